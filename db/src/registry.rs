use std::collections::HashMap;

use log::warn;

use crate::{DbError, TableName};

/// Tables holding the data of a single translation.
#[derive(Clone, Debug, PartialEq)]
pub struct TranslationTables {
    pub code: String,
    pub books: TableName,
    pub verses: TableName,
}

impl TranslationTables {
    /// Derives the `{code}_books` and `{code}_verses` tables for a translation code.
    pub fn for_code(code: &str) -> Result<Self, DbError> {
        Ok(Self {
            code: code.to_owned(),
            books: TableName::new(format!("{}_books", code))?,
            verses: TableName::new(format!("{}_verses", code))?,
        })
    }
}

/// Allow-list of translation codes and the tables they map to.
///
/// Only codes present here are ever turned into table identifiers, so a
/// request path can never name an arbitrary table.
#[derive(Clone, Debug, Default)]
pub struct TranslationRegistry {
    tables: HashMap<String, TranslationTables>,
}

impl TranslationRegistry {
    /// Builds the registry from translation codes, skipping codes that cannot
    /// form a table identifier.
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tables = codes
            .into_iter()
            .filter_map(|code| match TranslationTables::for_code(code.as_ref()) {
                Ok(t) => Some((t.code.to_owned(), t)),
                Err(e) => {
                    warn!("Skipping translation: {}", e);
                    None
                }
            })
            .collect();

        Self { tables }
    }

    /// Looks up the tables of a translation by its exact code.
    pub fn get(&self, code: &str) -> Option<&TranslationTables> {
        self.tables.get(code)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
