use diesel::prelude::*;

use crate::models::*;
use crate::query::{self, Filter, Slice, TableName, TableQuery, Window};
use crate::{DbError, TranslationTables};

/// Trait implemented by types that can look up the rows the API serves.
///
/// Single-row lookups return [DbError::NotFound] when nothing matches, and
/// reads against a translation whose tables do not exist return
/// [DbError::MissingTable].
pub trait DataBackend {
    /// Gets all translations, ordered by their code.
    fn translations(conn: &mut SqliteConnection) -> Result<Vec<Translation>, DbError>;

    /// Looks up a translation by its exact code (e.g. `KJV`).
    fn translation(code: &str, conn: &mut SqliteConnection) -> Result<Translation, DbError>;

    /// Gets all books in a translation, ordered by id.
    fn books(tables: &TranslationTables, conn: &mut SqliteConnection)
        -> Result<Vec<Book>, DbError>;

    /// Looks up a book in a translation by id.
    fn book(
        tables: &TranslationTables,
        id: i64,
        conn: &mut SqliteConnection,
    ) -> Result<Book, DbError>;

    /// Looks up a verse in a translation by id.
    fn verse(
        tables: &TranslationTables,
        id: i64,
        conn: &mut SqliteConnection,
    ) -> Result<Verse, DbError>;

    /// Gets one window of verses in a translation, ordered by id, optionally
    /// restricted to one book.
    fn verses(
        tables: &TranslationTables,
        book_id: Option<i64>,
        window: Window,
        conn: &mut SqliteConnection,
    ) -> Result<Slice<Verse>, DbError>;

    /// Looks up a cross reference by id.
    fn cross_reference(id: i64, conn: &mut SqliteConnection) -> Result<CrossReference, DbError>;

    /// Gets one window of cross references, ordered by id.
    fn cross_references(
        window: Window,
        conn: &mut SqliteConnection,
    ) -> Result<Slice<CrossReference>, DbError>;
}

const TRANSLATIONS: &str = "translations";
const CROSS_REFERENCES: &str = "cross_references";

fn by_id(table: &TableName, id: i64) -> TableQuery {
    TableQuery::new(table.to_owned()).filter(Filter::Integer {
        column: "id",
        value: id,
    })
}

/// Main implementation for the [DataBackend](crate::DataBackend) trait.
pub struct SqliteBackend;

impl DataBackend for SqliteBackend {
    fn translations(conn: &mut SqliteConnection) -> Result<Vec<Translation>, DbError> {
        let query = TableQuery::new(TableName::new(TRANSLATIONS)?).order_by("translation");
        query::load_all(&query, conn)
    }

    fn translation(code: &str, conn: &mut SqliteConnection) -> Result<Translation, DbError> {
        let query = TableQuery::new(TableName::new(TRANSLATIONS)?)
            .filter(Filter::Text {
                column: "translation",
                value: code.to_owned(),
            })
            .order_by("translation");
        query::find_one(&query, conn)
    }

    fn books(
        tables: &TranslationTables,
        conn: &mut SqliteConnection,
    ) -> Result<Vec<Book>, DbError> {
        query::load_all(&TableQuery::new(tables.books.to_owned()), conn)
    }

    fn book(
        tables: &TranslationTables,
        id: i64,
        conn: &mut SqliteConnection,
    ) -> Result<Book, DbError> {
        query::find_one(&by_id(&tables.books, id), conn)
    }

    fn verse(
        tables: &TranslationTables,
        id: i64,
        conn: &mut SqliteConnection,
    ) -> Result<Verse, DbError> {
        query::find_one(&by_id(&tables.verses, id), conn)
    }

    fn verses(
        tables: &TranslationTables,
        book_id: Option<i64>,
        window: Window,
        conn: &mut SqliteConnection,
    ) -> Result<Slice<Verse>, DbError> {
        let mut query = TableQuery::new(tables.verses.to_owned());
        if let Some(book_id) = book_id {
            query = query.filter(Filter::Integer {
                column: "book_id",
                value: book_id,
            });
        }
        query::load_slice(&query, window, conn)
    }

    fn cross_reference(id: i64, conn: &mut SqliteConnection) -> Result<CrossReference, DbError> {
        query::find_one(&by_id(&TableName::new(CROSS_REFERENCES)?, id), conn)
    }

    fn cross_references(
        window: Window,
        conn: &mut SqliteConnection,
    ) -> Result<Slice<CrossReference>, DbError> {
        let query = TableQuery::new(TableName::new(CROSS_REFERENCES)?);
        query::load_slice(&query, window, conn)
    }
}
