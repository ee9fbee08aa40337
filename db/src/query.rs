//! Generic, table-parameterized reads.
//!
//! Every lookup the API makes is one of four shapes: a single row by an
//! equality filter, all rows in order, an ordered window of rows, or a row
//! count. Table names come from [TableName](crate::TableName), which only
//! admits plain identifiers and is always quoted when rendered into SQL.
//! Filter values are always bound, never interpolated.
use std::fmt;

use diesel::prelude::*;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::result::Error;
use diesel::sql_types::{BigInt, Text};
use diesel::sqlite::Sqlite;
use lazy_static::lazy_static;
use regex::Regex;

use crate::DbError;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z0-9_]+$").unwrap();
}

/// A validated SQL table identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    /// Accepts only ASCII letters, digits and underscores.
    pub fn new<S: Into<String>>(name: S) -> Result<Self, DbError> {
        let name = name.into();
        if IDENTIFIER.is_match(&name) {
            Ok(TableName(name))
        } else {
            Err(DbError::InvalidIdentifier { identifier: name })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Equality filter applied to a single column.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Integer { column: &'static str, value: i64 },
    Text { column: &'static str, value: String },
}

impl Filter {
    fn column(&self) -> &'static str {
        match self {
            Filter::Integer { column, .. } | Filter::Text { column, .. } => column,
        }
    }
}

/// A read against one table, optionally filtered, ordered ascending by one column.
#[derive(Clone, Debug, PartialEq)]
pub struct TableQuery {
    table: TableName,
    filter: Option<Filter>,
    order_by: &'static str,
}

impl TableQuery {
    /// Creates a query over `table` ordered by `id`.
    pub fn new(table: TableName) -> Self {
        Self {
            table,
            filter: None,
            order_by: "id",
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn order_by(mut self, column: &'static str) -> Self {
        self.order_by = column;
        self
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    fn sql(&self, select: &str, tail: &str) -> String {
        let mut sql = format!("SELECT {} FROM {}", select, self.table.quoted());
        if let Some(ref f) = self.filter {
            sql.push_str(&format!(" WHERE \"{}\" = ?", f.column()));
        }
        if !tail.is_empty() {
            sql.push(' ');
            sql.push_str(tail);
        }
        sql
    }

    fn build(&self, select: &str, tail: &str) -> BoxedSqlQuery<'static, Sqlite, SqlQuery> {
        let query = diesel::sql_query(self.sql(select, tail)).into_boxed::<Sqlite>();
        match self.filter {
            Some(Filter::Integer { value, .. }) => query.bind::<BigInt, _>(value),
            Some(Filter::Text { ref value, .. }) => query.bind::<Text, _>(value.to_owned()),
            None => query,
        }
    }

    fn map_err(&self, e: Error) -> DbError {
        match e {
            Error::NotFound => DbError::NotFound,
            Error::DatabaseError(_, ref info)
                if info.message().starts_with("no such table") =>
            {
                DbError::MissingTable {
                    table: self.table.to_string(),
                }
            }
            e => DbError::Other {
                cause: e.to_string(),
            },
        }
    }
}

/// Row window of a paginated read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub offset: i64,
    pub limit: i64,
}

/// One window of rows together with the number of rows matching overall.
#[derive(Clone, Debug, PartialEq)]
pub struct Slice<T> {
    pub rows: Vec<T>,
    pub total: i64,
}

#[derive(QueryableByName)]
struct Count {
    #[diesel(sql_type = BigInt)]
    count: i64,
}

/// Fetches exactly one row, or [DbError::NotFound].
pub fn find_one<T>(query: &TableQuery, conn: &mut SqliteConnection) -> Result<T, DbError>
where
    T: QueryableByName<Sqlite> + 'static,
{
    query
        .build("*", &format!("ORDER BY \"{}\" ASC LIMIT 1", query.order_by))
        .get_result::<T>(conn)
        .map_err(|e| query.map_err(e))
}

/// Fetches every matching row in order.
pub fn load_all<T>(query: &TableQuery, conn: &mut SqliteConnection) -> Result<Vec<T>, DbError>
where
    T: QueryableByName<Sqlite> + 'static,
{
    query
        .build("*", &format!("ORDER BY \"{}\" ASC", query.order_by))
        .load::<T>(conn)
        .map_err(|e| query.map_err(e))
}

/// Fetches the rows in `[offset, offset + limit)` of the ordered result.
pub fn load_range<T>(
    query: &TableQuery,
    window: Window,
    conn: &mut SqliteConnection,
) -> Result<Vec<T>, DbError>
where
    T: QueryableByName<Sqlite> + 'static,
{
    query
        .build(
            "*",
            &format!("ORDER BY \"{}\" ASC LIMIT ? OFFSET ?", query.order_by),
        )
        .bind::<BigInt, _>(window.limit)
        .bind::<BigInt, _>(window.offset)
        .load::<T>(conn)
        .map_err(|e| query.map_err(e))
}

/// Counts matching rows. A count that yields no row is treated as zero.
pub fn count(query: &TableQuery, conn: &mut SqliteConnection) -> Result<i64, DbError> {
    query
        .build("COUNT(*) AS count", "")
        .get_result::<Count>(conn)
        .optional()
        .map(|c| c.map_or(0, |c| c.count))
        .map_err(|e| query.map_err(e))
}

/// Counts the matching rows, then fetches one window of them.
pub fn load_slice<T>(
    query: &TableQuery,
    window: Window,
    conn: &mut SqliteConnection,
) -> Result<Slice<T>, DbError>
where
    T: QueryableByName<Sqlite> + 'static,
{
    let total = count(query, conn)?;
    let rows = load_range(query, window, conn)?;

    Ok(Slice { rows, total })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_name() {
        assert!(TableName::new("KJV_books").is_ok());
        assert!(TableName::new("cross_references").is_ok());
        assert_eq!(
            TableName::new("KJV_books; DROP TABLE translations"),
            Err(DbError::InvalidIdentifier {
                identifier: "KJV_books; DROP TABLE translations".to_string()
            })
        );
        assert!(TableName::new("").is_err());
        assert!(TableName::new("kjv\"").is_err());
    }

    #[test]
    fn sql() {
        let table = TableName::new("KJV_verses").unwrap();

        let query = TableQuery::new(table.clone());
        assert_eq!(query.sql("*", ""), "SELECT * FROM \"KJV_verses\"");

        let query = TableQuery::new(table).filter(Filter::Integer {
            column: "book_id",
            value: 1,
        });
        assert_eq!(
            query.sql("COUNT(*) AS count", ""),
            "SELECT COUNT(*) AS count FROM \"KJV_verses\" WHERE \"book_id\" = ?"
        );
        assert_eq!(
            query.sql("*", "ORDER BY \"id\" ASC LIMIT ? OFFSET ?"),
            "SELECT * FROM \"KJV_verses\" WHERE \"book_id\" = ? ORDER BY \"id\" ASC LIMIT ? OFFSET ?"
        );
    }
}
