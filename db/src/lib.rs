use diesel::prelude::*;
use diesel::r2d2;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use thiserror::Error;

/// Type of a pooled SQLite connection manager.
pub type SqliteConnectionManager = r2d2::ConnectionManager<SqliteConnection>;

/// Type for a SQLite connection pool.
pub type SqliteConnectionPool = r2d2::Pool<SqliteConnectionManager>;

pub type DbConnection = SqliteConnection;

/// Migrations for the shared tables (`translations`, `cross_references`).
///
/// Translation-scoped tables are part of the dataset and are not created here.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(Clone, Error, Debug, PartialEq)]
pub enum DbError {
    #[error("No matching row was found.")]
    NotFound,

    #[error("Table '{}' does not exist.", table)]
    MissingTable { table: String },

    #[error("There was a connection pool error. Root cause: {:?}.", cause)]
    ConnectionPool { cause: String },

    #[error("'{}' is not a valid table identifier.", identifier)]
    InvalidIdentifier { identifier: String },

    #[error("There was a database error. Root cause: {:?}.", cause)]
    Other { cause: String },

    #[error("There was a database migration error. Root cause: {:?}.", cause)]
    Migration { cause: String },
}

impl From<r2d2::PoolError> for DbError {
    fn from(e: r2d2::PoolError) -> Self {
        DbError::ConnectionPool {
            cause: e.to_string(),
        }
    }
}

/// Builds a SQLite connection pool with the given URL.
pub fn build_pool(db_url: &str, max_size: u32) -> Result<SqliteConnectionPool, DbError> {
    Ok(r2d2::Pool::builder()
        .max_size(max_size)
        .build(SqliteConnectionManager::new(db_url))?)
}

/// Establishes a non-pooled SQLite connection.
pub fn establish_connection(db_url: &str) -> Result<SqliteConnection, DbError> {
    SqliteConnection::establish(db_url).map_err(|e| DbError::ConnectionPool {
        cause: format!("Error connecting to {db_url}: {e}"),
    })
}

/// Run any pending Diesel migrations.
pub fn run_migrations(conn: &mut SqliteConnection) -> Result<(), DbError> {
    conn.run_pending_migrations(MIGRATIONS)
        .map(|_| ())
        .map_err(|e| DbError::Migration {
            cause: e.to_string(),
        })
}

/// Loads every known translation and builds the table allow-list from it.
pub fn prefetch_translations<B>(conn: &mut SqliteConnection) -> Result<TranslationRegistry, DbError>
where
    B: DataBackend,
{
    B::translations(conn)
        .map(|translations| TranslationRegistry::new(translations.iter().map(|t| &t.translation)))
        .map_err(|e| DbError::Other {
            cause: format!("Could not preload translation data from database. Cause: {e}"),
        })
}

mod backend;
pub mod models;
mod query;
mod registry;

pub use backend::{DataBackend, SqliteBackend};
pub use query::{Filter, Slice, TableName, TableQuery, Window};
pub use registry::{TranslationRegistry, TranslationTables};
