use std::env;
use std::error::Error;
use std::process;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use serde::Serialize;

use db::{
    establish_connection, prefetch_translations, DataBackend, DbConnection, SqliteBackend,
    TranslationTables, Window,
};

/// CLI for looking up translations, books, verses and cross references
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// SQLite database to read from. Defaults to DATABASE_URL.
    #[arg(long)]
    database: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all translations
    Translations,
    /// List the books of a translation
    Books { translation: String },
    /// Show one verse
    Verse {
        translation: String,
        #[arg(value_parser = clap::value_parser!(i64).range(1..))]
        id: i64,
    },
    /// List one page of verses, optionally for a single book
    Verses {
        translation: String,
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
        book: Option<i64>,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Show one cross reference
    CrossRef {
        #[arg(value_parser = clap::value_parser!(i64).range(1..))]
        id: i64,
    },
    /// List one page of cross references
    CrossRefs {
        #[command(flatten)]
        page: PageArgs,
    },
}

/// Default page size when listing the verses of one book.
const BOOK_VERSES_PAGE_SIZE: i64 = 50;

/// Default page size for every other listing.
const PAGE_SIZE: i64 = 10;

#[derive(clap::Args, Debug)]
struct PageArgs {
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(i64).range(1..))]
    page: i64,
    /// Rows per page, 1 to 100. Defaults to 50 for one book, 10 otherwise.
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..=100))]
    page_size: Option<i64>,
}

impl PageArgs {
    fn window(&self, default_page_size: i64) -> Result<Window, Box<dyn Error>> {
        let limit = self.page_size.unwrap_or(default_page_size);
        let offset = (self.page - 1)
            .checked_mul(limit)
            .ok_or("Invalid page parameter")?;
        Ok(Window { offset, limit })
    }
}

fn tables(code: &str, conn: &mut DbConnection) -> Result<TranslationTables, Box<dyn Error>> {
    let registry = prefetch_translations::<SqliteBackend>(conn)?;
    registry
        .get(code)
        .cloned()
        .ok_or_else(|| format!("Translation not found: {}", code).into())
}

fn pretty<T: Serialize>(value: &T) -> Result<String, Box<dyn Error>> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn run<B: DataBackend>(command: &Command, conn: &mut DbConnection) -> Result<String, Box<dyn Error>> {
    match command {
        Command::Translations => pretty(&B::translations(conn)?),
        Command::Books { translation } => {
            let tables = tables(translation, conn)?;
            pretty(&B::books(&tables, conn)?)
        }
        Command::Verse { translation, id } => {
            let tables = tables(translation, conn)?;
            pretty(&B::verse(&tables, *id, conn)?)
        }
        Command::Verses {
            translation,
            book,
            page,
        } => {
            let tables = tables(translation, conn)?;
            let default_page_size = match book {
                Some(_) => BOOK_VERSES_PAGE_SIZE,
                None => PAGE_SIZE,
            };
            let slice = B::verses(&tables, *book, page.window(default_page_size)?, conn)?;
            eprintln!("{} verses in total", slice.total);
            pretty(&slice.rows)
        }
        Command::CrossRef { id } => pretty(&B::cross_reference(*id, conn)?),
        Command::CrossRefs { page } => {
            let slice = B::cross_references(page.window(PAGE_SIZE)?, conn)?;
            eprintln!("{} cross references in total", slice.total);
            pretty(&slice.rows)
        }
    }
}

fn main() {
    let cli = Cli::parse();

    dotenv().ok();
    let url = cli
        .database
        .to_owned()
        .or_else(|| env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "/tmp/bible-api.db".to_string());

    let result = establish_connection(&url)
        .map_err(Box::<dyn Error>::from)
        .and_then(|mut conn| run::<SqliteBackend>(&cli.command, &mut conn));

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use db::models::*;
    use db::run_migrations;
    use diesel::connection::SimpleConnection;

    use super::*;

    const FIXTURES: &str = r#"
        INSERT INTO translations (translation, title, license) VALUES
            ('KJV', 'King James Version', 'Public Domain');

        CREATE TABLE KJV_books (id INTEGER PRIMARY KEY NOT NULL, name TEXT NOT NULL);
        INSERT INTO KJV_books (id, name) VALUES (1, 'Genesis'), (2, 'Exodus');

        CREATE TABLE KJV_verses (
            id INTEGER PRIMARY KEY NOT NULL,
            book_id INTEGER NOT NULL,
            chapter INTEGER NOT NULL,
            verse INTEGER NOT NULL,
            text TEXT NOT NULL
        );
        INSERT INTO KJV_verses (id, book_id, chapter, verse, text) VALUES
            (1, 1, 1, 1, 'In the beginning God created the heaven and the earth.'),
            (2, 1, 1, 2, 'And the earth was without form, and void;'),
            (3, 2, 1, 1, 'Now these are the names of the children of Israel,');

        INSERT INTO cross_references
            (id, from_book, from_chapter, from_verse, to_book, to_chapter, to_verse_start, to_verse_end, votes)
        VALUES
            (1, 'Genesis', 1, 1, 'John', 1, 1, 3, 311),
            (2, 'Genesis', 1, 1, 'Hebrews', 11, 3, NULL, 208);
    "#;

    fn connection() -> DbConnection {
        let mut conn = establish_connection(":memory:").unwrap();
        run_migrations(&mut conn).unwrap();
        conn.batch_execute(FIXTURES).unwrap();
        conn
    }

    fn run_args(args: &[&str], conn: &mut DbConnection) -> Result<String, Box<dyn Error>> {
        let cli = Cli::try_parse_from(args.iter().copied()).unwrap();
        run::<SqliteBackend>(&cli.command, conn)
    }

    #[test]
    fn parse_commands() {
        let cli = Cli::try_parse_from(["cli", "verses", "KJV", "--book", "1", "--page", "2"]).unwrap();
        match cli.command {
            Command::Verses {
                translation,
                book,
                page,
            } => {
                assert_eq!(translation, "KJV");
                assert_eq!(book, Some(1));
                assert_eq!(page.page_size, None);
                assert_eq!(
                    page.window(BOOK_VERSES_PAGE_SIZE).unwrap(),
                    Window { offset: 50, limit: 50 }
                );
            }
            c => panic!("Unexpected command {:?}", c),
        }
    }

    #[test]
    fn reject_invalid_pages() {
        assert!(Cli::try_parse_from(["cli", "cross-refs", "--page", "0"]).is_err());
        assert!(Cli::try_parse_from(["cli", "cross-refs", "--page-size", "101"]).is_err());
        assert!(Cli::try_parse_from(["cli", "verse", "KJV", "0"]).is_err());
        assert!(Cli::try_parse_from(["cli", "cross-ref", "abc"]).is_err());
    }

    #[test]
    fn lookups() {
        let conn = &mut connection();

        let output = run_args(&["cli", "translations"], conn).unwrap();
        let translations: Vec<Translation> = serde_json::from_str(&output).unwrap();
        assert_eq!(translations.len(), 1);
        assert_eq!(translations[0].translation, "KJV");

        let output = run_args(&["cli", "books", "KJV"], conn).unwrap();
        let books: Vec<Book> = serde_json::from_str(&output).unwrap();
        assert_eq!(books.iter().map(|b| b.id).collect::<Vec<_>>(), vec![1, 2]);

        let output = run_args(&["cli", "verse", "KJV", "3"], conn).unwrap();
        let verse: Verse = serde_json::from_str(&output).unwrap();
        assert_eq!(verse.book_id, 2);

        let output = run_args(&["cli", "cross-ref", "2"], conn).unwrap();
        let cross_reference: CrossReference = serde_json::from_str(&output).unwrap();
        assert_eq!(cross_reference.to_book, "Hebrews");
        assert_eq!(cross_reference.to_verse_end, None);
    }

    #[test]
    fn listings() {
        let conn = &mut connection();

        let output = run_args(&["cli", "verses", "KJV", "--book", "1"], conn).unwrap();
        let verses: Vec<Verse> = serde_json::from_str(&output).unwrap();
        assert_eq!(verses.iter().map(|v| v.id).collect::<Vec<_>>(), vec![1, 2]);

        let args = ["cli", "verses", "KJV", "--page", "2", "--page-size", "2"];
        let output = run_args(&args, conn).unwrap();
        let verses: Vec<Verse> = serde_json::from_str(&output).unwrap();
        assert_eq!(verses.iter().map(|v| v.id).collect::<Vec<_>>(), vec![3]);

        let output = run_args(&["cli", "cross-refs", "--page-size", "1"], conn).unwrap();
        let cross_references: Vec<CrossReference> = serde_json::from_str(&output).unwrap();
        assert_eq!(cross_references.len(), 1);
        assert_eq!(cross_references[0].id, 1);
    }

    #[test]
    fn unknown_translation() {
        let conn = &mut connection();

        for args in [
            &["cli", "books", "NIV"][..],
            &["cli", "verse", "NIV", "1"][..],
            &["cli", "verses", "NIV"][..],
        ] {
            let e = run_args(args, conn).unwrap_err();
            assert_eq!(e.to_string(), "Translation not found: NIV");
        }

        let e = run_args(&["cli", "verse", "KJV", "99"], conn).unwrap_err();
        assert_eq!(e.to_string(), "No matching row was found.");
    }
}
