use diesel::sql_types::{BigInt, Integer, Nullable, Text};
use diesel::QueryableByName;
use serde::{Deserialize, Serialize};

/// Model representing a translation (e.g. KJV) from the `translations` table.
#[derive(Clone, Debug, Deserialize, PartialEq, QueryableByName, Serialize)]
pub struct Translation {
    #[diesel(sql_type = Text)]
    pub translation: String,
    #[diesel(sql_type = Text)]
    pub title: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub license: Option<String>,
}

/// Model representing a book from a `{translation}_books` table.
#[derive(Clone, Debug, Deserialize, PartialEq, QueryableByName, Serialize)]
pub struct Book {
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = Text)]
    pub name: String,
}

/// Model representing a Bible verse from a `{translation}_verses` table.
#[derive(Clone, Debug, Deserialize, PartialEq, QueryableByName, Serialize)]
pub struct Verse {
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = BigInt)]
    pub book_id: i64,
    #[diesel(sql_type = Integer)]
    pub chapter: i32,
    #[diesel(sql_type = Integer)]
    pub verse: i32,
    #[diesel(sql_type = Text)]
    pub text: String,
}

/// Model representing a cross reference between a verse and a range of
/// verses. `votes` ranks how relevant the reference is.
#[derive(Clone, Debug, Deserialize, PartialEq, QueryableByName, Serialize)]
pub struct CrossReference {
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    #[diesel(sql_type = Text)]
    pub from_book: String,
    #[diesel(sql_type = Integer)]
    pub from_chapter: i32,
    #[diesel(sql_type = Integer)]
    pub from_verse: i32,
    #[diesel(sql_type = Text)]
    pub to_book: String,
    #[diesel(sql_type = Integer)]
    pub to_chapter: i32,
    #[diesel(sql_type = Integer)]
    pub to_verse_start: i32,
    #[diesel(sql_type = Nullable<Integer>)]
    pub to_verse_end: Option<i32>,
    #[diesel(sql_type = Integer)]
    pub votes: i32,
}
