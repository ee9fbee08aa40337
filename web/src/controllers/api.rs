use actix_web::web;

use db::DataBackend;

use crate::controllers::*;
use crate::ServerData;

const TRANSLATIONS: Resource = Resource {
    not_found: None,
    failed: "Failed to fetch translations",
    translation_scoped: false,
};

const TRANSLATION: Resource = Resource {
    not_found: Some(TRANSLATION_NOT_FOUND),
    failed: "Failed to fetch translation",
    translation_scoped: false,
};

const BOOKS: Resource = Resource {
    not_found: None,
    failed: "Failed to fetch books",
    translation_scoped: true,
};

const BOOK: Resource = Resource {
    not_found: Some("Book not found"),
    failed: "Failed to fetch book",
    translation_scoped: true,
};

const VERSES: Resource = Resource {
    not_found: None,
    failed: "Failed to fetch verses",
    translation_scoped: true,
};

const VERSE: Resource = Resource {
    not_found: Some("Verse not found"),
    failed: "Failed to fetch verse",
    translation_scoped: true,
};

const CROSS_REFERENCES: Resource = Resource {
    not_found: None,
    failed: "Failed to fetch cross references",
    translation_scoped: false,
};

const CROSS_REFERENCE: Resource = Resource {
    not_found: Some("Cross reference not found"),
    failed: "Failed to fetch cross reference",
    translation_scoped: false,
};

/// Default page size when listing the verses of one book.
const BOOK_VERSES_PAGE_SIZE: u64 = 50;

/// Default page size for translation-wide and cross reference listings.
const PAGE_SIZE: u64 = 10;

/// Handles HTTP requests for all translations (`/api/translations`).
pub async fn translations<B>(data: web::Data<ServerData>) -> ApiResult
where
    B: DataBackend + 'static,
{
    lookup(&data, &TRANSLATIONS, B::translations).await
}

/// Handles HTTP requests for one translation (e.g. `/api/translations/KJV`).
pub async fn translation<B>(data: web::Data<ServerData>, params: web::Path<(String,)>) -> ApiResult
where
    B: DataBackend + 'static,
{
    let (code,) = params.into_inner();
    lookup(&data, &TRANSLATION, move |conn| B::translation(&code, conn)).await
}

/// Handles HTTP requests for the books of a translation (e.g. `/api/KJV/books`).
pub async fn books<B>(data: web::Data<ServerData>, params: web::Path<(String,)>) -> ApiResult
where
    B: DataBackend + 'static,
{
    let (code,) = params.into_inner();
    let tables = translation_tables(&data, &code)?;
    lookup(&data, &BOOKS, move |conn| B::books(&tables, conn)).await
}

/// Handles HTTP requests for one book (e.g. `/api/KJV/books/1`).
pub async fn book<B>(data: web::Data<ServerData>, params: web::Path<(String, String)>) -> ApiResult
where
    B: DataBackend + 'static,
{
    let (code, book_id) = params.into_inner();
    let book_id = parse_id(&book_id, INVALID_BOOK_ID)?;
    let tables = translation_tables(&data, &code)?;
    lookup(&data, &BOOK, move |conn| B::book(&tables, book_id, conn)).await
}

/// Handles HTTP requests for one page of a book's verses
/// (e.g. `/api/KJV/books/1/verses?page=2&pageSize=25`).
pub async fn book_verses<B>(
    data: web::Data<ServerData>,
    params: web::Path<(String, String)>,
    query: web::Query<PageParams>,
) -> ApiResult
where
    B: DataBackend + 'static,
{
    let (code, book_id) = params.into_inner();
    let book_id = parse_id(&book_id, INVALID_BOOK_ID)?;
    let request = PageRequest::from_params(&query, BOOK_VERSES_PAGE_SIZE)?;
    let tables = translation_tables(&data, &code)?;
    paginate(&data, &VERSES, request, move |window, conn| {
        B::verses(&tables, Some(book_id), window, conn)
    })
    .await
}

/// Handles HTTP requests for one page of a translation's verses
/// (e.g. `/api/KJV/verses?page=3`).
pub async fn verses<B>(
    data: web::Data<ServerData>,
    params: web::Path<(String,)>,
    query: web::Query<PageParams>,
) -> ApiResult
where
    B: DataBackend + 'static,
{
    let (code,) = params.into_inner();
    let request = PageRequest::from_params(&query, PAGE_SIZE)?;
    let tables = translation_tables(&data, &code)?;
    paginate(&data, &VERSES, request, move |window, conn| {
        B::verses(&tables, None, window, conn)
    })
    .await
}

/// Handles HTTP requests for one verse (e.g. `/api/KJV/verses/31102`).
pub async fn verse<B>(data: web::Data<ServerData>, params: web::Path<(String, String)>) -> ApiResult
where
    B: DataBackend + 'static,
{
    let (code, id) = params.into_inner();
    let id = parse_id(&id, INVALID_ID)?;
    let tables = translation_tables(&data, &code)?;
    lookup(&data, &VERSE, move |conn| B::verse(&tables, id, conn)).await
}

/// Handles HTTP requests for one page of cross references.
pub async fn cross_references<B>(
    data: web::Data<ServerData>,
    query: web::Query<PageParams>,
) -> ApiResult
where
    B: DataBackend + 'static,
{
    let request = PageRequest::from_params(&query, PAGE_SIZE)?;
    paginate(&data, &CROSS_REFERENCES, request, B::cross_references).await
}

/// Handles HTTP requests for one cross reference (e.g. `/api/cross_references/7`).
pub async fn cross_reference<B>(
    data: web::Data<ServerData>,
    params: web::Path<(String,)>,
) -> ApiResult
where
    B: DataBackend + 'static,
{
    let (id,) = params.into_inner();
    let id = parse_id(&id, INVALID_ID)?;
    lookup(&data, &CROSS_REFERENCE, move |conn| B::cross_reference(id, conn)).await
}
