use actix_web::{web, FromRequest, Handler, HttpResponse, Resource as Endpoint, Responder};
use log::error;
use serde::{Deserialize, Serialize};

use db::{DataBackend, DbConnection, DbError, Slice, TranslationTables, Window};

use crate::error::ApiError;
use crate::responder::PageData;
use crate::ServerData;

pub const INVALID_BOOK_ID: &str = "Invalid book ID parameter";
pub const INVALID_ID: &str = "Invalid ID parameter";
pub const INVALID_PAGE: &str = "Invalid page parameter";
pub const INVALID_PAGE_SIZE: &str = "Invalid pageSize parameter. Must be between 1 and 100";
pub const INVALID_QUERY: &str = "Invalid query parameters";
pub const TRANSLATION_NOT_FOUND: &str = "Translation not found";

const MAX_PAGE_SIZE: u64 = 100;

/// Result for JSON response handlers
pub type ApiResult = Result<HttpResponse, ApiError>;

/// Raw pagination query parameters, validated by [PageRequest].
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<String>,
}

/// A validated page of a listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
    offset: i64,
}

impl PageRequest {
    /// Validates `page` (at least 1) and `pageSize` (1 to 100). Missing or
    /// empty values take the defaults.
    pub fn from_params(params: &PageParams, default_page_size: u64) -> Result<Self, ApiError> {
        let page = match present(&params.page) {
            None => 1,
            Some(v) => parse_positive(v).ok_or(ApiError::Validation(INVALID_PAGE))?,
        };
        let page_size = match present(&params.page_size) {
            None => default_page_size,
            Some(v) => parse_positive(v)
                .filter(|n| *n <= MAX_PAGE_SIZE)
                .ok_or(ApiError::Validation(INVALID_PAGE_SIZE))?,
        };

        Self::new(page, page_size)
    }

    pub fn new(page: u64, page_size: u64) -> Result<Self, ApiError> {
        if page == 0 {
            return Err(ApiError::Validation(INVALID_PAGE));
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ApiError::Validation(INVALID_PAGE_SIZE));
        }
        // Pages so far out that the offset overflows can never hold rows.
        let offset = (page - 1)
            .checked_mul(page_size)
            .and_then(|o| i64::try_from(o).ok())
            .ok_or(ApiError::Validation(INVALID_PAGE))?;

        Ok(Self {
            page,
            page_size,
            offset,
        })
    }

    /// Rows `[(page - 1) * pageSize, page * pageSize)`.
    pub fn window(&self) -> Window {
        Window {
            offset: self.offset,
            limit: self.page_size as i64,
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn parse_positive(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok().filter(|n| *n >= 1)
}

/// Parses an id path segment, which must be an integer of at least 1.
pub fn parse_id(value: &str, message: &'static str) -> Result<i64, ApiError> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|n| *n >= 1)
        .ok_or(ApiError::Validation(message))
}

/// Resolves a translation code against the registry loaded at startup.
pub fn translation_tables(data: &ServerData, code: &str) -> Result<TranslationTables, ApiError> {
    data.translations
        .get(code)
        .cloned()
        .ok_or(ApiError::NotFound(TRANSLATION_NOT_FOUND))
}

/// How a resource reports backend failures to the client.
pub struct Resource {
    /// Message for a single-row lookup that matched nothing.
    pub not_found: Option<&'static str>,
    /// Message for every other backend failure.
    pub failed: &'static str,
    /// Whether the resource lives in per-translation tables.
    pub translation_scoped: bool,
}

impl Resource {
    /// Maps a specific database error to a client-facing one, and log.
    fn map_db_err(&self, e: DbError) -> ApiError {
        match (e, self.not_found) {
            (DbError::NotFound, Some(message)) => ApiError::NotFound(message),
            (DbError::MissingTable { .. }, _) if self.translation_scoped => {
                ApiError::NotFound(TRANSLATION_NOT_FOUND)
            }
            (e, _) => {
                error!("{}: {}", self.failed, e);
                ApiError::Backend(self.failed)
            }
        }
    }
}

/// Runs a backend call on the blocking pool with its own pooled connection.
async fn fetch<T, F>(data: &ServerData, resource: &Resource, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&mut DbConnection) -> Result<T, DbError> + Send + 'static,
{
    let pool = data.db.to_owned();
    let result = web::block(move || -> Result<T, DbError> {
        let mut conn = pool.get()?;
        f(&mut *conn)
    })
    .await?;

    result.map_err(|e| resource.map_db_err(e))
}

/// Responds with a row (or list of rows) serialized verbatim.
pub async fn lookup<T, F>(data: &ServerData, resource: &Resource, f: F) -> ApiResult
where
    T: Serialize + Send + 'static,
    F: FnOnce(&mut DbConnection) -> Result<T, DbError> + Send + 'static,
{
    let row = fetch(data, resource, f).await?;
    Ok(HttpResponse::Ok().json(row))
}

/// Responds with one page of rows wrapped in `{data, pagination}`.
pub async fn paginate<T, F>(
    data: &ServerData,
    resource: &Resource,
    request: PageRequest,
    f: F,
) -> ApiResult
where
    T: Serialize + Send + 'static,
    F: FnOnce(Window, &mut DbConnection) -> Result<Slice<T>, DbError> + Send + 'static,
{
    let window = request.window();
    let slice = fetch(data, resource, move |conn| f(window, conn)).await?;
    Ok(HttpResponse::Ok().json(PageData::new(slice, request.page, request.page_size)))
}

/// Fallback for any route the API does not serve.
pub async fn not_found() -> ApiResult {
    Err(ApiError::NotFound("Not found"))
}

/// Fallback for a served route requested with any method but GET.
pub async fn method_not_allowed() -> ApiResult {
    Err(ApiError::MethodNotAllowed)
}

/// A GET-only route.
fn get<F, Args>(path: &str, handler: F) -> Endpoint
where
    F: Handler<Args>,
    Args: FromRequest + 'static,
    F::Output: Responder + 'static,
{
    web::resource(path)
        .route(web::get().to(handler))
        .default_service(web::route().to(method_not_allowed))
}

/// Registers every API route against the given backend.
pub fn routes<B>(cfg: &mut web::ServiceConfig)
where
    B: DataBackend + 'static,
{
    cfg.app_data(
        web::QueryConfig::default()
            .error_handler(|_, _| ApiError::Validation(INVALID_QUERY).into()),
    )
    .service(get("/api/translations", api::translations::<B>))
    .service(get("/api/translations/{translation}", api::translation::<B>))
    .service(get("/api/cross_references", api::cross_references::<B>))
    .service(get("/api/cross_references/{id}", api::cross_reference::<B>))
    .service(get("/api/{translation}/books", api::books::<B>))
    .service(get("/api/{translation}/books/{book_id}", api::book::<B>))
    .service(get(
        "/api/{translation}/books/{book_id}/verses",
        api::book_verses::<B>,
    ))
    .service(get("/api/{translation}/verses", api::verses::<B>))
    .service(get("/api/{translation}/verses/{id}", api::verse::<B>));
}

pub mod api;

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn params(page: Option<&str>, page_size: Option<&str>) -> PageParams {
        PageParams {
            page: page.map(str::to_string),
            page_size: page_size.map(str::to_string),
        }
    }

    #[test]
    fn page_request_defaults() {
        let request = PageRequest::from_params(&params(None, None), 50).unwrap();
        assert_eq!(request.page, 1);
        assert_eq!(request.page_size, 50);
        assert_eq!(request.window(), Window { offset: 0, limit: 50 });

        let request = PageRequest::from_params(&params(Some(""), Some("")), 10).unwrap();
        assert_eq!(request.page, 1);
        assert_eq!(request.page_size, 10);
    }

    #[test]
    fn page_request_invalid() {
        for page in ["0", "-1", "abc", "1.5", "12abc"] {
            assert_eq!(
                PageRequest::from_params(&params(Some(page), None), 10),
                Err(ApiError::Validation(INVALID_PAGE)),
                "page={}",
                page
            );
        }
        for page_size in ["0", "101", "500", "-3", "ten"] {
            assert_eq!(
                PageRequest::from_params(&params(None, Some(page_size)), 10),
                Err(ApiError::Validation(INVALID_PAGE_SIZE)),
                "pageSize={}",
                page_size
            );
        }
        assert_eq!(
            PageRequest::from_params(&params(Some(&u64::MAX.to_string()), Some("100")), 10),
            Err(ApiError::Validation(INVALID_PAGE))
        );
    }

    #[test]
    fn ids() {
        assert_eq!(parse_id("1", INVALID_BOOK_ID), Ok(1));
        assert_eq!(parse_id(" 42 ", INVALID_ID), Ok(42));
        // Larger than any stored id can be
        for id in ["0", "-7", "abc", "", "3.0", "99999999999999999999"] {
            assert_eq!(
                parse_id(id, INVALID_BOOK_ID),
                Err(ApiError::Validation(INVALID_BOOK_ID))
            );
        }
    }

    #[test]
    fn resource_errors() {
        let resource = Resource {
            not_found: Some("Book not found"),
            failed: "Failed to fetch book",
            translation_scoped: true,
        };
        assert_eq!(
            resource.map_db_err(DbError::NotFound),
            ApiError::NotFound("Book not found")
        );
        assert_eq!(
            resource.map_db_err(DbError::MissingTable {
                table: "NIV_books".to_string()
            }),
            ApiError::NotFound(TRANSLATION_NOT_FOUND)
        );
        assert_eq!(
            resource.map_db_err(DbError::Other {
                cause: "disk I/O error".to_string()
            }),
            ApiError::Backend("Failed to fetch book")
        );

        let resource = Resource {
            not_found: None,
            failed: "Failed to fetch cross references",
            translation_scoped: false,
        };
        assert_eq!(
            resource.map_db_err(DbError::MissingTable {
                table: "cross_references".to_string()
            }),
            ApiError::Backend("Failed to fetch cross references")
        );
    }

    proptest! {
        #[test]
        fn window_starts_at_offset(page in 1u64..1_000_000, page_size in 1u64..=100) {
            let request = PageRequest::new(page, page_size).unwrap();
            let window = request.window();
            prop_assert_eq!(window.offset as u64, (page - 1) * page_size);
            prop_assert_eq!(window.limit as u64, page_size);
        }

        #[test]
        fn out_of_range_page_size(page_size in 101u64..100_000) {
            prop_assert_eq!(
                PageRequest::from_params(
                    &PageParams { page: None, page_size: Some(page_size.to_string()) },
                    10,
                ),
                Err(ApiError::Validation(INVALID_PAGE_SIZE))
            );
        }
    }
}
