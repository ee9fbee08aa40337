use serde::{Deserialize, Serialize};

use db::Slice;

use crate::error::ApiError;

/// Error body returned with every non-2xx response.
#[derive(Clone, Deserialize, Serialize, Debug, PartialEq)]
pub struct ErrorData {
    pub error: String,
}

impl ErrorData {
    pub fn from_error(e: &ApiError) -> Self {
        Self {
            error: e.to_string(),
        }
    }
}

/// Pagination metadata accompanying list responses.
#[derive(Clone, Copy, Deserialize, Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    /// `total_pages` is `ceil(total / page_size)`, so no rows means no pages.
    pub fn new(page: u64, page_size: u64, total: u64) -> Self {
        Self {
            page,
            page_size,
            total,
            total_pages: total.div_ceil(page_size),
        }
    }
}

/// One page of rows and the metadata describing it.
#[derive(Clone, Deserialize, Serialize, Debug, PartialEq)]
pub struct PageData<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> PageData<T> {
    pub fn new(slice: Slice<T>, page: u64, page_size: u64) -> Self {
        let total = u64::try_from(slice.total).unwrap_or(0);
        Self {
            data: slice.rows,
            pagination: Pagination::new(page, page_size, total),
        }
    }
}
