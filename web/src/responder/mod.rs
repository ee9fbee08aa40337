//! Response bodies shared by the API handlers.
mod data;

pub use self::data::{ErrorData, PageData};
