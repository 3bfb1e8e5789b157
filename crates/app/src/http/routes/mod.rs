pub mod comments;
pub mod health;
pub mod reactions;
pub mod replies;
pub mod upload;

use serde::Deserialize;

use crate::http::error::ApiError;
use adboard_core::types::Pagination;

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageParams {
    pub fn pagination(&self, max_limit: u32) -> Result<Pagination, ApiError> {
        Ok(Pagination::from_query(
            self.page.as_deref(),
            self.limit.as_deref(),
            max_limit,
        )?)
    }
}

fn required(name: &'static str, value: Option<String>) -> Result<String, ApiError> {
    value.ok_or_else(|| ApiError::BadRequest(format!("{name} is required")))
}
