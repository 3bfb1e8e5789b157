use serde::Serialize;

use crate::error::CoreError;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    page: u32,
    limit: u32,
}

impl Pagination {
    pub fn new(page: u32, limit: u32) -> Result<Self, CoreError> {
        if page < 1 {
            return Err(CoreError::InvalidPagination(format!(
                "page must be at least 1, got {page}"
            )));
        }
        if limit < 1 {
            return Err(CoreError::InvalidPagination(format!(
                "limit must be at least 1, got {limit}"
            )));
        }
        Ok(Pagination { page, limit })
    }

    /// Coerces raw query-string values. Missing or blank values fall back to
    /// the defaults and `limit` is clamped to `max_limit`.
    pub fn from_query(
        page: Option<&str>,
        limit: Option<&str>,
        max_limit: u32,
    ) -> Result<Self, CoreError> {
        let page = parse_positive("page", page, DEFAULT_PAGE)?;
        let limit = parse_positive("limit", limit, DEFAULT_LIMIT)?;
        Pagination::new(page, limit.min(max_limit.max(1)))
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn skip(&self) -> usize {
        (self.page as usize - 1).saturating_mul(self.limit as usize)
    }

    pub fn take(&self) -> usize {
        self.limit as usize
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

fn parse_positive(name: &str, raw: Option<&str>, default: u32) -> Result<u32, CoreError> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(default);
    };
    let value: u32 = raw
        .parse()
        .map_err(|_| CoreError::InvalidPagination(format!("{name} must be a number, got {raw}")))?;
    if value < 1 {
        return Err(CoreError::InvalidPagination(format!(
            "{name} must be at least 1, got {value}"
        )));
    }
    Ok(value)
}
