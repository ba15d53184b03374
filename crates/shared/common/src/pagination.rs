//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_NUMBER: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Pagination query parameters
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

fn default_page() -> u64 {
    DEFAULT_PAGE_NUMBER
}

fn default_per_page() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl PaginationParams {
    /// Page number, never below 1
    pub fn page(&self) -> u64 {
        self.page.max(1)
    }

    /// Calculate offset for database query, capped at the largest SQL bigint
    pub fn offset(&self) -> u64 {
        (self.page() - 1)
            .saturating_mul(self.limit())
            .min(i64::MAX as u64)
    }

    /// Get limit capped at maximum
    pub fn limit(&self) -> u64 {
        self.per_page.clamp(1, MAX_PAGE_SIZE)
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE_NUMBER,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Paginated list payload
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub meta: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PaginationMeta {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, params: &PaginationParams, total: u64) -> Self {
        let per_page = params.limit();
        Self {
            items,
            meta: PaginationMeta {
                page: params.page(),
                per_page,
                total,
                total_pages: total.div_ceil(per_page),
            },
        }
    }

    /// Convert items while keeping the metadata.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Paginated<U>, E> {
        Ok(Paginated {
            items: self.items.into_iter().map(f).collect::<Result<_, _>>()?,
            meta: self.meta,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_and_limit() {
        let params = PaginationParams { page: 3, per_page: 500 };
        assert_eq!(params.limit(), MAX_PAGE_SIZE);
        assert_eq!(params.offset(), 200);

        let params = PaginationParams { page: 0, per_page: 0 };
        assert_eq!(params.limit(), 1);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_offset_saturates_on_huge_page() {
        let params: PaginationParams =
            serde_json::from_str(r#"{"page": 18446744073709551615, "per_page": 20}"#).unwrap();
        assert_eq!(params.page(), u64::MAX);
        assert_eq!(params.offset(), i64::MAX as u64);
    }

    #[test]
    fn test_total_pages() {
        let page = Paginated::new(vec![1, 2], &PaginationParams::default(), 41);
        assert_eq!(page.meta.total_pages, 3);
        assert_eq!(page.meta.per_page, 20);
    }
}
