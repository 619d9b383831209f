//! Pagination primitives shared by list endpoints.
//!
//! A list request carries up to three raw query values: `page`, `page_size`
//! and `is_pagination`. [`PaginationQuery::resolve`] validates all three and
//! derives the effective [`PaginationParams`] for the request. Handlers turn
//! those into a [`PageWindow`] for the persistence layer and wrap their
//! results in a [`Paged`] envelope.
//!
//! # Examples
//! ```
//! use pagination::PaginationQuery;
//!
//! let query = PaginationQuery::new("3", "10", "true");
//! let params = query.resolve().expect("valid query");
//! assert_eq!(params.offset, 20);
//! assert_eq!(params.limit, 10);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: i64 = 200;

/// Limit applied when the supplied page or page size cannot be honoured.
pub const DEFAULT_LIMIT: i64 = 20;

/// Marker used for `page`, `page_size` and `limit` when pagination is off.
pub const DISABLED: i64 = -1;

const DEFAULT_PAGE: &str = "1";
const DEFAULT_PAGE_SIZE: &str = "20";
const DEFAULT_IS_PAGINATION: &str = "1";

/// Validation failure for one of the raw pagination query values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidQuery {
    /// `page` was not an integer.
    #[error("Invalid query param: 'page' must be integer")]
    Page,
    /// `page_size` was not an integer.
    #[error("Invalid query param: 'page_size' must be integer")]
    PageSize,
    /// `is_pagination` was not a recognised boolean literal.
    #[error("Invalid query param: 'is_pagination' must be one of 0/1/true/false")]
    IsPagination,
}

/// Raw pagination values as they arrive on the query string.
///
/// Missing keys fall back to `page=1`, `page_size=20` and
/// `is_pagination=1`. Present but empty keys are kept as empty strings and
/// fail validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PaginationQuery {
    /// One-based page number.
    pub page: String,
    /// Requested number of items per page.
    pub page_size: String,
    /// Boolean-like switch; `false` disables pagination entirely.
    pub is_pagination: String,
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_PAGE_SIZE, DEFAULT_IS_PAGINATION)
    }
}

impl PaginationQuery {
    /// Build a query from raw values.
    pub fn new(
        page: impl Into<String>,
        page_size: impl Into<String>,
        is_pagination: impl Into<String>,
    ) -> Self {
        Self {
            page: page.into(),
            page_size: page_size.into(),
            is_pagination: is_pagination.into(),
        }
    }

    /// Validate the raw values and derive the effective parameters.
    ///
    /// Every value is checked before the result is decided; when several are
    /// invalid the error for the first one (in `page`, `page_size`,
    /// `is_pagination` order) is reported.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidQuery`] when a value does not parse.
    pub fn resolve(&self) -> Result<PaginationParams, InvalidQuery> {
        let parsed_page = self.page.parse::<i64>().map_err(|_| InvalidQuery::Page);
        let parsed_page_size = self
            .page_size
            .parse::<i64>()
            .map_err(|_| InvalidQuery::PageSize);
        let parsed_enabled = parse_bool(&self.is_pagination).ok_or(InvalidQuery::IsPagination);

        match (parsed_page, parsed_page_size, parsed_enabled) {
            (Ok(page), Ok(page_size), Ok(enabled)) => {
                Ok(PaginationParams::derive(enabled, page, page_size))
            }
            (Err(err), _, _) | (_, Err(err), _) | (_, _, Err(err)) => Err(err),
        }
    }
}

/// Boolean literals accepted for `is_pagination`.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Effective pagination for one request.
///
/// `page` and `page_size` echo the client's values (or [`DISABLED`]) and are
/// reported back in the [`Paged`] envelope; `offset` and `limit` drive the
/// query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaginationParams {
    /// Whether pagination applies at all.
    pub enabled: bool,
    /// Requested page, or [`DISABLED`].
    pub page: i64,
    /// Requested page size, or [`DISABLED`].
    pub page_size: i64,
    /// Number of rows to skip.
    pub offset: i64,
    /// Maximum number of rows to return, or [`DISABLED`] for no limit.
    pub limit: i64,
}

impl PaginationParams {
    /// Apply the resolution policy to already parsed values.
    ///
    /// When `page_size` exceeds [`MAX_PAGE_SIZE`] the limit is capped but the
    /// offset stays at zero, so such requests always read the first window.
    #[must_use]
    pub const fn derive(enabled: bool, page: i64, page_size: i64) -> Self {
        if !enabled {
            return Self {
                enabled: false,
                page: DISABLED,
                page_size: DISABLED,
                offset: 0,
                limit: DISABLED,
            };
        }

        let (offset, limit) = if page > 0 && page_size > 0 && page_size <= MAX_PAGE_SIZE {
            ((page - 1).saturating_mul(page_size), page_size)
        } else if page > 0 && page_size > MAX_PAGE_SIZE {
            (0, MAX_PAGE_SIZE)
        } else {
            (0, DEFAULT_LIMIT)
        };

        Self {
            enabled: true,
            page,
            page_size,
            offset,
            limit,
        }
    }

    /// Row window to hand to the persistence layer.
    #[must_use]
    pub const fn window(&self) -> PageWindow {
        PageWindow {
            offset: self.offset,
            limit: if self.limit < 0 { None } else { Some(self.limit) },
        }
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self::derive(true, 1, DEFAULT_LIMIT)
    }
}

/// Offset and optional limit for a paged query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Number of rows to skip.
    pub offset: i64,
    /// Maximum number of rows, `None` for all remaining rows.
    pub limit: Option<i64>,
}

impl PageWindow {
    /// Window covering every row.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            offset: 0,
            limit: None,
        }
    }
}

/// Response envelope for paged listings.
///
/// Serializes as `{"count": .., "page": .., "page_size": .., "result": [..]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paged<T> {
    /// Total number of rows matching the query, ignoring the window.
    pub count: i64,
    /// Page echoed from the request.
    pub page: i64,
    /// Page size echoed from the request.
    pub page_size: i64,
    /// Rows inside the window.
    pub result: Vec<T>,
}

impl<T> Paged<T> {
    /// Wrap `result` using the echoed values from `params`.
    #[must_use]
    pub const fn new(params: &PaginationParams, count: i64, result: Vec<T>) -> Self {
        Self {
            count,
            page: params.page,
            page_size: params.page_size,
            result,
        }
    }

    /// Convert every row while keeping the envelope.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paged<U> {
        Paged {
            count: self.count,
            page: self.page,
            page_size: self.page_size,
            result: self.result.into_iter().map(f).collect(),
        }
    }
}
