use serde::{Deserialize, Serialize};

/// Pagination metadata included in list responses.
#[derive(Serialize, utoipa::ToSchema)]
pub struct Pagination {
    /// Current page number (1-based).
    #[schema(example = 1)]
    pub page: u64,
    /// Number of items per page.
    #[schema(example = 20)]
    pub per_page: u64,
    /// Total number of matching items across all pages.
    #[schema(example = 47)]
    pub total: u64,
    /// Total number of pages.
    #[schema(example = 3)]
    pub total_pages: u64,
}

/// Highest page number honoured; larger values are clamped to it.
pub const MAX_PAGE: u64 = 1_000_000;

/// Common `page` / `per_page` / `search` query parameters.
#[derive(Deserialize, Default, utoipa::IntoParams)]
pub struct PageQuery {
    /// 1-based page number, at most 1000000. Default: 1.
    pub page: Option<u64>,
    /// Items per page, 1-100. Default: 20.
    pub per_page: Option<u64>,
    /// Case-insensitive substring match on the name.
    pub search: Option<String>,
}

impl PageQuery {
    /// Clamp to `(1 <= page <= MAX_PAGE, 1 <= per_page <= 100)`, so
    /// `(page - 1) * per_page` cannot overflow.
    pub fn bounds(&self) -> (u64, u64) {
        let page = self.page.unwrap_or(1).clamp(1, MAX_PAGE);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        (page, per_page)
    }

    /// Trimmed, escaped, lower-cased `LIKE` pattern for `search`, if non-empty.
    pub fn like_pattern(&self) -> Option<String> {
        let term = escape_like(self.search.as_deref()?.trim());
        if term.is_empty() {
            None
        } else {
            Some(format!("%{}%", term.to_lowercase()))
        }
    }
}

impl Pagination {
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        Self {
            page,
            per_page,
            total,
            total_pages: total.div_ceil(per_page),
        }
    }
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
