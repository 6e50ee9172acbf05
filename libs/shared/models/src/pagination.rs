use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Validated page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub fn offset(&self) -> usize {
        ((self.page - 1) * self.limit) as usize
    }

    pub fn limit(&self) -> usize {
        self.limit as usize
    }
}

impl PageQuery {
    pub fn validate(&self) -> Result<Page, String> {
        let page = self.page.unwrap_or(1);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT);

        if page < 1 {
            return Err("Page must be a positive integer".to_string());
        }
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(format!("Limit must be between 1 and {}", MAX_PAGE_LIMIT));
        }

        Ok(Page { page, limit })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(page: Page, total: u64) -> Self {
        let limit = u64::from(page.limit);
        Self {
            page: page.page,
            limit: page.limit,
            total,
            pages: total.div_ceil(limit),
        }
    }
}
