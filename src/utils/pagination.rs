//! Page/limit handling for list endpoints

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Raw `?page&limit` query
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    /// Clamp to a usable page: page >= 1, 1 <= limit <= MAX_LIMIT
    pub fn resolve(self) -> Page {
        let page = self.page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE);
        let limit = self
            .limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);
        Page { page, limit }
    }
}

/// A resolved page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }

    /// Pagination block for a result set of `total` rows
    pub fn info(&self, total: i64) -> Pagination {
        let limit = self.limit as i64;
        Pagination {
            page: self.page,
            limit: self.limit,
            total,
            pages: (total + limit - 1) / limit,
        }
    }
}

/// Pagination block returned alongside list data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}
