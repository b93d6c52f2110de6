use std::collections::HashMap;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: i64,
    pub take: i64,
}

impl Page {
    /// Reads `page` and `limit` from the query string. Missing or non-numeric
    /// values use the defaults; anything below 1 is raised to 1.
    pub fn from_query(query: &HashMap<String, String>) -> Self {
        let page = read(query, "page", DEFAULT_PAGE).max(1);
        let limit = read(query, "limit", DEFAULT_LIMIT).max(1);
        Self {
            skip: (page - 1).saturating_mul(limit),
            take: limit,
        }
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        total / self.take + i64::from(total % self.take != 0)
    }
}

fn read(query: &HashMap<String, String>, key: &str, default: i64) -> i64 {
    query
        .get(key)
        .and_then(|v| v.trim().parse::<i64>().ok())
        .unwrap_or(default)
}
