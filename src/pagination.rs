use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// `?page=&limit=` query parameters. Out-of-range values are clamped, not rejected.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }
}

/// One page of results plus the totals a client needs to render paging controls
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, query: &PageQuery, total: i64) -> Self {
        let limit = query.limit();
        Self {
            items,
            page: query.page(),
            limit,
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamping() {
        let q = PageQuery::default();
        assert_eq!((q.page(), q.limit(), q.offset()), (1, 20, 0));

        let q = PageQuery {
            page: Some(0),
            limit: Some(1_000),
        };
        assert_eq!((q.page(), q.limit()), (1, 100));

        let q = PageQuery {
            page: Some(3),
            limit: Some(10),
        };
        assert_eq!(q.offset(), 20);
    }

    #[test]
    fn total_pages_rounds_up() {
        let q = PageQuery {
            page: Some(1),
            limit: Some(10),
        };
        assert_eq!(Page::new(vec![1; 10], &q, 21).total_pages, 3);
        assert_eq!(Page::<i32>::new(vec![], &q, 0).total_pages, 0);
    }
}
