//! Paged listing of tasks
//!
//! Query parameters are parsed permissively: a missing or unparseable `page`
//! or `limit` falls back to its default instead of failing the request. The
//! two are resolved independently, and the first occurrence of a repeated key
//! wins.
//!
//! ```rust
//! use tasky::pagination::{PageQuery, PageRequest};
//!
//! let query = PageQuery { page: Some("3".into()), limit: Some("50".into()) };
//! let request = PageRequest::from_query(&query);
//! assert_eq!(request.limit, 30);
//! assert_eq!(request.skip(), 60);
//! ```
//!
//! The listing issues two independent store operations, a count and then a
//! fetch. `total` reflects the collection at count time and `tasks` at fetch
//! time; there is no snapshot between them.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::Task;
use crate::store::{CollectionHandle, DocumentStore, Filter, FindOptions};

/// Page used when none is given
pub const DEFAULT_PAGE: i64 = 1;

/// Page size used when none is given
pub const DEFAULT_LIMIT: i64 = 10;

/// Largest page size a client may request
pub const MAX_PAGINATION_LIMIT: i64 = 30;

/// Raw `?page=&limit=` query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    /// Collect `page` and `limit` from decoded query pairs, keeping the first of each
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "page" => &mut query.page,
                "limit" => &mut query.limit,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

/// Resolved page parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page, never below 1
    pub page: i64,
    /// Page size, at most [`MAX_PAGINATION_LIMIT`]; zero or negative means unbounded
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Resolve query parameters, applying defaults and bounds
    pub fn from_query(query: &PageQuery) -> Self {
        let page = parse_or(query.page.as_deref(), DEFAULT_PAGE).max(1);
        let limit = parse_or(query.limit.as_deref(), DEFAULT_LIMIT).min(MAX_PAGINATION_LIMIT);
        Self { page, limit }
    }

    /// Documents to skip before this page
    pub fn skip(&self) -> u64 {
        match self.fetch_limit() {
            Some(limit) => (self.page.max(1) as u64 - 1).saturating_mul(limit),
            None => 0,
        }
    }

    /// Documents to fetch, `None` when unbounded
    pub fn fetch_limit(&self) -> Option<u64> {
        (self.limit > 0).then_some(self.limit as u64)
    }

    /// Store options for this page
    pub fn find_options(&self) -> FindOptions {
        FindOptions::default()
            .skip(self.skip())
            .limit(self.fetch_limit())
    }
}

fn parse_or(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|value| value.parse().ok()).unwrap_or(default)
}

/// Response body of `GET /api/v1/tasks`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    pub page: i64,
    pub limit: i64,
    pub total: u64,
}

/// Count every task, then fetch the requested page ordered by identifier
pub async fn list_tasks<S: DocumentStore>(
    tasks: &CollectionHandle<S, Task>,
    request: PageRequest,
) -> Result<TaskPage> {
    let filter = Filter::all();

    let total = tasks
        .count_documents(&filter)
        .await
        .map_err(|e| Error::store("Failed to count tasks", e))?;

    let items = tasks
        .find(&filter, request.find_options())
        .await
        .map_err(|e| Error::store("Failed to fetch tasks", e))?;

    Ok(TaskPage {
        tasks: items,
        page: request.page,
        limit: request.limit,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ObjectId;
    use crate::store::{Collections, MemoryStore};
    use rstest::rstest;
    use std::time::Duration;

    fn query(page: Option<&str>, limit: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    #[rstest]
    #[case(None, None, 1, 10)]
    #[case(Some("2"), Some("5"), 2, 5)]
    #[case(Some("1"), Some("30"), 1, 30)]
    #[case(Some("1"), Some("31"), 1, 30)]
    #[case(Some("4"), Some("1000"), 4, 30)]
    #[case(Some("abc"), Some("xyz"), 1, 10)]
    #[case(Some(""), Some(""), 1, 10)]
    #[case(Some("1.5"), Some("2.5"), 1, 10)]
    #[case(Some("0"), Some("5"), 1, 5)]
    #[case(Some("-3"), Some("5"), 1, 5)]
    #[case(Some("99999999999999999999"), None, 1, 10)]
    #[case(Some("2"), Some("0"), 2, 0)]
    #[case(Some("2"), Some("-4"), 2, -4)]
    fn test_from_query(
        #[case] page: Option<&str>,
        #[case] limit: Option<&str>,
        #[case] expected_page: i64,
        #[case] expected_limit: i64,
    ) {
        let request = PageRequest::from_query(&query(page, limit));
        assert_eq!(request.page, expected_page);
        assert_eq!(request.limit, expected_limit);
    }

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn test_from_pairs_keeps_first_of_each_key() {
        let query = PageQuery::from_pairs(pairs(&[
            ("page", "1"),
            ("page", "2"),
            ("limit", "5"),
            ("limit", "7"),
        ]));
        assert_eq!(query.page.as_deref(), Some("1"));
        assert_eq!(query.limit.as_deref(), Some("5"));
    }

    #[test]
    fn test_from_pairs_resolves_keys_independently() {
        let query = PageQuery::from_pairs(pairs(&[("sort", "desc"), ("page", "x"), ("limit", "5")]));
        let request = PageRequest::from_query(&query);
        assert_eq!(request, PageRequest { page: 1, limit: 5 });
    }

    #[rstest]
    #[case(1, 10, 0, Some(10))]
    #[case(2, 5, 5, Some(5))]
    #[case(3, 30, 60, Some(30))]
    #[case(5, 0, 0, None)]
    #[case(5, -1, 0, None)]
    fn test_skip_and_limit(
        #[case] page: i64,
        #[case] limit: i64,
        #[case] skip: u64,
        #[case] fetch: Option<u64>,
    ) {
        let request = PageRequest { page, limit };
        assert_eq!(request.skip(), skip);
        assert_eq!(request.fetch_limit(), fetch);
        assert_eq!(request.find_options(), FindOptions { skip, limit: fetch });
    }

    #[test]
    fn test_skip_uses_clamped_limit() {
        let request = PageRequest::from_query(&query(Some("2"), Some("100")));
        assert_eq!(request.fetch_limit(), Some(30));
        assert_eq!(request.skip(), 30);
    }

    #[test]
    fn test_skip_saturates() {
        let request = PageRequest {
            page: i64::MAX,
            limit: MAX_PAGINATION_LIMIT,
        };
        assert_eq!(request.skip(), u64::MAX);
    }

    async fn seeded(count: usize) -> (Collections<MemoryStore>, Vec<ObjectId>) {
        let store = MemoryStore::new();
        let collections = Collections::resolve(&store, Duration::from_secs(10));
        let owner = ObjectId::new();
        let mut ids = Vec::new();
        for n in 0..count {
            let task = Task {
                id: None,
                title: format!("task {}", n + 1),
                description: String::new(),
                completed: false,
                user_id: owner,
            };
            ids.push(collections.tasks.insert_one(&task).await.unwrap());
        }
        (collections, ids)
    }

    #[tokio::test]
    async fn test_second_page_of_twelve() {
        let (collections, ids) = seeded(12).await;

        let page = list_tasks(&collections.tasks, PageRequest { page: 2, limit: 5 })
            .await
            .unwrap();

        assert_eq!(page.total, 12);
        assert_eq!(page.page, 2);
        assert_eq!(page.limit, 5);
        let returned: Vec<_> = page.tasks.iter().filter_map(|t| t.id).collect();
        assert_eq!(returned, ids[5..10].to_vec());
    }

    #[tokio::test]
    async fn test_page_past_the_end_is_empty() {
        let (collections, _) = seeded(3).await;

        let page = list_tasks(&collections.tasks, PageRequest { page: 5, limit: 10 })
            .await
            .unwrap();

        assert!(page.tasks.is_empty());
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn test_non_positive_limit_returns_everything() {
        let (collections, _) = seeded(35).await;

        let page = list_tasks(&collections.tasks, PageRequest { page: 3, limit: 0 })
            .await
            .unwrap();

        assert_eq!(page.tasks.len(), 35);
        assert_eq!(page.limit, 0);
        assert_eq!(page.page, 3);
    }

    #[tokio::test]
    async fn test_count_failure_is_reported() {
        let store = MemoryStore::new();
        let collections = Collections::resolve(&store, Duration::from_secs(10));
        store.set_failing(true);

        let err = list_tasks(&collections.tasks, PageRequest::default())
            .await
            .unwrap_err();

        match err {
            Error::Store { context, source } => {
                assert_eq!(context, "Failed to count tasks");
                assert_eq!(source.collection.as_deref(), Some("tasks"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
