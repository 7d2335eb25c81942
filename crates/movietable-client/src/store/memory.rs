//! In-process Movies table.
//!
//! Follows the service's observable behaviour closely enough to run every
//! client operation without a network: items ordered by `(year, title)`,
//! scan limits counted before the filter, `LastEvaluatedKey` returned
//! whenever a limit is reached, projections that only return listed paths,
//! and updates that return the new values of the assigned paths.

use std::collections::BTreeMap;
use std::ops::Bound;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::error::{ClientError, Result};
use crate::record::{Item, MovieKey};
use crate::store::projection::{apply_projection, resolve_path, set_path};
use crate::store::{Page, ScanRequest, TableCreation, TableStore, UpdateCondition};

#[derive(Debug, Default)]
struct MemoryState {
    table_exists: bool,
    rows: BTreeMap<MovieKey, Item>,
    /// Remaining successful puts before `put` starts failing.
    puts_until_failure: Option<usize>,
}

/// A table held in memory.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// A store whose table already exists.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                table_exists: true,
                ..MemoryState::default()
            }),
        }
    }

    /// A store with no table; every data call fails until `create_table`.
    pub fn without_table() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Make `put` fail after `successes` more successful calls.
    pub fn fail_puts_after(&self, successes: usize) {
        self.state.lock().puts_until_failure = Some(successes);
    }

    /// Number of items stored.
    pub fn len(&self) -> usize {
        self.state.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every item in key order.
    pub fn items(&self) -> Vec<Item> {
        self.state.lock().rows.values().cloned().collect()
    }
}

impl MemoryState {
    fn require_table(&self, operation: &'static str) -> Result<()> {
        if self.table_exists {
            Ok(())
        } else {
            Err(ClientError::Service {
                operation,
                message: "ResourceNotFoundException: Cannot do operations on a non-existent table"
                    .to_string(),
            })
        }
    }

    fn insert(&mut self, item: Item) -> Result<()> {
        let key = MovieKey::from_item(&item)?;
        self.rows.insert(key, item);
        Ok(())
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn create_table(&self) -> Result<TableCreation> {
        let mut state = self.state.lock();
        if state.table_exists {
            return Ok(TableCreation::AlreadyExists);
        }
        state.table_exists = true;
        Ok(TableCreation::Created)
    }

    async fn batch_put(&self, items: Vec<Item>) -> Result<()> {
        let mut state = self.state.lock();
        state.require_table("BatchWriteItem")?;
        // Validate the whole batch first: the service rejects a batch with
        // any malformed request without writing the rest.
        for item in &items {
            MovieKey::from_item(item)?;
        }
        for item in items {
            state.insert(item)?;
        }
        Ok(())
    }

    async fn put(&self, item: Item) -> Result<()> {
        let mut state = self.state.lock();
        state.require_table("PutItem")?;
        match state.puts_until_failure {
            Some(0) => {
                return Err(ClientError::Service {
                    operation: "PutItem",
                    message: "injected write failure".to_string(),
                });
            }
            Some(n) => state.puts_until_failure = Some(n - 1),
            None => {}
        }
        state.insert(item)
    }

    async fn get(&self, key: &MovieKey) -> Result<Option<Item>> {
        let state = self.state.lock();
        state.require_table("GetItem")?;
        Ok(state.rows.get(key).cloned())
    }

    async fn update(
        &self,
        key: &MovieKey,
        assignments: &[(String, Value)],
        condition: UpdateCondition,
    ) -> Result<Item> {
        let mut state = self.state.lock();
        state.require_table("UpdateItem")?;

        let existing = state.rows.get(key).cloned();
        if existing.is_none() && condition == UpdateCondition::MustExist {
            return Err(ClientError::NotFound(key.clone()));
        }

        let mut item = existing.unwrap_or_else(|| key.to_item());
        for (path, value) in assignments {
            if !set_path(&mut item, path, value.clone(), false) {
                return Err(ClientError::Service {
                    operation: "UpdateItem",
                    message: format!(
                        "ValidationException: The document path provided in the update \
                         expression is invalid for update: {path}"
                    ),
                });
            }
        }

        let mut updated = Map::new();
        for (path, _) in assignments {
            if let Some(value) = resolve_path(&item, path) {
                set_path(&mut updated, path, value.clone(), true);
            }
        }
        state.rows.insert(key.clone(), item);
        Ok(updated)
    }

    async fn scan(&self, request: &ScanRequest) -> Result<Page> {
        let state = self.state.lock();
        state.require_table("Scan")?;

        let lower = match &request.exclusive_start_key {
            Some(key) => Bound::Excluded(key.clone()),
            None => Bound::Unbounded,
        };
        let limit = request.limit.unwrap_or(usize::MAX);

        let mut items = Vec::new();
        let mut evaluated = 0;
        let mut last_key = None;
        for (key, item) in state.rows.range((lower, Bound::Unbounded)) {
            if evaluated == limit {
                break;
            }
            evaluated += 1;
            last_key = Some(key.clone());
            if request.range.contains(key.year) {
                items.push(apply_projection(item, &request.projection));
            }
        }

        // The service hands back a key whenever the limit was reached, even
        // if nothing follows it.
        let last_evaluated_key = if evaluated == limit { last_key } else { None };
        Ok(Page {
            items,
            last_evaluated_key,
        })
    }

    async fn query(&self, year: i64) -> Result<Page> {
        let state = self.state.lock();
        state.require_table("Query")?;
        let start = MovieKey::new(year, "");
        let items = state
            .rows
            .range(start..)
            .take_while(|(key, _)| key.year == year)
            .map(|(_, item)| item.clone())
            .collect();
        Ok(Page {
            items,
            last_evaluated_key: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::YearRange;
    use serde_json::json;

    fn item(value: Value) -> Item {
        value.as_object().cloned().unwrap()
    }

    fn scan_all(range: YearRange, limit: Option<usize>) -> ScanRequest {
        ScanRequest {
            range,
            projection: Vec::new(),
            limit,
            exclusive_start_key: None,
        }
    }

    async fn store_with_years(years: &[i64]) -> MemoryStore {
        let store = MemoryStore::new();
        let items = years
            .iter()
            .map(|y| item(json!({"year": y, "title": format!("Movie {y}")})))
            .collect();
        store.batch_put(items).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_put_replaces_by_key() {
        let store = MemoryStore::new();
        store
            .put(item(json!({"year": 1990, "title": "a", "plot": "old"})))
            .await
            .unwrap();
        store
            .put(item(json!({"year": 1990, "title": "a"})))
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
        let got = store.get(&MovieKey::new(1990, "a")).await.unwrap().unwrap();
        assert!(got.get("plot").is_none());
    }

    #[tokio::test]
    async fn test_batch_rejects_keyless_item_without_writing() {
        let store = MemoryStore::new();
        let err = store
            .batch_put(vec![
                item(json!({"year": 1990, "title": "a"})),
                item(json!({"title": "b"})),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidRecord(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_scan_limit_counts_before_filter() {
        let store = store_with_years(&[1980, 1985, 1995]).await;
        let page = store
            .scan(&scan_all(YearRange::new(1990, 2000), Some(2)))
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(
            page.last_evaluated_key,
            Some(MovieKey::new(1985, "Movie 1985"))
        );
    }

    #[tokio::test]
    async fn test_scan_key_returned_at_exact_limit() {
        let store = store_with_years(&[1991, 1992]).await;
        let first = store
            .scan(&scan_all(YearRange::new(1990, 2000), Some(2)))
            .await
            .unwrap();
        assert_eq!(first.items.len(), 2);
        let key = first.last_evaluated_key.clone().unwrap();

        let mut request = scan_all(YearRange::new(1990, 2000), Some(2));
        request.exclusive_start_key = Some(key);
        let second = store.scan(&request).await.unwrap();
        assert!(second.items.is_empty());
        assert!(second.last_evaluated_key.is_none());
    }

    #[tokio::test]
    async fn test_query_only_matches_partition() {
        let store = store_with_years(&[1989, 1990, 1991]).await;
        store
            .put(item(json!({"year": 1990, "title": "Another"})))
            .await
            .unwrap();
        let page = store.query(1990).await.unwrap();
        let titles: Vec<&str> = page
            .items
            .iter()
            .map(|i| i["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Another", "Movie 1990"]);
        assert!(store.query(1700).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_update_returns_new_values() {
        let store = MemoryStore::new();
        store
            .put(item(json!({"year": 2000, "title": "x", "plot": "old", "keep": 1})))
            .await
            .unwrap();
        let updated = store
            .update(
                &MovieKey::new(2000, "x"),
                &[("plot".to_string(), json!("new"))],
                UpdateCondition::Upsert,
            )
            .await
            .unwrap();
        assert_eq!(Value::Object(updated), json!({"plot": "new"}));
        let got = store.get(&MovieKey::new(2000, "x")).await.unwrap().unwrap();
        assert_eq!(got["keep"], 1);
    }

    #[tokio::test]
    async fn test_update_upsert_and_must_exist() {
        let store = MemoryStore::new();
        let key = MovieKey::new(2001, "new");
        let err = store
            .update(&key, &[("plot".into(), json!("p"))], UpdateCondition::MustExist)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotFound(k) if k == key));
        assert!(store.is_empty());

        store
            .update(&key, &[("plot".into(), json!("p"))], UpdateCondition::Upsert)
            .await
            .unwrap();
        let got = store.get(&key).await.unwrap().unwrap();
        assert_eq!(Value::Object(got), json!({"year": 2001, "title": "new", "plot": "p"}));
    }

    #[tokio::test]
    async fn test_update_missing_parent_path_fails() {
        let store = store_with_years(&[1990]).await;
        let err = store
            .update(
                &MovieKey::new(1990, "Movie 1990"),
                &[("info.rating".into(), json!(5))],
                UpdateCondition::Upsert,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Service { operation: "UpdateItem", .. }));
    }

    #[tokio::test]
    async fn test_injected_put_failure() {
        let store = MemoryStore::new();
        store.fail_puts_after(1);
        store
            .put(item(json!({"year": 1990, "title": "a"})))
            .await
            .unwrap();
        let err = store
            .put(item(json!({"year": 1990, "title": "b"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Service { operation: "PutItem", .. }));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_table() {
        let store = MemoryStore::without_table();
        assert!(store.query(1990).await.is_err());
        assert_eq!(store.create_table().await.unwrap(), TableCreation::Created);
        assert_eq!(
            store.create_table().await.unwrap(),
            TableCreation::AlreadyExists
        );
        assert!(store.query(1990).await.unwrap().items.is_empty());
    }
}
