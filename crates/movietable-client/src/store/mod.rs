//! Table access seam: the remote DynamoDB table and an in-process stand-in.

pub mod attribute;
pub mod dynamo;
pub mod expression;
pub mod memory;
pub mod projection;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::record::{Item, MovieKey};

pub use dynamo::DynamoStore;
pub use memory::MemoryStore;

/// Inclusive range of release years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    pub start: i64,
    pub end: i64,
}

impl YearRange {
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, year: i64) -> bool {
        self.start <= year && year <= self.end
    }
}

/// One scan request: a year filter, a projection, and paging controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub range: YearRange,
    /// Dot-separated attribute paths. Empty returns whole items.
    pub projection: Vec<String>,
    /// Items evaluated (before filtering) per request.
    pub limit: Option<usize>,
    pub exclusive_start_key: Option<MovieKey>,
}

/// Items returned by one scan or query request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Item>,
    /// Continuation token: present when the service may hold more results.
    pub last_evaluated_key: Option<MovieKey>,
}

/// Outcome of a create-table call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableCreation {
    Created,
    AlreadyExists,
}

/// Guard applied to an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateCondition {
    /// Create the item if the key is absent.
    Upsert,
    /// Fail with `NotFound` if the key is absent.
    MustExist,
}

/// Operations the Movies client needs from a table.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Create the table with `year` as partition key and `title` as sort key.
    async fn create_table(&self) -> Result<TableCreation>;

    /// Insert-or-replace several items through the batched write path.
    async fn batch_put(&self, items: Vec<Item>) -> Result<()>;

    /// Insert-or-replace one item.
    async fn put(&self, item: Item) -> Result<()>;

    /// Fetch one item by key.
    async fn get(&self, key: &MovieKey) -> Result<Option<Item>>;

    /// SET each `(path, value)` on the item and return the updated
    /// attributes as confirmed by the store.
    async fn update(
        &self,
        key: &MovieKey,
        assignments: &[(String, Value)],
        condition: UpdateCondition,
    ) -> Result<Item>;

    /// Run one scan request.
    async fn scan(&self, request: &ScanRequest) -> Result<Page>;

    /// All items in one partition, in a single request.
    async fn query(&self, year: i64) -> Result<Page>;
}

#[async_trait]
impl<T: TableStore + ?Sized> TableStore for Box<T> {
    async fn create_table(&self) -> Result<TableCreation> {
        (**self).create_table().await
    }

    async fn batch_put(&self, items: Vec<Item>) -> Result<()> {
        (**self).batch_put(items).await
    }

    async fn put(&self, item: Item) -> Result<()> {
        (**self).put(item).await
    }

    async fn get(&self, key: &MovieKey) -> Result<Option<Item>> {
        (**self).get(key).await
    }

    async fn update(
        &self,
        key: &MovieKey,
        assignments: &[(String, Value)],
        condition: UpdateCondition,
    ) -> Result<Item> {
        (**self).update(key, assignments, condition).await
    }

    async fn scan(&self, request: &ScanRequest) -> Result<Page> {
        (**self).scan(request).await
    }

    async fn query(&self, year: i64) -> Result<Page> {
        (**self).query(year).await
    }
}
