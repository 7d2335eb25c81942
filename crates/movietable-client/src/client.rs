//! The Movies table client.
//!
//! Each method is one intent against the table: seed the sample rows, load a
//! JSON file, update a movie, page through a filtered scan, or query one
//! year. The client keeps no data of its own; every result comes from the
//! store.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::record::{Item, MovieKey, MovieRecord, MovieUpdate};
use crate::store::{ScanRequest, TableCreation, TableStore, UpdateCondition, YearRange};

/// Rows written by `seed`.
pub const SAMPLE_MOVIES: [(i64, &str); 2] = [(1990, "Example 3"), (2000, "Example 5")];

/// Years covered by `read_all`.
pub const DEFAULT_SCAN_RANGE: YearRange = YearRange::new(1990, 2000);

/// Attributes returned by `read_all`.
pub const SCAN_PROJECTION: [&str; 3] = ["year", "title", "info.rating"];

/// Outcome of a bulk load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub loaded: usize,
}

/// Client for the Movies table.
pub struct MovieClient<S> {
    store: S,
    config: ClientConfig,
}

impl<S: TableStore> MovieClient<S> {
    /// Wrap `store`, rejecting a config that fails `ClientConfig::validate`.
    pub fn new(store: S, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create the table if it does not exist yet.
    pub async fn create_table(&self) -> Result<TableCreation> {
        self.store.create_table().await
    }

    /// Write the fixed sample rows in one batched write.
    ///
    /// Rows are replaced by key, so seeding twice leaves the same two rows.
    pub async fn seed(&self) -> Result<()> {
        let items = SAMPLE_MOVIES
            .iter()
            .map(|(year, title)| MovieKey::new(*year, *title).to_item())
            .collect::<Vec<_>>();
        info!(table = %self.config.table_name, count = items.len(), "seeding sample movies");
        self.store.batch_put(items).await
    }

    /// Insert or replace one record.
    pub async fn put_record(&self, record: &MovieRecord) -> Result<()> {
        self.store.put(record.attributes().clone()).await
    }

    /// Load every record in a JSON file, one insert per record.
    ///
    /// The file is fully parsed and validated before the first write. A
    /// failed write stops the load; records written before it remain.
    pub async fn bulk_load(&self, path: impl AsRef<Path>) -> Result<LoadSummary> {
        let records = read_movie_file(path.as_ref())?;
        let mut loaded = 0;
        for record in &records {
            let (year, title) = (record.year(), record.title());
            info!(year, title, "Adding movie {year} - {title}");
            self.put_record(record).await?;
            loaded += 1;
        }
        info!(table = %self.config.table_name, loaded, "bulk load complete");
        Ok(LoadSummary { loaded })
    }

    /// SET `rating`, `plot` and `actors` on one movie and return the new
    /// values as confirmed by the table.
    pub async fn update_record(&self, key: &MovieKey, update: &MovieUpdate) -> Result<Item> {
        let condition = if self.config.strict_updates {
            UpdateCondition::MustExist
        } else {
            UpdateCondition::Upsert
        };
        let assignments = update.assignments()?;
        debug!(key = %key, ?condition, "updating movie");
        self.store.update(key, &assignments, condition).await
    }

    /// Fetch one movie by key.
    pub async fn get_record(&self, key: &MovieKey) -> Result<MovieRecord> {
        match self.store.get(key).await? {
            Some(item) => MovieRecord::try_from(item),
            None => Err(ClientError::NotFound(key.clone())),
        }
    }

    /// Page through movies from 1990 to 2000 inclusive, projected to year,
    /// title and `info.rating`.
    pub fn read_all(&self) -> ScanPages<'_, S> {
        self.read_range(DEFAULT_SCAN_RANGE)
    }

    /// Page through movies in an inclusive year range.
    pub fn read_range(&self, range: YearRange) -> ScanPages<'_, S> {
        ScanPages {
            store: &self.store,
            range,
            projection: SCAN_PROJECTION.iter().map(|p| p.to_string()).collect(),
            limit: self.config.page_size,
            state: ScanState::Start,
            pages_read: 0,
        }
    }

    /// Every movie released in `year`, from a single query request.
    pub async fn query_by_year(&self, year: i64) -> Result<Vec<MovieRecord>> {
        let page = self.store.query(year).await?;
        if let Some(key) = &page.last_evaluated_key {
            warn!(year, last_key = %key, "query result truncated by the service");
        }
        page.items.into_iter().map(MovieRecord::try_from).collect()
    }
}

// ---------------------------------------------------------------------------
// Scan pagination
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum ScanState {
    Start,
    HasMore(MovieKey),
    Done,
}

/// One page of a scan as it arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPage {
    /// 1-based position in the sequence.
    pub number: usize,
    pub records: Vec<MovieRecord>,
    pub last_evaluated_key: Option<MovieKey>,
}

/// A finite, lazily fetched sequence of scan pages.
///
/// Each `next_page` call sends one scan request. The sequence ends when the
/// service stops returning a continuation token. It cannot be rewound; ask
/// the client for a new one to start over.
pub struct ScanPages<'a, S: ?Sized> {
    store: &'a S,
    range: YearRange,
    projection: Vec<String>,
    limit: Option<usize>,
    state: ScanState,
    pages_read: usize,
}

impl<S: TableStore + ?Sized> ScanPages<'_, S> {
    /// Fetch the next page, or `None` once the scan is complete.
    ///
    /// A failed request leaves the position unchanged, so calling again
    /// retries the same page.
    pub async fn next_page(&mut self) -> Result<Option<ScanPage>> {
        let exclusive_start_key = match &self.state {
            ScanState::Start => None,
            ScanState::HasMore(key) => Some(key.clone()),
            ScanState::Done => return Ok(None),
        };

        let request = ScanRequest {
            range: self.range,
            projection: self.projection.clone(),
            limit: self.limit,
            exclusive_start_key,
        };
        let page = self.store.scan(&request).await?;
        self.pages_read += 1;

        self.state = match &page.last_evaluated_key {
            Some(next) if request.exclusive_start_key.as_ref() == Some(next) => {
                self.state = ScanState::Done;
                return Err(ClientError::Service {
                    operation: "Scan",
                    message: format!("continuation token did not advance past {next}"),
                });
            }
            Some(next) => ScanState::HasMore(next.clone()),
            None => ScanState::Done,
        };
        debug!(
            page = self.pages_read,
            items = page.items.len(),
            more = page.last_evaluated_key.is_some(),
            "scan page"
        );

        let records = page
            .items
            .into_iter()
            .map(MovieRecord::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(ScanPage {
            number: self.pages_read,
            records,
            last_evaluated_key: page.last_evaluated_key,
        }))
    }

    /// True once the final page has been returned.
    pub fn is_done(&self) -> bool {
        self.state == ScanState::Done
    }

    pub fn pages_read(&self) -> usize {
        self.pages_read
    }

    /// Drain the remaining pages into one list.
    pub async fn collect(mut self) -> Result<Vec<MovieRecord>> {
        let mut records = Vec::new();
        while let Some(page) = self.next_page().await? {
            records.extend(page.records);
        }
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// Bulk-load input
// ---------------------------------------------------------------------------

/// Parse a JSON array of movie objects, keeping numbers exact.
pub fn read_movie_file(path: &Path) -> Result<Vec<MovieRecord>> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ClientError::FileNotFound(path.to_path_buf()),
        _ => ClientError::Io(e),
    })?;
    parse_movies(&text)
}

/// Parse movie records from JSON text.
pub fn parse_movies(text: &str) -> Result<Vec<MovieRecord>> {
    let document: Value =
        serde_json::from_str(text).map_err(|e| ClientError::Parse(e.to_string()))?;
    let Value::Array(entries) = document else {
        return Err(ClientError::Parse(
            "expected a JSON array of movie objects".to_string(),
        ));
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            MovieRecord::try_from(entry).map_err(|e| match e {
                ClientError::InvalidRecord(msg) => {
                    ClientError::InvalidRecord(format!("entry {index}: {msg}"))
                }
                other => other,
            })
        })
        .collect()
}
