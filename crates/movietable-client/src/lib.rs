//! # movietable-client
//!
//! Client for a DynamoDB `Movies` table keyed by `year` (partition) and
//! `title` (sort). It seeds sample rows, bulk-loads JSON files, updates
//! movies, pages through a filtered scan, and queries one year.
//!
//! ```no_run
//! use movietable_client::{ClientConfig, DynamoStore, MovieClient};
//!
//! # async fn run() -> movietable_client::Result<()> {
//! let config = ClientConfig::default();
//! let store = DynamoStore::connect(&config).await?;
//! let client = MovieClient::new(store, config)?;
//!
//! client.seed().await?;
//! for movie in client.query_by_year(1990).await? {
//!     println!("{}", movie.summary_line());
//! }
//!
//! let mut pages = client.read_all();
//! while let Some(page) = pages.next_page().await? {
//!     println!("page {}: {} movie(s)", page.number, page.records.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod record;
pub mod store;

pub use client::{LoadSummary, MovieClient, ScanPage, ScanPages};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use record::{Item, MovieKey, MovieRecord, MovieUpdate};
pub use store::{DynamoStore, MemoryStore, TableCreation, TableStore, YearRange};
