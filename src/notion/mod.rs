//! Notion as the collection sink: page creation for scraped items,
//! duplicate detection, conflict retries, and dashboard statistics.

pub mod client;
pub mod sink;
pub mod stats;

pub use client::NotionClient;
pub use sink::{BulkReport, BulkSummary, NotionSink, SaveOutcome};
pub use stats::{ActivityEntry, NotionStatistics};
