pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod knowledge;
pub mod matcher;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use ingest::{initialize, IngestOptions, IngestReport};
pub use knowledge::DrugKnowledge;
pub use matcher::{MatchTier, Matcher};
pub use store::{DrugRecord, DrugStore, InteractionEdge};
