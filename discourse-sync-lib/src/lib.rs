use std::path::PathBuf;

pub mod config;
pub mod document;
pub mod orchestrator;
pub mod sink;
pub mod tracker;

pub use config::{DiscourseConfig, PostTemplate, SyncConfig};
pub use document::Document;
pub use orchestrator::{SyncReport, sync_documents};
pub use sink::{PostSink, SinkError};
pub use tracker::{PostIdTracker, TrackerError};

/// Identifier the forum assigns to a post when it is created.
pub type PostId = u64;

// Error type for the library
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Failed to read documents directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read document {}: {source}", path.display())]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    #[error("Sink failed for document `{document}`: {source}")]
    Sink {
        document: String,
        #[source]
        source: SinkError,
    },
}

/// Everything a sink needs to create a post for a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub category_id: u64,
    pub content: String,
    pub tags: Vec<String>,
}
