use crate::{NewPost, PostId};

/// Error types for post sinks
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Trait for post sinks
///
/// Implementors create and update posts on a remote service. The sync
/// runner only ever talks to the forum through this trait, so tests can
/// substitute a recording double.
pub trait PostSink {
    /// Create a post and return the identifier the service assigned to it
    fn create_post(&mut self, post: &NewPost) -> Result<PostId, SinkError>;

    /// Replace the full content of an existing post
    fn update_post(&mut self, post_id: PostId, content: &str) -> Result<(), SinkError>;

    /// Returns the name of this sink. This name should not have spaces & be unique.
    ///
    /// # Examples
    ///
    /// - discourse
    fn name(&self) -> &str;
}
