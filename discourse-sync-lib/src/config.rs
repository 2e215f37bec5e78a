use std::path::PathBuf;

use crate::{Document, NewPost};

/// Forum used when no host is configured
pub const DEFAULT_HOST: &str = "https://discourse.charmhub.io/";

/// Connection settings for the Discourse API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscourseConfig {
    pub host: String,
    /// Left unset here; the sink rejects a missing value when it is built.
    pub api_username: Option<String>,
    pub api_key: Option<String>,
}

impl Default for DiscourseConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            api_username: None,
            api_key: None,
        }
    }
}

/// How a new post is built from a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostTemplate {
    pub title_prefix: String,
    pub category_id: u64,
    pub tags: Vec<String>,
}

impl Default for PostTemplate {
    fn default() -> Self {
        Self {
            title_prefix: "juju ".to_string(),
            category_id: 22,
            tags: vec!["olm".to_string()],
        }
    }
}

impl PostTemplate {
    pub fn title_for(&self, document_name: &str) -> String {
        format!("{}{}", self.title_prefix, document_name)
    }

    pub fn new_post(&self, document: &Document) -> NewPost {
        NewPost {
            title: self.title_for(&document.name),
            category_id: self.category_id,
            content: document.content.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// Settings for one sync run, resolved once at startup
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub discourse: DiscourseConfig,
    /// Directory scanned for `.md` files
    pub docs_dir: PathBuf,
    /// File holding the document name to post id mapping
    pub post_ids: PathBuf,
    pub template: PostTemplate,
    pub dry_run: bool,
}
