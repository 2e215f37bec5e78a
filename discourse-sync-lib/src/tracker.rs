//! Persisted mapping from document name to post id.
//!
//! The mapping is loaded once and written back in full after every
//! [`PostIdTracker::record`], so a run that fails halfway leaves every post
//! created so far on disk and the next run picks up where it stopped.
//!
//! The on-disk format follows the file extension: `.toml` files hold a TOML
//! table, anything else is read and written as a YAML mapping.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::PostId;

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
    #[error("Failed to serialize post ids: {0}")]
    Serialize(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingFormat {
    Yaml,
    Toml,
}

impl MappingFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => Self::Toml,
            _ => Self::Yaml,
        }
    }

    fn parse(self, content: &str) -> Result<BTreeMap<String, PostId>, String> {
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        match self {
            // A YAML document of just `null` or `~` is an empty mapping too
            Self::Yaml => serde_yaml::from_str::<Option<BTreeMap<String, PostId>>>(content)
                .map(Option::unwrap_or_default)
                .map_err(|e| e.to_string()),
            Self::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        }
    }

    fn serialize(self, ids: &BTreeMap<String, PostId>) -> Result<String, TrackerError> {
        match self {
            Self::Yaml => serde_yaml::to_string(ids).map_err(|e| TrackerError::Serialize(e.to_string())),
            Self::Toml => toml::to_string(ids).map_err(|e| TrackerError::Serialize(e.to_string())),
        }
    }
}

/// Tracks which documents already have a post, and under which id
#[derive(Debug)]
pub struct PostIdTracker {
    path: PathBuf,
    format: MappingFormat,
    ids: BTreeMap<String, PostId>,
}

impl PostIdTracker {
    /// Load the mapping from `path`. A missing or empty file yields an empty
    /// mapping; the file is created on the first [`record`](Self::record).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TrackerError> {
        let path = path.as_ref().to_path_buf();
        let format = MappingFormat::from_path(&path);

        let ids = match std::fs::read_to_string(&path) {
            Ok(content) => format.parse(&content).map_err(|message| TrackerError::Parse {
                path: path.clone(),
                message,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No post id file yet, starting empty");
                BTreeMap::new()
            }
            Err(source) => return Err(TrackerError::Io { path, source }),
        };

        debug!(path = %path.display(), entries = ids.len(), "Loaded post ids");
        Ok(Self { path, format, ids })
    }

    pub fn get(&self, name: &str) -> Option<PostId> {
        self.ids.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ids.contains_key(name)
    }

    /// Store `post_id` under `name` and immediately write the whole mapping
    /// back to disk.
    pub fn record(&mut self, name: impl Into<String>, post_id: PostId) -> Result<(), TrackerError> {
        self.ids.insert(name.into(), post_id);
        self.save()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, PostId)> {
        self.ids.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> MappingFormat {
        self.format
    }

    fn save(&self) -> Result<(), TrackerError> {
        let content = self.format.serialize(&self.ids)?;
        let io_err = |source: std::io::Error| TrackerError::Io {
            path: self.path.clone(),
            source,
        };

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(io_err)?;

        // Write next to the target and rename over it so a crash never leaves a torn file
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp_path = parent.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

        let written =
            std::fs::write(&tmp_path, content).and_then(|()| std::fs::rename(&tmp_path, &self.path));
        if let Err(e) = written {
            // A failed write can leave a partial temp file behind as well as a failed rename
            let _ = std::fs::remove_file(&tmp_path);
            return Err(io_err(e));
        }

        debug!(path = %self.path.display(), entries = self.ids.len(), "Saved post ids");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let tracker = PostIdTracker::load(dir.path().join("post-ids.yaml")).unwrap();
        assert!(tracker.is_empty());
        assert!(!dir.path().join("post-ids.yaml").exists());
    }

    #[test]
    fn test_empty_and_null_files_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        for (file, content) in [
            ("empty.yaml", ""),
            ("blank.yaml", "\n  \n"),
            ("null.yaml", "null\n"),
            ("tilde.yaml", "~\n"),
            ("empty.toml", ""),
        ] {
            let path = dir.path().join(file);
            std::fs::write(&path, content).unwrap();
            let tracker = PostIdTracker::load(&path).unwrap();
            assert!(tracker.is_empty(), "{file} should load as empty");
        }
    }

    #[test]
    fn test_load_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post-ids.yaml");
        std::fs::write(&path, "overview: 1234\nhow-to-deploy: 5678\n").unwrap();

        let tracker = PostIdTracker::load(&path).unwrap();
        assert_eq!(tracker.format(), MappingFormat::Yaml);
        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.get("overview"), Some(1234));
        assert_eq!(tracker.get("how-to-deploy"), Some(5678));
        assert!(!tracker.contains("missing"));
    }

    #[test]
    fn test_load_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post-ids.toml");
        std::fs::write(&path, "overview = 1234\n\"with space\" = 42\n").unwrap();

        let tracker = PostIdTracker::load(&path).unwrap();
        assert_eq!(tracker.format(), MappingFormat::Toml);
        assert_eq!(tracker.get("overview"), Some(1234));
        assert_eq!(tracker.get("with space"), Some(42));
    }

    #[test]
    fn test_unparsable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post-ids.yaml");
        std::fs::write(&path, "overview: not-a-number\n").unwrap();

        let err = PostIdTracker::load(&path).unwrap_err();
        assert!(matches!(err, TrackerError::Parse { .. }));
    }

    #[test]
    fn test_record_flushes_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post-ids.yaml");

        let mut tracker = PostIdTracker::load(&path).unwrap();
        tracker.record("overview", 11).unwrap();
        assert_eq!(PostIdTracker::load(&path).unwrap().get("overview"), Some(11));

        tracker.record("install", 12).unwrap();
        let reloaded = PostIdTracker::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get("install"), Some(12));
    }

    #[test]
    fn test_record_overwrites_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post-ids.yaml");
        std::fs::write(&path, "# hand-written\nzeta: 3\n").unwrap();

        let mut tracker = PostIdTracker::load(&path).unwrap();
        tracker.record("alpha", 1).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("hand-written"));
        assert!(content.find("alpha").unwrap() < content.find("zeta").unwrap());
    }

    #[test]
    fn test_record_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post-ids.toml");

        let mut tracker = PostIdTracker::load(&path).unwrap();
        tracker.record("overview", 7).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("overview = 7"));
        assert_eq!(PostIdTracker::load(&path).unwrap().get("overview"), Some(7));
    }

    #[test]
    fn test_failed_save_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("post-ids.yaml");
        let mut tracker = PostIdTracker::load(&path).unwrap();

        // A directory in the way makes the final rename fail
        std::fs::create_dir(&path).unwrap();
        let err = tracker.record("overview", 1).unwrap_err();
        assert!(matches!(err, TrackerError::Io { .. }));

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("post-ids.yaml")]);
    }

    #[test]
    fn test_record_creates_parent_dirs_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("post-ids.yaml");

        let mut tracker = PostIdTracker::load(&path).unwrap();
        tracker.record("overview", 1).unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path().join("state"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("post-ids.yaml")]);
    }
}
