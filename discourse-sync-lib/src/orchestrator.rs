use std::path::Path;

use tracing::{debug, info};

use crate::SyncError;
use crate::config::PostTemplate;
use crate::document::{Document, markdown_name};
use crate::sink::{PostSink, SinkError};
use crate::tracker::PostIdTracker;

/// What a sync run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Publish every Markdown document in `docs_dir` to the sink.
///
/// Documents already in the tracker are updated in place; the others get a
/// new post whose id is recorded (and flushed to disk) before the next
/// document is looked at. The first failure aborts the run.
///
/// In dry-run mode nothing is sent to the sink and the tracker is left
/// untouched.
pub fn sync_documents(
    docs_dir: &Path,
    sink: &mut impl PostSink,
    tracker: &mut PostIdTracker,
    template: &PostTemplate,
    dry_run: bool,
) -> Result<SyncReport, SyncError> {
    let read_dir_err = |source: std::io::Error| SyncError::ReadDir {
        path: docs_dir.to_path_buf(),
        source,
    };

    let mut entries = std::fs::read_dir(docs_dir)
        .map_err(read_dir_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_dir_err)?;
    entries.sort_by_key(|entry| entry.file_name());

    info!(
        sink = sink.name(),
        docs_dir = %docs_dir.display(),
        entries = entries.len(),
        tracked = tracker.len(),
        "Syncing documents"
    );

    let mut report = SyncReport::default();

    for entry in entries {
        let Some(name) = markdown_name(&entry) else {
            info!(entry = %entry.file_name().to_string_lossy(), "Skipping entry: not a Markdown file");
            report.skipped += 1;
            continue;
        };

        let path = entry.path();
        let document = Document::read(&path, name)
            .map_err(|source| SyncError::ReadDocument { path, source })?;

        if sync_document(&document, sink, tracker, template, dry_run)? {
            report.created += 1;
        } else {
            report.updated += 1;
        }
    }

    Ok(report)
}

/// Returns `true` when a new post was created, `false` for an update
fn sync_document(
    document: &Document,
    sink: &mut impl PostSink,
    tracker: &mut PostIdTracker,
    template: &PostTemplate,
    dry_run: bool,
) -> Result<bool, SyncError> {
    let sink_err = |source: SinkError| SyncError::Sink {
        document: document.name.clone(),
        source,
    };

    if let Some(post_id) = tracker.get(&document.name) {
        if dry_run {
            info!(document = %document.name, post_id, "[DRY RUN] Would update post");
            return Ok(false);
        }

        info!(document = %document.name, post_id, "Updating post");
        sink.update_post(post_id, &document.content).map_err(sink_err)?;
        return Ok(false);
    }

    let post = template.new_post(document);
    if dry_run {
        info!(document = %document.name, title = %post.title, "[DRY RUN] Would create post");
        return Ok(true);
    }

    info!(document = %document.name, "No post id found, creating new post");
    let post_id = sink.create_post(&post).map_err(sink_err)?;
    info!(document = %document.name, post_id, "Created post");

    tracker.record(document.name.clone(), post_id)?;
    debug!(document = %document.name, post_id, path = %tracker.path().display(), "Recorded post id");

    Ok(true)
}
