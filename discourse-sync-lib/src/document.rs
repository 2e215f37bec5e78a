use std::fs::DirEntry;
use std::path::Path;

/// Suffix a file name must end with to be synced. Matched case-sensitively.
pub const MARKDOWN_SUFFIX: &str = ".md";

/// A Markdown file read from the documents directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// File name without the `.md` suffix
    pub name: String,
    pub content: String,
}

impl Document {
    /// Read the full text of the file at `path` as the document `name`
    pub fn read(path: &Path, name: impl Into<String>) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self {
            name: name.into(),
            content,
        })
    }
}

/// Strip exactly one trailing `.md` from a file name
pub fn document_name(file_name: &str) -> Option<&str> {
    file_name.strip_suffix(MARKDOWN_SUFFIX)
}

/// The document name for a regular file (symlinks followed) whose name ends
/// in `.md`, or `None` for anything that should not be synced
pub fn markdown_name(entry: &DirEntry) -> Option<String> {
    let file_name = entry.file_name();
    let name = document_name(file_name.to_str()?)?;

    std::fs::metadata(entry.path())
        .is_ok_and(|m| m.is_file())
        .then(|| name.to_string())
}
