//! File records.
//!
//! ## Learning: Transparent Newtypes
//!
//! `FileId` wraps a `String` so a folder id can never be passed where a
//! file id is expected, yet `#[serde(transparent)]` makes it serialize as
//! the bare string. Ids are opaque: fresh ones are UUID v4 text, but any
//! string read from a snapshot is accepted as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::folder::FolderId;
use crate::language::Language;

/// Unique identifier for a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    /// Creates a new unique file ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the id text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for FileId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for FileId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A single text file in the workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    /// Unique identifier, never reused
    pub id: FileId,

    /// Display name including extension (not unique)
    pub name: String,

    /// Text payload
    pub content: String,

    /// Language used when running the file
    pub language: Language,

    /// Bumped on every content, name, or language change
    pub last_modified: DateTime<Utc>,

    /// Owning folder; `None` means root-level
    pub folder_id: Option<FolderId>,
}

impl File {
    /// Creates a file with a fresh id.
    pub fn new(
        name: impl Into<String>,
        content: impl Into<String>,
        language: Language,
        folder_id: Option<FolderId>,
    ) -> Self {
        Self {
            id: FileId::new(),
            name: name.into(),
            content: content.into(),
            language,
            last_modified: Utc::now(),
            folder_id,
        }
    }

    /// Returns true if the file lives at the workspace root.
    pub fn is_root(&self) -> bool {
        self.folder_id.is_none()
    }

    pub(crate) fn touch(&mut self) {
        self.last_modified = Utc::now();
    }
}
