//! Folder records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a folder. Opaque, like [`FileId`](crate::file::FileId).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderId(String);

impl FolderId {
    /// Creates a new unique folder ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the id text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for FolderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FolderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for FolderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for FolderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A folder grouping files and other folders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: FolderId,

    /// Display name (not unique)
    pub name: String,

    /// Enclosing folder; `None` means root-level
    pub parent_id: Option<FolderId>,

    pub last_modified: DateTime<Utc>,
}

impl Folder {
    /// Creates a folder with a fresh id.
    pub fn new(name: impl Into<String>, parent_id: Option<FolderId>) -> Self {
        Self {
            id: FolderId::new(),
            name: name.into(),
            parent_id,
            last_modified: Utc::now(),
        }
    }

    /// Returns true if the folder lives at the workspace root.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub(crate) fn touch(&mut self) {
        self.last_modified = Utc::now();
    }
}
