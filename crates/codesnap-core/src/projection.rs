//! The "current file" the editor binds to.
//!
//! `ActiveFile` is a denormalized copy of whichever file the workspace's
//! active pointer names. It is refreshed synchronously from the in-memory
//! workspace after every mutation and never from storage, so it cannot
//! observe a snapshot older than the store itself.
//!
//! ## Learning: `clone_from`
//!
//! Most edits change only one field of the active file. `clone_from`
//! lets the existing `File` reuse its `String` buffers instead of
//! allocating a fresh copy on every keystroke, which is why `sync`
//! matches on the slot instead of assigning `active.cloned()` outright.

use crate::file::{File, FileId};
use crate::workspace::Workspace;

/// Snapshot of the active file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveFile {
    file: Option<File>,
}

impl ActiveFile {
    /// Creates a projection already in sync with `workspace`.
    pub fn from_workspace(workspace: &Workspace) -> Self {
        Self {
            file: workspace.active_file().cloned(),
        }
    }

    /// Brings the projection in line with `workspace`.
    ///
    /// Returns true if the projected file changed identity (a different
    /// file became active, or the active file went away).
    pub fn sync(&mut self, workspace: &Workspace) -> bool {
        let previous = self.id().cloned();
        match (&mut self.file, workspace.active_file()) {
            (Some(current), Some(active)) => {
                if current != active {
                    current.clone_from(active);
                }
            }
            (slot, active) => *slot = active.cloned(),
        }
        previous.as_ref() != self.id()
    }

    /// Returns the projected file.
    pub fn get(&self) -> Option<&File> {
        self.file.as_ref()
    }

    /// Returns the ID of the projected file.
    pub fn id(&self) -> Option<&FileId> {
        self.file.as_ref().map(|f| &f.id)
    }

    /// Returns true if the projection matches `workspace` exactly.
    pub fn is_consistent_with(&self, workspace: &Workspace) -> bool {
        self.file.as_ref() == workspace.active_file()
    }
}
