//! Read-only tree view of a workspace for the file explorer.
//!
//! Root-level files and folders are listed first; every folder carries
//! its own files and subfolders, so nested folders are always reachable.

use crate::file::File;
use crate::folder::Folder;
use crate::workspace::Workspace;

/// A folder together with everything stored directly inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNode<'a> {
    pub folder: &'a Folder,
    pub files: Vec<&'a File>,
    pub children: Vec<FolderNode<'a>>,
}

impl FolderNode<'_> {
    /// Total number of files in this folder and all subfolders.
    pub fn file_count(&self) -> usize {
        self.files.len() + self.children.iter().map(FolderNode::file_count).sum::<usize>()
    }
}

/// The workspace partitioned for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizedFiles<'a> {
    /// Files with no folder
    pub root_files: Vec<&'a File>,
    /// Folders with no parent, each with its subtree
    pub folders: Vec<FolderNode<'a>>,
}

/// Builds the explorer tree. Store order is preserved at every level.
pub fn organize(workspace: &Workspace) -> OrganizedFiles<'_> {
    OrganizedFiles {
        root_files: workspace.files_in(None).collect(),
        folders: workspace
            .folders()
            .iter()
            .filter(|f| f.is_root())
            .map(|f| build_node(workspace, f))
            .collect(),
    }
}

fn build_node<'a>(workspace: &'a Workspace, folder: &'a Folder) -> FolderNode<'a> {
    // A folder has a single parent, so starting from the roots each folder
    // is visited at most once.
    let children = workspace
        .folders()
        .iter()
        .filter(|f| f.parent_id.as_ref() == Some(&folder.id))
        .map(|f| build_node(workspace, f))
        .collect();

    FolderNode {
        folder,
        files: workspace.files_in(Some(&folder.id)).collect(),
        children,
    }
}
