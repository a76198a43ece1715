//! The canonical workspace store.
//!
//! `Workspace` owns every file and folder plus the active-file pointer.
//! All methods here are synchronous and purely in-memory; persisting the
//! result and refreshing the editor projection is the job of
//! [`Session`](crate::session::Session).
//!
//! ## Invariants
//!
//! - At least one file exists once the workspace has been reconciled.
//! - `active_file_id`, when set, names an existing file.
//! - A file's `folder_id` and a folder's `parent_id`, when set, name an
//!   existing folder. Creation validates the reference and folder deletion
//!   cascades through every descendant.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::file::{File, FileId};
use crate::folder::{Folder, FolderId};
use crate::language::Language;
use crate::{CoreError, CoreResult};

/// Settings the store needs when it has to synthesize or classify a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDefaults {
    /// Language for names with an unrecognized extension
    pub language: Language,
    /// Name of the file synthesized when the workspace would be empty
    pub welcome_name: String,
}

impl Default for FileDefaults {
    fn default() -> Self {
        Self {
            language: Language::Python,
            welcome_name: "welcome.py".to_string(),
        }
    }
}

/// Everything removed by a cascading folder delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderRemoval {
    /// The deleted folder followed by all of its descendants
    pub folders: Vec<FolderId>,
    /// Files that lived anywhere under the deleted folder
    pub files: Vec<FileId>,
    /// Replacement file created because the delete emptied the workspace
    pub welcome: Option<FileId>,
}

/// The full set of files and folders for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    /// Display label
    name: String,

    /// All folders, in creation order
    folders: Vec<Folder>,

    /// All files, in creation order
    files: Vec<File>,

    /// File currently bound to the editor
    active_file_id: Option<FileId>,

    #[serde(skip)]
    defaults: FileDefaults,
}

impl Workspace {
    /// Creates an empty workspace. Call [`reconcile`](Self::reconcile)
    /// before handing it out so the one-file invariant holds.
    pub fn new(name: impl Into<String>, defaults: FileDefaults) -> Self {
        Self {
            name: name.into(),
            folders: Vec::new(),
            files: Vec::new(),
            active_file_id: None,
            defaults,
        }
    }

    /// Creates a workspace holding a single active welcome file.
    pub fn initialize(name: impl Into<String>, defaults: FileDefaults) -> Self {
        let mut workspace = Self::new(name, defaults);
        workspace.reconcile();
        workspace
    }

    // ==================== Getters ====================

    /// Returns the workspace display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns all files in creation order.
    pub fn files(&self) -> &[File] {
        &self.files
    }

    /// Returns all folders in creation order.
    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    /// Returns a file by ID.
    pub fn file(&self, id: &FileId) -> Option<&File> {
        self.files.iter().find(|f| &f.id == id)
    }

    /// Returns a folder by ID.
    pub fn folder(&self, id: &FolderId) -> Option<&Folder> {
        self.folders.iter().find(|f| &f.id == id)
    }

    /// Returns the files stored directly in `folder_id` (`None` for root).
    pub fn files_in(&self, folder_id: Option<&FolderId>) -> impl Iterator<Item = &File> {
        self.files
            .iter()
            .filter(move |f| f.folder_id.as_ref() == folder_id)
    }

    /// Returns the active file ID.
    pub fn active_file_id(&self) -> Option<&FileId> {
        self.active_file_id.as_ref()
    }

    /// Returns the active file.
    pub fn active_file(&self) -> Option<&File> {
        self.active_file_id.as_ref().and_then(|id| self.file(id))
    }

    /// Returns the defaults used for classification and welcome files.
    pub fn defaults(&self) -> &FileDefaults {
        &self.defaults
    }

    /// Replaces the defaults. Used after loading a snapshot, since
    /// defaults come from configuration rather than storage.
    pub fn set_defaults(&mut self, defaults: FileDefaults) {
        self.defaults = defaults;
    }

    // ==================== File Operations ====================

    /// Creates a file and makes it active.
    ///
    /// The language is taken from `language` when given, otherwise detected
    /// from the name's extension. Missing content is filled with the
    /// language's boilerplate.
    pub fn create_file(
        &mut self,
        name: impl Into<String>,
        folder_id: Option<FolderId>,
        content: Option<String>,
        language: Option<Language>,
    ) -> CoreResult<File> {
        if let Some(folder_id) = &folder_id {
            self.require_folder(folder_id)?;
        }

        let name = name.into();
        let language = language.unwrap_or_else(|| Language::detect(&name, self.defaults.language));
        let content = content.unwrap_or_else(|| language.boilerplate().to_string());

        let file = File::new(name, content, language, folder_id);
        tracing::debug!("Created file {} ({}, {})", file.name, file.id, file.language);

        self.active_file_id = Some(file.id.clone());
        self.files.push(file.clone());
        Ok(file)
    }

    /// Deletes a file.
    ///
    /// If the deleted file was active, the first remaining file becomes
    /// active; if none remain, a welcome file is created and activated.
    pub fn delete_file(&mut self, id: &FileId) -> CoreResult<File> {
        let index = self
            .files
            .iter()
            .position(|f| &f.id == id)
            .ok_or_else(|| CoreError::FileNotFound(id.clone()))?;

        let removed = self.files.remove(index);
        tracing::debug!("Deleted file {} ({})", removed.name, removed.id);

        self.reconcile();
        Ok(removed)
    }

    /// Renames a file. Names are not required to be unique.
    pub fn rename_file(&mut self, id: &FileId, name: impl Into<String>) -> CoreResult<()> {
        let file = self.file_mut(id)?;
        file.name = name.into();
        file.touch();
        Ok(())
    }

    /// Replaces a file's content.
    pub fn update_content(&mut self, id: &FileId, content: impl Into<String>) -> CoreResult<()> {
        let file = self.file_mut(id)?;
        file.content = content.into();
        file.touch();
        Ok(())
    }

    /// Changes the language a file is classified as.
    pub fn reclassify(&mut self, id: &FileId, language: Language) -> CoreResult<()> {
        let file = self.file_mut(id)?;
        if file.language != language {
            file.language = language;
            file.touch();
        }
        Ok(())
    }

    /// Makes a file active.
    pub fn set_active(&mut self, id: &FileId) -> CoreResult<&File> {
        let index = self
            .files
            .iter()
            .position(|f| &f.id == id)
            .ok_or_else(|| CoreError::FileNotFound(id.clone()))?;
        self.active_file_id = Some(id.clone());
        Ok(&self.files[index])
    }

    // ==================== Folder Operations ====================

    /// Creates a folder. Does not change the active file.
    pub fn create_folder(
        &mut self,
        name: impl Into<String>,
        parent_id: Option<FolderId>,
    ) -> CoreResult<Folder> {
        if let Some(parent_id) = &parent_id {
            self.require_folder(parent_id)?;
        }

        let folder = Folder::new(name, parent_id);
        tracing::debug!("Created folder {} ({})", folder.name, folder.id);

        self.folders.push(folder.clone());
        Ok(folder)
    }

    /// Renames a folder. Names are not required to be unique.
    pub fn rename_folder(&mut self, id: &FolderId, name: impl Into<String>) -> CoreResult<()> {
        let folder = self
            .folders
            .iter_mut()
            .find(|f| &f.id == id)
            .ok_or_else(|| CoreError::FolderNotFound(id.clone()))?;
        folder.name = name.into();
        folder.touch();
        Ok(())
    }

    /// Deletes a folder together with every descendant folder and every
    /// file stored anywhere beneath it.
    ///
    /// The active file is reselected if it was among the removed files.
    pub fn delete_folder(&mut self, id: &FolderId) -> CoreResult<FolderRemoval> {
        self.require_folder(id)?;

        let doomed = self.descendants(id);

        let mut removal = FolderRemoval {
            folders: doomed.clone(),
            ..FolderRemoval::default()
        };

        let doomed: HashSet<FolderId> = doomed.into_iter().collect();
        self.folders.retain(|f| !doomed.contains(&f.id));
        self.files.retain(|f| match &f.folder_id {
            Some(folder_id) if doomed.contains(folder_id) => {
                removal.files.push(f.id.clone());
                false
            }
            _ => true,
        });

        tracing::debug!(
            "Deleted folder {} with {} subfolders and {} files",
            id,
            removal.folders.len() - 1,
            removal.files.len()
        );

        removal.welcome = self.reconcile().map(|f| f.id);
        Ok(removal)
    }

    /// Returns `id` followed by all folders nested under it, breadth-first.
    pub fn descendants(&self, id: &FolderId) -> Vec<FolderId> {
        let mut seen = HashSet::from([id]);
        let mut order = vec![id.clone()];
        let mut cursor = 0;

        while cursor < order.len() {
            let parent = order[cursor].clone();
            cursor += 1;
            for folder in &self.folders {
                if folder.parent_id.as_ref() == Some(&parent) && seen.insert(&folder.id) {
                    order.push(folder.id.clone());
                }
            }
        }

        order
    }

    // ==================== Invariant Maintenance ====================

    /// Restores the active-file invariants.
    ///
    /// Creates and activates a welcome file if the workspace is empty, and
    /// moves a dangling active pointer to the first file. Returns the
    /// welcome file if one was created.
    pub fn reconcile(&mut self) -> Option<File> {
        if self.files.is_empty() {
            let name = self.defaults.welcome_name.clone();
            let language = Language::detect(&name, self.defaults.language);
            let file = File::new(name, language.boilerplate(), language, None);
            tracing::debug!("Workspace empty, created {} ({})", file.name, file.id);
            self.active_file_id = Some(file.id.clone());
            self.files.push(file.clone());
            return Some(file);
        }

        if let Some(active) = &self.active_file_id {
            if self.file(active).is_none() {
                self.active_file_id = self.files.first().map(|f| f.id.clone());
            }
        }

        None
    }

    /// Moves records the explorer could never reach to the root: files and
    /// folders whose parent no longer exists, and folders caught in a parent
    /// cycle.
    ///
    /// Only snapshots written by older builds can contain such records.
    /// Returns the number of records moved.
    pub fn adopt_orphans(&mut self) -> usize {
        let known: HashSet<FolderId> = self.folders.iter().map(|f| f.id.clone()).collect();
        let mut moved = 0;

        for folder in &mut self.folders {
            if folder
                .parent_id
                .as_ref()
                .is_some_and(|p| !known.contains(p) || *p == folder.id)
            {
                folder.parent_id = None;
                moved += 1;
            }
        }

        // What is left unreachable from the roots is a parent cycle. Lifting
        // one member of a cycle makes the rest of it reachable again.
        let mut reachable: HashSet<FolderId> = self
            .folders
            .iter()
            .filter(|f| f.is_root())
            .flat_map(|f| self.descendants(&f.id))
            .collect();
        for index in 0..self.folders.len() {
            if reachable.contains(&self.folders[index].id) {
                continue;
            }
            self.folders[index].parent_id = None;
            moved += 1;
            let id = self.folders[index].id.clone();
            reachable.extend(self.descendants(&id));
        }

        for file in &mut self.files {
            if file.folder_id.as_ref().is_some_and(|f| !known.contains(f)) {
                file.folder_id = None;
                moved += 1;
            }
        }

        moved
    }

    fn file_mut(&mut self, id: &FileId) -> CoreResult<&mut File> {
        self.files
            .iter_mut()
            .find(|f| &f.id == id)
            .ok_or_else(|| CoreError::FileNotFound(id.clone()))
    }

    fn require_folder(&self, id: &FolderId) -> CoreResult<()> {
        match self.folder(id) {
            Some(_) => Ok(()),
            None => Err(CoreError::FolderNotFound(id.clone())),
        }
    }
}
