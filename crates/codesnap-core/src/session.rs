//! The workspace session: the only surface the editor UI talks to.
//!
//! `Session` wires the canonical [`Workspace`], the [`ActiveFile`]
//! projection, [`Persistence`], and the [`EventBus`] together. Every
//! mutation runs the same sequence:
//!
//! 1. mutate the workspace in memory,
//! 2. resync the projection from the workspace,
//! 3. emit events,
//! 4. save the full snapshot.
//!
//! Step 2 never reads storage, so `current_file()` is correct as soon as
//! a method returns. If step 4 fails the error is returned, but the
//! in-memory state (and the projection) already reflect the mutation and
//! the next successful save will persist it.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::event::{EventBus, WorkspaceEvent};
use crate::file::{File, FileId};
use crate::folder::{Folder, FolderId};
use crate::language::Language;
use crate::organizer::{organize, OrganizedFiles};
use crate::persistence::{FileStorage, Persistence, Storage};
use crate::projection::ActiveFile;
use crate::transfer::{Export, HostFile};
use crate::workspace::{FileDefaults, FolderRemoval, Workspace};
use crate::{CoreError, CoreResult};

/// A loaded workspace plus everything kept in sync with it.
pub struct Session {
    /// Canonical state
    workspace: Workspace,

    /// Denormalized active file for the editor
    active: ActiveFile,

    /// Language shown in the editor toolbar
    language: Language,

    persistence: Persistence,

    event_bus: EventBus,

    /// Name used when the workspace is reset
    default_name: String,
}

impl Session {
    /// Opens the saved workspace from `storage`, or starts a fresh one if
    /// nothing usable is stored.
    pub fn open(config: &Config, storage: impl Storage + 'static) -> Self {
        let persistence = Persistence::new(storage, config.storage.key.clone());
        let defaults = config.workspace.file_defaults();

        let (workspace, fresh) = match persistence.load(defaults.clone()) {
            Some(workspace) => (workspace, false),
            None => {
                tracing::info!("Initializing workspace {:?}", config.workspace.name);
                (Workspace::initialize(config.workspace.name.clone(), defaults), true)
            }
        };

        if fresh {
            if let Err(e) = persistence.save(&workspace) {
                tracing::warn!("Failed to save new workspace: {}", e);
            }
        }

        let active = ActiveFile::from_workspace(&workspace);
        let language = active
            .get()
            .map(|f| f.language)
            .unwrap_or(config.workspace.default_language);

        Self {
            workspace,
            active,
            language,
            persistence,
            event_bus: EventBus::new(),
            default_name: config.workspace.name.clone(),
        }
    }

    /// Opens the workspace stored in the configured data directory.
    pub fn open_default(config: &Config) -> CoreResult<Self> {
        let dir = config.storage.resolve_dir()?;
        tracing::info!("Using workspace storage at {}", dir.display());
        Ok(Self::open(config, FileStorage::new(dir)))
    }

    // ==================== State ====================

    /// Returns the canonical workspace.
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Returns the file bound to the editor.
    pub fn current_file(&self) -> Option<&File> {
        self.active.get()
    }

    /// Returns the language preference shown in the editor.
    pub fn language(&self) -> Language {
        self.language
    }

    /// Returns root files and folders with their subtrees.
    pub fn organized_files(&self) -> OrganizedFiles<'_> {
        organize(&self.workspace)
    }

    /// Subscribes to workspace events.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<WorkspaceEvent> {
        self.event_bus.subscribe()
    }

    // ==================== File Operations ====================

    /// Creates a file, makes it active, and switches the language
    /// preference to the file's language.
    pub fn create_file(
        &mut self,
        name: impl Into<String>,
        folder_id: Option<FolderId>,
        content: Option<String>,
        language: Option<Language>,
    ) -> CoreResult<File> {
        let file = self.workspace.create_file(name, folder_id, content, language)?;
        self.commit([WorkspaceEvent::FileCreated(file.id.clone())])?;
        Ok(file)
    }

    /// Creates `file{N}.{ext}` in `folder_id` using the current language
    /// preference, where N is one more than the files already there.
    pub fn create_untitled_file(&mut self, folder_id: Option<FolderId>) -> CoreResult<File> {
        let count = self.workspace.files_in(folder_id.as_ref()).count();
        let name = format!("file{}.{}", count + 1, self.language.extension());
        let language = self.language;
        self.create_file(name, folder_id, None, Some(language))
    }

    /// Deletes a file. If it was active, another file (or a new welcome
    /// file) becomes active before this returns.
    pub fn delete_file(&mut self, id: &FileId) -> CoreResult<()> {
        self.workspace.delete_file(id)?;
        self.commit([WorkspaceEvent::FileDeleted(id.clone())])
    }

    /// Renames a file.
    pub fn rename_file(&mut self, id: &FileId, name: impl Into<String>) -> CoreResult<()> {
        self.workspace.rename_file(id, name)?;
        self.commit([WorkspaceEvent::FileRenamed(id.clone())])
    }

    /// Makes a file active and adopts its language as the preference.
    pub fn open_file(&mut self, id: &FileId) -> CoreResult<&File> {
        let language = self.workspace.set_active(id)?.language;
        self.set_preference(language);
        self.commit([])?;
        self.active
            .get()
            .ok_or_else(|| CoreError::FileNotFound(id.clone()))
    }

    /// Replaces a file's content.
    pub fn update_file_content(&mut self, id: &FileId, content: impl Into<String>) -> CoreResult<()> {
        self.workspace.update_content(id, content)?;
        self.commit([WorkspaceEvent::FileChanged(id.clone())])
    }

    /// Changes which language a file is classified as. Does not touch the
    /// language preference.
    pub fn reclassify_file(&mut self, id: &FileId, language: Language) -> CoreResult<()> {
        self.workspace.reclassify(id, language)?;
        self.commit([WorkspaceEvent::FileReclassified(id.clone(), language)])
    }

    // ==================== Language ====================

    /// Changes the language preference only. No file is modified; the
    /// preference picks the extension for
    /// [`create_untitled_file`](Self::create_untitled_file).
    pub fn set_language_preference(&mut self, language: Language) {
        self.set_preference(language);
    }

    /// Changes the preference and reclassifies the active file, if any.
    ///
    /// This is the combined toolbar action; prefer
    /// [`set_language_preference`](Self::set_language_preference) or
    /// [`reclassify_file`](Self::reclassify_file) when only one effect is
    /// wanted.
    pub fn set_language(&mut self, language: Language) -> CoreResult<()> {
        self.set_preference(language);
        match self.workspace.active_file_id().cloned() {
            Some(id) => self.reclassify_file(&id, language),
            None => Ok(()),
        }
    }

    // ==================== Folder Operations ====================

    /// Creates a folder, optionally inside another folder.
    pub fn create_folder(
        &mut self,
        name: impl Into<String>,
        parent_id: Option<FolderId>,
    ) -> CoreResult<Folder> {
        let folder = self.workspace.create_folder(name, parent_id)?;
        self.commit([WorkspaceEvent::FolderCreated(folder.id.clone())])?;
        Ok(folder)
    }

    /// Renames a folder.
    pub fn rename_folder(&mut self, id: &FolderId, name: impl Into<String>) -> CoreResult<()> {
        self.workspace.rename_folder(id, name)?;
        self.commit([WorkspaceEvent::FolderRenamed(id.clone())])
    }

    /// Deletes a folder with all nested folders and files.
    pub fn delete_folder(&mut self, id: &FolderId) -> CoreResult<FolderRemoval> {
        let removal = self.workspace.delete_folder(id)?;
        let mut events: Vec<_> = removal
            .files
            .iter()
            .cloned()
            .map(WorkspaceEvent::FileDeleted)
            .collect();
        events.push(WorkspaceEvent::FolderDeleted {
            folder: id.clone(),
            removed_files: removal.files.clone(),
        });
        self.commit(events)?;
        Ok(removal)
    }

    // ==================== Import / Export ====================

    /// Adds a host file to the workspace root and makes it active.
    pub fn import(&mut self, host: HostFile) -> CoreResult<File> {
        let content = host.decode()?;
        let language = Language::detect(&host.name, self.workspace.defaults().language);
        if !host.is_supported() {
            tracing::debug!("{} has no known extension, importing as {}", host.name, language);
        }

        let file = self
            .workspace
            .create_file(host.name, None, Some(content), Some(language))?;
        tracing::info!("Imported {} as {}", file.name, file.language);

        self.commit([
            WorkspaceEvent::FileCreated(file.id.clone()),
            WorkspaceEvent::FileImported(file.id.clone()),
        ])?;
        Ok(file)
    }

    /// Reads a file from disk and imports it.
    pub async fn import_path(&mut self, path: impl AsRef<Path>) -> CoreResult<File> {
        let host = HostFile::read(path).await?;
        self.import(host)
    }

    /// Returns a downloadable copy of a file, or `None` if it is gone.
    pub fn export_file(&self, id: &FileId) -> Option<Export> {
        self.workspace.file(id).map(Export::from_file)
    }

    /// Writes a file into `dir`. A missing file is silently skipped.
    pub async fn export_to(&self, id: &FileId, dir: impl AsRef<Path>) -> CoreResult<Option<PathBuf>> {
        let Some(export) = self.export_file(id) else {
            tracing::debug!("Export skipped, file {} not found", id);
            return Ok(None);
        };
        let path = export.write_to(dir).await?;
        tracing::info!("Exported {} to {}", export.file_name, path.display());
        Ok(Some(path))
    }

    // ==================== Lifecycle ====================

    /// Discards everything and starts over with a single welcome file.
    pub fn reset(&mut self) -> CoreResult<()> {
        let defaults: FileDefaults = self.workspace.defaults().clone();
        self.persistence.clear()?;
        self.workspace = Workspace::initialize(self.default_name.clone(), defaults);
        self.commit([])
    }

    // ==================== Internals ====================

    fn set_preference(&mut self, language: Language) {
        if self.language != language {
            self.language = language;
            self.event_bus.emit(WorkspaceEvent::LanguageChanged(language));
        }
    }

    /// Resyncs the projection, emits `events`, and saves the snapshot.
    fn commit(&mut self, events: impl IntoIterator<Item = WorkspaceEvent>) -> CoreResult<()> {
        if self.active.sync(&self.workspace) {
            if let Some((id, language)) = self.active.get().map(|f| (f.id.clone(), f.language)) {
                self.set_preference(language);
                self.event_bus.emit(WorkspaceEvent::ActiveFileChanged(id));
            }
        }

        for event in events {
            self.event_bus.emit(event);
        }

        self.persistence.save(&self.workspace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventHandler;
    use crate::persistence::MemoryStorage;

    fn session() -> (Session, MemoryStorage) {
        let storage = MemoryStorage::new();
        (Session::open(&Config::default(), storage.clone()), storage)
    }

    fn current_id(session: &Session) -> FileId {
        session.current_file().unwrap().id.clone()
    }

    fn drain(handler: &mut EventHandler) -> Vec<WorkspaceEvent> {
        std::iter::from_fn(|| handler.try_next()).collect()
    }

    #[test]
    fn test_open_initializes_and_saves() {
        let (session, storage) = session();
        assert_eq!(session.workspace().files().len(), 1);
        assert_eq!(session.current_file().unwrap().name, "welcome.py");
        assert_eq!(session.language(), Language::Python);
        assert!(storage.get("codesnap_workspace").unwrap().is_some());
    }

    #[test]
    fn test_reload_restores_active_file() {
        let (mut session, storage) = session();
        let file = session.create_file("app.js", None, None, None).unwrap();
        session.update_file_content(&file.id, "console.log(1)").unwrap();
        drop(session);

        let reloaded = Session::open(&Config::default(), storage);
        let current = reloaded.current_file().unwrap();
        assert_eq!(current.id, file.id);
        assert_eq!(current.content, "console.log(1)");
        assert_eq!(reloaded.language(), Language::JavaScript);
    }

    #[test]
    fn test_open_keeps_snapshot_with_legacy_ids() {
        let storage = MemoryStorage::new();
        storage
            .set(
                "codesnap_workspace",
                r#"{
                    "name": "My Learning Workspace",
                    "folders": [{ "id": "folder_1_abc", "name": "graphs", "parentId": null,
                                  "lastModified": "2024-03-01T10:00:00.000Z" }],
                    "files": [
                        { "id": "welcome", "name": "welcome.py", "content": "print(1)",
                          "language": "python", "lastModified": "2024-03-01T10:00:00.000Z",
                          "folderId": null },
                        { "id": "file_1700000000000_k3j4h5g6f", "name": "bfs.c",
                          "content": "MY WORK", "language": "c",
                          "lastModified": "2024-03-01T10:05:00.000Z", "folderId": "folder_1_abc" }
                    ],
                    "activeFileId": "file_1700000000000_k3j4h5g6f"
                }"#,
            )
            .unwrap();

        let mut session = Session::open(&Config::default(), storage.clone());
        let names: Vec<_> = session.workspace().files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["welcome.py", "bfs.c"]);
        assert_eq!(session.current_file().unwrap().content, "MY WORK");
        assert_eq!(session.language(), Language::C);

        session
            .update_file_content(&FileId::from("welcome"), "print(2)")
            .unwrap();
        let stored = storage.get("codesnap_workspace").unwrap().unwrap();
        assert!(stored.contains("MY WORK"));
        assert!(stored.contains("print(2)"));
    }

    #[test]
    fn test_corrupt_snapshot_starts_over() {
        let storage = MemoryStorage::new();
        storage.set("codesnap_workspace", "[1, 2").unwrap();

        let session = Session::open(&Config::default(), storage);
        assert_eq!(session.workspace().files().len(), 1);
        assert_eq!(session.current_file().unwrap().name, "welcome.py");
    }

    #[test]
    fn test_create_file_activates_and_sets_language() {
        let (mut session, _) = session();
        let file = session.create_file("Main.java", None, None, None).unwrap();
        assert_eq!(session.current_file(), Some(&file));
        assert_eq!(session.language(), Language::Java);
    }

    #[test]
    fn test_untitled_file_uses_language_preference() {
        let (mut session, _) = session();
        session.set_language_preference(Language::Java);

        let file = session.create_untitled_file(None).unwrap();
        assert_eq!(file.name, "file2.java");
        assert_eq!(file.language, Language::Java);
        assert_eq!(file.content, Language::Java.boilerplate());
        assert_eq!(session.current_file(), Some(&file));

        let folder = session.create_folder("algos", None).unwrap();
        session.set_language_preference(Language::C);
        let inner = session.create_untitled_file(Some(folder.id.clone())).unwrap();
        assert_eq!(inner.name, "file1.c");
        assert_eq!(inner.folder_id, Some(folder.id.clone()));

        let next = session.create_untitled_file(Some(folder.id)).unwrap();
        assert_eq!(next.name, "file2.c");
    }

    #[test]
    fn test_untitled_file_in_missing_folder() {
        let (mut session, _) = session();
        assert!(matches!(
            session.create_untitled_file(Some(FolderId::new())),
            Err(CoreError::FolderNotFound(_))
        ));
        assert_eq!(session.workspace().files().len(), 1);
    }

    #[test]
    fn test_delete_active_updates_projection_synchronously() {
        let (mut session, _) = session();
        let welcome = current_id(&session);
        let x = session.create_file("x.c", None, None, None).unwrap();
        session.open_file(&x.id).unwrap();

        session.delete_file(&x.id).unwrap();

        assert_eq!(session.workspace().active_file_id(), Some(&welcome));
        assert_eq!(session.current_file().map(|f| &f.id), Some(&welcome));
        assert_eq!(session.language(), Language::Python);
    }

    #[test]
    fn test_rename_and_edit_update_projection() {
        let (mut session, _) = session();
        let id = current_id(&session);

        session.rename_file(&id, "intro.py").unwrap();
        session.update_file_content(&id, "print('hi')").unwrap();

        let current = session.current_file().unwrap();
        assert_eq!(current.name, "intro.py");
        assert_eq!(current.content, "print('hi')");
    }

    #[test]
    fn test_rename_folder() {
        let (mut session, storage) = session();
        let folder = session.create_folder("algos", None).unwrap();
        let other = session.create_folder("notes", None).unwrap();
        let file = session.create_file("a.c", Some(folder.id.clone()), None, None).unwrap();
        let mut handler = EventHandler::new(session.subscribe());
        let before = session.workspace().clone();

        session.rename_folder(&folder.id, "algorithms").unwrap();

        let renamed = session.workspace().folder(&folder.id).unwrap();
        assert_eq!(renamed.name, "algorithms");
        assert!(renamed.last_modified >= folder.last_modified);
        assert_eq!(
            session.workspace().folder(&other.id),
            before.folder(&other.id)
        );
        assert_eq!(session.workspace().files(), before.files());
        assert_eq!(session.current_file(), Some(&file));
        assert_eq!(drain(&mut handler), [WorkspaceEvent::FolderRenamed(folder.id.clone())]);

        let reloaded = Session::open(&Config::default(), storage);
        assert_eq!(reloaded.workspace().folder(&folder.id).unwrap().name, "algorithms");

        assert!(matches!(
            session.rename_folder(&FolderId::new(), "x"),
            Err(CoreError::FolderNotFound(_))
        ));
    }

    #[test]
    fn test_edit_inactive_file_leaves_projection() {
        let (mut session, _) = session();
        let first = session.current_file().unwrap().clone();
        let other = session.create_file("b.py", None, None, None).unwrap();
        session.open_file(&first.id).unwrap();

        session.update_file_content(&other.id, "changed").unwrap();
        assert_eq!(session.current_file(), Some(&first));
    }

    #[test]
    fn test_language_preference_is_separate_from_reclassify() {
        let (mut session, _) = session();
        let id = current_id(&session);

        session.set_language_preference(Language::C);
        assert_eq!(session.language(), Language::C);
        assert_eq!(session.current_file().unwrap().language, Language::Python);

        session.reclassify_file(&id, Language::Java).unwrap();
        assert_eq!(session.current_file().unwrap().language, Language::Java);
        assert_eq!(session.language(), Language::C);
    }

    #[test]
    fn test_set_language_updates_both() {
        let (mut session, _) = session();
        session.set_language(Language::JavaScript).unwrap();
        assert_eq!(session.language(), Language::JavaScript);
        assert_eq!(
            session.current_file().unwrap().language,
            Language::JavaScript
        );
    }

    #[test]
    fn test_open_file_sets_language() {
        let (mut session, _) = session();
        let c = session.create_file("a.c", None, None, None).unwrap();
        session.create_file("b.py", None, None, None).unwrap();

        let opened = session.open_file(&c.id).unwrap();
        assert_eq!(opened.id, c.id);
        assert_eq!(session.language(), Language::C);
    }

    #[test]
    fn test_open_missing_file() {
        let (mut session, _) = session();
        assert!(matches!(
            session.open_file(&FileId::new()),
            Err(CoreError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_delete_folder_with_active_file() {
        let (mut session, _) = session();
        let folder = session.create_folder("F", None).unwrap();
        let inner = session
            .create_file("in.java", Some(folder.id.clone()), None, None)
            .unwrap();
        assert_eq!(session.current_file().map(|f| &f.id), Some(&inner.id));

        let removal = session.delete_folder(&folder.id).unwrap();
        assert_eq!(removal.files, vec![inner.id.clone()]);
        let current = session.current_file().unwrap();
        assert!(session.workspace().file(&current.id).is_some());
        assert_ne!(current.id, inner.id);
    }

    #[test]
    fn test_import_java() {
        let (mut session, _) = session();
        let source = "public class Solve {\n  // ünïcode\n}\n";
        let file = session
            .import(HostFile::new("solve.java", source))
            .unwrap();

        assert_eq!(file.language, Language::Java);
        assert_eq!(file.content, source);
        assert!(file.is_root());
        assert_eq!(session.current_file(), Some(&file));
    }

    #[test]
    fn test_import_empty_file_keeps_empty_content() {
        let (mut session, _) = session();
        let file = session.import(HostFile::new("empty.py", Vec::<u8>::new())).unwrap();
        assert_eq!(file.content, "");
        assert_eq!(session.current_file().unwrap().content, "");
    }

    #[test]
    fn test_import_txt_uses_default_language() {
        let (mut session, _) = session();
        let file = session.import(HostFile::new("notes.txt", "hello")).unwrap();
        assert_eq!(file.language, Language::Python);
    }

    #[test]
    fn test_import_invalid_text_changes_nothing() {
        let (mut session, _) = session();
        let before = session.workspace().clone();
        let err = session.import(HostFile::new("bad.py", vec![0xc3u8, 0x28]));
        assert!(matches!(err, Err(CoreError::Import { .. })));
        assert_eq!(session.workspace(), &before);
    }

    #[test]
    fn test_export_missing_is_none() {
        let (session, _) = session();
        assert!(session.export_file(&FileId::new()).is_none());
        let export = session.export_file(&current_id(&session)).unwrap();
        assert_eq!(export.file_name, "welcome.py");
    }

    #[tokio::test]
    async fn test_import_and_export_paths() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("solve.java");
        std::fs::write(&source, "class Solve {}").unwrap();

        let (mut session, _) = session();
        let file = session.import_path(&source).await.unwrap();

        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();
        let written = session.export_to(&file.id, &out).await.unwrap().unwrap();
        assert_eq!(std::fs::read_to_string(written).unwrap(), "class Solve {}");

        assert!(session.export_to(&FileId::new(), &out).await.unwrap().is_none());
    }

    #[test]
    fn test_events_for_create_and_import() {
        let (mut session, _) = session();
        let mut handler = EventHandler::new(session.subscribe());

        let created = session.create_file("a.js", None, None, None).unwrap();
        let imported = session.import(HostFile::new("b.py", "x = 1")).unwrap();

        let events = drain(&mut handler);
        assert!(events.contains(&WorkspaceEvent::FileCreated(created.id.clone())));
        assert!(events.contains(&WorkspaceEvent::ActiveFileChanged(created.id)));
        assert!(events.contains(&WorkspaceEvent::LanguageChanged(Language::JavaScript)));
        assert!(events.contains(&WorkspaceEvent::FileImported(imported.id)));
    }

    #[test]
    fn test_reset() {
        let (mut session, storage) = session();
        session.create_folder("F", None).unwrap();
        session.create_file("x.c", None, None, None).unwrap();

        session.reset().unwrap();
        assert!(session.workspace().folders().is_empty());
        assert_eq!(session.workspace().files().len(), 1);
        assert_eq!(session.current_file().unwrap().name, "welcome.py");
        assert!(storage.get("codesnap_workspace").unwrap().is_some());
    }
}
