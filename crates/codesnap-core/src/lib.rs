//! # CodeSnap Core
//!
//! The virtual workspace behind the practice editor: an in-memory,
//! persisted collection of files and folders with a single active file.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Session                            │
//! │  ┌─────────────┐  ┌──────────────┐  ┌──────────────────┐ │
//! │  │  Workspace  │→ │  ActiveFile  │  │     EventBus     │ │
//! │  │   (store)   │  │ (projection) │  │ (fire & forget)  │ │
//! │  └──────┬──────┘  └──────────────┘  └──────────────────┘ │
//! │         │                                                 │
//! │  ┌──────┴──────────────────────┐   ┌──────────────────┐  │
//! │  │ Persistence (Storage + key) │   │ Import / Export  │  │
//! │  └─────────────────────────────┘   └──────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Every mutation flows the same way: the `Workspace` changes, the
//! `ActiveFile` projection is refreshed from it, the whole snapshot is
//! saved, and an event is emitted.

pub mod config;
pub mod event;
pub mod file;
pub mod folder;
pub mod language;
pub mod organizer;
pub mod persistence;
pub mod projection;
pub mod session;
pub mod transfer;
pub mod workspace;

pub use config::Config;
pub use event::{EventBus, EventHandler, WorkspaceEvent};
pub use file::{File, FileId};
pub use folder::{Folder, FolderId};
pub use language::Language;
pub use organizer::{FolderNode, OrganizedFiles};
pub use persistence::{FileStorage, MemoryStorage, Persistence, Storage};
pub use projection::ActiveFile;
pub use session::Session;
pub use transfer::{Export, HostFile};
pub use workspace::{FileDefaults, FolderRemoval, Workspace};

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("File not found: {0}")]
    FileNotFound(FileId),

    #[error("Folder not found: {0}")]
    FolderNotFound(FolderId),

    #[error("Failed to import {name}: {message}")]
    Import { name: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}
