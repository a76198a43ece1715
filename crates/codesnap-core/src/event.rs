//! Workspace notifications.
//!
//! Events are fire-and-forget: the session emits them after a mutation has
//! been applied and never waits on, or depends on, whoever listens. The
//! activity tracker is the typical subscriber.
//!
//! ## Learning: Broadcast Channels
//!
//! `tokio::sync::broadcast` hands every receiver its own clone of each
//! message, so `WorkspaceEvent` must be `Clone`. A receiver that falls
//! more than the channel capacity behind gets `Lagged` instead of
//! blocking the sender; `EventHandler` logs and skips ahead.

use crate::file::FileId;
use crate::folder::FolderId;
use crate::language::Language;
use tokio::sync::broadcast;

/// Things that happened to the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceEvent {
    // File events
    /// A file was created by the user
    FileCreated(FileId),
    /// A file was created from a host file
    FileImported(FileId),
    /// A file was removed
    FileDeleted(FileId),
    /// A file was renamed
    FileRenamed(FileId),
    /// A file's content changed
    FileChanged(FileId),
    /// A file was assigned a different language
    FileReclassified(FileId, Language),

    // Folder events
    /// A folder was created
    FolderCreated(FolderId),
    /// A folder was renamed
    FolderRenamed(FolderId),
    /// A folder and everything beneath it was removed
    FolderDeleted {
        folder: FolderId,
        removed_files: Vec<FileId>,
    },

    // Editor events
    /// A different file became active
    ActiveFileChanged(FileId),
    /// The language preference changed
    LanguageChanged(Language),
}

/// Broadcasts workspace events to any number of subscribers.
pub struct EventBus {
    sender: broadcast::Sender<WorkspaceEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Emits an event to all subscribers.
    pub fn emit(&self, event: WorkspaceEvent) {
        // No receivers is fine
        let _ = self.sender.send(event);
    }

    /// Subscribes to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkspaceEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

/// Helper for consuming events in a background task.
///
/// ```ignore
/// let mut handler = EventHandler::new(session.subscribe());
///
/// tokio::spawn(async move {
///     while let Some(event) = handler.next().await {
///         if let WorkspaceEvent::FileImported(_) = event {
///             activity.files_imported += 1;
///         }
///     }
/// });
/// ```
pub struct EventHandler {
    receiver: broadcast::Receiver<WorkspaceEvent>,
}

impl EventHandler {
    /// Creates a new event handler.
    pub fn new(receiver: broadcast::Receiver<WorkspaceEvent>) -> Self {
        Self { receiver }
    }

    /// Waits for the next event, skipping over any that were dropped
    /// because this handler fell behind.
    pub async fn next(&mut self) -> Option<WorkspaceEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Event handler lagged, missed {} events", n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next event if one is already queued.
    pub fn try_next(&mut self) -> Option<WorkspaceEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    tracing::warn!("Event handler lagged, missed {} events", n);
                    continue;
                }
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let id = FileId::new();

        bus.emit(WorkspaceEvent::FileCreated(id.clone()));

        let event = rx.recv().await.unwrap();
        assert_eq!(event, WorkspaceEvent::FileCreated(id));
    }

    #[tokio::test]
    async fn test_handler_ends_when_bus_dropped() {
        let bus = EventBus::new();
        let mut handler = EventHandler::new(bus.subscribe());

        bus.emit(WorkspaceEvent::LanguageChanged(Language::Java));
        drop(bus);

        assert_eq!(
            handler.next().await,
            Some(WorkspaceEvent::LanguageChanged(Language::Java))
        );
        assert_eq!(handler.next().await, None);
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new();
        bus.emit(WorkspaceEvent::FolderCreated(FolderId::new()));
    }
}
