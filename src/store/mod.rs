// Store module - Persisted notification collection, storage contexts, and alerts
pub mod alert;
pub mod core;
pub mod storage;

pub use alert::{AlertError, AlertSink, Chime, LogAlertSink, PopupPermission, Tone};
pub use core::{NotificationStore, StoreOptions};
pub use storage::{
    ContextId, FileBackend, MemoryBackend, SharedStorage, StorageBackend, StorageContext,
    StorageEvent,
};
