use crate::types::constants::STORAGE_BUS_CAPACITY;
use crate::types::{NotifyError, Result};
use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tempfile::NamedTempFile;
use tokio::sync::broadcast;

/// String key/value persistence shared by every store context
pub trait StorageBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local backend; nothing survives a restart
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// One file per key inside a directory
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open (creating if needed) a storage directory
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(NotifyError::Storage(format!("invalid storage key '{}'", key)));
        }
        Ok(self.dir.join(key))
    }
}

impl StorageBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.path_for(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        // Each write gets its own temp file, renamed over the key atomically
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Identifies one store context (the analogue of a browser tab)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

/// Change signal emitted whenever a context rewrites or removes a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub origin: ContextId,
}

/// A storage backend plus the change bus every context listens on
#[derive(Clone)]
pub struct SharedStorage {
    backend: Arc<dyn StorageBackend>,
    events: broadcast::Sender<StorageEvent>,
    next_context: Arc<AtomicU64>,
}

impl SharedStorage {
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        let (events, _) = broadcast::channel(STORAGE_BUS_CAPACITY);
        Self {
            backend: Arc::new(backend),
            events,
            next_context: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// File-backed storage rooted at `dir`
    pub fn open_dir(dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(FileBackend::open(dir)?))
    }

    /// Create a new context with its own identity on the change bus
    pub fn context(&self) -> StorageContext {
        let id = ContextId(self.next_context.fetch_add(1, Ordering::Relaxed));
        StorageContext {
            id,
            shared: self.clone(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }
}

/// A context's handle on shared storage; its writes are signalled to all others
#[derive(Clone)]
pub struct StorageContext {
    id: ContextId,
    shared: SharedStorage,
}

impl StorageContext {
    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.shared.backend.get(key)
    }

    /// Write a value and signal the change if the value actually changed
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let old_value = self.previous_value(key);
        self.shared.backend.set(key, value)?;

        if old_value.as_deref() != Some(value) {
            self.emit(key, old_value, Some(value.to_string()));
        }
        Ok(())
    }

    /// Remove a key and signal the change if it existed
    pub fn remove(&self, key: &str) -> Result<()> {
        let old_value = self.previous_value(key);
        self.shared.backend.remove(key)?;

        if old_value.is_some() {
            self.emit(key, old_value, None);
        }
        Ok(())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.shared.subscribe()
    }

    fn previous_value(&self, key: &str) -> Option<String> {
        match self.shared.backend.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("Could not read previous value of '{}': {}", key, e);
                None
            }
        }
    }

    fn emit(&self, key: &str, old_value: Option<String>, new_value: Option<String>) {
        let event = StorageEvent {
            key: key.to_string(),
            old_value,
            new_value,
            origin: self.id,
        };
        // No receivers just means no other context is listening
        if self.shared.events.send(event).is_err() {
            tracing::trace!("No storage listeners for key '{}'", key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_backend_get_set_remove() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get("k").unwrap(), None);
        backend.set("k", "v").unwrap();
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("v"));
        backend.remove("k").unwrap();
        assert_eq!(backend.get("k").unwrap(), None);
    }

    #[test]
    fn test_file_backend_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();

        let backend = FileBackend::open(dir.path()).unwrap();
        backend.set("notifications", "[1,2]").unwrap();

        let reopened = FileBackend::open(dir.path()).unwrap();
        assert_eq!(
            reopened.get("notifications").unwrap().as_deref(),
            Some("[1,2]")
        );

        reopened.remove("notifications").unwrap();
        reopened.remove("notifications").unwrap();
        assert_eq!(backend.get("notifications").unwrap(), None);
    }

    #[test]
    fn test_file_backend_concurrent_writers_to_one_key() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        let values: Vec<String> = ["a", "b"]
            .iter()
            .map(|tag| {
                let items: Vec<String> = (0..20_000).map(|i| format!("{tag}{i}")).collect();
                serde_json::to_string(&items).unwrap()
            })
            .collect();

        std::thread::scope(|scope| {
            for value in &values {
                let backend = &backend;
                scope.spawn(move || {
                    for _ in 0..100 {
                        backend.set("notifications", value).unwrap();
                    }
                });
            }
            let backend = &backend;
            let values = &values;
            scope.spawn(move || {
                for _ in 0..200 {
                    if let Some(read) = backend.get("notifications").unwrap() {
                        assert!(values.contains(&read), "torn read of {} bytes", read.len());
                    }
                }
            });
        });

        let last = backend.get("notifications").unwrap().unwrap();
        assert!(values.contains(&last));
        // No temp files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_file_backend_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        for key in ["../escape", "a/b", "", ".hidden"] {
            assert!(matches!(backend.set(key, "x"), Err(NotifyError::Storage(_))), "{key}");
        }
    }

    #[test]
    fn test_contexts_get_distinct_ids() {
        let shared = SharedStorage::memory();
        assert_ne!(shared.context().id(), shared.context().id());
    }

    #[test]
    fn test_set_emits_old_and_new_values() {
        let shared = SharedStorage::memory();
        let ctx = shared.context();
        let mut rx = shared.subscribe();

        ctx.set("k", "one").unwrap();
        ctx.set("k", "two").unwrap();

        let first = rx.try_recv().unwrap();
        assert_eq!(first.old_value, None);
        assert_eq!(first.new_value.as_deref(), Some("one"));
        assert_eq!(first.origin, ctx.id());

        let second = rx.try_recv().unwrap();
        assert_eq!(second.old_value.as_deref(), Some("one"));
        assert_eq!(second.new_value.as_deref(), Some("two"));
    }

    #[test]
    fn test_unchanged_write_is_not_signalled() {
        let shared = SharedStorage::memory();
        let ctx = shared.context();
        ctx.set("k", "same").unwrap();

        let mut rx = shared.subscribe();
        ctx.set("k", "same").unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_remove_signals_only_existing_keys() {
        let shared = SharedStorage::memory();
        let ctx = shared.context();
        let mut rx = shared.subscribe();

        ctx.remove("missing").unwrap();
        assert!(rx.try_recv().is_err());

        ctx.set("k", "v").unwrap();
        ctx.remove("k").unwrap();
        let _set = rx.try_recv().unwrap();
        let removed = rx.try_recv().unwrap();
        assert_eq!(removed.old_value.as_deref(), Some("v"));
        assert_eq!(removed.new_value, None);
    }
}
