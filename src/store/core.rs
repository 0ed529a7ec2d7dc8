use super::alert::{AlertSink, Chime, PopupPermission};
use super::storage::{StorageContext, StorageEvent};
use crate::client::NotificationClient;
use crate::infrastructure::{HandlerRegistry, Subscription};
use crate::types::constants::{MAX_NOTIFICATIONS, NOTIFICATIONS_KEY, SOUND_KEY};
use crate::types::{NewNotification, Notification};
use chrono::Utc;
use std::collections::HashSet;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Capacity; the oldest entries are evicted beyond it
    pub max_notifications: usize,
    pub notifications_key: String,
    pub sound_key: String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            max_notifications: MAX_NOTIFICATIONS,
            notifications_key: NOTIFICATIONS_KEY.to_string(),
            sound_key: SOUND_KEY.to_string(),
        }
    }
}

struct StoreState {
    /// Newest first
    items: Vec<Notification>,
    /// Ids this context has already seen, for diffing foreign writes
    known_ids: HashSet<String>,
    sound_enabled: bool,
    permission_requested: bool,
}

impl StoreState {
    fn adopt(&mut self, items: Vec<Notification>) {
        self.known_ids = items.iter().map(|n| n.id.clone()).collect();
        self.items = items;
    }
}

/// Persisted, capped, newest-first collection of notifications.
///
/// Every mutation is written back to the store's [`StorageContext`], which
/// signals the other contexts sharing the same storage. Persistence is
/// best-effort: write failures are logged and the in-memory state stays
/// authoritative for this context. Concurrent writers race; the last write wins.
pub struct NotificationStore {
    storage: StorageContext,
    alerts: Arc<dyn AlertSink>,
    chime: Chime,
    options: StoreOptions,
    state: Mutex<StoreState>,
    listeners: HandlerRegistry<[Notification]>,
}

impl NotificationStore {
    /// Create a store, loading whatever the storage already holds
    pub fn new(storage: StorageContext, alerts: Arc<dyn AlertSink>, options: StoreOptions) -> Self {
        let mut state = StoreState {
            items: Vec::new(),
            known_ids: HashSet::new(),
            sound_enabled: read_sound(&storage, &options.sound_key),
            permission_requested: false,
        };
        state.adopt(read_items(&storage, &options));

        Self {
            storage,
            alerts,
            chime: Chime::two_tone(),
            options,
            state: Mutex::new(state),
            listeners: HandlerRegistry::new(),
        }
    }

    /// Add a locally originated notification, assigning id and timestamp
    pub fn add(&self, notification: NewNotification) -> Notification {
        let notification = notification.into_notification(Utc::now());
        self.prepend(notification.clone(), false);
        notification
    }

    /// Insert a notification that already has an id; duplicates are ignored
    pub fn insert(&self, notification: Notification) -> bool {
        self.prepend(notification, true)
    }

    fn prepend(&self, notification: Notification, dedupe: bool) -> bool {
        let (snapshot, sound) = {
            let mut state = self.lock();
            if dedupe && state.known_ids.contains(&notification.id) {
                tracing::debug!("Ignoring duplicate notification {}", notification.id);
                return false;
            }
            state.items.insert(0, notification.clone());
            state.items.truncate(self.options.max_notifications);
            let items = std::mem::take(&mut state.items);
            state.adopt(items);
            (state.items.clone(), state.sound_enabled)
        };

        self.persist(&snapshot);
        self.alert(&notification, sound);
        self.listeners.emit(&snapshot);
        true
    }

    /// Mark one notification read; returns whether it exists
    pub fn mark_as_read(&self, id: &str) -> bool {
        let snapshot = {
            let mut state = self.lock();
            let Some(notification) = state.items.iter_mut().find(|n| n.id == id) else {
                return false;
            };
            notification.read = true;
            state.items.clone()
        };

        self.persist(&snapshot);
        self.listeners.emit(&snapshot);
        true
    }

    pub fn mark_all_as_read(&self) {
        let snapshot = {
            let mut state = self.lock();
            state.items.iter_mut().for_each(|n| n.read = true);
            state.items.clone()
        };

        self.persist(&snapshot);
        self.listeners.emit(&snapshot);
    }

    /// Empty the collection and delete the persisted entry
    pub fn clear_all(&self) {
        self.lock().adopt(Vec::new());

        if let Err(e) = self.storage.remove(&self.options.notifications_key) {
            tracing::warn!("Failed to clear persisted notifications: {}", e);
        }
        self.listeners.emit(&[]);
    }

    /// Flip the sound preference and return the new value
    pub fn toggle_sound(&self) -> bool {
        let enabled = {
            let mut state = self.lock();
            state.sound_enabled = !state.sound_enabled;
            state.sound_enabled
        };

        let value = if enabled { "true" } else { "false" };
        if let Err(e) = self.storage.set(&self.options.sound_key, value) {
            tracing::warn!("Failed to persist sound preference: {}", e);
        }
        enabled
    }

    pub fn sound_enabled(&self) -> bool {
        self.lock().sound_enabled
    }

    /// All notifications, newest first
    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().items.clone()
    }

    pub fn unread_count(&self) -> usize {
        self.lock().items.iter().filter(|n| !n.read).count()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Register a listener receiving the full collection after every change
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&[Notification]) + Send + Sync + 'static,
    {
        self.listeners.register(listener)
    }

    /// Ask for popup permission the first time; later calls only report it
    pub fn request_popup_permission(&self) -> PopupPermission {
        let first = {
            let mut state = self.lock();
            !std::mem::replace(&mut state.permission_requested, true)
        };

        if first {
            self.alerts.request_popup_permission()
        } else {
            self.alerts.popup_permission()
        }
    }

    /// Insert every notification the client delivers
    pub fn attach(self: &Arc<Self>, client: &NotificationClient) -> Subscription {
        let store = Arc::downgrade(self);
        client.on_notification(move |notification| {
            if let Some(store) = store.upgrade() {
                store.insert(notification.clone());
            }
        })
    }

    /// Apply a change made by another context; returns how many ids were new here
    pub fn apply_storage_event(&self, event: &StorageEvent) -> usize {
        if event.origin == self.storage.id() {
            return 0;
        }

        if event.key == self.options.sound_key {
            self.lock().sound_enabled = event.new_value.as_deref() != Some("false");
            return 0;
        }
        if event.key != self.options.notifications_key {
            return 0;
        }

        let items = event
            .new_value
            .as_deref()
            .map(|json| parse_items(json, self.options.max_notifications))
            .unwrap_or_default();
        self.adopt_foreign(items)
    }

    /// Re-read the persisted collection, e.g. after missing change signals
    pub fn reload(&self) -> usize {
        let items = read_items(&self.storage, &self.options);
        self.adopt_foreign(items)
    }

    fn adopt_foreign(&self, items: Vec<Notification>) -> usize {
        let (fresh, snapshot, sound) = {
            let mut state = self.lock();
            let fresh: Vec<Notification> = items
                .iter()
                .filter(|n| !state.known_ids.contains(&n.id))
                .cloned()
                .collect();
            state.adopt(items);
            (fresh, state.items.clone(), state.sound_enabled)
        };

        if let Some(newest) = fresh.first() {
            tracing::debug!("{} new notifications from another context", fresh.len());
            self.alert(newest, sound);
        }
        self.listeners.emit(&snapshot);
        fresh.len()
    }

    /// Follow the storage change bus until the store is dropped
    pub fn spawn_sync(self: &Arc<Self>) -> JoinHandle<()> {
        let mut rx = self.storage.subscribe();
        let store = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                let received = rx.recv().await;
                let Some(store) = store.upgrade() else {
                    break;
                };
                match received {
                    Ok(event) => {
                        store.apply_storage_event(&event);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Missed {} storage events, reloading", skipped);
                        store.reload();
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            tracing::debug!("Storage sync task finished");
        })
    }

    fn persist(&self, items: &[Notification]) {
        let json = match serde_json::to_string(items) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize notifications: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.set(&self.options.notifications_key, &json) {
            tracing::warn!("Failed to persist notifications: {}", e);
        }
    }

    /// Chime (if enabled) and popup (if permitted); failures are only logged
    fn alert(&self, notification: &Notification, sound: bool) {
        if sound {
            match catch_unwind(AssertUnwindSafe(|| self.alerts.play_chime(&self.chime))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!("Failed to play chime: {}", e),
                Err(_) => tracing::error!("Alert sink panicked while playing chime"),
            }
        }

        let popup = catch_unwind(AssertUnwindSafe(|| {
            if self.alerts.popup_permission() == PopupPermission::Granted {
                self.alerts
                    .show_popup(&notification.title, &notification.message)
            } else {
                Ok(())
            }
        }));
        match popup {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!("Failed to show popup: {}", e),
            Err(_) => tracing::error!("Alert sink panicked while showing popup"),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn read_items(storage: &StorageContext, options: &StoreOptions) -> Vec<Notification> {
    match storage.get(&options.notifications_key) {
        Ok(Some(json)) => parse_items(&json, options.max_notifications),
        Ok(None) => Vec::new(),
        Err(e) => {
            tracing::warn!("Failed to read persisted notifications: {}", e);
            Vec::new()
        }
    }
}

fn parse_items(json: &str, max: usize) -> Vec<Notification> {
    match serde_json::from_str::<Vec<Notification>>(json) {
        Ok(mut items) => {
            items.truncate(max);
            items
        }
        Err(e) => {
            tracing::warn!("Discarding corrupted notification collection: {}", e);
            Vec::new()
        }
    }
}

fn read_sound(storage: &StorageContext, key: &str) -> bool {
    match storage.get(key) {
        Ok(value) => value.as_deref() != Some("false"),
        Err(e) => {
            tracing::warn!("Failed to read sound preference: {}", e);
            true
        }
    }
}
