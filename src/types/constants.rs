/// Inbound frame discriminators (the `type` field of every frame)
pub mod frame_types {
    pub const NOTIFICATION: &str = "notification";
    pub const PING: &str = "ping";
}

/// Query parameter carrying the bearer token on the WebSocket URL
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Base reconnect delay (milliseconds), doubled per attempt
pub const RECONNECT_BASE_DELAY: u64 = 3000;

/// Attempts after which automatic reconnection gives up
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Capacity of the client-wide notification event stream
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

/// Maximum number of notifications kept by a store
pub const MAX_NOTIFICATIONS: usize = 50;

/// Storage key holding the JSON array of notifications
pub const NOTIFICATIONS_KEY: &str = "notifications";

/// Storage key holding the sound preference (`"true"` / `"false"`)
pub const SOUND_KEY: &str = "notification_sound";

/// Capacity of the shared storage change bus
pub const STORAGE_BUS_CAPACITY: usize = 256;

/// Title used when a pushed notification carries none
pub const DEFAULT_TITLE: &str = "Notification";

/// Prefix of locally synthesized notification ids
pub const ID_PREFIX: &str = "notif_";

/// Length of the random base36 suffix of synthesized ids
pub const ID_SUFFIX_LEN: usize = 9;
