use realtime_notify::{
    LogAlertSink, NewNotification, NotificationClient, NotificationStore, NotificationType,
    NotifierOptions, SharedStorage, StoreOptions,
};
use std::sync::Arc;

/// Connect, feed delivered notifications into a persisted store, and mirror it in a second context
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "realtime_notify=info".into()),
        )
        .init();

    let url = std::env::var("NOTIFY_URL").expect("NOTIFY_URL must be set in .env");
    let token = std::env::var("NOTIFY_TOKEN").expect("NOTIFY_TOKEN must be set in .env");
    let data_dir = std::env::var("NOTIFY_DATA_DIR").unwrap_or_else(|_| "./notify-data".into());

    let storage = SharedStorage::open_dir(&data_dir)?;
    let alerts = Arc::new(LogAlertSink::default());

    // The "tab" that owns the connection
    let primary = Arc::new(NotificationStore::new(
        storage.context(),
        alerts.clone(),
        StoreOptions::default(),
    ));
    primary.request_popup_permission();

    // A second context that only follows storage changes
    let mirror = Arc::new(NotificationStore::new(
        storage.context(),
        alerts,
        StoreOptions::default(),
    ));
    let _mirror_sync = mirror.spawn_sync();
    let _mirror_view = mirror.subscribe(|items| {
        let unread = items.iter().filter(|n| !n.read).count();
        println!("mirror: {} notifications, {} unread", items.len(), unread);
    });

    println!("Loaded {} stored notifications", primary.len());

    let client = NotificationClient::new(&url, NotifierOptions::default())?;
    let _feed = primary.attach(&client);
    let _status = client.on_connection_change(|up| println!("connected: {}", up));

    client.connect(token.as_str()).await?;

    primary.add(NewNotification::new(
        "Feed started",
        format!("Listening on {}", url),
        NotificationType::Info,
    ));

    println!("Press Ctrl+C to mark everything read and exit");
    tokio::signal::ctrl_c().await?;

    primary.mark_all_as_read();
    client.disconnect().await?;
    println!("Unread after exit: {}", primary.unread_count());

    Ok(())
}
