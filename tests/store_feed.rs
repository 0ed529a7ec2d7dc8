mod common;

use common::{TestServer, eventually, notification_frame};
use realtime_notify::{
    LogAlertSink, NewNotification, NotificationClient, NotificationStore, NotificationType,
    NotifierOptions, SharedStorage, StoreOptions,
};
use std::sync::Arc;

fn store_on(storage: &SharedStorage) -> Arc<NotificationStore> {
    Arc::new(NotificationStore::new(
        storage.context(),
        Arc::new(LogAlertSink::default()),
        StoreOptions::default(),
    ))
}

#[tokio::test]
async fn delivered_notifications_land_in_every_context() {
    let dir = tempfile::tempdir().unwrap();
    let storage = SharedStorage::open_dir(dir.path()).unwrap();

    let primary = store_on(&storage);
    let mirror = store_on(&storage);
    let sync = mirror.spawn_sync();

    let mut server = TestServer::start().await;
    let client = NotificationClient::new(&server.url, NotifierOptions::default()).unwrap();
    let _feed = primary.attach(&client);

    client.connect("t").await.unwrap();
    let mut conn = server.next_conn().await;
    conn.send_text(&notification_frame("n1", "First")).await;
    conn.send_text(&notification_frame("n2", "Second")).await;
    // Redelivery of a known id is ignored
    conn.send_text(&notification_frame("n1", "First")).await;
    conn.send_text(r#"{"type":"ping"}"#).await;
    assert_eq!(conn.recv_text().await, r#"{"type":"pong"}"#);

    eventually(|| primary.len() == 2 && mirror.len() == 2).await;
    let ids: Vec<String> = mirror.notifications().into_iter().map(|n| n.id).collect();
    assert_eq!(ids, vec!["n2".to_string(), "n1".to_string()]);

    primary.mark_as_read("n1");
    eventually(|| mirror.unread_count() == 1).await;

    client.disconnect().await.unwrap();
    sync.abort();

    // A fresh context on the same directory sees the persisted state
    let reopened = store_on(&SharedStorage::open_dir(dir.path()).unwrap());
    assert_eq!(reopened.len(), 2);
    assert_eq!(reopened.unread_count(), 1);
}

#[tokio::test]
async fn add_then_mark_as_read_end_to_end() {
    let storage = SharedStorage::memory();
    let store = store_on(&storage);

    let added = store.add(NewNotification::new(
        "Test",
        "Hello",
        NotificationType::SystemAlert,
    ));
    assert_eq!(store.len(), 1);
    assert_eq!(store.unread_count(), 1);
    assert!(added.id.starts_with("notif_"));

    store.mark_as_read(&added.id);
    assert_eq!(store.unread_count(), 0);

    let reloaded = store_on(&storage);
    assert!(reloaded.notifications()[0].read);
}
