use super::{FrameError, InboundFrame};
use crate::client::ConnectionManager;
use crate::infrastructure::HandlerRegistry;
use crate::types::{ControlMessage, Notification};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::broadcast;

/// What the router did with one inbound frame
#[derive(Debug)]
pub enum RouteOutcome {
    /// Notification handed to this many handlers (panicking handlers excluded)
    Delivered(usize),
    /// Ping answered with a pong
    Ponged,
    /// Valid frame of a kind the client does not act on
    Ignored(String),
    /// Frame could not be parsed
    Dropped(FrameError),
}

/// Routes incoming text frames to notification handlers or keep-alive replies
pub struct MessageRouter {
    connection: Arc<ConnectionManager>,
    handlers: HandlerRegistry<Notification>,
    events: broadcast::Sender<Notification>,
}

impl MessageRouter {
    pub fn new(
        connection: Arc<ConnectionManager>,
        handlers: HandlerRegistry<Notification>,
        events: broadcast::Sender<Notification>,
    ) -> Self {
        Self {
            connection,
            handlers,
            events,
        }
    }

    /// Routes one text frame; never fails, problems are logged
    pub async fn route(&self, text: &str) -> RouteOutcome {
        match InboundFrame::parse(text, Utc::now()) {
            Ok(InboundFrame::Notification(notification)) => self.deliver(notification),
            Ok(InboundFrame::Ping) => {
                self.reply_pong().await;
                RouteOutcome::Ponged
            }
            Ok(InboundFrame::Other(kind)) => {
                tracing::debug!("Ignoring frame of type '{}'", kind);
                RouteOutcome::Ignored(kind)
            }
            Err(e) => {
                tracing::error!("Failed to parse frame: {} - Raw: {}", e, text);
                RouteOutcome::Dropped(e)
            }
        }
    }

    fn deliver(&self, notification: Notification) -> RouteOutcome {
        tracing::debug!(
            "Delivering notification id={}, type={}",
            notification.id,
            notification.kind
        );

        let delivered = self.handlers.emit(&notification);

        // No receivers is fine: the event stream is optional
        if self.events.send(notification).is_err() {
            tracing::trace!("No event stream subscribers");
        }

        RouteOutcome::Delivered(delivered)
    }

    async fn reply_pong(&self) {
        let pong = match ControlMessage::Pong.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to encode pong: {}", e);
                return;
            }
        };

        if let Err(e) = self.connection.send_text(pong).await {
            tracing::warn!("Failed to answer ping: {}", e);
        } else {
            tracing::debug!("Answered ping with pong");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::connection::tests::memory_sink;
    use futures::StreamExt;
    use std::sync::Mutex;

    fn router() -> (
        MessageRouter,
        HandlerRegistry<Notification>,
        Arc<ConnectionManager>,
        broadcast::Sender<Notification>,
    ) {
        let connection = Arc::new(ConnectionManager::new());
        let handlers = HandlerRegistry::new();
        let (events, _) = broadcast::channel(16);
        let router = MessageRouter::new(Arc::clone(&connection), handlers.clone(), events.clone());
        (router, handlers, connection, events)
    }

    #[tokio::test]
    async fn test_ping_is_answered_with_exact_pong() {
        let (router, _, connection, _) = router();
        let (sink, mut rx) = memory_sink();
        connection.set_writer(sink).await;

        let outcome = router.route(r#"{"type":"ping"}"#).await;
        assert!(matches!(outcome, RouteOutcome::Ponged));

        let sent = rx.next().await.unwrap();
        assert_eq!(sent.to_text().unwrap(), r#"{"type":"pong"}"#);
    }

    #[tokio::test]
    async fn test_ping_without_transport_does_not_fail() {
        let (router, _, _, _) = router();
        let outcome = router.route(r#"{"type":"ping"}"#).await;
        assert!(matches!(outcome, RouteOutcome::Ponged));
    }

    #[tokio::test]
    async fn test_malformed_frame_invokes_no_handler() {
        let (router, handlers, _, events) = router();
        let calls = Arc::new(Mutex::new(0));
        let c = Arc::clone(&calls);
        let _sub = handlers.register(move |_| *c.lock().unwrap() += 1);
        let mut stream = events.subscribe();

        for text in ["not json", "{\"type\":", "[]", r#"{"type":"notification","data":3}"#] {
            let outcome = router.route(text).await;
            assert!(matches!(outcome, RouteOutcome::Dropped(_)), "{text}");
        }

        assert_eq!(*calls.lock().unwrap(), 0);
        assert!(stream.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_notifications_reach_handlers_and_event_stream_in_order() {
        let (router, handlers, _, events) = router();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let _sub = handlers.register(move |n: &Notification| s.lock().unwrap().push(n.id.clone()));
        let mut stream = events.subscribe();

        for id in ["a", "b", "c"] {
            let frame = format!(r#"{{"type":"notification","data":{{"id":"{id}","title":"T"}}}}"#);
            let outcome = router.route(&frame).await;
            assert!(matches!(outcome, RouteOutcome::Delivered(1)));
        }

        assert_eq!(*seen.lock().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(stream.recv().await.unwrap().id, "a");
        assert_eq!(stream.recv().await.unwrap().id, "b");
        assert_eq!(stream.recv().await.unwrap().id, "c");
    }

    #[tokio::test]
    async fn test_other_frames_are_ignored() {
        let (router, _, _, _) = router();
        let outcome = router.route(r#"{"type":"presence","count":3}"#).await;
        assert!(matches!(outcome, RouteOutcome::Ignored(kind) if kind == "presence"));
    }
}
