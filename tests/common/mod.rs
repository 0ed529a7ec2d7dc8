#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::{WebSocketStream, accept_hdr_async};

pub const WAIT: Duration = Duration::from_secs(5);

/// In-process notification server accepting any number of connections
pub struct TestServer {
    pub url: String,
    connections: mpsc::UnboundedReceiver<ServerConn>,
}

/// One accepted connection and the query string it was opened with
pub struct ServerConn {
    pub query: Option<String>,
    pub ws: WebSocketStream<TcpStream>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, connections) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let (query_tx, query_rx) = oneshot::channel();
                let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
                    let _ = query_tx.send(req.uri().query().map(str::to_string));
                    Ok(resp)
                };

                let Ok(ws) = accept_hdr_async(stream, callback).await else {
                    continue;
                };
                let query = query_rx.await.ok().flatten();
                if tx.send(ServerConn { query, ws }).is_err() {
                    break;
                }
            }
        });

        Self {
            url: format!("ws://{addr}/ws/notifications"),
            connections,
        }
    }

    pub async fn next_conn(&mut self) -> ServerConn {
        tokio::time::timeout(WAIT, self.connections.recv())
            .await
            .expect("timed out waiting for a connection")
            .expect("server stopped")
    }

    /// Assert no client connects within `wait`
    pub async fn expect_no_conn(&mut self, wait: Duration) {
        if let Ok(Some(_)) = tokio::time::timeout(wait, self.connections.recv()).await {
            panic!("unexpected connection");
        }
    }
}

impl ServerConn {
    pub async fn send_text(&mut self, text: &str) {
        self.ws.send(Message::text(text)).await.unwrap();
    }

    /// Next text frame from the client, skipping control frames
    pub async fn recv_text(&mut self) -> String {
        loop {
            let msg = tokio::time::timeout(WAIT, self.ws.next())
                .await
                .expect("timed out waiting for a frame")
                .expect("connection ended")
                .unwrap();
            if msg.is_text() {
                return msg.to_text().unwrap().to_string();
            }
        }
    }

    /// Wait until the client closes its side
    pub async fn expect_closed(&mut self) {
        tokio::time::timeout(WAIT, async {
            while let Some(Ok(msg)) = self.ws.next().await {
                if msg.is_close() {
                    break;
                }
            }
        })
        .await
        .expect("client did not close");
    }
}

pub fn notification_frame(id: &str, title: &str) -> String {
    serde_json::json!({
        "type": "notification",
        "data": {
            "id": id,
            "title": title,
            "body": format!("{title} body"),
            "type": "comment",
            "created_at": "2024-05-01T12:00:00Z",
            "data": {"post_id": 42}
        }
    })
    .to_string()
}

/// Poll `check` until it holds or the wait runs out
pub async fn eventually(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(WAIT, async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
