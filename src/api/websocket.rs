//! Realtime hospital directory feed over WebSocket.
//!
//! Connection lifecycle:
//! 1. Client opens `GET /ws/hospitals`; the feed subscription is taken
//!    before the upgrade completes so no write is missed.
//! 2. Server sends `subscribed`.
//! 3. Every hospital insert/update/delete is forwarded as a `change`.
//! 4. If the client falls behind the feed buffer it gets `resync` and
//!    should refetch `GET /api/hospitals`.
//! 5. Heartbeat every 30s until the client closes.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{Sink, SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;

use crate::api::types::ApiContext;
use crate::models::Hospital;
use crate::realtime::ChangeEvent;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Server → client messages.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsOutgoing {
    Subscribed { channel: &'static str },
    Change { change: ChangeEvent<Hospital> },
    Resync { missed: u64 },
    Heartbeat { server_time: String },
}

/// `GET /ws/hospitals`
pub async fn hospitals(ws: WebSocketUpgrade, State(ctx): State<ApiContext>) -> impl IntoResponse {
    let feed = ctx.hospital_feed().subscribe();
    tracing::info!(subscribers = ctx.hospital_feed().subscriber_count(), "Hospital feed subscriber joined");
    ws.on_upgrade(move |socket| handle_ws(socket, feed))
}

async fn handle_ws(socket: WebSocket, mut feed: Receiver<ChangeEvent<Hospital>>) {
    let (mut sink, mut stream) = socket.split();

    if !send(&mut sink, &WsOutgoing::Subscribed { channel: "hospitals" }).await {
        return;
    }

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await; // Consume initial immediate tick

    loop {
        let outgoing = tokio::select! {
            msg = stream.next() => match msg {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                // Client messages carry nothing; Ping/Pong handled by axum/tungstenite
                Some(Ok(_)) => continue,
            },
            event = feed.recv() => match event {
                Ok(change) => WsOutgoing::Change { change },
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Hospital feed subscriber lagged");
                    WsOutgoing::Resync { missed }
                }
                Err(RecvError::Closed) => break,
            },
            _ = heartbeat.tick() => WsOutgoing::Heartbeat {
                server_time: chrono::Utc::now().to_rfc3339(),
            },
        };

        if !send(&mut sink, &outgoing).await {
            break;
        }
    }

    let _ = sink.close().await;
    tracing::info!("Hospital feed subscriber left");
}

/// Returns false once the client is gone.
async fn send<S>(sink: &mut S, msg: &WsOutgoing) -> bool
where
    S: Sink<Message> + Unpin,
{
    let json = match serde_json::to_string(msg) {
        Ok(j) => j,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode feed message");
            return true;
        }
    };
    sink.send(Message::Text(json)).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite;

    use crate::api::router::api_router_with_ctx;
    use crate::core_state::CoreState;
    use crate::models::HospitalInput;

    #[test]
    fn messages_are_tagged_by_type() {
        let json = serde_json::to_value(WsOutgoing::Resync { missed: 3 }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "resync", "missed": 3}));

        let id = uuid::Uuid::new_v4();
        let json = serde_json::to_value(WsOutgoing::Change {
            change: ChangeEvent::Delete(id),
        })
        .unwrap();
        assert_eq!(json["type"], "change");
        assert_eq!(json["change"]["event"], "delete");
        assert_eq!(json["change"]["record"], id.to_string());
    }

    async fn setup_ws_server() -> (String, ApiContext, tempfile::TempDir, tokio::task::JoinHandle<()>) {
        let tmp = tempfile::tempdir().unwrap();
        let core = Arc::new(CoreState::open(tmp.path().join("ws.db")).unwrap());
        let ctx = ApiContext::new(core);
        let app = api_router_with_ctx(ctx.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("ws://127.0.0.1:{}/ws/hospitals", addr.port()), ctx, tmp, handle)
    }

    async fn next_json<S>(ws: &mut S) -> serde_json::Value
    where
        S: StreamExt<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
    {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timeout waiting for message")
            .expect("stream ended")
            .expect("WS error");
        serde_json::from_str(&msg.into_text().expect("not text")).unwrap()
    }

    #[tokio::test]
    async fn connect_receives_subscribed() {
        let (url, _ctx, _tmp, server) = setup_ws_server().await;
        let (mut ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("WS connect failed");

        let welcome = next_json(&mut ws).await;
        assert_eq!(welcome["type"], "subscribed");
        assert_eq!(welcome["channel"], "hospitals");

        let _ = ws.close(None).await;
        server.abort();
    }

    #[tokio::test]
    async fn published_changes_are_forwarded() {
        let (url, ctx, _tmp, server) = setup_ws_server().await;
        let (mut ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("WS connect failed");
        let _ = next_json(&mut ws).await;

        let hospital = Hospital::from_input(
            HospitalInput {
                name: "Garki Hospital".into(),
                address: "Tafawa Balewa Way".into(),
                state: "FCT".into(),
                rating: 4.0,
                ..Default::default()
            },
            chrono::Utc::now(),
        );
        ctx.publish_hospital(ChangeEvent::Insert(hospital.clone()));

        let msg = next_json(&mut ws).await;
        assert_eq!(msg["type"], "change");
        assert_eq!(msg["change"]["event"], "insert");
        assert_eq!(msg["change"]["record"]["id"], hospital.id.to_string());

        ctx.publish_hospital(ChangeEvent::Delete(hospital.id));
        let msg = next_json(&mut ws).await;
        assert_eq!(msg["change"]["event"], "delete");

        let _ = ws.close(None).await;
        server.abort();
    }

    #[tokio::test]
    async fn http_writes_reach_socket() {
        let (url, _ctx, _tmp, server) = setup_ws_server().await;
        let (mut ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("WS connect failed");
        let _ = next_json(&mut ws).await;

        let http_url = url.replace("ws://", "http://").replace("/ws/hospitals", "/api/hospitals");
        let resp = reqwest::Client::new()
            .post(&http_url)
            .json(&serde_json::json!({
                "name": "Aminu Kano Teaching Hospital",
                "address": "Zaria Rd",
                "state": "Kano",
                "rating": 4.1
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::CREATED);

        let msg = next_json(&mut ws).await;
        assert_eq!(msg["change"]["record"]["name"], "Aminu Kano Teaching Hospital");

        let _ = ws.close(None).await;
        server.abort();
    }
}
