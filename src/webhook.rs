//! Webhook transport — verification handshake and inbound message intake.
//!
//! Normalizes the Meta WhatsApp envelope to [`IncomingMessage`] and hands
//! each text message to the router on a spawned task so the webhook can
//! acknowledge quickly.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::convo::{ConversationRouter, IncomingMessage};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ConversationRouter>,
    pub verify_token: String,
}

/// Build the Axum router with webhook and health routes.
pub fn webhook_routes(router: Arc<ConversationRouter>, verify_token: String) -> Router {
    let state = AppState {
        router,
        verify_token,
    };

    Router::new()
        .route("/health", get(health))
        .route("/webhook/whatsapp", get(verify_webhook).post(receive_webhook))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "foliobot"
    }))
}

/// Meta webhook verification handshake:
/// `?hub.mode=subscribe&hub.verify_token=...&hub.challenge=...`
async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let mode = params.get("hub.mode").map(String::as_str);
    let token = params.get("hub.verify_token").map(String::as_str);
    let challenge = params.get("hub.challenge").cloned().unwrap_or_default();

    if mode == Some("subscribe") && token == Some(state.verify_token.as_str()) {
        info!("Webhook verified");
        (StatusCode::OK, challenge)
    } else {
        warn!("Webhook verification rejected");
        (StatusCode::FORBIDDEN, String::new())
    }
}

// ── Envelope ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
struct Change {
    #[serde(default)]
    value: Option<ChangeValue>,
}

#[derive(Debug, Deserialize)]
struct ChangeValue {
    #[serde(default)]
    messages: Vec<WebhookMessage>,
}

#[derive(Debug, Deserialize)]
struct WebhookMessage {
    from: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<TextBody>,
}

#[derive(Debug, Deserialize)]
struct TextBody {
    body: String,
}

/// Flatten the webhook envelope into normalized inbound messages.
fn extract_messages(envelope: Envelope) -> Vec<IncomingMessage> {
    let mut out = Vec::new();
    for entry in envelope.entry {
        for change in entry.changes {
            let Some(value) = change.value else { continue };
            for message in value.messages {
                if message.kind != "text" {
                    debug!(kind = %message.kind, "Ignoring non-text message");
                    continue;
                }
                let Some(text) = message.text else { continue };
                let mut normalized = IncomingMessage::new(message.from, text.body);
                if let Some(id) = message.id {
                    normalized = normalized.with_message_id(id);
                }
                out.push(normalized);
            }
        }
    }
    out
}

/// Inbound webhook deliveries. Responds 200 immediately; processing runs on
/// spawned tasks (the router serializes per sender internally).
async fn receive_webhook(
    State(state): State<AppState>,
    Json(envelope): Json<Envelope>,
) -> impl IntoResponse {
    for message in extract_messages(envelope) {
        debug!(sender = %message.sender, "Inbound message");
        let router = Arc::clone(&state.router);
        tokio::spawn(async move {
            router.handle_message(message).await;
        });
    }
    StatusCode::OK
}
