//! Incoming WhatsApp message handling — unwrapping and forwarding.
//!
//! The channel forwards every customer message, flagging group chats;
//! whitelist and group policy live in the gateway, not here.

use lapak_core::message::{ChannelEvent, IncomingMessage};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

/// Process an incoming WhatsApp message event.
pub(super) async fn handle_incoming_message(
    msg: waproto::whatsapp::Message,
    info: wacore::types::message::MessageInfo,
    tx: &mpsc::Sender<ChannelEvent>,
    sent_ids: &Arc<Mutex<HashSet<String>>>,
) {
    // Our own outgoing messages come back as events too; never dispatch them.
    if info.source.is_from_me {
        return;
    }

    let msg_id = info.id.clone();
    if sent_ids.lock().await.remove(&msg_id) {
        debug!("skipping own echo: {msg_id}");
        return;
    }

    // Unwrap nested wrappers (device_sent, ephemeral, view_once).
    let inner = msg
        .device_sent_message
        .as_ref()
        .and_then(|d| d.message.as_deref())
        .or_else(|| {
            msg.ephemeral_message
                .as_ref()
                .and_then(|e| e.message.as_deref())
        })
        .or_else(|| {
            msg.view_once_message
                .as_ref()
                .and_then(|v| v.message.as_deref())
        })
        .unwrap_or(&msg);

    let text = inner
        .conversation
        .as_deref()
        .or_else(|| {
            inner
                .extended_text_message
                .as_ref()
                .and_then(|e| e.text.as_deref())
        })
        .unwrap_or("")
        .to_string();

    // Media and other non-text payloads have no meaning in a button flow.
    if text.is_empty() {
        debug!("skipping non-text whatsapp message {msg_id}");
        return;
    }

    let phone = info.source.sender.user.clone();
    let sender_name = if info.push_name.is_empty() {
        phone.clone()
    } else {
        info.push_name.clone()
    };

    let incoming = IncomingMessage {
        id: Uuid::new_v4(),
        channel: "whatsapp".to_string(),
        sender_id: phone,
        sender_name: Some(sender_name),
        text,
        timestamp: chrono::Utc::now(),
        reply_target: Some(info.source.chat.to_string()),
        is_group: info.source.is_group,
    };

    if tx.send(ChannelEvent::Message(incoming)).await.is_err() {
        info!("whatsapp channel receiver dropped");
    }
}
