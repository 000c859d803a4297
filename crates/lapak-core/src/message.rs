use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An incoming chat message from a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Channel name (e.g. "whatsapp").
    pub channel: String,
    /// Platform-specific sender ID (phone number without server suffix).
    pub sender_id: String,
    /// Human-readable sender name.
    pub sender_name: Option<String>,
    /// Message text content.
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Platform-specific target for routing the reply (e.g. full JID).
    #[serde(default)]
    pub reply_target: Option<String>,
    /// Whether this message comes from a group chat.
    #[serde(default)]
    pub is_group: bool,
}

/// An outgoing message to send back through a channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub text: String,
    /// Platform-specific target. A bare customer id is acceptable; the
    /// channel completes it into a full address.
    #[serde(default)]
    pub reply_target: Option<String>,
}

/// An incoming voice/video call offer.
#[derive(Debug, Clone)]
pub struct IncomingCall {
    /// Channel the offer arrived on.
    pub channel: String,
    /// Platform-specific caller ID (phone number without server suffix).
    pub sender_id: String,
    /// Platform-specific call identifier, needed to reject the offer.
    pub call_id: String,
    /// Target for routing the rejection notice back to the caller.
    pub reply_target: Option<String>,
}

/// Everything a channel can hand to the gateway.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// A chat message arrived.
    Message(IncomingMessage),
    /// A call offer arrived.
    Call(IncomingCall),
    /// A pairing QR code payload was (re)generated.
    Qr(String),
    /// The channel is paired and connected.
    Ready,
}
