use crate::{
    error::LapakError,
    message::{ChannelEvent, IncomingCall, OutgoingMessage},
};
use async_trait::async_trait;

/// Messaging Channel trait — the transport seam.
///
/// The gateway only ever talks to this trait; the WhatsApp implementation
/// (and the test mock) live behind it.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Start listening for events.
    /// Returns a receiver that yields incoming channel events.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<ChannelEvent>, LapakError>;

    /// Send a message through this channel. Single attempt; failures are
    /// the caller's to log, never retried.
    async fn send(&self, message: OutgoingMessage) -> Result<(), LapakError>;

    /// Reject an incoming call offer.
    async fn reject_call(&self, call: &IncomingCall) -> Result<(), LapakError>;

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), LapakError>;
}
