//! Channel trait implementation for WhatsApp.

use super::WhatsAppChannel;
use async_trait::async_trait;
use lapak_core::{
    error::LapakError,
    message::{ChannelEvent, IncomingCall, OutgoingMessage},
    traits::Channel,
};
use tokio::sync::mpsc;
use tracing::info;
use wacore_binary::jid::Jid;

/// Server suffix for personal chats; a bare phone number is completed
/// into `{number}@s.whatsapp.net`.
const USER_SERVER: &str = "s.whatsapp.net";

impl WhatsAppChannel {
    /// Turn a reply target into a JID. Full JIDs pass through; bare
    /// customer ids (as stored in the session file) get the user server
    /// appended.
    pub(super) fn resolve_jid(target: &str) -> Result<Jid, LapakError> {
        let jid_str = if target.contains('@') {
            target.to_string()
        } else {
            format!("{target}@{USER_SERVER}")
        };
        jid_str
            .parse()
            .map_err(|e| LapakError::Channel(format!("invalid whatsapp JID '{jid_str}': {e}")))
    }

    /// Send a text message. Single attempt: delivery failure surfaces to
    /// the caller, which logs it and moves on.
    async fn send_text(&self, target: &str, text: &str) -> Result<(), LapakError> {
        let client_guard = self.client.lock().await;
        let client = client_guard
            .as_ref()
            .ok_or_else(|| LapakError::Channel("whatsapp client not connected".into()))?;

        let jid = Self::resolve_jid(target)?;
        let msg = waproto::whatsapp::Message {
            conversation: Some(text.to_string()),
            ..Default::default()
        };

        let msg_id = client
            .send_message(jid, msg)
            .await
            .map_err(|e| LapakError::Channel(format!("whatsapp send failed: {e}")))?;

        // Track sent message ID to ignore our own echo.
        self.sent_ids.lock().await.insert(msg_id);

        Ok(())
    }
}

#[async_trait]
impl Channel for WhatsAppChannel {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn start(&self) -> Result<mpsc::Receiver<ChannelEvent>, LapakError> {
        let (tx, rx) = mpsc::channel(64);
        self.build_and_run_bot(tx).await?;
        info!("WhatsApp channel started");
        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), LapakError> {
        let target = message
            .reply_target
            .as_deref()
            .ok_or_else(|| LapakError::Channel("no reply_target on outgoing message".into()))?;

        self.send_text(target, &message.text).await
    }

    async fn reject_call(&self, call: &IncomingCall) -> Result<(), LapakError> {
        let client_guard = self.client.lock().await;
        let client = client_guard
            .as_ref()
            .ok_or_else(|| LapakError::Channel("whatsapp client not connected".into()))?;

        let caller = Self::resolve_jid(
            call.reply_target.as_deref().unwrap_or(&call.sender_id),
        )?;

        client
            .reject_call(&caller, &call.call_id)
            .await
            .map_err(|e| LapakError::Channel(format!("whatsapp call reject failed: {e}")))?;

        Ok(())
    }

    async fn stop(&self) -> Result<(), LapakError> {
        info!("WhatsApp channel stopped");
        *self.client.lock().await = None;
        Ok(())
    }
}
