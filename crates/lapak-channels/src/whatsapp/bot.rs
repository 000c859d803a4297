//! Bot lifecycle — building the WhatsApp bot and mapping its events.

use super::events::handle_incoming_message;
use super::WhatsAppChannel;
use lapak_core::{
    error::LapakError,
    message::{ChannelEvent, IncomingCall},
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use wacore::types::events::Event;
use whatsapp_rust::bot::Bot;
use whatsapp_rust_sqlite_storage::SqliteStoreBackend;
use whatsapp_rust_tokio_transport::TokioWebSocketTransportFactory;
use whatsapp_rust_ureq_http_client::UreqHttpClient;

impl WhatsAppChannel {
    /// Build the WhatsApp bot with the event handler and run it in the
    /// background. Library events are translated into `ChannelEvent`s;
    /// everything else about the protocol stays inside `whatsapp-rust`.
    pub(super) async fn build_and_run_bot(
        &self,
        tx: mpsc::Sender<ChannelEvent>,
    ) -> Result<(), LapakError> {
        let db_path = self.session_db_path();
        let client_handle = self.client.clone();

        info!("WhatsApp bot building (session: {db_path})...");

        let backend = Arc::new(
            SqliteStoreBackend::new(&db_path)
                .await
                .map_err(|e| LapakError::Channel(format!("whatsapp store init failed: {e}")))?,
        );

        let client_for_event = client_handle.clone();
        let sent_ids_for_event = self.sent_ids.clone();

        let mut bot = Bot::builder()
            .with_backend(backend)
            .with_transport_factory(TokioWebSocketTransportFactory::new())
            .with_http_client(UreqHttpClient::new())
            .with_device_props(
                Some(self.config.device_name.clone()),
                None,
                Some(waproto::whatsapp::device_props::PlatformType::Desktop),
            )
            .on_event(move |event, client| {
                let tx = tx.clone();
                let client_store = client_for_event.clone();
                let sent_ids = sent_ids_for_event.clone();
                async move {
                    match event {
                        Event::PairingQrCode { code, .. } => {
                            info!("WhatsApp QR code generated (scan to pair)");
                            let _ = tx.send(ChannelEvent::Qr(code)).await;
                        }
                        Event::PairSuccess(_) => {
                            info!("WhatsApp pairing successful");
                        }
                        Event::Connected(_) => {
                            info!("WhatsApp connected");
                            *client_store.lock().await = Some(client);
                            let _ = tx.send(ChannelEvent::Ready).await;
                        }
                        Event::Disconnected(_) => {
                            // No reconnect logic here: a restart is the
                            // recovery path for a lost connection.
                            warn!("WhatsApp disconnected");
                            *client_store.lock().await = None;
                        }
                        Event::LoggedOut(_) => {
                            warn!("WhatsApp logged out - session invalidated");
                            *client_store.lock().await = None;
                        }
                        Event::Message(msg, info) => {
                            handle_incoming_message(*msg, info, &tx, &sent_ids).await;
                        }
                        Event::CallOffer(offer) => {
                            let call = IncomingCall {
                                channel: "whatsapp".to_string(),
                                sender_id: offer.from.user.clone(),
                                call_id: offer.call_id.clone(),
                                reply_target: Some(offer.from.to_string()),
                            };
                            let _ = tx.send(ChannelEvent::Call(call)).await;
                        }
                        _ => {}
                    }
                }
            })
            .build()
            .await
            .map_err(|e| LapakError::Channel(format!("whatsapp bot build failed: {e}")))?;

        // Store client reference immediately if already connected.
        *client_handle.lock().await = Some(bot.client());

        // Run bot in background.
        let _handle = bot
            .run()
            .await
            .map_err(|e| LapakError::Channel(format!("whatsapp bot run failed: {e}")))?;

        info!("WhatsApp bot started");
        Ok(())
    }
}
