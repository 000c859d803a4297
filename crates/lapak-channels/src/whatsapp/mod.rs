//! WhatsApp channel — pure Rust implementation via `whatsapp-rust`.
//!
//! Uses the WhatsApp Web protocol (Noise handshake + Signal encryption).
//! Pairing is done by scanning a QR code, like WhatsApp Web. Signal and
//! device state is persisted to `{data_dir}/whatsapp_session/whatsapp.db`
//! by the stock sqlite storage backend.

mod bot;
mod channel;
mod events;
mod qr;


pub use qr::{generate_qr_image, generate_qr_terminal};

use lapak_core::config::WhatsAppConfig;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// WhatsApp channel using the WhatsApp Web protocol.
pub struct WhatsAppChannel {
    pub(super) config: WhatsAppConfig,
    pub(super) data_dir: String,
    /// Client handle for sending messages — set once the bot connects.
    pub(super) client: Arc<Mutex<Option<Arc<whatsapp_rust::client::Client>>>>,
    /// Message IDs we sent — used to ignore our own echo.
    pub(super) sent_ids: Arc<Mutex<HashSet<String>>>,
}

impl WhatsAppChannel {
    /// Create a new WhatsApp channel from config.
    pub fn new(config: WhatsAppConfig, data_dir: &str) -> Self {
        Self {
            config,
            data_dir: data_dir.to_string(),
            client: Arc::new(Mutex::new(None)),
            sent_ids: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Check if the WhatsApp client is currently connected.
    pub async fn is_connected(&self) -> bool {
        self.client.lock().await.is_some()
    }

    /// Get the session database path, creating the directory if needed.
    pub(super) fn session_db_path(&self) -> String {
        let dir = lapak_core::shellexpand(&self.data_dir);
        let session_dir = format!("{dir}/whatsapp_session");
        let _ = std::fs::create_dir_all(&session_dir);
        format!("{session_dir}/whatsapp.db")
    }
}
