//! Gateway — the main event loop connecting the channel, the session
//! store, and the conversation state machine.
//!
//! Includes: admin command handling, whitelist/group filtering, the
//! timeout sweeper, QR file maintenance for the HTTP surface, and
//! graceful shutdown.

use crate::chatlog::ChatLog;
use crate::commands::{self, AdminCommand};
use crate::http;
use chrono::{DateTime, Utc};
use lapak_core::{
    config::Config,
    message::{ChannelEvent, IncomingCall, IncomingMessage, OutgoingMessage},
    shellexpand,
    traits::Channel,
};
use lapak_flow::{
    machine::{self, Timeouts},
    menu, replies,
    session::{Session, SessionState},
};
use lapak_store::SessionStore;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// The central gateway routing chat events through the menu flow.
pub struct Gateway {
    channels: HashMap<String, Arc<dyn Channel>>,
    store: SessionStore,
    config: Config,
    chat_log: ChatLog,
}

impl Gateway {
    /// Create a new gateway.
    pub fn new(
        channels: HashMap<String, Arc<dyn Channel>>,
        store: SessionStore,
        config: Config,
    ) -> Self {
        let chat_log = ChatLog::new(shellexpand(&config.session.chat_log_path));
        Self {
            channels,
            store,
            config,
            chat_log,
        }
    }

    /// Run the main event loop.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        info!(
            "Lapak gateway running | channels: {} | admins: {} | whitelist: {}",
            self.channels.keys().cloned().collect::<Vec<_>>().join(", "),
            self.config.admin.numbers.len(),
            self.config.admin.whitelist.len(),
        );

        let (tx, mut rx) = mpsc::channel::<ChannelEvent>(256);

        for (name, channel) in &self.channels {
            let mut channel_rx = channel
                .start()
                .await
                .map_err(|e| anyhow::anyhow!("failed to start channel {name}: {e}"))?;
            let tx = tx.clone();
            let channel_name = name.clone();

            tokio::spawn(async move {
                while let Some(event) = channel_rx.recv().await {
                    if tx.send(event).await.is_err() {
                        info!("gateway receiver dropped, stopping {channel_name} forwarder");
                        break;
                    }
                }
            });

            info!("Channel started: {name}");
        }

        drop(tx);

        // Spawn the timeout sweeper.
        let sweep_store = self.store.clone();
        let sweep_channels = self.channels.clone();
        let sweep_secs = self.config.session.sweep_interval_secs;
        let sweep_handle = tokio::spawn(async move {
            Self::sweeper_loop(sweep_store, sweep_channels, sweep_secs).await;
        });

        // Spawn the HTTP surface (liveness + pairing QR).
        let http_handle = tokio::spawn(http::serve(self.config.http.clone(), self.qr_path()));

        // Main event loop with graceful shutdown.
        loop {
            tokio::select! {
                Some(event) = rx.recv() => {
                    self.handle_event(event).await;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        self.shutdown(&sweep_handle, &http_handle).await;
        Ok(())
    }

    /// Graceful shutdown: stop background tasks and channels.
    async fn shutdown(
        &self,
        sweep_handle: &tokio::task::JoinHandle<()>,
        http_handle: &tokio::task::JoinHandle<()>,
    ) {
        info!("Shutting down...");
        sweep_handle.abort();
        http_handle.abort();

        for (name, channel) in &self.channels {
            if let Err(e) = channel.stop().await {
                warn!("failed to stop channel {name}: {e}");
            }
        }

        info!("Shutdown complete.");
    }

    async fn handle_event(&self, event: ChannelEvent) {
        match event {
            ChannelEvent::Message(incoming) => self.handle_message(incoming).await,
            ChannelEvent::Call(call) => self.handle_call(call).await,
            ChannelEvent::Qr(payload) => self.handle_qr(&payload),
            ChannelEvent::Ready => {
                info!("channel paired and ready");
                // The pairing QR is stale from here on.
                let _ = std::fs::remove_file(self.qr_path());
            }
        }
    }

    /// Process one inbound chat message through the full pipeline.
    async fn handle_message(&self, incoming: IncomingMessage) {
        // --- 1. CHAT LOG ---
        self.chat_log.append(&incoming.sender_id, &incoming.text);

        // --- 2. ADMIN COMMAND CHECK ---
        if self.config.admin.is_admin(&incoming.sender_id) {
            if let Some(cmd) = AdminCommand::parse(&incoming.text) {
                info!("admin command from {}: {cmd:?}", incoming.sender_id);
                let response = commands::handle(cmd, &self.store).await;
                self.send_text(
                    &incoming.channel,
                    incoming.reply_target.as_deref(),
                    &response,
                )
                .await;
            }
            // Admin chatter outside the grammar stays unanswered, like
            // any other whitelisted sender.
            return;
        }

        // --- 3. WHITELIST / GROUP FILTER ---
        if self.config.admin.is_whitelisted(&incoming.sender_id) {
            debug!("ignoring whitelisted sender {}", incoming.sender_id);
            return;
        }
        if incoming.is_group {
            debug!("ignoring group message from {}", incoming.sender_id);
            return;
        }

        let now = Utc::now();

        // --- 4. SESSION LOOKUP / CREATE + STATE MACHINE ---
        let reply = match self.store.get(&incoming.sender_id).await {
            None => {
                // First contact consumes the triggering message and
                // greets with the main menu.
                self.store
                    .upsert(Session::new(&incoming.sender_id, now))
                    .await;
                info!("new session for {}", incoming.sender_id);
                menu::MAIN.render()
            }
            Some(mut session) => {
                let reply =
                    machine::advance(&mut session, incoming.text.trim(), now, self.timeouts());
                // --- 5. PERSIST ---
                self.store.upsert(session).await;
                reply
            }
        };

        // --- 6. REPLY ---
        self.send_text(&incoming.channel, incoming.reply_target.as_deref(), &reply)
            .await;
    }

    /// Call policy: reject calls from non-whitelisted callers and explain
    /// over chat. Stateless — never touches the session machine.
    async fn handle_call(&self, call: IncomingCall) {
        if self.config.admin.is_whitelisted(&call.sender_id) {
            debug!("allowing call from whitelisted {}", call.sender_id);
            return;
        }

        info!("rejecting call from {}", call.sender_id);
        if let Some(channel) = self.channels.get(&call.channel) {
            if let Err(e) = channel.reject_call(&call).await {
                warn!("failed to reject call from {}: {e}", call.sender_id);
            }
            self.send_text(
                &call.channel,
                call.reply_target.as_deref(),
                replies::CALL_REJECTED,
            )
            .await;
        } else {
            error!("no channel found for '{}'", call.channel);
        }
    }

    /// Persist the pairing QR as a PNG for the `/qr` endpoint.
    fn handle_qr(&self, payload: &str) {
        let path = self.qr_path();
        match lapak_channels::whatsapp::generate_qr_image(payload) {
            Ok(png) => {
                if let Some(parent) = path.parent() {
                    let _ = std::fs::create_dir_all(parent);
                }
                if let Err(e) = std::fs::write(&path, png) {
                    warn!("failed to write QR image to {}: {e}", path.display());
                } else {
                    info!("pairing QR updated, available at /qr");
                }
            }
            Err(e) => warn!("QR image generation failed: {e}"),
        }
    }

    fn qr_path(&self) -> PathBuf {
        PathBuf::from(shellexpand(&self.config.bot.data_dir)).join("qr.png")
    }

    fn timeouts(&self) -> Timeouts {
        Timeouts::from_secs(
            self.config.session.call_timeout_secs,
            self.config.session.order_timeout_secs,
        )
    }

    /// Background task: expire sessions stuck in a waiting state.
    async fn sweeper_loop(
        store: SessionStore,
        channels: HashMap<String, Arc<dyn Channel>>,
        poll_secs: u64,
    ) {
        loop {
            tokio::time::sleep(std::time::Duration::from_secs(poll_secs)).await;
            sweep_once(&store, &channels, Utc::now()).await;
        }
    }

    /// Send a plain text message through a named channel.
    async fn send_text(&self, channel_name: &str, target: Option<&str>, text: &str) {
        let msg = OutgoingMessage {
            text: text.to_string(),
            reply_target: target.map(str::to_string),
        };

        if let Some(channel) = self.channels.get(channel_name) {
            if let Err(e) = channel.send(msg).await {
                error!("failed to send message via {channel_name}: {e}");
            }
        } else {
            error!("no channel found for '{channel_name}'");
        }
    }
}

/// One sweeper pass. Performs the same reset the dispatcher would:
/// replace the expired session with a fresh one, notify the customer,
/// re-send the main menu. Idempotent when nothing has expired: no writes,
/// no sends.
pub(crate) async fn sweep_once(
    store: &SessionStore,
    channels: &HashMap<String, Arc<dyn Channel>>,
    now: DateTime<Utc>,
) {
    for (id, session) in store.all().await {
        if !session.is_expired(now) {
            continue;
        }

        let notice = match session.state {
            SessionState::IzinCall => replies::CALL_EXPIRED,
            SessionState::PendingAdmin => replies::ORDER_EXPIRED,
            // expires_at only exists on waiting states.
            _ => continue,
        };

        info!("session {id} expired in {:?}, resetting", session.state);
        store.upsert(Session::new(&id, now)).await;

        // The session key itself addresses the customer on the (sole)
        // chat channel; the channel completes it into a full address.
        let main_menu = menu::MAIN.render();
        for channel in channels.values() {
            for text in [notice, main_menu.as_str()] {
                let msg = OutgoingMessage {
                    text: text.to_string(),
                    reply_target: Some(id.clone()),
                };
                if let Err(e) = channel.send(msg).await {
                    error!("failed to send expiry notice to {id}: {e}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lapak_core::config::AdminConfig;
    use lapak_core::error::LapakError;
    use lapak_store::MemoryBackend;
    use tokio::sync::Mutex;
    use uuid::Uuid;

    /// Channel double that records every outgoing message.
    #[derive(Default)]
    struct MockChannel {
        sent: Mutex<Vec<OutgoingMessage>>,
        rejected_calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Channel for MockChannel {
        fn name(&self) -> &str {
            "mock"
        }

        async fn start(&self) -> Result<mpsc::Receiver<ChannelEvent>, LapakError> {
            let (_tx, rx) = mpsc::channel(1);
            Ok(rx)
        }

        async fn send(&self, message: OutgoingMessage) -> Result<(), LapakError> {
            self.sent.lock().await.push(message);
            Ok(())
        }

        async fn reject_call(&self, call: &IncomingCall) -> Result<(), LapakError> {
            self.rejected_calls.lock().await.push(call.call_id.clone());
            Ok(())
        }

        async fn stop(&self) -> Result<(), LapakError> {
            Ok(())
        }
    }

    fn test_config() -> Config {
        let mut cfg = Config::default();
        cfg.bot.data_dir = std::env::temp_dir()
            .join("__lapak_test_gateway__")
            .to_string_lossy()
            .into_owned();
        cfg.session.chat_log_path = format!("{}/logs.txt", cfg.bot.data_dir);
        cfg.admin = AdminConfig {
            numbers: vec!["628999".to_string()],
            whitelist: vec!["628888".to_string()],
        };
        cfg
    }

    async fn test_gateway() -> (Gateway, Arc<MockChannel>, SessionStore) {
        let channel = Arc::new(MockChannel::default());
        let mut channels: HashMap<String, Arc<dyn Channel>> = HashMap::new();
        channels.insert("mock".to_string(), channel.clone());
        let store = SessionStore::open(Arc::new(MemoryBackend::default()))
            .await
            .unwrap();
        let gateway = Gateway::new(channels, store.clone(), test_config());
        (gateway, channel, store)
    }

    fn incoming(sender: &str, text: &str) -> IncomingMessage {
        IncomingMessage {
            id: Uuid::new_v4(),
            channel: "mock".to_string(),
            sender_id: sender.to_string(),
            sender_name: None,
            text: text.to_string(),
            timestamp: Utc::now(),
            reply_target: Some(sender.to_string()),
            is_group: false,
        }
    }

    #[tokio::test]
    async fn test_first_contact_creates_session_and_greets() {
        let (gateway, channel, store) = test_gateway().await;

        gateway.handle_message(incoming("628123", "hello")).await;

        let session = store.get("628123").await.expect("session created");
        assert_eq!(session.state, SessionState::Menu);

        let sent = channel.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].text.contains("MENU UTAMA"));
        assert_eq!(sent[0].reply_target.as_deref(), Some("628123"));
    }

    #[tokio::test]
    async fn test_second_message_advances_the_flow() {
        let (gateway, channel, store) = test_gateway().await;

        gateway.handle_message(incoming("628123", "hello")).await;
        gateway.handle_message(incoming("628123", "TOP UP")).await;

        let session = store.get("628123").await.unwrap();
        assert_eq!(session.state, SessionState::TopupNominal);

        let sent = channel.sent.lock().await;
        assert!(sent[1].text.contains("150K"));
    }

    #[tokio::test]
    async fn test_whitelisted_and_group_messages_are_ignored() {
        let (gateway, channel, store) = test_gateway().await;

        gateway.handle_message(incoming("628888", "hello")).await;

        let mut group = incoming("628777", "hello");
        group.is_group = true;
        gateway.handle_message(group).await;

        assert!(store.all().await.is_empty(), "no sessions may be created");
        assert!(channel.sent.lock().await.is_empty(), "no replies may be sent");
    }

    #[tokio::test]
    async fn test_admin_close_deletes_session_without_messaging_customer() {
        let (gateway, channel, store) = test_gateway().await;
        store.upsert(Session::new("628123", Utc::now())).await;

        gateway
            .handle_message(incoming("628999", "close 628123"))
            .await;

        assert!(store.get("628123").await.is_none());
        let sent = channel.sent.lock().await;
        assert_eq!(sent.len(), 1, "only the admin confirmation goes out");
        assert_eq!(sent[0].reply_target.as_deref(), Some("628999"));
        assert!(sent[0].text.contains("ditutup"));
    }

    #[tokio::test]
    async fn test_admin_chatter_is_silently_ignored() {
        let (gateway, channel, store) = test_gateway().await;

        gateway.handle_message(incoming("628999", "halo juga")).await;

        assert!(store.all().await.is_empty());
        assert!(channel.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_call_from_customer_is_rejected_with_notice() {
        let (gateway, channel, _store) = test_gateway().await;

        gateway
            .handle_call(IncomingCall {
                channel: "mock".to_string(),
                sender_id: "628123".to_string(),
                call_id: "call-1".to_string(),
                reply_target: Some("628123".to_string()),
            })
            .await;

        assert_eq!(*channel.rejected_calls.lock().await, vec!["call-1"]);
        let sent = channel.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].text.contains("panggilan tidak diizinkan"));
    }

    #[tokio::test]
    async fn test_call_from_whitelisted_passes_through() {
        let (gateway, channel, _store) = test_gateway().await;

        gateway
            .handle_call(IncomingCall {
                channel: "mock".to_string(),
                sender_id: "628888".to_string(),
                call_id: "call-2".to_string(),
                reply_target: Some("628888".to_string()),
            })
            .await;

        assert!(channel.rejected_calls.lock().await.is_empty());
        assert!(channel.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_sweep_expires_pending_admin_session() {
        let (_, channel, store) = test_gateway().await;
        let mut channels: HashMap<String, Arc<dyn Channel>> = HashMap::new();
        channels.insert("mock".to_string(), channel.clone());

        let now = Utc::now();
        let mut session = Session::new("628123", now);
        session.state = SessionState::PendingAdmin;
        session.expires_at = Some(now - chrono::Duration::seconds(1));
        store.upsert(session).await;

        sweep_once(&store, &channels, now).await;

        let reset = store.get("628123").await.unwrap();
        assert_eq!(reset.state, SessionState::Menu);
        assert!(reset.expires_at.is_none());

        let sent = channel.sent.lock().await;
        assert_eq!(sent.len(), 2, "expiry notice plus main menu");
        assert!(sent[0].text.contains("ditutup otomatis"));
        assert!(sent[1].text.contains("MENU UTAMA"));
    }

    #[tokio::test]
    async fn test_sweep_uses_call_notice_for_izin_call() {
        let (_, channel, store) = test_gateway().await;
        let mut channels: HashMap<String, Arc<dyn Channel>> = HashMap::new();
        channels.insert("mock".to_string(), channel.clone());

        let now = Utc::now();
        let mut session = Session::new("628123", now);
        session.state = SessionState::IzinCall;
        session.expires_at = Some(now - chrono::Duration::seconds(1));
        store.upsert(session).await;

        sweep_once(&store, &channels, now).await;

        let sent = channel.sent.lock().await;
        assert!(sent[0].text.contains("berakhir otomatis"));
    }

    #[tokio::test]
    async fn test_sweep_is_idempotent_when_nothing_expired() {
        let (_, channel, store) = test_gateway().await;
        let mut channels: HashMap<String, Arc<dyn Channel>> = HashMap::new();
        channels.insert("mock".to_string(), channel.clone());

        let now = Utc::now();
        let mut session = Session::new("628123", now);
        session.state = SessionState::PendingAdmin;
        session.expires_at = Some(now + chrono::Duration::seconds(3600));
        store.upsert(session.clone()).await;

        sweep_once(&store, &channels, now).await;

        assert_eq!(store.get("628123").await, Some(session), "no writes");
        assert!(channel.sent.lock().await.is_empty(), "no messages");
    }
}
