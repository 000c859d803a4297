use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::LapakError;

/// Top-level Lapak configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
}

/// General bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// Admin and exempt identities.
///
/// Identifiers are bare phone numbers (e.g. `"628123456789"`), matching
/// the sender ids the channel produces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Admin phone numbers. Admin messages are only ever interpreted as
    /// commands, never dispatched to the menu flow.
    #[serde(default)]
    pub numbers: Vec<String>,
    /// Exempt identities (family phones etc.) the bot never auto-replies to.
    #[serde(default)]
    pub whitelist: Vec<String>,
}

impl AdminConfig {
    /// Whether `id` is an admin identity.
    pub fn is_admin(&self, id: &str) -> bool {
        self.numbers.iter().any(|n| n == id)
    }

    /// Whether `id` is exempt from auto-replies (admins included).
    pub fn is_whitelisted(&self, id: &str) -> bool {
        self.is_admin(id) || self.whitelist.iter().any(|n| n == id)
    }
}

/// Session store and expiry settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// JSON snapshot of every live session.
    #[serde(default = "default_store_path")]
    pub store_path: String,
    /// Append-only chat log, one line per inbound event.
    #[serde(default = "default_chat_log_path")]
    pub chat_log_path: String,
    /// How long a call-permission request may wait (seconds).
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,
    /// How long a pending order may wait for the admin (seconds).
    #[serde(default = "default_order_timeout")]
    pub order_timeout_secs: u64,
    /// Sweeper poll period (seconds).
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            chat_log_path: default_chat_log_path(),
            call_timeout_secs: default_call_timeout(),
            order_timeout_secs: default_order_timeout(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

/// Embedded HTTP server (liveness + pairing QR).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: default_http_port(),
        }
    }
}

/// Channel configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub whatsapp: Option<WhatsAppConfig>,
}

/// WhatsApp channel config.
///
/// Signal/device state is stored at `{data_dir}/whatsapp_session/`.
/// Pairing is done by scanning a QR code (like WhatsApp Web).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Device name shown in the phone's linked-devices list.
    #[serde(default = "default_device_name")]
    pub device_name: String,
}

// --- Default value functions ---

fn default_name() -> String {
    "Lapak".to_string()
}
fn default_data_dir() -> String {
    "~/.lapak".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_store_path() -> String {
    "~/.lapak/sessions.json".to_string()
}
fn default_chat_log_path() -> String {
    "~/.lapak/logs.txt".to_string()
}
fn default_call_timeout() -> u64 {
    300
}
fn default_order_timeout() -> u64 {
    3600
}
fn default_sweep_interval() -> u64 {
    60
}
fn default_device_name() -> String {
    "LAPAK".to_string()
}

/// `PORT` env var wins over the built-in default, read once at startup.
fn default_http_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000)
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, LapakError> {
    let path = Path::new(path);
    if !path.exists() {
        tracing::info!("Config file not found at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| LapakError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| LapakError::Config(format!("failed to parse config: {}", e)))?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_defaults() {
        let sc = SessionConfig::default();
        assert_eq!(sc.call_timeout_secs, 300);
        assert_eq!(sc.order_timeout_secs, 3600);
        assert_eq!(sc.sweep_interval_secs, 60);
    }

    #[test]
    fn test_session_config_from_toml() {
        let toml_str = r#"
            call_timeout_secs = 120
            order_timeout_secs = 1800
        "#;
        let sc: SessionConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(sc.call_timeout_secs, 120);
        assert_eq!(sc.order_timeout_secs, 1800);
        // Unset keys keep their defaults.
        assert_eq!(sc.sweep_interval_secs, 60);
        assert_eq!(sc.store_path, "~/.lapak/sessions.json");
    }

    #[test]
    fn test_admin_whitelist_includes_admins() {
        let admin = AdminConfig {
            numbers: vec!["628111".to_string()],
            whitelist: vec!["628222".to_string()],
        };
        assert!(admin.is_admin("628111"));
        assert!(!admin.is_admin("628222"));
        assert!(admin.is_whitelisted("628111"));
        assert!(admin.is_whitelisted("628222"));
        assert!(!admin.is_whitelisted("628333"));
    }

    #[test]
    fn test_config_from_toml_full() {
        let toml_str = r#"
            [bot]
            name = "Warung"
            data_dir = "/tmp/lapak-test"

            [admin]
            numbers = ["628111"]
            whitelist = ["628222", "628333"]

            [channel.whatsapp]
            enabled = true
        "#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.bot.name, "Warung");
        assert_eq!(cfg.bot.log_level, "info");
        assert_eq!(cfg.admin.numbers, vec!["628111"]);
        let wa = cfg.channel.whatsapp.unwrap();
        assert!(wa.enabled);
        assert_eq!(wa.device_name, "LAPAK");
    }

    #[test]
    fn test_config_empty_toml_is_all_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        assert_eq!(cfg.bot.data_dir, "~/.lapak");
        assert!(cfg.admin.numbers.is_empty());
        assert!(cfg.channel.whatsapp.is_none());
    }

    #[test]
    fn test_shellexpand_home() {
        std::env::set_var("HOME", "/home/tester");
        assert_eq!(shellexpand("~/x/y"), "/home/tester/x/y");
        assert_eq!(shellexpand("/abs/path"), "/abs/path");
    }
}
