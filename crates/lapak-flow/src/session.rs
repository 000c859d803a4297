use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Position of a customer within the fixed menu flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Menu,
    TopupNominal,
    TopupConfirm,
    PersonalCategory,
    IzinCall,
    PendingAdmin,
}

impl SessionState {
    /// Waiting states that carry an auto-expiry deadline.
    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::IzinCall | Self::PendingAdmin)
    }
}

/// Slots filled in as the conversation progresses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selections {
    /// Chosen top-up nominal (e.g. "200K").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominal: Option<String>,
    /// Chosen payment method ("BAYAR" or "BON").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Chosen personal-request category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Per-customer conversational state record.
///
/// Invariant: `expires_at` is `Some` iff `state.is_waiting()`. The state
/// machine maintains this on every transition; the sweeper relies on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Customer identifier (phone-number-derived string); the store key.
    pub id: String,
    pub state: SessionState,
    /// Timestamp of the last inbound event.
    pub last_activity: DateTime<Utc>,
    /// Auto-expiry deadline while in a waiting state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub selections: Selections,
}

impl Session {
    /// Create a fresh session in the entry state.
    pub fn new(id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            state: SessionState::Menu,
            last_activity: now,
            expires_at: None,
            selections: Selections::default(),
        }
    }

    /// Whether the session's deadline has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(deadline) if now > deadline)
    }
}
