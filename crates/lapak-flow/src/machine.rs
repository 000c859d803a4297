//! Conversation state machine.
//!
//! A single pure transition function over (session, inbound text, now).
//! All replies and state changes for the button flow come from here; the
//! dispatcher and the sweeper only wire it to the transport and the store.

use crate::menu::{self, Menu};
use crate::replies;
use crate::session::{Session, SessionState};
use chrono::{DateTime, Duration, Utc};

/// Expiry windows for the waiting states.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub call: Duration,
    pub order: Duration,
}

impl Timeouts {
    pub fn from_secs(call_secs: u64, order_secs: u64) -> Self {
        Self {
            call: Duration::seconds(call_secs as i64),
            order: Duration::seconds(order_secs as i64),
        }
    }
}

/// Feed one inbound text into a session.
///
/// Mutates the session in place and returns the reply to send. An input
/// not present in the current menu's option set never changes state; the
/// current menu is re-sent with an invalid-choice prefix. Every
/// transition entering a waiting state sets `expires_at`; every
/// transition leaving one clears it.
pub fn advance(session: &mut Session, text: &str, now: DateTime<Utc>, timeouts: Timeouts) -> String {
    session.last_activity = now;

    match session.state {
        SessionState::Menu => match text {
            "TOP UP" => {
                session.state = SessionState::TopupNominal;
                menu::TOPUP_NOMINAL.render()
            }
            "PESAN PRIBADI" => {
                session.state = SessionState::PersonalCategory;
                menu::PERSONAL_CATEGORY.render()
            }
            "IZIN CALLING" => {
                session.state = SessionState::IzinCall;
                session.expires_at = Some(now + timeouts.call);
                replies::CALL_RECORDED.to_string()
            }
            _ => invalid(&menu::MAIN),
        },

        SessionState::TopupNominal => {
            if text == menu::BACK {
                session.state = SessionState::Menu;
                menu::MAIN.render()
            } else if menu::TOPUP_NOMINAL.contains(text) {
                session.selections.nominal = Some(text.to_string());
                session.state = SessionState::TopupConfirm;
                menu::TOPUP_CONFIRM.render()
            } else {
                invalid(&menu::TOPUP_NOMINAL)
            }
        }

        SessionState::TopupConfirm => {
            if text == menu::BACK {
                // One state back, not a reset to the top menu.
                session.state = SessionState::TopupNominal;
                menu::TOPUP_NOMINAL.render()
            } else if menu::TOPUP_CONFIRM.contains(text) {
                session.selections.method = Some(text.to_string());
                session.state = SessionState::PendingAdmin;
                session.expires_at = Some(now + timeouts.order);
                replies::TOPUP_PENDING.to_string()
            } else {
                invalid(&menu::TOPUP_CONFIRM)
            }
        }

        SessionState::PersonalCategory => {
            if text == menu::BACK {
                session.state = SessionState::Menu;
                menu::MAIN.render()
            } else if menu::PERSONAL_CATEGORY.contains(text) {
                session.selections.category = Some(text.to_string());
                session.state = SessionState::PendingAdmin;
                session.expires_at = Some(now + timeouts.order);
                replies::PERSONAL_PENDING.to_string()
            } else {
                invalid(&menu::PERSONAL_CATEGORY)
            }
        }

        SessionState::IzinCall => {
            // The request is considered forwarded to the admin out-of-band;
            // any further input returns the customer to the top menu.
            session.state = SessionState::Menu;
            session.expires_at = None;
            format!("{}\n\n{}", replies::BACK_TO_MENU, menu::MAIN.render())
        }

        SessionState::PendingAdmin => replies::PENDING_REMINDER.to_string(),
    }
}

fn invalid(current: &Menu) -> String {
    format!("{}\n\n{}", replies::INVALID_CHOICE, current.render())
}
