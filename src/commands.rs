//! Admin commands — session termination from the admin identity.

use lapak_store::SessionStore;

/// Commands accepted from the admin identity.
///
/// Anything outside this grammar is ordinary admin chatter and stays
/// unanswered, like any other whitelisted sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    /// `close` — clear every session.
    CloseAll,
    /// `close <id>` — delete exactly one session.
    Close(String),
}

impl AdminCommand {
    /// Parse an admin message. The keyword is case-insensitive, the
    /// target id is exact.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split_whitespace();
        let keyword = parts.next()?;
        if !keyword.eq_ignore_ascii_case("close") {
            return None;
        }
        match (parts.next(), parts.next()) {
            (None, _) => Some(Self::CloseAll),
            (Some(id), None) => Some(Self::Close(id.to_string())),
            (Some(_), Some(_)) => None,
        }
    }
}

/// Execute a command and return the confirmation for the admin.
///
/// The affected customer is never messaged.
pub async fn handle(cmd: AdminCommand, store: &SessionStore) -> String {
    match cmd {
        AdminCommand::CloseAll => {
            let n = store.clear().await;
            format!("Semua sesi ditutup ({n}).")
        }
        AdminCommand::Close(id) => {
            if store.delete(&id).await {
                format!("Sesi {id} ditutup.")
            } else {
                format!("Sesi {id} tidak ditemukan.")
            }
        }
    }
}
