//! # lapak-store
//!
//! Flat-file session store: an in-memory map of customer id to session,
//! mirrored to a JSON snapshot through an injected backend after every
//! mutation. Full-file rewrite per write — fine for the session counts a
//! single counter sees, and a known scaling limit; the backend seam exists
//! so incremental persistence can replace it without touching the flow.

use async_trait::async_trait;
use lapak_core::error::LapakError;
use lapak_flow::session::Session;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Persistence seam for the session store.
///
/// The store serializes the whole map and hands the JSON here; backends
/// decide where it lands.
#[async_trait]
pub trait SnapshotBackend: Send + Sync {
    /// Load the last snapshot, or `None` if none exists yet.
    async fn load(&self) -> Result<Option<String>, LapakError>;

    /// Durably replace the snapshot.
    async fn persist(&self, json: &str) -> Result<(), LapakError>;
}

/// Backend writing the snapshot to a single JSON file.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SnapshotBackend for FileBackend {
    async fn load(&self) -> Result<Option<String>, LapakError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => Ok(Some(json)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn persist(&self, json: &str) -> Result<(), LapakError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Write-then-rename so a crash mid-write never truncates the
        // previous snapshot.
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// In-memory backend for tests.
#[derive(Default)]
pub struct MemoryBackend {
    snapshot: Mutex<Option<String>>,
}

#[async_trait]
impl SnapshotBackend for MemoryBackend {
    async fn load(&self) -> Result<Option<String>, LapakError> {
        Ok(self.snapshot.lock().await.clone())
    }

    async fn persist(&self, json: &str) -> Result<(), LapakError> {
        *self.snapshot.lock().await = Some(json.to_string());
        Ok(())
    }
}

/// Session store handle. Cheap to clone; the dispatcher and the sweeper
/// share one map, so every mutation goes through the internal mutex.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
    backend: Arc<dyn SnapshotBackend>,
}

impl SessionStore {
    /// Open a store, loading the previous snapshot if one parses.
    ///
    /// A corrupt snapshot is not fatal: the store starts empty and the
    /// condition is logged.
    pub async fn open(backend: Arc<dyn SnapshotBackend>) -> Result<Self, LapakError> {
        let sessions = match backend.load().await? {
            Some(json) => match serde_json::from_str::<HashMap<String, Session>>(&json) {
                Ok(map) => map,
                Err(e) => {
                    warn!("session snapshot unparseable, starting empty: {e}");
                    HashMap::new()
                }
            },
            None => HashMap::new(),
        };

        info!("session store loaded ({} sessions)", sessions.len());

        Ok(Self {
            sessions: Arc::new(Mutex::new(sessions)),
            backend,
        })
    }

    /// Look up a session by customer id.
    pub async fn get(&self, id: &str) -> Option<Session> {
        self.sessions.lock().await.get(id).cloned()
    }

    /// Insert or replace a session, then snapshot the whole store.
    pub async fn upsert(&self, session: Session) {
        let json = {
            let mut map = self.sessions.lock().await;
            map.insert(session.id.clone(), session);
            snapshot(&map)
        };
        self.persist(json).await;
    }

    /// Remove a session. Returns whether it existed; persists only when
    /// something actually changed.
    pub async fn delete(&self, id: &str) -> bool {
        let json = {
            let mut map = self.sessions.lock().await;
            if map.remove(id).is_none() {
                return false;
            }
            snapshot(&map)
        };
        self.persist(json).await;
        true
    }

    /// Remove every session. Returns how many were dropped.
    pub async fn clear(&self) -> usize {
        let (json, dropped) = {
            let mut map = self.sessions.lock().await;
            let dropped = map.len();
            map.clear();
            (snapshot(&map), dropped)
        };
        if dropped > 0 {
            self.persist(json).await;
        }
        dropped
    }

    /// Every live session, for the sweeper.
    pub async fn all(&self) -> Vec<(String, Session)> {
        self.sessions
            .lock()
            .await
            .iter()
            .map(|(id, s)| (id.clone(), s.clone()))
            .collect()
    }

    /// Snapshot failure is logged, never surfaced: the in-memory state
    /// stands and the next successful write reconciles the file.
    async fn persist(&self, json: Option<String>) {
        let Some(json) = json else {
            return;
        };
        if let Err(e) = self.backend.persist(&json).await {
            warn!("failed to persist session snapshot: {e}");
        }
    }
}

fn snapshot(map: &HashMap<String, Session>) -> Option<String> {
    match serde_json::to_string_pretty(map) {
        Ok(json) => Some(json),
        Err(e) => {
            warn!("failed to serialize session snapshot: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lapak_flow::session::SessionState;

    async fn memory_store() -> (SessionStore, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::default());
        let store = SessionStore::open(backend.clone()).await.unwrap();
        (store, backend)
    }

    #[tokio::test]
    async fn test_upsert_get_delete() {
        let (store, _) = memory_store().await;
        let session = Session::new("628123", Utc::now());

        store.upsert(session.clone()).await;
        assert_eq!(store.get("628123").await, Some(session));

        assert!(store.delete("628123").await);
        assert!(store.get("628123").await.is_none());
        assert!(!store.delete("628123").await, "second delete is a no-op");
    }

    #[tokio::test]
    async fn test_clear_drops_everything() {
        let (store, _) = memory_store().await;
        store.upsert(Session::new("a", Utc::now())).await;
        store.upsert(Session::new("b", Utc::now())).await;

        assert_eq!(store.clear().await, 2);
        assert!(store.all().await.is_empty());
        assert_eq!(store.clear().await, 0);
    }

    #[tokio::test]
    async fn test_every_mutation_snapshots() {
        let (store, backend) = memory_store().await;

        store.upsert(Session::new("a", Utc::now())).await;
        let after_upsert = backend.load().await.unwrap().unwrap();
        assert!(after_upsert.contains("\"a\""));

        store.delete("a").await;
        let after_delete = backend.load().await.unwrap().unwrap();
        assert!(!after_delete.contains("\"a\""));
    }

    #[tokio::test]
    async fn test_reload_round_trips() {
        let backend = Arc::new(MemoryBackend::default());
        let store = SessionStore::open(backend.clone()).await.unwrap();

        let mut session = Session::new("628123", Utc::now());
        session.state = SessionState::PendingAdmin;
        session.expires_at = Some(Utc::now() + chrono::Duration::seconds(3600));
        session.selections.nominal = Some("200K".to_string());
        session.selections.method = Some("BON".to_string());
        store.upsert(session.clone()).await;
        store.upsert(Session::new("628456", Utc::now())).await;

        let reloaded = SessionStore::open(backend).await.unwrap();
        assert_eq!(reloaded.get("628123").await, Some(session));
        assert_eq!(reloaded.all().await.len(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_starts_empty() {
        let backend = Arc::new(MemoryBackend::default());
        backend.persist("{ this is not json").await.unwrap();

        let store = SessionStore::open(backend).await.unwrap();
        assert!(store.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_file_backend_round_trip() {
        let dir = std::env::temp_dir().join("__lapak_test_file_backend__");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("sessions.json");

        let backend = Arc::new(FileBackend::new(&path));
        assert_eq!(backend.load().await.unwrap(), None, "no file yet");

        let store = SessionStore::open(backend.clone()).await.unwrap();
        store.upsert(Session::new("628123", Utc::now())).await;
        assert!(path.exists(), "snapshot file should be written");

        let reloaded = SessionStore::open(backend).await.unwrap();
        assert!(reloaded.get("628123").await.is_some());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
