//! Durable holder of the access/refresh token pair.
//!
//! The store is the only place session credentials live. It is written by
//! login, by a successful renewal, and by session termination - the request
//! pipeline itself never writes it. Reads always observe a complete pair;
//! writes hold the write lock across the in-memory update and the disk
//! persist so a snapshot can never interleave with a half-finished write.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

/// Session file name in the data directory.
const SESSION_FILE: &str = "session.json";

/// The current credential pair. Either side may be absent; a session with no
/// access token is anonymous.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }
}

pub struct TokenStore {
    path: PathBuf,
    session: RwLock<Session>,
}

impl TokenStore {
    /// Initialize from `session.json` under `data_dir`, or start empty if no
    /// session has been persisted.
    pub fn load_or_empty(data_dir: PathBuf) -> Result<Self> {
        let path = data_dir.join(SESSION_FILE);
        let session = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .context("Failed to read session file")?;
            let session: Session = serde_json::from_str(&contents)
                .context("Failed to parse session file")?;
            debug!(authenticated = session.is_authenticated(), "Loaded persisted session");
            session
        } else {
            Session::default()
        };

        Ok(Self {
            path,
            session: RwLock::new(session),
        })
    }

    /// Snapshot of the current pair.
    pub async fn get(&self) -> Session {
        self.session.read().await.clone()
    }

    /// Construction-time snapshot, taken before the store is shared across
    /// tasks and the read lock could be contended.
    pub fn current(&self) -> Session {
        self.session
            .try_read()
            .map(|session| session.clone())
            .unwrap_or_default()
    }

    /// Replace both tokens (login).
    pub async fn set(&self, access: String, refresh: String) -> Result<()> {
        let mut session = self.session.write().await;
        session.access_token = Some(access);
        session.refresh_token = Some(refresh);
        self.persist(&session)
    }

    /// Apply a renewal result. The refresh token is only replaced when the
    /// server actually rotated it.
    pub async fn update(&self, access: String, rotated_refresh: Option<String>) -> Result<()> {
        let mut session = self.session.write().await;
        session.access_token = Some(access);
        if let Some(refresh) = rotated_refresh {
            session.refresh_token = Some(refresh);
        }
        self.persist(&session)
    }

    /// Drop both tokens (logout or terminal auth failure).
    pub async fn clear(&self) -> Result<()> {
        let mut session = self.session.write().await;
        *session = Session::default();
        if self.path.exists() {
            std::fs::remove_file(&self.path).context("Failed to remove session file")?;
        }
        Ok(())
    }

    fn persist(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create session directory")?;
        }
        let contents = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, contents).context("Failed to write session file")?;
        Ok(())
    }
}
