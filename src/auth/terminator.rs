//! Session termination and the session-ended notification.
//!
//! When a renewal fails the session is over: the token store is cleared and
//! a single session-ended event is broadcast for the UI shell to react to
//! (show the login screen). Pending requests are not tracked here; they fail
//! on their own through the request pipeline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{info, warn};

use super::token_store::TokenStore;

/// Capacity of the session-ended channel. Events carry no payload and a shell
/// only cares about the latest one, so a small buffer is plenty.
const EVENT_CHANNEL_CAPACITY: usize = 8;

pub struct SessionTerminator {
    tokens: Arc<TokenStore>,
    events: broadcast::Sender<()>,
    /// Set while a session exists. `terminate` only acts on the first call
    /// after arming; repeated calls are no-ops until a new login re-arms.
    armed: AtomicBool,
}

impl SessionTerminator {
    pub fn new(tokens: Arc<TokenStore>, armed: bool) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            tokens,
            events,
            armed: AtomicBool::new(armed),
        }
    }

    /// Subscribe to session-ended events. Safe to call from any number of
    /// shells; each receiver sees every event.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.events.subscribe()
    }

    /// Mark a session as live again after a successful login.
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// End the session: clear the token store and broadcast session-ended
    /// exactly once. Idempotent until the next `arm`.
    pub async fn terminate(&self) {
        if !self.armed.swap(false, Ordering::SeqCst) {
            return;
        }

        if let Err(e) = self.tokens.clear().await {
            warn!(error = %e, "Failed to clear token store during termination");
        }

        info!("Session terminated");
        // Nobody listening is fine; the next subscriber starts fresh.
        let _ = self.events.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Arc<TokenStore> {
        let dir = tempfile::tempdir().unwrap();
        Arc::new(TokenStore::load_or_empty(dir.path().to_path_buf()).unwrap())
    }

    #[tokio::test]
    async fn terminate_clears_tokens_and_notifies_once() {
        let tokens = store();
        tokens.set("A1".to_string(), "R1".to_string()).await.unwrap();
        let terminator = SessionTerminator::new(Arc::clone(&tokens), true);
        let mut events = terminator.subscribe();

        terminator.terminate().await;
        terminator.terminate().await;

        assert!(!tokens.get().await.is_authenticated());
        assert!(events.try_recv().is_ok());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn terminate_is_a_noop_while_anonymous() {
        let terminator = SessionTerminator::new(store(), false);
        let mut events = terminator.subscribe();

        terminator.terminate().await;

        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn rearming_allows_a_second_termination() {
        let terminator = SessionTerminator::new(store(), false);
        let mut events = terminator.subscribe();

        terminator.arm();
        terminator.terminate().await;
        terminator.arm();
        terminator.terminate().await;

        assert!(events.try_recv().is_ok());
        assert!(events.try_recv().is_ok());
        assert!(events.try_recv().is_err());
    }
}
