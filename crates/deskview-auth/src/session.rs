//! In-memory login sessions
//!
//! Tokens live until logout or process exit; the cookie that carries them is
//! a browser-session cookie, so closing the browser logs the viewer out.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "deskview_session";

/// Issued session tokens and the user each belongs to
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, String>>>,
}

impl SessionStore {
    /// Create an empty session store
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new session token for `username`
    pub async fn create(&self, username: &str) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.sessions
            .write()
            .await
            .insert(token.clone(), username.to_string());
        info!("Session started for user '{}'", username);
        token
    }

    /// Whether `token` belongs to a live session
    pub async fn is_valid(&self, token: &str) -> bool {
        self.sessions.read().await.contains_key(token)
    }

    /// The user a session belongs to
    pub async fn user(&self, token: &str) -> Option<String> {
        self.sessions.read().await.get(token).cloned()
    }

    /// End a session; returns false if the token was unknown
    pub async fn remove(&self, token: &str) -> bool {
        match self.sessions.write().await.remove(token) {
            Some(username) => {
                info!("Session ended for user '{}'", username);
                true
            }
            None => {
                debug!("Logout with unknown session token");
                false
            }
        }
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let store = SessionStore::new();
        let token = store.create("admin").await;

        assert_eq!(token.len(), 32);
        assert!(store.is_valid(&token).await);
        assert_eq!(store.user(&token).await.as_deref(), Some("admin"));

        assert!(store.remove(&token).await);
        assert!(!store.is_valid(&token).await);
        assert!(!store.remove(&token).await);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_tokens_are_unique() {
        let store = SessionStore::new();
        let a = store.create("admin").await;
        let b = store.create("admin").await;
        assert_ne!(a, b);
        assert_eq!(store.len().await, 2);
        assert!(!store.is_valid("not-a-token").await);
    }
}
