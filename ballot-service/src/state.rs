//! Shared application state and session management

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use retro_core::Address;

use crate::config::ServiceConfig;
use crate::database::Database;

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Sign-in nonces and bearer sessions, both expiring
#[derive(Clone)]
pub struct SessionStore {
    nonces: Arc<Mutex<HashMap<String, u64>>>,
    sessions: Arc<Mutex<HashMap<String, SessionData>>>,
    nonce_ttl_secs: u64,
    session_ttl_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SessionData {
    pub voter: Address,
    pub expires_at: u64,
}

impl SessionStore {
    pub fn new(nonce_ttl_secs: u64, session_ttl_secs: u64) -> Self {
        Self {
            nonces: Arc::new(Mutex::new(HashMap::new())),
            sessions: Arc::new(Mutex::new(HashMap::new())),
            nonce_ttl_secs,
            session_ttl_secs,
        }
    }

    pub fn nonce_ttl_secs(&self) -> u64 {
        self.nonce_ttl_secs
    }

    pub fn session_ttl_secs(&self) -> u64 {
        self.session_ttl_secs
    }

    pub fn create_nonce(&self) -> String {
        let nonce = hex::encode(rand::thread_rng().gen::<[u8; 16]>());
        let expires_at = now_secs() + self.nonce_ttl_secs;

        let mut nonces = self.nonces.lock().expect("nonce mutex poisoned");
        let now = now_secs();
        nonces.retain(|_, expires| *expires >= now);
        nonces.insert(nonce.clone(), expires_at);
        nonce
    }

    /// Remove the nonce; true only if it existed and had not expired
    pub fn consume_nonce(&self, nonce: &str) -> bool {
        let mut nonces = self.nonces.lock().expect("nonce mutex poisoned");
        matches!(nonces.remove(nonce), Some(expires_at) if now_secs() <= expires_at)
    }

    pub fn create_session(&self, voter: Address) -> String {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let data = SessionData {
            voter,
            expires_at: now_secs() + self.session_ttl_secs,
        };

        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        let now = now_secs();
        sessions.retain(|_, session| session.expires_at >= now);
        sessions.insert(token.clone(), data);
        token
    }

    /// Voter for a live session token
    pub fn session_voter(&self, token: &str) -> Option<Address> {
        let sessions = self.sessions.lock().expect("session mutex poisoned");
        sessions
            .get(token)
            .filter(|session| now_secs() <= session.expires_at)
            .map(|session| session.voter)
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: SessionStore,
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ServiceConfig) -> Self {
        Self {
            db,
            sessions: SessionStore::new(config.nonce_ttl_secs, config.session_ttl_secs),
            config: Arc::new(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voter() -> Address {
        "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf".parse().unwrap()
    }

    #[test]
    fn nonce_is_single_use() {
        let store = SessionStore::new(60, 60);
        let nonce = store.create_nonce();
        assert_eq!(nonce.len(), 32);
        assert!(store.consume_nonce(&nonce));
        assert!(!store.consume_nonce(&nonce));
        assert!(!store.consume_nonce("unknown"));
    }

    #[test]
    fn session_resolves_voter() {
        let store = SessionStore::new(60, 60);
        let token = store.create_session(voter());
        assert_eq!(store.session_voter(&token), Some(voter()));
        assert_eq!(store.session_voter("other"), None);
    }

    #[test]
    fn expired_entries_are_rejected() {
        let store = SessionStore {
            nonces: Arc::new(Mutex::new(HashMap::new())),
            sessions: Arc::new(Mutex::new(HashMap::new())),
            nonce_ttl_secs: 0,
            session_ttl_secs: 0,
        };
        store
            .nonces
            .lock()
            .unwrap()
            .insert("stale".to_string(), now_secs() - 10);
        store.sessions.lock().unwrap().insert(
            "stale".to_string(),
            SessionData {
                voter: voter(),
                expires_at: now_secs() - 10,
            },
        );
        assert!(!store.consume_nonce("stale"));
        assert_eq!(store.session_voter("stale"), None);
    }
}
