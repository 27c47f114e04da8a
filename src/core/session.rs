//! Per-user banking sessions.
//!
//! The store is the only shared mutable state in the bot: one record per
//! Discord user, created by a successful login and replaced wholesale by the
//! next one. There is no logout; a session lives for the process lifetime.
//!
//! Tokens are mirrored to a flat JSON file as a best-effort cache. The
//! in-memory map stays authoritative: write failures are logged and never
//! abort the command that triggered them, and an unreadable file simply
//! yields an empty store at startup.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::core::money::Coins;
use crate::errors::Result;

/// On-disk shape of the mirror file: a flat Discord user id → token map.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
struct TokenMirror(HashMap<String, String>);

/// One user's banking session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque bearer credential for the banking API.
    pub token: String,
    /// Bank username. `None` for sessions restored from the token mirror.
    pub username: Option<String>,
    /// Advisory cached balance; updated optimistically after claim/transfer
    /// and allowed to drift from the bank's true value.
    pub balance: Option<Coins>,
    /// The account's id at the bank. `None` for restored sessions.
    pub bank_user_id: Option<String>,
}

impl Session {
    /// A session known only by its token (restored from the mirror file).
    #[must_use]
    pub const fn restored(token: String) -> Self {
        Self {
            token,
            username: None,
            balance: None,
            bank_user_id: None,
        }
    }
}

/// In-memory map of Discord user id → [`Session`], with an optional
/// flat-file token mirror.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, Session>,
    path: Option<PathBuf>,
}

impl SessionStore {
    /// Loads the store from the mirror file at `path`. A missing or corrupt
    /// file falls back to an empty store; the path is kept for later writes.
    #[must_use]
    pub fn load(path: PathBuf) -> Self {
        let sessions = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<TokenMirror>(&text) {
                Ok(mirror) => mirror
                    .0
                    .into_iter()
                    .map(|(user, token)| (user, Session::restored(token)))
                    .collect(),
                Err(e) => {
                    warn!(path = %path.display(), "Session file is corrupt, starting empty: {e}");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        Self {
            sessions,
            path: Some(path),
        }
    }

    /// An unmirrored store. Used by tests and as the fallback when no
    /// session file is configured.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Looks up a user's session.
    #[must_use]
    pub fn get(&self, user_id: &str) -> Option<&Session> {
        self.sessions.get(user_id)
    }

    /// Mutable lookup, for in-place balance updates.
    pub fn get_mut(&mut self, user_id: &str) -> Option<&mut Session> {
        self.sessions.get_mut(user_id)
    }

    /// Replaces the user's session unconditionally (a second login discards
    /// the first session entirely) and mirrors tokens to disk best-effort.
    pub fn set(&mut self, user_id: String, session: Session) {
        self.sessions.insert(user_id, session);
        if let Err(e) = self.persist() {
            error!("Failed to persist session file: {e}");
        }
    }

    /// Writes the user → token map to the mirror file, if one is configured.
    pub fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let mirror = TokenMirror(
            self.sessions
                .iter()
                .map(|(user, session)| (user.clone(), session.token.clone()))
                .collect(),
        );
        fs::write(path, serde_json::to_string_pretty(&mirror)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_session(token: &str) -> Session {
        Session {
            token: token.to_string(),
            username: Some("alice".to_string()),
            balance: Some(Coins::parse("10.00000000").expect("valid")),
            bank_user_id: Some("u1".to_string()),
        }
    }

    #[test]
    fn set_replaces_without_merge() {
        let mut store = SessionStore::in_memory();
        store.set("d1".to_string(), full_session("s1"));
        store.set("d1".to_string(), Session::restored("s2".to_string()));

        let session = store.get("d1").expect("present");
        assert_eq!(session.token, "s2");
        // The first session's cached balance is gone, not merged.
        assert!(session.balance.is_none());
    }

    #[test]
    fn mirror_roundtrip_restores_tokens_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sessions.json");

        let mut store = SessionStore::load(path.clone());
        store.set("d1".to_string(), full_session("s1"));

        let restored = SessionStore::load(path);
        let session = restored.get("d1").expect("restored");
        assert_eq!(session.token, "s1");
        assert!(session.username.is_none());
        assert!(session.balance.is_none());
    }

    #[test]
    fn mirror_file_is_a_flat_user_token_map() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sessions.json");

        let mut store = SessionStore::load(path.clone());
        store.set("d1".to_string(), full_session("s1"));

        let text = fs::read_to_string(&path).expect("mirror written");
        let parsed: serde_json::Value = serde_json::from_str(&text).expect("valid json");
        assert_eq!(parsed, serde_json::json!({ "d1": "s1" }));
    }

    #[test]
    fn corrupt_file_falls_back_to_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sessions.json");
        fs::write(&path, "{not json").expect("write");

        let store = SessionStore::load(path);
        assert!(store.get("d1").is_none());
    }

    #[test]
    fn missing_file_is_an_empty_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::load(dir.path().join("nope.json"));
        assert!(store.get("d1").is_none());
    }

    #[test]
    fn unmirrored_store_persist_is_a_no_op() {
        let store = SessionStore::in_memory();
        store.persist().expect("no path means nothing to write");
    }
}
