//! Persisted session store.
//!
//! Holds the bearer token and user profile. Every mutation is written
//! through to SQLite before it returns: the full `{token, user}` record
//! under [`SESSION_RECORD_KEY`] and the token alone in the credential slot.
//! Consumers read the store synchronously on each use; there is no
//! change notification.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::VerifyOtpResponse;
use crate::db::{
    Database, DbResult, SESSION_RECORD_KEY, TOKEN_CREDENTIAL_SERVICE, TOKEN_CREDENTIAL_USERNAME,
};
use crate::models::{Session, UserProfile};

/// Version tag of the serialized record.
const RECORD_VERSION: u32 = 0;

/// On-disk shape of the session record.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedRecord {
    state: Session,
    #[serde(default)]
    version: u32,
}

struct Inner {
    db: Database,
    session: Session,
}

/// Owned, injectable session state with a narrow mutation API.
pub struct SessionStore {
    inner: Mutex<Inner>,
}

impl SessionStore {
    /// Open the store at `path`, rehydrating any persisted session.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        Self::from_database(Database::open(path)?)
    }

    /// Create a store backed by an in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        Self::from_database(Database::open_in_memory()?)
    }

    /// Wrap an opened database, rehydrating once.
    pub fn from_database(db: Database) -> DbResult<Self> {
        let session = rehydrate(&db)?;
        debug!(
            authenticated = session.is_authenticated(),
            has_user = session.user.is_some(),
            "session rehydrated"
        );
        Ok(Self {
            inner: Mutex::new(Inner { db, session }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Every write replaces the whole session, so a poisoned guard still
        // holds a consistent value.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn token(&self) -> Option<String> {
        self.lock().session.token.clone()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.lock().session.user.clone()
    }

    /// Copy of the current session.
    pub fn snapshot(&self) -> Session {
        self.lock().session.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().session.is_authenticated()
    }

    /// Replace the token; `None` signs the user out of the token slot only.
    pub fn set_token(&self, token: Option<String>) -> DbResult<()> {
        let mut inner = self.lock();
        let next = Session {
            token,
            user: inner.session.user.clone(),
        };
        commit(&mut inner, next)
    }

    /// Replace the user profile.
    pub fn set_user(&self, user: Option<UserProfile>) -> DbResult<()> {
        let mut inner = self.lock();
        let next = Session {
            token: inner.session.token.clone(),
            user,
        };
        commit(&mut inner, next)
    }

    /// Apply a verify-OTP response. Only fields present in the response are
    /// written; a missing `user` leaves the current profile untouched, and
    /// an empty token counts as missing.
    pub fn apply_verification(&self, response: &VerifyOtpResponse) -> DbResult<()> {
        let mut inner = self.lock();
        let next = Session {
            token: response
                .token
                .clone()
                .filter(|t| !t.is_empty())
                .or_else(|| inner.session.token.clone()),
            user: response
                .user
                .clone()
                .or_else(|| inner.session.user.clone()),
        };
        commit(&mut inner, next)
    }

    /// Clear token and user together. Idempotent.
    pub fn logout(&self) -> DbResult<()> {
        let mut inner = self.lock();
        let was_authenticated = inner.session.is_authenticated();
        commit(&mut inner, Session::empty())?;
        if was_authenticated {
            info!("session cleared");
        }
        Ok(())
    }

    /// Token held in the credential slot, read without touching the
    /// serialized record. Used for the quick restart check.
    pub fn stored_token(&self) -> DbResult<Option<String>> {
        let inner = self.lock();
        Ok(inner
            .db
            .get_credential(TOKEN_CREDENTIAL_SERVICE)?
            .map(|c| c.secret))
    }
}

fn rehydrate(db: &Database) -> DbResult<Session> {
    let record: Option<PersistedRecord> = match db.get_value(SESSION_RECORD_KEY) {
        Ok(record) => record,
        Err(e) => {
            warn!(error = %e, "discarding unreadable session record");
            None
        }
    };
    let mut session = record.map(|r| r.state).unwrap_or_default();

    if session.token.is_none() {
        if let Some(credential) = db.get_credential(TOKEN_CREDENTIAL_SERVICE)? {
            session.token = Some(credential.secret);
        }
    }
    Ok(session)
}

/// Persist `next` and only then make it the in-memory value.
fn commit(inner: &mut Inner, next: Session) -> DbResult<()> {
    inner.db.put_value(
        SESSION_RECORD_KEY,
        &PersistedRecord {
            state: next.clone(),
            version: RECORD_VERSION,
        },
    )?;
    match &next.token {
        Some(token) => inner.db.set_credential(
            TOKEN_CREDENTIAL_SERVICE,
            TOKEN_CREDENTIAL_USERNAME,
            token,
        )?,
        None => {
            inner.db.clear_credential(TOKEN_CREDENTIAL_SERVICE)?;
        }
    }
    inner.session = next;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserProfile {
        UserProfile {
            id: id.into(),
            user_type: "customer".into(),
            name: "Asha Rao".into(),
            phone: "+919876543210".into(),
        }
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = SessionStore::open_in_memory().unwrap();
        assert_eq!(store.snapshot(), Session::empty());
        assert!(!store.is_authenticated());
        assert!(store.stored_token().unwrap().is_none());
    }

    #[test]
    fn test_set_token_and_user() {
        let store = SessionStore::open_in_memory().unwrap();
        store.set_token(Some("t1".into())).unwrap();
        store.set_user(Some(user("u1"))).unwrap();

        assert_eq!(store.token().as_deref(), Some("t1"));
        assert_eq!(store.user().unwrap().id, "u1");
        assert_eq!(store.stored_token().unwrap().as_deref(), Some("t1"));
    }

    #[test]
    fn test_logout_clears_both_and_is_idempotent() {
        let store = SessionStore::open_in_memory().unwrap();
        store.set_token(Some("t1".into())).unwrap();
        store.set_user(Some(user("u1"))).unwrap();

        store.logout().unwrap();
        assert_eq!(store.snapshot(), Session::empty());
        assert!(store.stored_token().unwrap().is_none());

        store.logout().unwrap();
        assert_eq!(store.snapshot(), Session::empty());
    }

    #[test]
    fn test_apply_verification_without_user_keeps_user() {
        let store = SessionStore::open_in_memory().unwrap();
        store.set_user(Some(user("u1"))).unwrap();

        store
            .apply_verification(&VerifyOtpResponse {
                token: Some("t2".into()),
                user: None,
            })
            .unwrap();

        assert_eq!(store.token().as_deref(), Some("t2"));
        assert_eq!(store.user().unwrap().id, "u1");
    }

    #[test]
    fn test_apply_verification_without_token_keeps_token() {
        let store = SessionStore::open_in_memory().unwrap();
        store.set_token(Some("t1".into())).unwrap();

        store
            .apply_verification(&VerifyOtpResponse {
                token: None,
                user: Some(user("u9")),
            })
            .unwrap();

        assert_eq!(store.token().as_deref(), Some("t1"));
        assert_eq!(store.user().unwrap().id, "u9");
    }

    #[test]
    fn test_rehydrate_falls_back_to_credential() {
        let db = Database::open_in_memory().unwrap();
        db.set_credential(TOKEN_CREDENTIAL_SERVICE, TOKEN_CREDENTIAL_USERNAME, "cred-token")
            .unwrap();

        let store = SessionStore::from_database(db).unwrap();
        assert_eq!(store.token().as_deref(), Some("cred-token"));
        assert!(store.user().is_none());
    }

    #[test]
    fn test_rehydrate_ignores_corrupt_record() {
        let db = Database::open_in_memory().unwrap();
        db.conn()
            .execute(
                "INSERT INTO kv_store (key, value) VALUES (?1, '{broken')",
                [SESSION_RECORD_KEY],
            )
            .unwrap();

        let store = SessionStore::from_database(db).unwrap();
        assert_eq!(store.snapshot(), Session::empty());
    }

    #[test]
    fn test_record_shape() {
        let store = SessionStore::open_in_memory().unwrap();
        store.set_token(Some("t1".into())).unwrap();

        let inner = store.lock();
        let raw: serde_json::Value = inner.db.get_value(SESSION_RECORD_KEY).unwrap().unwrap();
        assert_eq!(raw["state"]["token"], "t1");
        assert!(raw["state"]["user"].is_null());
        assert_eq!(raw["version"], 0);
    }
}
