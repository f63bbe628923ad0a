//! The Session Store: owner of the active identity.
//!
//! [`SessionStore`] is a cheap cloneable handle. Every component that needs
//! the signed-in user receives one explicitly; nothing reads the identity
//! from ambient global state.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use spektr_shared::{Identity, Theme, UserId};
use spektr_store::{Database, StoreError};

use crate::error::Result;
use crate::theme::ThemeSink;

struct Inner {
    db: Database,
    current: Option<Identity>,
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<Inner>>,
    theme: Arc<dyn ThemeSink>,
}

impl SessionStore {
    /// Wrap an opened database. The store starts logged out; call
    /// [`restore`](Self::restore) to pick up a saved identity.
    pub fn new(db: Database, theme: Arc<dyn ThemeSink>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner { db, current: None })),
            theme,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave Inner half-written:
        // every mutation is a single assignment.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Load the saved identity, if any, and make it current.
    ///
    /// Unreadable or malformed saved state counts as "logged out"; it is
    /// logged and discarded, never surfaced.
    pub fn restore(&self) -> Option<Identity> {
        let mut inner = self.lock();
        let restored = match inner.db.load_identity() {
            Ok(found) => found,
            Err(StoreError::Corrupt { reason, .. }) => {
                warn!(%reason, "discarding malformed saved session");
                if let Err(e) = inner.db.clear_identity() {
                    warn!(error = %e, "failed to remove malformed session");
                }
                None
            }
            Err(e) => {
                warn!(error = %e, "failed to read saved session");
                None
            }
        };

        match &restored {
            Some(identity) => {
                info!(user_id = %identity.id, username = %identity.username, "session restored");
                self.theme.apply(identity.theme);
            }
            None => self.theme.apply(Theme::default()),
        }
        inner.current = restored.clone();
        restored
    }

    pub fn current(&self) -> Option<Identity> {
        self.lock().current.clone()
    }

    pub fn current_id(&self) -> Option<UserId> {
        self.lock().current.as_ref().map(|i| i.id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().current.is_some()
    }

    /// Replace the active identity, apply its theme and persist it.
    ///
    /// The in-memory identity is replaced even when persisting fails; the
    /// storage error is returned so callers can report it.
    pub fn set_identity(&self, identity: Identity) -> Result<()> {
        let mut inner = self.lock();
        self.theme.apply(identity.theme);
        let saved = inner.db.save_identity(&identity);
        info!(user_id = %identity.id, "active identity set");
        inner.current = Some(identity);
        saved.map_err(Into::into)
    }

    /// Forget the active identity, remove it from storage and reset the
    /// theme.
    pub fn clear(&self) -> Result<()> {
        let mut inner = self.lock();
        inner.current = None;
        self.theme.apply(Theme::default());
        inner.db.clear_identity()?;
        info!("session cleared");
        Ok(())
    }
}
