//! Profile Editor: edit, upload an avatar, save, sign out.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, info, warn};

use spektr_shared::{username_is_blank, Identity, IdentityDelta, ProfileDraft};

use crate::api::Backend;
use crate::busy::BusyFlag;
use crate::error::{ClientError, Result};
use crate::session::SessionStore;

/// Outcome of [`ProfileEditor::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing differed from the persisted identity; no call was made.
    Unchanged,
    Saved(Identity),
}

pub struct ProfileEditor {
    backend: Arc<dyn Backend>,
    session: SessionStore,
    persisted: Identity,
    draft: ProfileDraft,
    busy: bool,
    error: Option<String>,
}

impl ProfileEditor {
    /// Start editing the active identity.
    pub fn open(backend: Arc<dyn Backend>, session: SessionStore) -> Result<Self> {
        let persisted = session.current().ok_or(ClientError::NotAuthenticated)?;
        let draft = ProfileDraft::from(&persisted);
        Ok(Self {
            backend,
            session,
            persisted,
            draft,
            busy: false,
            error: None,
        })
    }

    /// The identity as last saved.
    pub fn persisted(&self) -> &Identity {
        &self.persisted
    }

    pub fn draft(&self) -> &ProfileDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ProfileDraft {
        &mut self.draft
    }

    /// Drop unsaved edits.
    pub fn reset(&mut self) {
        self.draft = ProfileDraft::from(&self.persisted);
        self.error = None;
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// What [`save`](Self::save) would send right now.
    pub fn pending_delta(&self) -> IdentityDelta {
        IdentityDelta::between(&self.persisted, &self.draft)
    }

    /// Upload image bytes and point the draft's avatar at the result. Only
    /// the draft changes; the avatar is persisted by the next save.
    pub async fn upload_avatar(&mut self, bytes: &[u8], mime_type: &str) -> Result<String> {
        if bytes.is_empty() {
            return Err(ClientError::validation("Image is empty"));
        }
        if self.busy {
            return Err(ClientError::Busy);
        }
        self.error = None;

        let encoded = STANDARD.encode(bytes);
        let outcome = {
            let _busy = BusyFlag::raise(&mut self.busy);
            self.backend.upload_avatar(&encoded, mime_type).await
        };

        match outcome {
            Ok(url) => {
                debug!(size = bytes.len(), %mime_type, "avatar uploaded");
                self.draft.avatar_url = Some(url.clone());
                Ok(url)
            }
            Err(e) => {
                warn!(error = ?e, "avatar upload failed");
                self.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Send the changed fields. On failure the draft is left as it was so
    /// the user can retry.
    pub async fn save(&mut self) -> Result<SaveOutcome> {
        if self.busy {
            return Err(ClientError::Busy);
        }
        if self.draft.first_name.trim().is_empty() || username_is_blank(&self.draft.username) {
            let e = ClientError::validation("Username and first name are required");
            self.error = Some(e.user_message());
            return Err(e);
        }

        let delta = self.pending_delta();
        if delta.is_empty() {
            debug!("profile unchanged, nothing to save");
            return Ok(SaveOutcome::Unchanged);
        }

        self.error = None;
        let outcome = {
            let _busy = BusyFlag::raise(&mut self.busy);
            self.backend.update_identity(self.persisted.id, &delta).await
        };

        let updated = match outcome {
            Ok(updated) => updated,
            Err(e) => {
                warn!(fields = ?delta.field_names(), error = ?e, "profile save failed");
                self.error = Some(e.user_message());
                return Err(e);
            }
        };

        info!(user_id = %updated.id, fields = ?delta.field_names(), "profile saved");
        self.persisted = updated.clone();
        self.draft = ProfileDraft::from(&updated);
        if let Err(e) = self.session.set_identity(updated.clone()) {
            warn!(error = %e, "profile saved, but the session could not be updated on disk");
        }
        Ok(SaveOutcome::Saved(updated))
    }

    /// End the session. The editor is consumed; the caller returns to the
    /// auth screen.
    pub fn logout(self) -> Result<()> {
        info!(user_id = %self.persisted.id, "logging out");
        self.session.clear()
    }
}
