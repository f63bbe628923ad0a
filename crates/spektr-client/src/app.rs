//! Application wiring.
//!
//! [`App`] owns the backend handle and the Session Store and hands both to
//! each screen it builds. The top-level route depends only on whether an
//! identity is active.

use std::sync::Arc;

use tracing::info;

use spektr_shared::ChatId;
use spektr_store::Database;

use crate::api::{Backend, HttpBackend};
use crate::auth::AuthFlow;
use crate::chat_list::ChatList;
use crate::config::ClientConfig;
use crate::conversation::ConversationView;
use crate::error::{ClientError, Result};
use crate::profile::ProfileEditor;
use crate::session::SessionStore;
use crate::theme::ThemeHandle;

/// Where the user is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Auth,
    ChatList,
    Conversation(ChatId),
}

pub struct App {
    config: ClientConfig,
    backend: Arc<dyn Backend>,
    session: SessionStore,
    theme: ThemeHandle,
}

impl App {
    /// Open local storage, build the HTTP backend and restore any saved
    /// session.
    pub fn start(config: ClientConfig) -> Result<Self> {
        let db = match &config.data_dir {
            Some(dir) => Database::open_in_dir(dir)?,
            None => Database::new()?,
        };

        let backend = HttpBackend::new(config.endpoints.clone(), config.request_timeout)?;
        Ok(Self::with_parts(config, Arc::new(backend), db))
    }

    /// Assemble from already-built parts and restore the saved session.
    pub fn with_parts(config: ClientConfig, backend: Arc<dyn Backend>, db: Database) -> Self {
        let theme = ThemeHandle::new();
        let session = SessionStore::new(db, Arc::new(theme.clone()));
        if let Some(identity) = session.restore() {
            info!(username = %identity.username, "resuming session");
        }
        Self {
            config,
            backend,
            session,
            theme,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn theme(&self) -> &ThemeHandle {
        &self.theme
    }

    /// The screen to show when no conversation is open.
    pub fn route(&self) -> Route {
        if self.session.is_authenticated() {
            Route::ChatList
        } else {
            Route::Auth
        }
    }

    pub fn auth_flow(&self) -> AuthFlow {
        AuthFlow::new(self.backend.clone(), self.session.clone(), self.config.auth_mode)
    }

    pub fn chat_list(&self) -> ChatList {
        ChatList::new(self.backend.clone(), self.session.clone())
    }

    /// Mount a conversation for the active identity; polling starts at
    /// once.
    pub fn open_conversation(&self, chat_id: ChatId) -> Result<ConversationView> {
        let me = self.session.current_id().ok_or(ClientError::NotAuthenticated)?;
        Ok(ConversationView::mount(
            chat_id,
            me,
            self.backend.clone(),
            self.config.poll_interval,
        ))
    }

    pub fn profile_editor(&self) -> Result<ProfileEditor> {
        ProfileEditor::open(self.backend.clone(), self.session.clone())
    }
}
