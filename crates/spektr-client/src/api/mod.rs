//! The remote API boundary.
//!
//! Every backend interaction goes through [`Backend`] so that screens can be
//! driven against the real HTTP service ([`HttpBackend`]) or a scripted fake.

mod http;

use async_trait::async_trait;

use spektr_shared::protocol::MessagesReply;
use spektr_shared::{ChatId, ChatSummary, DirectoryEntry, Identity, IdentityDelta, MessageId, UserId};

use crate::error::Result;

pub use http::{Endpoints, HttpBackend};

/// Fields submitted by the registration form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: Option<String>,
}

/// Operations offered by the Spektr backend.
///
/// Implementations map a backend error payload to
/// [`ClientError::Rejected`](crate::ClientError::Rejected) and any failure to
/// complete the call to [`ClientError::Transport`](crate::ClientError::Transport).
#[async_trait]
pub trait Backend: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<Identity>;

    async fn register(&self, registration: &Registration) -> Result<Identity>;

    /// Prefix search over usernames. `requester` excludes the caller and the
    /// users they blocked.
    async fn search_users(&self, query: &str, requester: Option<UserId>)
        -> Result<Vec<DirectoryEntry>>;

    async fn update_identity(&self, id: UserId, delta: &IdentityDelta) -> Result<Identity>;

    async fn block_user(&self, blocker: UserId, blocked: UserId) -> Result<()>;

    async fn unblock_user(&self, blocker: UserId, blocked: UserId) -> Result<()>;

    async fn list_chats(&self, id: UserId) -> Result<Vec<ChatSummary>>;

    /// Find or create the two-party chat between `a` and `b`.
    async fn create_chat(&self, a: UserId, b: UserId) -> Result<ChatId>;

    async fn list_messages(&self, chat: ChatId) -> Result<MessagesReply>;

    async fn send_message(&self, chat: ChatId, sender: UserId, text: &str) -> Result<MessageId>;

    /// Upload base64-encoded image bytes; returns the public URL.
    async fn upload_avatar(&self, encoded: &str, mime_type: &str) -> Result<String>;
}
