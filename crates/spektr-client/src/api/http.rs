use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use spektr_shared::constants::USER_ID_HEADER;
use spektr_shared::protocol::{
    ChatCreatedReply, ChatsReply, MessageSentReply, MessagesReply, Reply, SuccessReply,
    UploadReply, UserReply, UsersReply,
};
use spektr_shared::{ChatId, ChatSummary, DirectoryEntry, Identity, IdentityDelta, MessageId, UserId};

use super::{Backend, Registration};
use crate::error::{ClientError, Result};

/// URLs of the five backend functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub auth: String,
    pub users: String,
    pub chats: String,
    pub messages: String,
    pub upload: String,
}

impl Endpoints {
    /// Derive all endpoints from one base URL (`{base}/auth`, `{base}/users`, ...).
    pub fn from_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            auth: format!("{base}/auth"),
            users: format!("{base}/users"),
            chats: format!("{base}/chats"),
            messages: format!("{base}/messages"),
            upload: format!("{base}/upload"),
        }
    }
}

/// [`Backend`] over HTTP + JSON.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    endpoints: Endpoints,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBody<'a> {
    user_id: UserId,
    #[serde(flatten)]
    delta: &'a IdentityDelta,
}

impl HttpBackend {
    pub fn new(endpoints: Endpoints, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Send a request and decode either the payload or the error envelope.
    async fn call<T: DeserializeOwned>(&self, op: &'static str, request: RequestBuilder) -> Result<T> {
        debug!(op, "backend call");

        let resp = request.send().await.map_err(|e| {
            warn!(op, error = %e, "request failed");
            ClientError::from(e)
        })?;
        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| {
            warn!(op, error = %e, "failed to read response body");
            ClientError::from(e)
        })?;

        match serde_json::from_slice::<Reply<T>>(&body) {
            Ok(Reply::Error { error }) => {
                debug!(op, %status, error = %error, "backend rejected request");
                Err(ClientError::Rejected(error))
            }
            Ok(Reply::Ok(value)) if status.is_success() => Ok(value),
            Ok(Reply::Ok(_)) => {
                warn!(op, %status, "unexpected status without error body");
                Err(ClientError::Transport(format!("server answered {status}")))
            }
            Err(e) => {
                warn!(op, %status, error = %e, "undecodable response");
                Err(ClientError::Transport(format!(
                    "invalid response ({status}): {e}"
                )))
            }
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn login(&self, email: &str, password: &str) -> Result<Identity> {
        let req = self.client.post(&self.endpoints.auth).json(&json!({
            "action": "login",
            "email": email,
            "password": password,
        }));
        let reply: UserReply = self.call("login", req).await?;
        Ok(reply.user)
    }

    async fn register(&self, registration: &Registration) -> Result<Identity> {
        let req = self.client.post(&self.endpoints.auth).json(&json!({
            "action": "register",
            "username": registration.username,
            "email": registration.email,
            "password": registration.password,
            "firstName": registration.first_name,
            "lastName": registration.last_name,
        }));
        let reply: UserReply = self.call("register", req).await?;
        Ok(reply.user)
    }

    async fn search_users(
        &self,
        query: &str,
        requester: Option<UserId>,
    ) -> Result<Vec<DirectoryEntry>> {
        let mut req = self
            .client
            .get(&self.endpoints.users)
            .query(&[("search", query)]);
        if let Some(id) = requester {
            req = req.header(USER_ID_HEADER, id.to_string());
        }
        let reply: UsersReply = self.call("search_users", req).await?;
        Ok(reply.users)
    }

    async fn update_identity(&self, id: UserId, delta: &IdentityDelta) -> Result<Identity> {
        let req = self
            .client
            .put(&self.endpoints.users)
            .json(&UpdateBody { user_id: id, delta });
        let reply: UserReply = self.call("update_identity", req).await?;
        Ok(reply.user)
    }

    async fn block_user(&self, blocker: UserId, blocked: UserId) -> Result<()> {
        let req = self.client.post(&self.endpoints.users).json(&json!({
            "action": "block",
            "blockerId": blocker,
            "blockedId": blocked,
        }));
        let _: SuccessReply = self.call("block_user", req).await?;
        Ok(())
    }

    async fn unblock_user(&self, blocker: UserId, blocked: UserId) -> Result<()> {
        let req = self.client.post(&self.endpoints.users).json(&json!({
            "action": "unblock",
            "blockerId": blocker,
            "blockedId": blocked,
        }));
        let _: SuccessReply = self.call("unblock_user", req).await?;
        Ok(())
    }

    async fn list_chats(&self, id: UserId) -> Result<Vec<ChatSummary>> {
        let req = self
            .client
            .get(&self.endpoints.chats)
            .header(USER_ID_HEADER, id.to_string());
        let reply: ChatsReply = self.call("list_chats", req).await?;
        Ok(reply.chats)
    }

    async fn create_chat(&self, a: UserId, b: UserId) -> Result<ChatId> {
        let req = self.client.post(&self.endpoints.chats).json(&json!({
            "user1Id": a,
            "user2Id": b,
        }));
        let reply: ChatCreatedReply = self.call("create_chat", req).await?;
        Ok(reply.chat_id)
    }

    async fn list_messages(&self, chat: ChatId) -> Result<MessagesReply> {
        let req = self
            .client
            .get(&self.endpoints.messages)
            .query(&[("chatId", chat.to_string())]);
        self.call("list_messages", req).await
    }

    async fn send_message(&self, chat: ChatId, sender: UserId, text: &str) -> Result<MessageId> {
        let req = self.client.post(&self.endpoints.messages).json(&json!({
            "chatId": chat,
            "senderId": sender,
            "text": text,
        }));
        let reply: MessageSentReply = self.call("send_message", req).await?;
        Ok(reply.id)
    }

    async fn upload_avatar(&self, encoded: &str, mime_type: &str) -> Result<String> {
        let req = self.client.post(&self.endpoints.upload).json(&json!({
            "file": encoded,
            "type": mime_type,
        }));
        let reply: UploadReply = self.call("upload_avatar", req).await?;
        Ok(reply.url)
    }
}
