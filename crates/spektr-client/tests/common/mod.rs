//! Scripted in-memory backend and fixtures shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use spektr_client::api::{Backend, Registration};
use spektr_client::session::SessionStore;
use spektr_client::theme::ThemeHandle;
use spektr_client::{ClientError, Result};
use spektr_shared::protocol::MessagesReply;
use spektr_shared::{
    ChatId, ChatSummary, DirectoryEntry, Identity, IdentityDelta, Language, Message, MessageId,
    Theme, UserId,
};
use spektr_store::Database;

/// One recorded boundary call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Login { email: String, password: String },
    Register(Registration),
    Search { query: String, requester: Option<UserId> },
    Update { id: UserId, delta: IdentityDelta },
    Block { blocker: UserId, blocked: UserId },
    Unblock { blocker: UserId, blocked: UserId },
    ListChats(UserId),
    CreateChat(UserId, UserId),
    ListMessages(ChatId),
    Send { chat: ChatId, sender: UserId, text: String },
    Upload { encoded: String, mime_type: String },
}

#[derive(Default)]
struct Script {
    calls: Vec<Call>,
    identities: VecDeque<Result<Identity>>,
    searches: VecDeque<Result<Vec<DirectoryEntry>>>,
    chats: VecDeque<Result<Vec<ChatSummary>>>,
    creates: VecDeque<Result<ChatId>>,
    histories: VecDeque<Result<MessagesReply>>,
    /// Served once `histories` runs dry.
    standing_history: MessagesReply,
    sends: VecDeque<Result<MessageId>>,
    blocks: VecDeque<Result<()>>,
    uploads: VecDeque<Result<String>>,
    /// Calls still to be left hanging after they are recorded.
    stalls: u32,
}

/// Backend that answers from per-operation queues and records every call.
/// Unscripted identity calls fail; everything else has a benign default.
#[derive(Default)]
pub struct FakeBackend {
    script: Mutex<Script>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    pub fn push_identity(&self, outcome: Result<Identity>) {
        self.script().identities.push_back(outcome);
    }

    pub fn push_search(&self, outcome: Result<Vec<DirectoryEntry>>) {
        self.script().searches.push_back(outcome);
    }

    pub fn push_chats(&self, outcome: Result<Vec<ChatSummary>>) {
        self.script().chats.push_back(outcome);
    }

    pub fn push_history(&self, outcome: Result<MessagesReply>) {
        self.script().histories.push_back(outcome);
    }

    pub fn set_standing_history(&self, reply: MessagesReply) {
        self.script().standing_history = reply;
    }

    pub fn push_create(&self, outcome: Result<ChatId>) {
        self.script().creates.push_back(outcome);
    }

    /// Leave the next `n` login, update, send or upload calls pending
    /// forever, so callers can abandon them.
    pub fn stall_next(&self, n: u32) {
        self.script().stalls = n;
    }

    pub fn push_send(&self, outcome: Result<MessageId>) {
        self.script().sends.push_back(outcome);
    }

    pub fn push_block(&self, outcome: Result<()>) {
        self.script().blocks.push_back(outcome);
    }

    pub fn push_upload(&self, outcome: Result<String>) {
        self.script().uploads.push_back(outcome);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.script().calls.iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) -> std::sync::MutexGuard<'_, Script> {
        let mut script = self.script();
        script.calls.push(call);
        script
    }

    fn note(&self, call: Call) {
        self.script().calls.push(call);
    }

    async fn stall(&self) {
        let stalled = {
            let mut script = self.script();
            let stalled = script.stalls > 0;
            if stalled {
                script.stalls -= 1;
            }
            stalled
        };
        if stalled {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn login(&self, email: &str, password: &str) -> Result<Identity> {
        self.note(Call::Login {
            email: email.to_string(),
            password: password.to_string(),
        });
        self.stall().await;
        self.script().identities.pop_front().unwrap_or_else(unscripted)
    }

    async fn register(&self, registration: &Registration) -> Result<Identity> {
        let mut s = self.record(Call::Register(registration.clone()));
        s.identities.pop_front().unwrap_or_else(unscripted)
    }

    async fn search_users(
        &self,
        query: &str,
        requester: Option<UserId>,
    ) -> Result<Vec<DirectoryEntry>> {
        let mut s = self.record(Call::Search {
            query: query.to_string(),
            requester,
        });
        s.searches.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn update_identity(&self, id: UserId, delta: &IdentityDelta) -> Result<Identity> {
        self.note(Call::Update {
            id,
            delta: delta.clone(),
        });
        self.stall().await;
        self.script().identities.pop_front().unwrap_or_else(unscripted)
    }

    async fn block_user(&self, blocker: UserId, blocked: UserId) -> Result<()> {
        let mut s = self.record(Call::Block { blocker, blocked });
        s.blocks.pop_front().unwrap_or(Ok(()))
    }

    async fn unblock_user(&self, blocker: UserId, blocked: UserId) -> Result<()> {
        self.note(Call::Unblock { blocker, blocked });
        Ok(())
    }

    async fn list_chats(&self, id: UserId) -> Result<Vec<ChatSummary>> {
        let mut s = self.record(Call::ListChats(id));
        s.chats.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn create_chat(&self, a: UserId, b: UserId) -> Result<ChatId> {
        let mut s = self.record(Call::CreateChat(a, b));
        s.creates
            .pop_front()
            .unwrap_or(Ok(ChatId(a.0 * 100 + b.0)))
    }

    async fn list_messages(&self, chat: ChatId) -> Result<MessagesReply> {
        let mut s = self.record(Call::ListMessages(chat));
        match s.histories.pop_front() {
            Some(outcome) => outcome,
            None => Ok(s.standing_history.clone()),
        }
    }

    async fn send_message(&self, chat: ChatId, sender: UserId, text: &str) -> Result<MessageId> {
        self.note(Call::Send {
            chat,
            sender,
            text: text.to_string(),
        });
        self.stall().await;
        self.script().sends.pop_front().unwrap_or(Ok(MessageId(1)))
    }

    async fn upload_avatar(&self, encoded: &str, mime_type: &str) -> Result<String> {
        self.note(Call::Upload {
            encoded: encoded.to_string(),
            mime_type: mime_type.to_string(),
        });
        self.stall().await;
        self.script()
            .uploads
            .pop_front()
            .unwrap_or_else(|| Ok("https://cdn.example/avatars/1.png".to_string()))
    }
}

fn unscripted<T>() -> Result<T> {
    Err(ClientError::Rejected("unscripted call".into()))
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn session() -> (SessionStore, ThemeHandle) {
    let theme = ThemeHandle::new();
    let db = Database::open_in_memory().unwrap();
    (SessionStore::new(db, Arc::new(theme.clone())), theme)
}

pub fn signed_in(identity: Identity) -> (SessionStore, ThemeHandle) {
    let (session, theme) = session();
    session.set_identity(identity).unwrap();
    (session, theme)
}

pub fn identity(id: i64, username: &str, first_name: &str) -> Identity {
    Identity {
        id: UserId(id),
        username: username.to_string(),
        email: format!("{}@example.com", username.trim_start_matches('@')),
        first_name: first_name.to_string(),
        last_name: None,
        avatar_url: None,
        language: Language::Ru,
        theme: Theme::Light,
    }
}

pub fn ann() -> Identity {
    identity(1, "@ann", "Ann")
}

pub fn bob() -> Identity {
    identity(2, "@bob", "Bob")
}

pub fn chat(chat_id: i64, peer: &Identity, last: Option<&str>) -> ChatSummary {
    ChatSummary {
        chat_id: ChatId(chat_id),
        user_id: peer.id,
        username: peer.username.clone(),
        first_name: peer.first_name.clone(),
        last_name: None,
        avatar_url: None,
        last_message: last.map(str::to_string),
        last_message_time: None,
    }
}

pub fn entry(of: &Identity) -> DirectoryEntry {
    DirectoryEntry {
        id: of.id,
        username: of.username.clone(),
        first_name: of.first_name.clone(),
        last_name: None,
        avatar_url: None,
    }
}

pub fn message(id: i64, from: &Identity, text: &str) -> Message {
    Message {
        id: MessageId(id),
        text: text.to_string(),
        sender_id: from.id,
        username: from.username.clone(),
        first_name: from.first_name.clone(),
        avatar_url: None,
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, id as u32).unwrap(),
    }
}

pub fn history(messages: Vec<Message>) -> MessagesReply {
    MessagesReply {
        messages,
        peer: None,
    }
}
