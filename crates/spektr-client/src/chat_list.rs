//! Directory & Chat List.
//!
//! Holds the signed-in user's conversations and the live user search.
//! While a search query is active its results replace the chat list; when
//! the query is cleared the last loaded list comes back untouched.

use std::sync::Arc;

use tracing::{debug, info, warn};

use spektr_shared::{ChatId, ChatSummary, DirectoryEntry, UserId};

use crate::api::Backend;
use crate::error::{ClientError, Result};
use crate::sequencer::{RequestSequencer, Ticket};
use crate::session::SessionStore;

/// Request keys for the list screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKey {
    Chats(UserId),
    Search,
}

/// What the list area currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListRows<'a> {
    Chats(&'a [ChatSummary]),
    /// Search mode; may be empty ("nobody found").
    Directory(&'a [DirectoryEntry]),
}

pub struct ChatList {
    backend: Arc<dyn Backend>,
    session: SessionStore,
    owner: Option<UserId>,
    chats: Vec<ChatSummary>,
    query: String,
    results: Vec<DirectoryEntry>,
    searching: bool,
    sequencer: RequestSequencer<ListKey>,
    error: Option<String>,
}

impl ChatList {
    pub fn new(backend: Arc<dyn Backend>, session: SessionStore) -> Self {
        Self {
            backend,
            session,
            owner: None,
            chats: Vec::new(),
            query: String::new(),
            results: Vec::new(),
            searching: false,
            sequencer: RequestSequencer::new(),
            error: None,
        }
    }

    pub fn chats(&self) -> &[ChatSummary] {
        &self.chats
    }

    pub fn results(&self) -> &[DirectoryEntry] {
        &self.results
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_searching(&self) -> bool {
        self.searching
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn rows(&self) -> ListRows<'_> {
        if self.searching {
            ListRows::Directory(&self.results)
        } else {
            ListRows::Chats(&self.chats)
        }
    }

    /// Identity the current list belongs to.
    pub fn owner(&self) -> Option<UserId> {
        self.owner
    }

    fn me(&self) -> Result<UserId> {
        self.session.current_id().ok_or(ClientError::NotAuthenticated)
    }

    // -----------------------------------------------------------------------
    // Chat list
    // -----------------------------------------------------------------------

    /// Reload the list if the active identity changed since the last load.
    /// Returns whether a reload happened.
    pub async fn sync_identity(&mut self) -> Result<bool> {
        if self.session.current_id() == self.owner {
            return Ok(false);
        }
        self.load_chats().await?;
        Ok(true)
    }

    pub fn begin_load_chats(&mut self) -> Result<Ticket<ListKey>> {
        let me = self.me()?;
        Ok(self.sequencer.issue(ListKey::Chats(me)))
    }

    /// Apply a chat list response. Returns `Ok(false)` when a newer response
    /// was already applied.
    pub fn apply_chats(
        &mut self,
        ticket: Ticket<ListKey>,
        outcome: Result<Vec<ChatSummary>>,
    ) -> Result<bool> {
        let chats = outcome.map_err(|e| self.fail_for(&ticket, "load chats", e))?;
        if !self.sequencer.accept(&ticket) {
            warn!(seq = ticket.seq(), "discarding stale chat list");
            return Ok(false);
        }
        let ListKey::Chats(owner) = *ticket.key() else {
            return Ok(false);
        };
        if self.session.current_id() != Some(owner) {
            debug!(user_id = %owner, "discarding chat list of a previous identity");
            return Ok(false);
        }
        debug!(user_id = %owner, count = chats.len(), "chat list loaded");
        self.owner = Some(owner);
        self.chats = chats;
        self.error = None;
        Ok(true)
    }

    /// Fetch the full set of conversations, replacing the held one.
    pub async fn load_chats(&mut self) -> Result<()> {
        let me = self.me()?;
        let ticket = self.sequencer.issue(ListKey::Chats(me));
        let outcome = self.backend.list_chats(me).await;
        self.apply_chats(ticket, outcome).map(|_| ())
    }

    // -----------------------------------------------------------------------
    // Search
    // -----------------------------------------------------------------------

    /// Record a query change. A blank query leaves search mode and returns
    /// `None`; otherwise the returned ticket must accompany the request.
    pub fn begin_search(&mut self, query: &str) -> Option<Ticket<ListKey>> {
        self.query = query.to_string();
        let ticket = self.sequencer.issue(ListKey::Search);
        if query.trim().is_empty() {
            // Anything still in flight is older than this and gets dropped.
            self.sequencer.accept(&ticket);
            self.results.clear();
            self.searching = false;
            return None;
        }
        Some(ticket)
    }

    pub fn apply_search(
        &mut self,
        ticket: Ticket<ListKey>,
        outcome: Result<Vec<DirectoryEntry>>,
    ) -> Result<bool> {
        let results = outcome.map_err(|e| self.fail_for(&ticket, "search", e))?;
        if !self.sequencer.accept(&ticket) {
            debug!(seq = ticket.seq(), "discarding stale search results");
            return Ok(false);
        }
        self.results = results;
        self.searching = true;
        self.error = None;
        Ok(true)
    }

    /// Handle one change of the search input.
    pub async fn search(&mut self, query: &str) -> Result<()> {
        let Some(ticket) = self.begin_search(query) else {
            return Ok(());
        };
        let requester = self.session.current_id();
        let outcome = self.backend.search_users(query, requester).await;
        self.apply_search(ticket, outcome).map(|_| ())
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// Open (or create) the conversation with a directory entry. The
    /// returned chat id is where the caller navigates next.
    pub async fn select_entry(&mut self, entry: &DirectoryEntry) -> Result<ChatId> {
        let me = self.me()?;
        match self.backend.create_chat(me, entry.id).await {
            Ok(chat_id) => {
                info!(chat_id = %chat_id, peer = %entry.username, "chat opened");
                Ok(chat_id)
            }
            Err(e) => Err(self.fail("create chat", e)),
        }
    }

    /// Lift a block and reload the list, where the user's chat reappears.
    pub async fn unblock(&mut self, user: UserId) -> Result<()> {
        let me = self.me()?;
        if let Err(e) = self.backend.unblock_user(me, user).await {
            return Err(self.fail("unblock", e));
        }
        info!(user_id = %user, "user unblocked");
        self.load_chats().await
    }

    /// Record a failed response unless a newer request for the same key
    /// has been issued since; that one decides what the screen shows.
    fn fail_for(&mut self, ticket: &Ticket<ListKey>, op: &'static str, e: ClientError) -> ClientError {
        if !self.sequencer.is_latest(ticket) {
            debug!(op, seq = ticket.seq(), error = ?e, "ignoring failure of a superseded request");
            return e;
        }
        self.fail(op, e)
    }

    fn fail(&mut self, op: &'static str, e: ClientError) -> ClientError {
        warn!(op, error = ?e, "chat list operation failed");
        self.error = Some(e.user_message());
        e
    }
}
