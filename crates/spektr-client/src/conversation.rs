//! Conversation View: one chat's history, the input box and the poller.
//!
//! All state of a mounted conversation lives behind one lock owned by the
//! view. The poller task and user actions both go through it, so there is a
//! single writer per conversation even on a multi-threaded runtime. History
//! responses are sequence-tagged and stale ones are dropped, whichever of
//! the poller or a manual reload issued them.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use spektr_shared::protocol::MessagesReply;
use spektr_shared::{ChatId, Message, MessageId, Peer, UserId};

use crate::api::Backend;
use crate::app::Route;
use crate::error::{ClientError, Result};
use crate::sequencer::{RequestSequencer, Ticket};

#[derive(Debug, Default)]
struct ConversationState {
    messages: Vec<Message>,
    peer: Option<Peer>,
    input: String,
    sending: bool,
    error: Option<String>,
    sequencer: RequestSequencer<ChatId>,
}

/// Everything the poller needs; cloned into its task.
#[derive(Clone)]
struct Loader {
    chat_id: ChatId,
    me: UserId,
    backend: Arc<dyn Backend>,
    state: Arc<Mutex<ConversationState>>,
    version: Arc<watch::Sender<u64>>,
}

impl Loader {
    fn lock(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn begin(&self) -> Ticket<ChatId> {
        self.lock().sequencer.issue(self.chat_id)
    }

    fn apply(&self, ticket: Ticket<ChatId>, outcome: Result<MessagesReply>) -> Result<bool> {
        let reply = match outcome {
            Ok(reply) => reply,
            Err(e) => {
                debug!(chat_id = %self.chat_id, error = ?e, "history load failed");
                return Err(e);
            }
        };

        let mut state = self.lock();
        if !state.sequencer.accept(&ticket) {
            warn!(chat_id = %self.chat_id, seq = ticket.seq(), "discarding stale history");
            return Ok(false);
        }

        let peer = reply.peer.or_else(|| derive_peer(&reply.messages, self.me));
        if peer.is_some() {
            state.peer = peer;
        }
        state.messages = reply.messages;
        drop(state);

        self.version.send_modify(|v| *v += 1);
        Ok(true)
    }

    async fn load(&self) -> Result<bool> {
        let ticket = self.begin();
        let outcome = self.backend.list_messages(self.chat_id).await;
        self.apply(ticket, outcome)
    }
}

/// Marks the conversation as sending; cleared on drop, so a cancelled send
/// does not leave the view stuck.
struct Sending<'a> {
    loader: &'a Loader,
}

impl<'a> Sending<'a> {
    /// Claim the send slot and take the text to send. The input is sent as
    /// typed; trimming only decides whether there is anything to send.
    fn begin(loader: &'a Loader) -> Result<(Self, String)> {
        let mut state = loader.lock();
        if state.sending {
            return Err(ClientError::Busy);
        }
        if state.input.trim().is_empty() {
            return Err(ClientError::validation("Message is empty"));
        }
        state.sending = true;
        state.error = None;
        Ok((Self { loader }, state.input.clone()))
    }
}

impl Drop for Sending<'_> {
    fn drop(&mut self) {
        self.loader.lock().sending = false;
    }
}

/// First sender in load order that is not `me`.
pub fn derive_peer(messages: &[Message], me: UserId) -> Option<Peer> {
    messages.iter().find(|m| m.sender_id != me).map(Peer::from)
}

pub struct ConversationView {
    loader: Loader,
    poller: Option<JoinHandle<()>>,
}

impl ConversationView {
    /// Open a conversation without polling.
    pub fn new(chat_id: ChatId, me: UserId, backend: Arc<dyn Backend>) -> Self {
        let (version, _rx) = watch::channel(0);
        Self {
            loader: Loader {
                chat_id,
                me,
                backend,
                state: Arc::new(Mutex::new(ConversationState::default())),
                version: Arc::new(version),
            },
            poller: None,
        }
    }

    /// Open a conversation and start polling: history loads immediately,
    /// then every `period` until the view is unmounted or dropped.
    pub fn mount(chat_id: ChatId, me: UserId, backend: Arc<dyn Backend>, period: Duration) -> Self {
        let mut view = Self::new(chat_id, me, backend);
        view.start_polling(period);
        view
    }

    pub fn start_polling(&mut self, period: Duration) {
        self.stop_polling();

        let loader = self.loader.clone();
        info!(chat_id = %loader.chat_id, period_ms = period.as_millis() as u64, "polling started");
        self.poller = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                // Failures are retried by the next tick only.
                let _ = loader.load().await;
            }
        }));
    }

    pub fn stop_polling(&mut self) {
        if let Some(handle) = self.poller.take() {
            handle.abort();
            debug!(chat_id = %self.loader.chat_id, "polling stopped");
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Tear the view down. Equivalent to dropping it.
    pub fn unmount(mut self) {
        self.stop_polling();
    }

    pub fn chat_id(&self) -> ChatId {
        self.loader.chat_id
    }

    pub fn messages(&self) -> Vec<Message> {
        self.loader.lock().messages.clone()
    }

    /// The other participant, once known. Peer-specific UI stays hidden
    /// until then.
    pub fn peer(&self) -> Option<Peer> {
        self.loader.lock().peer.clone()
    }

    pub fn input(&self) -> String {
        self.loader.lock().input.clone()
    }

    pub fn set_input(&self, text: &str) {
        self.loader.lock().input = text.to_string();
    }

    pub fn is_sending(&self) -> bool {
        self.loader.lock().sending
    }

    pub fn error(&self) -> Option<String> {
        self.loader.lock().error.clone()
    }

    /// Bumped each time a history response is applied.
    pub fn updates(&self) -> watch::Receiver<u64> {
        self.loader.version.subscribe()
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    pub fn begin_history(&self) -> Ticket<ChatId> {
        self.loader.begin()
    }

    /// Apply a history response. Returns `Ok(false)` if a newer one was
    /// already applied.
    pub fn apply_history(
        &self,
        ticket: Ticket<ChatId>,
        outcome: Result<MessagesReply>,
    ) -> Result<bool> {
        self.loader.apply(ticket, outcome)
    }

    /// Fetch the full history and replace the held sequence.
    pub async fn load_history(&self) -> Result<bool> {
        self.loader.load().await
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    /// Send the current input. On success the input is cleared and the
    /// history reloaded; on failure the input is kept.
    pub async fn send_message(&self) -> Result<MessageId> {
        let chat_id = self.loader.chat_id;
        let outcome = {
            let (_sending, text) = Sending::begin(&self.loader)?;
            self.loader
                .backend
                .send_message(chat_id, self.loader.me, &text)
                .await
        };

        {
            let mut state = self.loader.lock();
            match &outcome {
                Ok(id) => {
                    debug!(chat_id = %chat_id, message_id = ?id, "message sent");
                    state.input.clear();
                }
                Err(e) => {
                    warn!(chat_id = %chat_id, error = ?e, "send failed");
                    state.error = Some(e.user_message());
                }
            }
        }

        let id = outcome?;
        if let Err(e) = self.loader.load().await {
            debug!(chat_id = %chat_id, error = ?e, "reload after send failed");
        }
        Ok(id)
    }

    /// Block the peer. On success the caller goes back to the chat list.
    pub async fn block_peer(&self) -> Result<Route> {
        let peer = self.peer().ok_or(ClientError::NoPeer)?;
        match self.loader.backend.block_user(self.loader.me, peer.id).await {
            Ok(()) => {
                info!(user_id = %peer.id, username = %peer.username, "user blocked");
                Ok(Route::ChatList)
            }
            Err(e) => {
                warn!(user_id = %peer.id, error = ?e, "block failed");
                self.loader.lock().error = Some(e.user_message());
                Err(e)
            }
        }
    }
}

impl Drop for ConversationView {
    fn drop(&mut self) {
        self.stop_polling();
    }
}
