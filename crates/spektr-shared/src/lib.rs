//! # spektr-shared
//!
//! Data model shared by the Spektr client crates: identities, chat
//! summaries, directory entries, messages and the backend reply envelope.

pub mod constants;
pub mod identity;
pub mod protocol;
pub mod types;

pub use identity::{normalize_username, username_is_blank, Identity, IdentityDelta, ProfileDraft};
pub use protocol::{ChatSummary, DirectoryEntry, Message, Peer};
pub use types::{ChatId, Language, MessageId, Theme, UserId};
