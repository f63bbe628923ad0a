//! Records exchanged with the Spektr backend, plus the reply envelope
//! every endpoint shares.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::identity::Identity;
use crate::types::{ChatId, MessageId, UserId};

/// One row of the chat list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatSummary {
    pub chat_id: ChatId,
    /// The other participant.
    pub user_id: UserId,
    pub username: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default, deserialize_with = "opt_timestamp")]
    pub last_message_time: Option<DateTime<Utc>>,
}

/// A user search hit, not yet part of any conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub sender_id: UserId,
    pub username: String,
    pub first_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(deserialize_with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// The other side of a two-party conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Peer {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl From<&Message> for Peer {
    fn from(m: &Message) -> Self {
        Self {
            id: m.sender_id,
            username: m.username.clone(),
            first_name: m.first_name.clone(),
            avatar_url: m.avatar_url.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reply bodies
// ---------------------------------------------------------------------------

/// Every endpoint either answers with its payload or with `{"error": ".."}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Reply<T> {
    Error { error: String },
    Ok(T),
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserReply {
    pub user: Identity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsersReply {
    pub users: Vec<DirectoryEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatsReply {
    pub chats: Vec<ChatSummary>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatCreatedReply {
    pub chat_id: ChatId,
}

/// History of one chat. Newer backends name the peer explicitly.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessagesReply {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub peer: Option<Peer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageSentReply {
    pub id: MessageId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadReply {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuccessReply {
    #[serde(default)]
    pub success: bool,
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Parse RFC 3339, or a naive ISO-8601 timestamp taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

fn opt_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}
