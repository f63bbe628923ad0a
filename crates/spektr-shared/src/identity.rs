use serde::{Deserialize, Serialize};

use crate::types::{lenient, Language, Theme, UserId};

/// The signed-in user's profile as held by the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub language: Language,
    #[serde(default, deserialize_with = "lenient")]
    pub theme: Theme,
}

impl Identity {
    /// "First Last", or just the first name.
    pub fn display_name(&self) -> String {
        match self.last_name.as_deref().filter(|s| !s.is_empty()) {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }
}

/// Prefix a username with exactly one `@` when it has none.
pub fn normalize_username(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('@') {
        trimmed.to_string()
    } else {
        format!("@{trimmed}")
    }
}

/// True when nothing but whitespace and `@` is left, e.g. `"@"` or `" @@ "`.
pub fn username_is_blank(raw: &str) -> bool {
    raw.trim().trim_start_matches('@').trim().is_empty()
}

/// Editable copy of an [`Identity`]. There is no `id` field: the id never
/// changes once the backend assigned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDraft {
    pub username: String,
    pub email: String,
    pub first_name: String,
    /// Empty means "no last name".
    pub last_name: String,
    pub avatar_url: Option<String>,
    pub language: Language,
    pub theme: Theme,
}

impl From<&Identity> for ProfileDraft {
    fn from(identity: &Identity) -> Self {
        Self {
            username: identity.username.clone(),
            email: identity.email.clone(),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone().unwrap_or_default(),
            avatar_url: identity.avatar_url.clone(),
            language: identity.language,
            theme: identity.theme,
        }
    }
}

/// Fields to change on the backend. Only fields that differ are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
}

impl IdentityDelta {
    /// Compare a draft against the last persisted identity.
    pub fn between(persisted: &Identity, draft: &ProfileDraft) -> Self {
        fn changed<T: PartialEq + Clone>(old: &T, new: &T) -> Option<T> {
            (old != new).then(|| new.clone())
        }

        let username = normalize_username(&draft.username);
        let last_name = draft.last_name.trim().to_string();
        let avatar_url = match (&persisted.avatar_url, &draft.avatar_url) {
            (old, Some(new)) if old.as_ref() != Some(new) => Some(new.clone()),
            _ => None,
        };

        Self {
            username: changed(&persisted.username, &username),
            first_name: changed(&persisted.first_name, &draft.first_name),
            last_name: changed(&persisted.last_name.clone().unwrap_or_default(), &last_name),
            email: changed(&persisted.email, &draft.email),
            avatar_url,
            language: changed(&persisted.language, &draft.language),
            theme: changed(&persisted.theme, &draft.theme),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Names of the wire fields carried by this delta.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.username.is_some() {
            names.push("username");
        }
        if self.first_name.is_some() {
            names.push("firstName");
        }
        if self.last_name.is_some() {
            names.push("lastName");
        }
        if self.email.is_some() {
            names.push("email");
        }
        if self.avatar_url.is_some() {
            names.push("avatarUrl");
        }
        if self.language.is_some() {
            names.push("language");
        }
        if self.theme.is_some() {
            names.push("theme");
        }
        names
    }
}
