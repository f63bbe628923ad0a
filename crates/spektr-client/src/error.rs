use spektr_store::StoreError;
use thiserror::Error;

/// Everything a client operation can fail with. None of these end the
/// process; the worst outcome is that the operation did not complete.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Input rejected locally, before any boundary call.
    #[error("{0}")]
    Validation(String),

    /// The backend answered with an error payload. Shown verbatim.
    #[error("{0}")]
    Rejected(String),

    /// The call did not complete (network, HTTP status or decoding).
    /// The detail is logged; users see a generic message.
    #[error("Could not reach the server, please try again")]
    Transport(String),

    /// A request for the same action is still in flight.
    #[error("Please wait for the current request to finish")]
    Busy,

    /// The conversation has no known peer yet.
    #[error("The other participant is not known yet")]
    NoPeer,

    /// The operation needs a signed-in user.
    #[error("Not signed in")]
    NotAuthenticated,

    /// Local persistence failed.
    #[error("Local storage error: {0}")]
    Storage(#[from] StoreError),
}

impl ClientError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
