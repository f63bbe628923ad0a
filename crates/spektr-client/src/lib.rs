//! # spektr-client
//!
//! Client core for the Spektr messenger: the session, the auth flow, the
//! chat list and directory search, open conversations with polling, and
//! the profile editor, all talking to the backend through [`api::Backend`].

pub mod api;
pub mod app;
pub mod auth;
pub mod chat_list;
pub mod config;
pub mod conversation;
pub mod error;
pub mod profile;
pub mod sequencer;
pub mod session;
pub mod theme;

mod busy;

use tracing_subscriber::{fmt, EnvFilter};

pub use app::{App, Route};
pub use config::ClientConfig;
pub use error::{ClientError, Result};

/// Install the global `tracing` subscriber. `RUST_LOG` overrides the
/// default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("spektr_client=debug,spektr_store=info,warn"));

    // Log to stderr so the terminal driver's stdout stays readable.
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .try_init();
}
