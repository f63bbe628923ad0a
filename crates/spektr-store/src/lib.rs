//! # spektr-store
//!
//! Durable local state for the Spektr client, backed by SQLite.
//!
//! The client keeps exactly one record: the last authenticated identity,
//! saved under a fixed namespace. It is written after every successful
//! sign-in or profile save and removed on logout.

pub mod database;
pub mod migrations;
pub mod session;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
