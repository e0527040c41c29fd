//! Terminal client for the Yorisoi chat room.
//!
//! Joins with a user id, shows the assigned anonymous identity, replays the
//! recent history, and keeps reconnecting with a fresh identity when the
//! connection drops.

pub mod domain;
pub mod error;
pub mod formatter;
pub mod input;
pub mod runner;
pub mod session;
pub mod ui;

pub use error::ClientError;
pub use runner::{ClientConfig, run_client};
