//! Utilities shared by the Yorisoi server and client.

pub mod logger;
pub mod time;
