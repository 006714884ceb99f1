//! Shared pieces of the bot panel: configuration, platform paths, the wire
//! types of the bot's REST API and the client that talks to it.

pub mod client;
pub mod config;
pub mod format;
pub mod platform;
pub mod protocol;
