//! Slack Direct-Message Exporter Library
//!
//! This library provides tools to:
//! - Resolve a Slack user name to the DM channel shared with the token owner
//! - Page backward through the whole channel history and merge it
//! - Export the ordered transcript to a CSV spreadsheet

pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod paginator;
pub mod resolver;
pub mod slack;

// Re-export common types
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use models::{Conversation, Message, Page, Timestamp, User};
pub use paginator::{fetch_history, History};
pub use resolver::{resolve, Resolution, UserDirectory};
pub use slack::{SlackApi, SlackClient};

// Commands module uses re-exported types, so it must be declared after the re-exports
pub mod commands;
