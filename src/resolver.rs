//! Resolve a counterpart's name to their DM conversation.

use std::collections::HashMap;

use tracing::info;

use crate::config::DEFAULT_SELF_LABEL;
use crate::error::{Error, Result};
use crate::models::{Conversation, User};

/// Sender id → display name, with a fallback label for the requesting user.
///
/// In a DM only two people write: the counterpart, who is registered here
/// once resolved, and the token owner. Any sender missing from the map is
/// therefore attributed to the self label.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    names: HashMap<String, String>,
    self_label: String,
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::new(DEFAULT_SELF_LABEL)
    }
}

impl UserDirectory {
    pub fn new(self_label: &str) -> Self {
        Self {
            names: HashMap::new(),
            self_label: self_label.to_string(),
        }
    }

    pub fn register(&mut self, user_id: &str, name: &str) {
        self.names.insert(user_id.to_string(), name.to_string());
    }

    /// Display name for `sender_id`, or the self label.
    pub fn resolve_or_self(&self, sender_id: Option<&str>) -> &str {
        sender_id
            .and_then(|id| self.names.get(id))
            .map(String::as_str)
            .unwrap_or(self.self_label.as_str())
    }

}

/// Outcome of resolving a counterpart name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub name: String,
    pub user_id: String,
    pub conversation_id: String,
}

/// First user whose `name` equals `name` exactly (case-sensitive).
pub fn find_user_id<'a>(users: &'a [User], name: &str) -> Result<&'a str> {
    users
        .iter()
        .find(|u| u.name == name)
        .map(|u| u.id.as_str())
        .ok_or_else(|| Error::UserNotFound(name.to_string()))
}

/// First DM channel whose counterpart is `user_id`.
pub fn find_conversation_id<'a>(
    conversations: &'a [Conversation],
    user_id: &str,
    name: &str,
) -> Result<&'a str> {
    conversations
        .iter()
        .find(|c| c.user_id == user_id)
        .map(|c| c.id.as_str())
        .ok_or_else(|| Error::ConversationNotFound(name.to_string()))
}

/// Resolve `name` and register it in `directory` for message attribution.
pub fn resolve(
    name: &str,
    users: &[User],
    conversations: &[Conversation],
    directory: &mut UserDirectory,
) -> Result<Resolution> {
    let user_id = find_user_id(users, name)?;
    info!("Resolved user {} -> {}", name, user_id);

    let conversation_id = find_conversation_id(conversations, user_id, name)?;
    info!("Found DM channel {} with {}", conversation_id, name);

    directory.register(user_id, name);

    Ok(Resolution {
        name: name.to_string(),
        user_id: user_id.to_string(),
        conversation_id: conversation_id.to_string(),
    })
}
