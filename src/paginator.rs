//! Reassemble a full DM history from backward-paging `conversations.history`.
//!
//! Each round asks for messages strictly older than the oldest message of
//! the previous page. Paging continues while the server reports more data
//! *or* the page came back at full capacity, because Slack can under-report
//! `has_more` on an exact page boundary. The accumulated messages are then
//! deduplicated and sorted oldest first.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::models::{Message, Page, Timestamp};
use crate::slack::SlackApi;

/// Complete, ordered history of one conversation.
#[derive(Debug, Clone, Default)]
pub struct History {
    /// Unique messages, ascending by timestamp.
    pub messages: Vec<Message>,
    /// Number of `fetch_page` calls made.
    pub fetches: usize,
    /// Re-fetched boundary messages removed during the merge.
    pub duplicates_dropped: usize,
}

/// Whether another round is needed after `page`.
pub fn should_continue(page: &Page, page_size: usize) -> bool {
    page.has_more || page.messages.len() == page_size
}

/// Fetch every message of `conversation_id`, `page_size` at a time.
pub async fn fetch_history<A: SlackApi>(
    api: &A,
    conversation_id: &str,
    page_size: usize,
) -> Result<History> {
    if page_size == 0 {
        return Err(Error::InvalidArgument("page size must be positive".to_string()));
    }

    let mut accumulated: Vec<Message> = Vec::new();
    let mut bound: Option<Timestamp> = None;
    let mut fetches = 0;

    loop {
        let page = api.fetch_page(conversation_id, bound, page_size).await?;
        fetches += 1;

        let bounds = page.bounds();
        let more = should_continue(&page, page_size);
        info!(
            "Page {}: {} messages (has_more={})",
            fetches,
            page.messages.len(),
            page.has_more
        );
        debug!(?bounds, "page bounds");

        accumulated.extend(page.messages);

        if !more {
            break;
        }

        let Some((oldest, _)) = bounds else {
            return Err(Error::PaginationAnomaly(format!(
                "page {} of {} was empty while more messages were reported",
                fetches, conversation_id
            )));
        };
        if let Some(previous) = bound {
            if oldest >= previous {
                return Err(Error::PaginationAnomaly(format!(
                    "page {} of {} did not move past {}",
                    fetches, conversation_id, previous
                )));
            }
        }
        bound = Some(oldest);
    }

    let (messages, duplicates_dropped) = merge(accumulated);
    if duplicates_dropped > 0 {
        warn!("Dropped {} duplicate messages at page boundaries", duplicates_dropped);
    }

    Ok(History {
        messages,
        fetches,
        duplicates_dropped,
    })
}

/// Drop repeated (timestamp, sender, text) entries, keeping the first
/// fetched, then stable-sort ascending. Returns the number dropped.
pub fn merge(messages: Vec<Message>) -> (Vec<Message>, usize) {
    let total = messages.len();
    let mut seen = HashSet::with_capacity(total);
    let mut unique: Vec<Message> = messages
        .into_iter()
        .filter(|m| seen.insert(m.identity()))
        .collect();
    unique.sort_by_key(|m| m.timestamp);

    let dropped = total - unique.len();
    (unique, dropped)
}
