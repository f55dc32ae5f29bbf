//! Export command - fetch a DM history and save it as CSV
//!
//! Resolves the counterpart, pages through the whole conversation and writes
//! `<name>-message-history.csv` into the configured output directory.

use std::path::PathBuf;

use tracing::info;

use crate::config::Config;
use crate::error::Result;
use crate::export::{history_filename, write_history};
use crate::paginator::fetch_history;
use crate::resolver::{resolve, UserDirectory};
use crate::slack::{SlackApi, SlackClient};

/// What a finished export produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub messages: usize,
    pub fetches: usize,
}

/// Export the DM history with `user` using the real Slack client.
pub async fn run(config: &Config, user: &str) -> Result<ExportSummary> {
    let client = SlackClient::from_config(config)?;
    export_with(&client, config, user).await
}

/// Export against any [`SlackApi`] implementation.
///
/// Nothing is written unless the whole history was fetched.
pub async fn export_with<A: SlackApi>(api: &A, config: &Config, user: &str) -> Result<ExportSummary> {
    config.validate()?;

    let conversations = api.list_direct_message_conversations().await?;
    let users = api.list_users().await?;
    info!(
        "Loaded {} DM channels and {} users",
        conversations.len(),
        users.len()
    );

    let mut directory = UserDirectory::new(&config.self_label);
    let resolution = resolve(user, &users, &conversations, &mut directory)?;

    let history = fetch_history(api, &resolution.conversation_id, config.page_size).await?;

    let path = config.output_dir.join(history_filename(&resolution.name));
    println!(
        "Found {} messages with user {}",
        history.messages.len(),
        resolution.name
    );
    println!("Saving to {}...", path.display());

    let rows = write_history(&path, &history.messages, &directory, &config.time_format)?;
    println!("Save complete");

    Ok(ExportSummary {
        path,
        messages: rows,
        fetches: history.fetches,
    })
}
