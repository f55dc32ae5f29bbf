//! Minimal Slack Web API client (users, DM channels, history).

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::models::{Conversation, Page, Timestamp, User};
use crate::{Error, Result};

/// Page size for the list endpoints (users, conversations).
const LIST_LIMIT: usize = 200;

/// Remote operations the exporter depends on.
#[allow(async_fn_in_trait)]
pub trait SlackApi {
    /// All direct-message channels visible to the token owner.
    async fn list_direct_message_conversations(&self) -> Result<Vec<Conversation>>;

    /// All workspace members.
    async fn list_users(&self) -> Result<Vec<User>>;

    /// One page of history strictly older than `latest` (newest first).
    async fn fetch_page(
        &self,
        conversation_id: &str,
        latest: Option<Timestamp>,
        limit: usize,
    ) -> Result<Page>;
}

#[derive(Debug, Clone)]
pub struct SlackClient {
    http: Client,
    token: String,
    base_url: String,
}

impl SlackClient {
    /// Create client with provided API token.
    pub fn new<S: Into<String>>(token: S, timeout: Duration) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(Error::MissingCredential(crate::config::TOKEN_ENV.to_string()));
        }

        let http = Client::builder()
            .user_agent(format!("slack_dm_export/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            token,
            base_url: crate::config::DEFAULT_API_URL.to_string(),
        })
    }

    /// Create client from loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut client = Self::new(config.token()?, config.request_timeout)?;
        client.base_url = config.api_url.trim_end_matches('/').to_string();
        Ok(client)
    }

    /// Create client with custom base url (primarily for tests).
    pub fn with_base_url<S1: Into<String>, S2: Into<String>>(
        token: S1,
        base_url: S2,
    ) -> Result<Self> {
        let mut client = Self::new(token, Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS))?;
        client.base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(client)
    }

    async fn get<D: DeserializeOwned>(&self, method: &str, query: &[(&str, String)]) -> Result<D> {
        let url = format!("{}/{}", self.base_url, method);
        debug!(%method, ?query, "Slack API call");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Http(format!("{} request failed: {}", method, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Http(format!("failed to read {} response: {}", method, e)))?;

        if !status.is_success() {
            return Err(Error::Http(format!(
                "{} returned HTTP {}: {}",
                method,
                status.as_u16(),
                text
            )));
        }

        let envelope: Envelope = serde_json::from_str(&text).map_err(|e| {
            Error::SerializationError(format!("{} returned non-JSON body: {}", method, e))
        })?;
        if !envelope.ok {
            return Err(Error::SlackApi(format!(
                "{}: {}",
                method,
                envelope.error.unwrap_or_else(|| "unknown_error".to_string())
            )));
        }

        serde_json::from_str(&text).map_err(|e| {
            Error::SerializationError(format!("unexpected {} payload: {}", method, e))
        })
    }
}

impl SlackApi for SlackClient {
    async fn list_direct_message_conversations(&self) -> Result<Vec<Conversation>> {
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut query = vec![("types", "im".to_string()), ("limit", LIST_LIMIT.to_string())];
            if let Some(c) = cursor.take() {
                query.push(("cursor", c));
            }

            let response: ConversationsList = self.get("conversations.list", &query).await?;
            all.extend(response.channels);

            match next_cursor(response.response_metadata) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(all)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut query = vec![("limit", LIST_LIMIT.to_string())];
            if let Some(c) = cursor.take() {
                query.push(("cursor", c));
            }

            let response: UsersList = self.get("users.list", &query).await?;
            all.extend(response.members);

            match next_cursor(response.response_metadata) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(all)
    }

    async fn fetch_page(
        &self,
        conversation_id: &str,
        latest: Option<Timestamp>,
        limit: usize,
    ) -> Result<Page> {
        let mut query = vec![
            ("channel", conversation_id.to_string()),
            ("limit", limit.to_string()),
            ("inclusive", "false".to_string()),
        ];
        if let Some(bound) = latest {
            query.push(("latest", bound.to_string()));
        }

        self.get("conversations.history", &query).await
    }
}

fn next_cursor(meta: Option<ResponseMetadata>) -> Option<String> {
    meta.and_then(|m| m.next_cursor).filter(|c| !c.is_empty())
}

#[derive(Debug, Deserialize)]
struct Envelope {
    ok: bool,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ConversationsList {
    #[serde(default)]
    channels: Vec<Conversation>,
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct UsersList {
    #[serde(default)]
    members: Vec<User>,
    response_metadata: Option<ResponseMetadata>,
}
