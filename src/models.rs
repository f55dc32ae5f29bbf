//! Data types shared by the Slack client, the paginator and the exporter

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

const MICROS_PER_SEC: i64 = 1_000_000;
const FRACTION_DIGITS: usize = 6;

/// Slack message timestamp (`"1512085950.000216"`), held as exact microseconds.
///
/// Slack uses the timestamp both as the ordering key and as the message
/// identifier inside a conversation, so it must round-trip without the
/// precision loss an `f64` would introduce at 16 significant digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn from_secs(secs: i64) -> Self {
        Timestamp(secs * MICROS_PER_SEC)
    }

    pub fn as_micros(self) -> i64 {
        self.0
    }

    /// Floating-point seconds since the epoch.
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / MICROS_PER_SEC as f64
    }

    /// Convert into a zoned date-time, `None` if out of chrono's range.
    pub fn to_datetime<Tz: TimeZone>(self, tz: &Tz) -> Option<DateTime<Tz>> {
        DateTime::<Utc>::from_timestamp_micros(self.0).map(|dt| dt.with_timezone(tz))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:0width$}",
            self.0 / MICROS_PER_SEC,
            self.0 % MICROS_PER_SEC,
            width = FRACTION_DIGITS
        )
    }
}

impl FromStr for Timestamp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::SerializationError(format!("invalid Slack timestamp '{}'", s));

        let (secs, fraction) = s.split_once('.').unwrap_or((s, ""));
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if secs.is_empty() || !all_digits(secs) || !all_digits(fraction) {
            return Err(invalid());
        }
        if fraction.len() > FRACTION_DIGITS {
            return Err(invalid());
        }

        let secs: i64 = secs.parse().map_err(|_| invalid())?;
        let mut micros: i64 = if fraction.is_empty() {
            0
        } else {
            fraction.parse().map_err(|_| invalid())?
        };
        for _ in fraction.len()..FRACTION_DIGITS {
            micros *= 10;
        }

        secs.checked_mul(MICROS_PER_SEC)
            .and_then(|v| v.checked_add(micros))
            .map(Timestamp)
            .ok_or_else(invalid)
    }
}

impl TryFrom<String> for Timestamp {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// A single direct message as returned by `conversations.history`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    /// Author id; absent for messages that cannot be attributed.
    #[serde(rename = "user", default)]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "ts")]
    pub timestamp: Timestamp,
    /// Set when the `is_starred` marker is present at all.
    #[serde(rename = "is_starred", default, deserialize_with = "marker_present")]
    pub starred: bool,
}

impl Message {
    pub fn new(sender_id: Option<&str>, text: &str, timestamp: Timestamp) -> Self {
        Self {
            sender_id: sender_id.map(str::to_string),
            text: text.to_string(),
            timestamp,
            starred: false,
        }
    }

    pub fn starred(mut self) -> Self {
        self.starred = true;
        self
    }

    /// Identity used to collapse re-fetched boundary messages.
    pub fn identity(&self) -> (Timestamp, Option<String>, String) {
        (self.timestamp, self.sender_id.clone(), self.text.clone())
    }
}

fn marker_present<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    serde::de::IgnoredAny::deserialize(deserializer)?;
    Ok(true)
}

/// One bounded batch of history plus the server's continuation flag.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub has_more: bool,
}

impl Page {
    pub fn new(messages: Vec<Message>, has_more: bool) -> Self {
        Self { messages, has_more }
    }

    /// `(oldest, newest)` timestamps in the page, `None` when empty.
    pub fn bounds(&self) -> Option<(Timestamp, Timestamp)> {
        let mut iter = self.messages.iter().map(|m| m.timestamp);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), ts| (lo.min(ts), hi.max(ts))))
    }
}

/// Workspace member from `users.list`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
}

impl User {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

/// Direct-message channel from `conversations.list?types=im`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(rename = "user", default)]
    pub user_id: String,
}

impl Conversation {
    pub fn new(id: &str, user_id: &str) -> Self {
        Self {
            id: id.to_string(),
            user_id: user_id.to_string(),
        }
    }
}
