//! Export utilities for saving a DM history to a CSV spreadsheet

use std::fmt::{Display, Write as _};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, TimeZone};

use crate::error::{Error, Result};
use crate::models::{Message, Timestamp};
use crate::resolver::UserDirectory;

pub const HEADER: [&str; 4] = ["Time", "Author", "Content", "Is Starred"];
const STARRED: &str = "yes";
const PARTIAL_SUFFIX: &str = "partial";

/// `<name>-message-history.csv`
pub fn history_filename(name: &str) -> String {
    format!("{}-message-history.csv", name)
}

/// Render `ts` in `tz` with a strftime `format`.
///
/// Falls back to the raw Slack timestamp when it is outside chrono's range.
pub fn format_time<Tz>(ts: Timestamp, tz: &Tz, format: &str) -> Result<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let Some(dt) = ts.to_datetime(tz) else {
        return Ok(ts.to_string());
    };
    let mut out = String::new();
    write!(out, "{}", dt.format(format))
        .map_err(|_| Error::InvalidArgument(format!("invalid time format '{}'", format)))?;
    Ok(out)
}

/// CSV writer for one conversation transcript
pub struct ExportWriter<W: Write, Tz: TimeZone> {
    writer: csv::Writer<W>,
    tz: Tz,
    time_format: String,
    rows: usize,
}

impl<W, Tz> ExportWriter<W, Tz>
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    /// Wrap `inner` and write the header row.
    pub fn new(inner: W, tz: Tz, time_format: &str) -> Result<Self> {
        let mut writer = csv::Writer::from_writer(inner);
        writer.write_record(HEADER)?;
        Ok(Self {
            writer,
            tz,
            time_format: time_format.to_string(),
            rows: 0,
        })
    }

    /// Write a single message row
    pub fn write_message(&mut self, message: &Message, directory: &UserDirectory) -> Result<()> {
        let time = format_time(message.timestamp, &self.tz, &self.time_format)?;
        let author = directory.resolve_or_self(message.sender_id.as_deref());
        let starred = if message.starred { STARRED } else { "" };

        self.writer
            .write_record([time.as_str(), author, message.text.as_str(), starred])?;
        self.rows += 1;
        Ok(())
    }

    /// Flush and return the inner writer with the number of data rows.
    pub fn finish(self) -> Result<(W, usize)> {
        let rows = self.rows;
        let inner = self
            .writer
            .into_inner()
            .map_err(|e| Error::IoError(e.into_error()))?;
        Ok((inner, rows))
    }
}

/// Write `messages` to `path` in local time.
///
/// Rows go to `<path>.partial` first and the file is renamed into place
/// only after a successful flush, so `path` never holds a truncated export.
pub fn write_history(
    path: &Path,
    messages: &[Message],
    directory: &UserDirectory,
    time_format: &str,
) -> Result<usize> {
    write_history_in(path, messages, directory, Local, time_format)
}

pub fn write_history_in<Tz>(
    path: &Path,
    messages: &[Message],
    directory: &UserDirectory,
    tz: Tz,
    time_format: &str,
) -> Result<usize>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let partial = partial_path(path);
    let mut writer = ExportWriter::new(File::create(&partial)?, tz, time_format)?;
    for message in messages {
        writer.write_message(message, directory)?;
    }
    let (file, rows) = writer.finish()?;
    file.sync_all()?;
    drop(file);

    fs::rename(&partial, path)?;
    Ok(rows)
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    path.with_file_name(name)
}
