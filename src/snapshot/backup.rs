//! Backup enumeration
//!
//! Browsable sources publish an HTML index whose links are the backup
//! directories. Sources behind a download URL override have no index, so
//! their candidate backups are synthesized from the calendar.

use crate::core::error::{Result, TrondError};
use crate::helpers::acquire::http;
use chrono::{Datelike, Days, NaiveDate};
use std::fmt;
use std::str::FromStr;

use super::source::SourceRegistry;

const PREFIX: &str = "backup";

/// Days back from today covered by synthesized listings.
const SYNTHESIZED_SPAN_DAYS: u64 = 180;

/// Within this many days every date is listed; beyond it only the 10th,
/// 20th and 30th of each month.
const DAILY_WINDOW_DAYS: u64 = 30;

/// A `backupYYYYMMDD` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BackupId {
    date: NaiveDate,
}

impl BackupId {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

impl FromStr for BackupId {
    type Err = TrondError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || TrondError::InvalidBackup(s.to_string());
        let digits = s.strip_prefix(PREFIX).ok_or_else(invalid)?;
        if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        NaiveDate::parse_from_str(digits, "%Y%m%d")
            .map(Self::new)
            .map_err(|_| invalid())
    }
}

impl fmt::Display for BackupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", PREFIX, self.date.format("%Y%m%d"))
    }
}

/// Candidate backups for sources without an index, newest first.
pub fn synthesize(today: NaiveDate) -> Vec<BackupId> {
    (1..SYNTHESIZED_SPAN_DAYS)
        .filter_map(|i| today.checked_sub_days(Days::new(i)).map(|d| (i, d)))
        .filter(|(i, d)| *i < DAILY_WINDOW_DAYS || matches!(d.day(), 10 | 20 | 30))
        .map(|(_, d)| BackupId::new(d))
        .collect()
}

/// Backup directory names published by `domain`.
///
/// Names are returned as listed; they are not required to parse as
/// [`BackupId`].
pub fn list_backups(registry: &SourceRegistry, domain: &str) -> Result<Vec<String>> {
    let source = registry.require(domain)?;

    if !source.is_browsable() {
        let today = chrono::Local::now().date_naive();
        return Ok(synthesize(today).iter().map(|b| b.to_string()).collect());
    }

    let links = http::fetch_links(&source.base_url())?;
    Ok(links
        .iter()
        .filter_map(|link| http::last_path_segment(link))
        .collect())
}

/// Newest well-formed backup among `names`.
pub fn latest(domain: &str, names: &[String]) -> Result<BackupId> {
    names
        .iter()
        .filter_map(|n| n.parse::<BackupId>().ok())
        .max()
        .ok_or_else(|| TrondError::NoBackups(domain.to_string()))
}

/// List `domain` and pick its newest backup.
pub fn latest_backup(registry: &SourceRegistry, domain: &str) -> Result<BackupId> {
    let names = list_backups(registry, domain)?;
    latest(domain, &names)
}
