use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Category of a dashboard log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Warning,
    Error,
    Moderation,
    Success,
}

impl LogKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogKind::Info => "info",
            LogKind::Warning => "warning",
            LogKind::Error => "error",
            LogKind::Moderation => "moderation",
            LogKind::Success => "success",
        }
    }
}

impl std::fmt::Display for LogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(LogKind::Info),
            "warning" => Ok(LogKind::Warning),
            "error" => Ok(LogKind::Error),
            "moderation" => Ok(LogKind::Moderation),
            "success" => Ok(LogKind::Success),
            other => Err(format!("unknown log type '{}'", other)),
        }
    }
}

/// A single event shown on the dashboard's log page. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub message: String,
    /// `None` for events that aren't about one guild.
    #[serde(serialize_with = "crate::core::snowflake::serialize_optional")]
    pub guild_id: Option<u64>,
}

/// Which entries a listing should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFilter {
    #[default]
    All,
    Kind(LogKind),
}

impl FromStr for LogFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            Ok(LogFilter::All)
        } else {
            s.parse().map(LogFilter::Kind)
        }
    }
}

impl LogFilter {
    pub fn matches(&self, entry: &LogEntry) -> bool {
        match self {
            LogFilter::All => true,
            LogFilter::Kind(kind) => entry.kind == *kind,
        }
    }
}
