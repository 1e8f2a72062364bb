use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a backend record. The clinic backend is not consistent about
/// sending ids as numbers or strings, so both are accepted and the original
/// form is kept for the way back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Numeric(i64),
    Text(String),
}

impl RecordId {
    /// Parses a path segment, preferring the numeric form when it fits.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(match trimmed.parse::<i64>() {
            Ok(n) => RecordId::Numeric(n),
            Err(_) => RecordId::Text(trimmed.to_string()),
        })
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, RecordId::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Numeric(n) => write!(f, "{}", n),
            RecordId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Numeric(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId::Text(value.to_string())
    }
}
