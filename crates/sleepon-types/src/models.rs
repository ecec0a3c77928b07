use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Name shown in place of the author on anonymous entries and comments.
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// Self-assessed state a user picks when reflecting on an entry.
/// An entry that has never been reflected on has no status (`None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    OverIt,
    StillDealing,
    NeedHelp,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OverIt => "over_it",
            Self::StillDealing => "still_dealing",
            Self::NeedHelp => "need_help",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown entry status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for EntryStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "over_it" => Ok(Self::OverIt),
            "still_dealing" => Ok(Self::StillDealing),
            "need_help" => Ok(Self::NeedHelp),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Author name as it may be shown to other users.
pub fn display_author(username: &str, is_anonymous: bool) -> String {
    if is_anonymous {
        ANONYMOUS_NAME.to_string()
    } else {
        username.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_string_forms_agree_with_serde() {
        for status in [EntryStatus::OverIt, EntryStatus::StillDealing, EntryStatus::NeedHelp] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<EntryStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("feeling_fine".parse::<EntryStatus>().is_err());
        assert!(serde_json::from_str::<EntryStatus>("\"\"").is_err());
    }

    #[test]
    fn anonymous_authors_are_redacted() {
        assert_eq!(display_author("mali", true), ANONYMOUS_NAME);
        assert_eq!(display_author("mali", false), "mali");
    }
}
