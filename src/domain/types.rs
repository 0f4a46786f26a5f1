//! Shared domain enumerations aligned with persisted forum columns and the sitemap protocol.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Value of `forum_status` in the forums table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForumStatus {
    Normal,
    Approval,
    Closed,
}

impl ForumStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ForumStatus::Normal => "normal",
            ForumStatus::Approval => "approval",
            ForumStatus::Closed => "closed",
        }
    }

    pub fn is_listed(self) -> bool {
        !matches!(self, ForumStatus::Closed)
    }
}

impl FromStr for ForumStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "normal" => Ok(ForumStatus::Normal),
            "approval" => Ok(ForumStatus::Approval),
            "closed" => Ok(ForumStatus::Closed),
            other => Err(DomainError::validation(format!(
                "unknown forum status `{other}`"
            ))),
        }
    }
}

/// Sitemap `<changefreq>` hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeFreq {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl ChangeFreq {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeFreq::Hourly => "hourly",
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
        }
    }
}

impl fmt::Display for ChangeFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sitemap `<priority>` in tenths, always within `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Priority(u8);

impl Priority {
    pub const HOME: Priority = Priority(10);
    pub const FORUM: Priority = Priority(8);
    pub const TOPIC: Priority = Priority(7);
    pub const POST: Priority = Priority(6);
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.0 / 10, self.0 % 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_forums_are_not_listed() {
        assert!(ForumStatus::Normal.is_listed());
        assert!(ForumStatus::Approval.is_listed());
        assert!(!ForumStatus::Closed.is_listed());
    }

    #[test]
    fn forum_status_parses_stored_values() {
        for status in [ForumStatus::Normal, ForumStatus::Approval, ForumStatus::Closed] {
            assert_eq!(status.as_str().parse::<ForumStatus>().unwrap(), status);
        }
        assert!("open".parse::<ForumStatus>().is_err());
    }

    #[test]
    fn priority_renders_one_decimal() {
        assert_eq!(Priority::HOME.to_string(), "1.0");
        assert_eq!(Priority::FORUM.to_string(), "0.8");
        assert_eq!(Priority::TOPIC.to_string(), "0.7");
        assert_eq!(Priority(0).to_string(), "0.0");
    }
}
