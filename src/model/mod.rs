use std::fmt;

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BRANCH: &str = "master";
pub const INVALID_DATE: &str = "Invalid Date";

// the body returned by GET api/v1/builds
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct BuildPage {
    pub builds: Vec<BuildRecord>,
}

/// One build as reported by the server. Records are never mutated after they
/// are received; a refresh replaces them wholesale.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BuildRecord {
    pub id: String,
    pub git_url: String,
    #[serde(default)]
    pub git_branch: Option<String>,
    pub queued_at: String,
    pub status: String,
    pub log_url: String,
    #[serde(default)]
    pub tags_created: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_param: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_duration_millis: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_duration_millis: Option<i64>,
    #[serde(
        default,
        rename = "commitIDBeforeBuild",
        skip_serializing_if = "Option::is_none"
    )]
    pub commit_id_before_build: Option<String>,
    #[serde(
        default,
        rename = "commitIDAfterBuild",
        skip_serializing_if = "Option::is_none"
    )]
    pub commit_id_after_build: Option<String>,
}

impl BuildRecord {
    pub fn branch(&self) -> &str {
        self.git_branch.as_deref().unwrap_or(DEFAULT_BRANCH)
    }

    pub fn tags(&self) -> &[String] {
        self.tags_created.as_deref().unwrap_or_default()
    }

    pub fn is_cancellable(&self) -> bool {
        self.cancel_url.is_some()
    }

    pub fn typed_status(&self) -> BuildStatus {
        BuildStatus::parse(&self.status)
    }

    /// Repository name with the branch appended unless it is the default one.
    pub fn friendly_name(&self) -> String {
        friendly_repo_label(&self.git_url, self.branch())
    }

    pub fn queued_at_display(&self, zone: DisplayZone) -> String {
        format_timestamp(&self.queued_at, zone)
    }
}

pub fn friendly_repo_label(git_url: &str, branch: &str) -> String {
    let trimmed = git_url.strip_suffix('/').unwrap_or(git_url);
    let mut friendly = match trimmed.rfind('/') {
        Some(idx) if idx > 0 => trimmed[idx + 1..].to_string(),
        _ => trimmed.to_string(),
    };
    if branch != DEFAULT_BRANCH {
        friendly.push_str(&format!(" ({branch})"));
    }
    friendly
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisplayZone {
    #[default]
    Local,
    Utc,
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    let millis = value.parse::<i64>().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}

pub fn format_timestamp(value: &str, zone: DisplayZone) -> String {
    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";
    match parse_timestamp(value) {
        Some(dt) => match zone {
            DisplayZone::Utc => dt.format(FORMAT).to_string(),
            DisplayZone::Local => dt.with_timezone(&Local).format(FORMAT).to_string(),
        },
        None => INVALID_DATE.to_string(),
    }
}

// typed view over the status text, which the server may extend at any time
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuildStatus {
    Queued,
    InProgress,
    Success,
    Failure,
    Cancelling,
    Cancelled,
    TimedOut,
    Other(String),
}

impl BuildStatus {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "QUEUED" => Self::Queued,
            "IN_PROGRESS" => Self::InProgress,
            "SUCCESS" => Self::Success,
            "FAILURE" => Self::Failure,
            "CANCELLING" => Self::Cancelling,
            "CANCELLED" => Self::Cancelled,
            "TIMED_OUT" => Self::TimedOut,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_end_state(&self) -> bool {
        matches!(
            self,
            Self::Success | Self::Failure | Self::Cancelled | Self::TimedOut
        )
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "QUEUED",
            Self::InProgress => "IN_PROGRESS",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Cancelling => "CANCELLING",
            Self::Cancelled => "CANCELLED",
            Self::TimedOut => "TIMED_OUT",
            Self::Other(s) => s.as_str(),
        };
        f.write_str(s)
    }
}

#[cfg(test)]
pub(crate) fn record(id: &str, git_url: &str, branch: &str) -> BuildRecord {
    BuildRecord {
        id: id.to_string(),
        git_url: git_url.to_string(),
        git_branch: Some(branch.to_string()),
        queued_at: "2024-01-01T00:00:00Z".to_string(),
        status: "SUCCESS".to_string(),
        log_url: format!("/log/{id}"),
        tags_created: None,
        cancel_url: None,
        url: None,
        build_param: None,
        queue_duration_millis: None,
        build_duration_millis: None,
        commit_id_before_build: None,
        commit_id_after_build: None,
    }
}
