use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One unit of developer activity: a commit, issue, or pull request.
///
/// `repository` is expected in canonical form (usually `owner/name`).
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use devmove_core::ContributionEvent;
///
/// let event = ContributionEvent::new(
///     "alice",
///     "apache/zookeeper",
///     Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap(),
/// );
/// assert_eq!(event.repository, "apache/zookeeper");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionEvent {
    /// Developer login.
    pub developer: String,
    /// Canonical repository identifier.
    pub repository: String,
    /// When the contribution was created, normalized to UTC.
    pub timestamp: DateTime<Utc>,
    /// Contribution type (`issues`, `pulls`, `commits`, ...) when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ContributionEvent {
    /// Build an event from borrowed parts.
    pub fn new(
        developer: impl Into<String>,
        repository: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            developer: developer.into(),
            repository: repository.into(),
            timestamp,
            kind: None,
        }
    }

    /// Tag the event with its contribution type.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use devmove_core::ContributionEvent;
    ///
    /// let event = ContributionEvent::new("alice", "x/y", Utc::now()).with_kind("pulls");
    /// assert_eq!(event.kind.as_deref(), Some("pulls"));
    /// ```
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

/// Which half of a partitioned timeline an analysis looks at.
///
/// # Examples
///
/// ```
/// use devmove_core::Side;
///
/// let side: Side = "after".parse().unwrap();
/// assert_eq!(side, Side::After);
/// assert_eq!(Side::Before.to_string(), "before");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Repositories visited before the first pivot contribution.
    Before,
    /// Repositories visited after the first pivot contribution.
    After,
}

impl Side {
    /// Both sides, in timeline order.
    pub const ALL: [Side; 2] = [Side::Before, Side::After];

    /// File-name fragment used by the research exports (`pre` / `post`).
    pub fn file_tag(self) -> &'static str {
        match self {
            Side::Before => "pre",
            Side::After => "post",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Before => write!(f, "before"),
            Side::After => write!(f, "after"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "before" | "pre" | "into" => Ok(Side::Before),
            "after" | "post" | "out" => Ok(Side::After),
            other => Err(format!("unknown side: {other}")),
        }
    }
}

/// How partition results are written to disk.
///
/// # Examples
///
/// ```
/// use devmove_core::PartitionLayout;
///
/// assert_eq!(PartitionLayout::default(), PartitionLayout::Repository);
/// assert_eq!("developer".parse::<PartitionLayout>().unwrap(), PartitionLayout::Developer);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionLayout {
    /// One row per repository per side, with its developer list and count.
    #[default]
    Repository,
    /// One row per developer with `before` and `after` list columns.
    Developer,
}

impl fmt::Display for PartitionLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionLayout::Repository => write!(f, "repository"),
            PartitionLayout::Developer => write!(f, "developer"),
        }
    }
}

impl FromStr for PartitionLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "repository" | "repo" => Ok(PartitionLayout::Repository),
            "developer" | "dev" => Ok(PartitionLayout::Developer),
            other => Err(format!("unknown partition layout: {other}")),
        }
    }
}

/// Output format for CLI subcommands.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use devmove_core::OutputFormat;
///
/// let fmt: OutputFormat = "json".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Json);
///
/// let fmt: OutputFormat = "md".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Markdown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable tables and summaries.
    #[default]
    Text,
    /// Machine-readable JSON with camelCase keys.
    Json,
    /// Markdown-formatted output.
    Markdown,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!(
            "markdown".parse::<OutputFormat>().unwrap(),
            OutputFormat::Markdown
        );
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn output_format_default_is_text() {
        assert_eq!(OutputFormat::default(), OutputFormat::Text);
    }

    #[test]
    fn side_accepts_research_aliases() {
        assert_eq!("pre".parse::<Side>().unwrap(), Side::Before);
        assert_eq!("Into".parse::<Side>().unwrap(), Side::Before);
        assert_eq!("POST".parse::<Side>().unwrap(), Side::After);
        assert_eq!("out".parse::<Side>().unwrap(), Side::After);
        assert!("during".parse::<Side>().is_err());
    }

    #[test]
    fn side_roundtrips_through_json() {
        let json = serde_json::to_string(&Side::After).unwrap();
        assert_eq!(json, "\"after\"");
        let parsed: Side = serde_json::from_str("\"before\"").unwrap();
        assert_eq!(parsed, Side::Before);
    }

    #[test]
    fn side_file_tags() {
        assert_eq!(Side::Before.file_tag(), "pre");
        assert_eq!(Side::After.file_tag(), "post");
    }

    #[test]
    fn contribution_event_serializes_camel_case() {
        let event = ContributionEvent::new(
            "alice",
            "apache/zookeeper",
            Utc.with_ymd_and_hms(2020, 1, 2, 3, 4, 5).unwrap(),
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["repository"], "apache/zookeeper");
        assert_eq!(json["timestamp"], "2020-01-02T03:04:05Z");
        assert!(json.get("kind").is_none());
    }
}
