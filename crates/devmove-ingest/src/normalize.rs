//! Repository identifier and timestamp normalization.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

/// GitHub API URL: `https://api.github.com/repos/{owner}/{name}[/...]`.
static API_REPO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"repos/([^/\s]+/[^/\s]+)").expect("valid API repository regex"));

/// GitHub web URL: `https://github.com/{owner}/{name}[.git][/]`.
static WEB_REPO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.)?github\.com/([^/\s]+/[^/\s]+?)(?:\.git)?/?$")
        .expect("valid web repository regex")
});

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// Canonicalize a repository reference to `owner/name`.
///
/// API and web URLs are reduced to `owner/name`; anything else is trimmed and
/// kept as-is, so bare names (`zookeeper`) pass through. Returns `None` for
/// blank input.
///
/// # Examples
///
/// ```
/// use devmove_ingest::normalize::normalize_repository;
///
/// assert_eq!(
///     normalize_repository("https://api.github.com/repos/apache/zookeeper").as_deref(),
///     Some("apache/zookeeper"),
/// );
/// assert_eq!(
///     normalize_repository("https://github.com/apache/curator.git").as_deref(),
///     Some("apache/curator"),
/// );
/// assert_eq!(normalize_repository(" zookeeper ").as_deref(), Some("zookeeper"));
/// assert_eq!(normalize_repository("   "), None);
/// ```
pub fn normalize_repository(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(caps) = API_REPO_RE.captures(trimmed) {
        return Some(caps[1].to_string());
    }
    if let Some(caps) = WEB_REPO_RE.captures(trimmed) {
        return Some(caps[1].to_string());
    }
    Some(trimmed.to_string())
}

/// Parse a contribution timestamp into UTC.
///
/// Accepts RFC 3339 (`2021-03-04T05:06:07Z`, with or without offset),
/// `2021-03-04 05:06:07+00:00`, and naive date-times, which are taken as UTC.
/// Returns `None` for anything else.
///
/// # Examples
///
/// ```
/// use devmove_ingest::normalize::parse_timestamp;
///
/// let t = parse_timestamp("2021-03-04T05:06:07+02:00").unwrap();
/// assert_eq!(t.to_rfc3339(), "2021-03-04T03:06:07+00:00");
/// assert!(parse_timestamp("not a date").is_none());
/// ```
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(t.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Developer id from a per-developer export file name: the stem up to the
/// first `_` (`alice_issues.csv` -> `alice`).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use devmove_ingest::normalize::developer_from_file_name;
///
/// assert_eq!(developer_from_file_name(Path::new("data/alice_pulls.csv")).as_deref(), Some("alice"));
/// assert_eq!(developer_from_file_name(Path::new("bob.csv")).as_deref(), Some("bob"));
/// ```
pub fn developer_from_file_name(path: &std::path::Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let developer = stem.split('_').next().unwrap_or(stem).trim();
    if developer.is_empty() {
        None
    } else {
        Some(developer.to_string())
    }
}

/// Contribution type from a per-developer export file name: the stem after
/// the first `_` (`alice_pull_requests.csv` -> `pull_requests`).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use devmove_ingest::normalize::kind_from_file_name;
///
/// assert_eq!(kind_from_file_name(Path::new("alice_issues.csv")).as_deref(), Some("issues"));
/// assert_eq!(kind_from_file_name(Path::new("bob.csv")), None);
/// ```
pub fn kind_from_file_name(path: &std::path::Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let (_, kind) = stem.split_once('_')?;
    let kind = kind.trim();
    if kind.is_empty() {
        None
    } else {
        Some(kind.to_string())
    }
}
