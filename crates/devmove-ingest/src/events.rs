//! Loading contribution events from CSV exports.
//!
//! Rows with a blank developer, a blank repository, or an unparseable
//! timestamp are dropped here and counted, so everything handed to the
//! movement analyses is well formed.

use std::io::Read;
use std::path::{Path, PathBuf};

use devmove_core::{ContributionEvent, DevmoveError};
use serde::Serialize;
use tracing::{debug, warn};

use crate::normalize::{
    developer_from_file_name, kind_from_file_name, normalize_repository, parse_timestamp,
};
use crate::table::{csv_error, header_index, require_column};

/// Column names accepted for the repository, in order of preference.
pub const REPOSITORY_COLUMNS: &[&str] = &["repository", "repository_url", "repo", "repo_base"];

/// Optional column names for the contribution type.
pub const KIND_COLUMNS: &[&str] = &["type", "kind"];

/// One raw row: developer, repository, created_at, and contribution type.
type RawRow = (String, String, String, Option<String>);

/// Row accounting for a load.
///
/// # Examples
///
/// ```
/// use devmove_ingest::events::LoadReport;
///
/// let report = LoadReport { rows_read: 10, rows_dropped: 2 };
/// assert_eq!(report.rows_kept(), 8);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    /// Data rows read from the source.
    pub rows_read: usize,
    /// Rows rejected for blank fields or unparseable timestamps.
    pub rows_dropped: usize,
}

impl LoadReport {
    /// Rows that became events.
    pub fn rows_kept(&self) -> usize {
        self.rows_read - self.rows_dropped
    }

    fn absorb(&mut self, other: LoadReport) {
        self.rows_read += other.rows_read;
        self.rows_dropped += other.rows_dropped;
    }
}

/// Events sorted by developer then timestamp, with their load report.
#[derive(Debug, Clone, Default)]
pub struct LoadedEvents {
    /// Well-formed events.
    pub events: Vec<ContributionEvent>,
    /// Row accounting.
    pub report: LoadReport,
}

/// Load a merged contribution table.
///
/// The table needs a `developer` column, a repository column (one of
/// [`REPOSITORY_COLUMNS`]), and `created_at`. A `type` column, if present,
/// tags each event with its contribution type.
///
/// # Errors
///
/// Returns [`DevmoveError::FileNotFound`] if `path` does not exist,
/// [`DevmoveError::MissingColumn`] if a required column is absent, or
/// [`DevmoveError::Csv`] if the file is not valid CSV.
pub fn load_contributions(path: &Path) -> Result<LoadedEvents, DevmoveError> {
    if !path.exists() {
        return Err(DevmoveError::FileNotFound(path.to_path_buf()));
    }
    let file = std::fs::File::open(path)?;
    read_contributions(file, path)
}

/// Read a merged contribution table from any reader. `source` names the
/// table in errors and logs.
///
/// # Errors
///
/// Same as [`load_contributions`], minus the existence check.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use devmove_ingest::events::read_contributions;
///
/// let csv = "developer,repo,created_at\n\
///            alice,https://api.github.com/repos/apache/zookeeper,2020-01-02T00:00:00Z\n\
///            alice,apache/curator,not-a-date\n";
/// let loaded = read_contributions(csv.as_bytes(), Path::new("inline.csv")).unwrap();
/// assert_eq!(loaded.events.len(), 1);
/// assert_eq!(loaded.events[0].repository, "apache/zookeeper");
/// assert_eq!(loaded.report.rows_dropped, 1);
/// ```
pub fn read_contributions<R: Read>(reader: R, source: &Path) -> Result<LoadedEvents, DevmoveError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers().map_err(csv_error(source))?.clone();

    let developer_col = require_column(&headers, &["developer"], source)?;
    let repository_col = require_column(&headers, REPOSITORY_COLUMNS, source)?;
    let created_col = require_column(&headers, &["created_at"], source)?;
    let kind_col = header_index(&headers, KIND_COLUMNS);

    let rows = rdr.records().map(|record| {
        record.map(|r| {
            (
                r.get(developer_col).unwrap_or_default().to_string(),
                r.get(repository_col).unwrap_or_default().to_string(),
                r.get(created_col).unwrap_or_default().to_string(),
                kind_col.and_then(|i| r.get(i)).map(str::to_string),
            )
        })
    });
    let mut loaded = collect_events(rows, source)?;
    sort_events(&mut loaded.events);
    report_drops(&loaded.report, source);
    Ok(loaded)
}

/// Load every `*.csv` export in `dir`, one developer per file prefix.
///
/// Each file needs `repository_url` (or another repository column) and
/// `created_at`. The developer is always taken from the file name, so
/// `alice_issues.csv` and `alice_pulls.csv` both belong to `alice` whatever
/// their contents say; the rest of the stem (`issues`, `pulls`) becomes the
/// contribution type.
///
/// # Errors
///
/// Returns [`DevmoveError::FileNotFound`] if `dir` does not exist, and the
/// errors of [`read_contributions`] for any file.
pub fn load_developer_dir(dir: &Path) -> Result<LoadedEvents, DevmoveError> {
    if !dir.is_dir() {
        return Err(DevmoveError::FileNotFound(dir.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    files.sort();

    let mut combined = LoadedEvents::default();
    for file in &files {
        let Some(developer) = developer_from_file_name(file) else {
            warn!(file = %file.display(), "cannot derive developer from file name, skipping");
            continue;
        };
        let kind = kind_from_file_name(file);
        let loaded = read_developer_file(file, &developer, kind.as_deref())?;
        debug!(
            file = %file.display(),
            developer = developer.as_str(),
            events = loaded.events.len(),
            "loaded developer export"
        );
        combined.events.extend(loaded.events);
        combined.report.absorb(loaded.report);
    }

    sort_events(&mut combined.events);
    report_drops(&combined.report, dir);
    Ok(combined)
}

fn read_developer_file(
    path: &Path,
    developer: &str,
    kind: Option<&str>,
) -> Result<LoadedEvents, DevmoveError> {
    let mut rdr = csv::Reader::from_path(path).map_err(csv_error(path))?;
    let headers = rdr.headers().map_err(csv_error(path))?.clone();

    let repository_col = require_column(&headers, REPOSITORY_COLUMNS, path)?;
    let created_col = require_column(&headers, &["created_at"], path)?;

    let rows = rdr.records().map(|record| {
        record.map(|r| {
            (
                developer.to_string(),
                r.get(repository_col).unwrap_or_default().to_string(),
                r.get(created_col).unwrap_or_default().to_string(),
                kind.map(str::to_string),
            )
        })
    });
    collect_events(rows, path)
}

fn collect_events<I>(rows: I, source: &Path) -> Result<LoadedEvents, DevmoveError>
where
    I: Iterator<Item = Result<RawRow, csv::Error>>,
{
    let mut loaded = LoadedEvents::default();
    for row in rows {
        let (developer, repository, created_at, kind) = row.map_err(csv_error(source))?;
        loaded.report.rows_read += 1;

        let developer = developer.trim();
        let repository = normalize_repository(&repository);
        let timestamp = parse_timestamp(&created_at);
        match (developer.is_empty(), repository, timestamp) {
            (false, Some(repository), Some(timestamp)) => {
                let mut event = ContributionEvent::new(developer, repository, timestamp);
                event.kind = kind.map(|k| k.trim().to_string()).filter(|k| !k.is_empty());
                loaded.events.push(event);
            }
            _ => loaded.report.rows_dropped += 1,
        }
    }
    Ok(loaded)
}

/// Stable sort by (developer, timestamp); same-instant rows keep file order.
fn sort_events(events: &mut [ContributionEvent]) {
    events.sort_by(|a, b| {
        a.developer
            .cmp(&b.developer)
            .then_with(|| a.timestamp.cmp(&b.timestamp))
    });
}

fn report_drops(report: &LoadReport, source: &Path) {
    if report.rows_dropped > 0 {
        warn!(
            source = %source.display(),
            dropped = report.rows_dropped,
            read = report.rows_read,
            "dropped rows with blank fields or unparseable timestamps"
        );
    }
    debug!(source = %source.display(), kept = report.rows_kept(), "loaded contributions");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(csv: &str) -> Result<LoadedEvents, DevmoveError> {
        read_contributions(csv.as_bytes(), Path::new("test.csv"))
    }

    #[test]
    fn events_are_sorted_by_developer_then_time() {
        let loaded = read(
            "developer,repository,created_at\n\
             bob,x/a,2020-01-03T00:00:00Z\n\
             alice,x/b,2020-01-02T00:00:00Z\n\
             alice,x/a,2020-01-01T00:00:00Z\n",
        )
        .unwrap();
        let order: Vec<_> = loaded
            .events
            .iter()
            .map(|e| format!("{}:{}", e.developer, e.repository))
            .collect();
        assert_eq!(order, vec!["alice:x/a", "alice:x/b", "bob:x/a"]);
    }

    #[test]
    fn missing_timestamp_column_is_an_error() {
        let err = read("developer,repository\nalice,x/a\n").unwrap_err();
        match err {
            DevmoveError::MissingColumn { column, .. } => assert_eq!(column, "created_at"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_repository_column_lists_alternatives() {
        let err = read("developer,created_at\nalice,2020-01-01T00:00:00Z\n").unwrap_err();
        assert!(err.to_string().contains("repository"));
    }

    #[test]
    fn blank_fields_are_dropped() {
        let loaded = read(
            "developer,repository,created_at\n\
             ,x/a,2020-01-01T00:00:00Z\n\
             alice,,2020-01-01T00:00:00Z\n\
             alice,x/a,\n\
             alice,x/a,2020-01-01T00:00:00Z\n",
        )
        .unwrap();
        assert_eq!(loaded.events.len(), 1);
        assert_eq!(loaded.report, LoadReport { rows_read: 4, rows_dropped: 3 });
    }

    #[test]
    fn repository_url_column_is_normalized() {
        let loaded = read(
            "developer,repository_url,created_at\n\
             alice,https://api.github.com/repos/apache/zookeeper,2020-01-01T00:00:00Z\n",
        )
        .unwrap();
        assert_eq!(loaded.events[0].repository, "apache/zookeeper");
    }

    #[test]
    fn type_column_tags_events() {
        let loaded = read(
            "developer,repository,created_at,type\n\
             alice,x/a,2020-01-01T00:00:00Z,pulls\n\
             alice,x/b,2020-01-02T00:00:00Z,\n",
        )
        .unwrap();
        assert_eq!(loaded.events[0].kind.as_deref(), Some("pulls"));
        assert_eq!(loaded.events[1].kind, None);
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_contributions(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, DevmoveError::FileNotFound(_)));
    }
}
