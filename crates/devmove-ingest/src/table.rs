//! Column lookup shared by the readers, and loaders for derived tables
//! (repository membership and per-repository counts).

use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use devmove_core::{DevmoveError, Side};
use devmove_movement::membership::RepositoryMembership;
use devmove_movement::summary::RepositoryTally;

use crate::lists::parse_list;

/// Repository column candidates for derived tables. A side name wins because
/// the research exports name the column after the side it describes.
const SIDE_REPOSITORY_COLUMNS: &[&str] = &["before", "after", "repository", "repo", "repo_base"];

/// A membership table loaded from disk.
#[derive(Debug, Clone, Default)]
pub struct MembershipTable {
    /// Side named by the repository column, if it is `before` or `after`.
    pub side: Option<Side>,
    /// Repository to developers.
    pub membership: RepositoryMembership,
}

pub(crate) fn csv_error(source: &Path) -> impl Fn(csv::Error) -> DevmoveError + '_ {
    move |e| DevmoveError::Csv(format!("{}: {e}", source.display()))
}

fn clean_header(name: &str) -> &str {
    name.trim_start_matches('\u{feff}').trim()
}

/// Position of the first header matching one of `names` (in `names` order).
pub(crate) fn header_index(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    names
        .iter()
        .find_map(|name| headers.iter().position(|h| clean_header(h) == *name))
}

pub(crate) fn require_column(
    headers: &StringRecord,
    names: &[&str],
    source: &Path,
) -> Result<usize, DevmoveError> {
    header_index(headers, names).ok_or_else(|| DevmoveError::MissingColumn {
        column: names.join(" | "),
        path: source.to_path_buf(),
    })
}

/// Parse a `developers` cell, rejecting blank ids.
fn parse_developers(cell: &str, source: &Path, row: usize) -> Result<Vec<String>, DevmoveError> {
    let invalid = |reason: String| {
        DevmoveError::InputValidation(format!("{} row {row}: {reason}", source.display()))
    };
    let developers = parse_list(cell).map_err(|e| invalid(e.to_string()))?;
    developers
        .into_iter()
        .map(|d| {
            let trimmed = d.trim();
            if trimmed.is_empty() {
                Err(invalid("blank developer id in developers list".into()))
            } else {
                Ok(trimmed.to_string())
            }
        })
        .collect()
}

/// Load a `repository, developers` membership table.
///
/// # Errors
///
/// Returns [`DevmoveError::FileNotFound`] if `path` does not exist, and the
/// errors of [`read_membership`].
pub fn load_membership(path: &Path) -> Result<MembershipTable, DevmoveError> {
    if !path.exists() {
        return Err(DevmoveError::FileNotFound(path.to_path_buf()));
    }
    read_membership(std::fs::File::open(path)?, path)
}

/// Read a membership table from any reader.
///
/// The repository column is the first of `before`, `after`, `repository`,
/// `repo`, `repo_base`; `developers` holds a list literal.
///
/// # Errors
///
/// Returns [`DevmoveError::MissingColumn`] if either column is absent,
/// [`DevmoveError::InputValidation`] for a blank repository, a malformed
/// developer list, or a blank developer id, or [`DevmoveError::Csv`] for
/// invalid CSV.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use devmove_core::Side;
/// use devmove_ingest::table::read_membership;
///
/// let csv = "after,count,developers\nr1,2,\"['A', 'B']\"\n";
/// let table = read_membership(csv.as_bytes(), Path::new("inline.csv")).unwrap();
/// assert_eq!(table.side, Some(Side::After));
/// assert_eq!(table.membership.get("r1").unwrap().len(), 2);
/// ```
pub fn read_membership<R: Read>(reader: R, source: &Path) -> Result<MembershipTable, DevmoveError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers().map_err(csv_error(source))?.clone();

    let repository_col = require_column(&headers, SIDE_REPOSITORY_COLUMNS, source)?;
    let developers_col = require_column(&headers, &["developers"], source)?;
    let side = clean_header(&headers[repository_col]).parse::<Side>().ok();

    let mut rows = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.map_err(csv_error(source))?;
        let repository = record.get(repository_col).unwrap_or_default().trim();
        if repository.is_empty() {
            return Err(DevmoveError::InputValidation(format!(
                "{} row {}: blank repository",
                source.display(),
                line + 2
            )));
        }
        let developers =
            parse_developers(record.get(developers_col).unwrap_or_default(), source, line + 2)?;
        rows.push((repository.to_string(), developers));
    }

    Ok(MembershipTable {
        side,
        membership: RepositoryMembership::from_rows(rows),
    })
}

/// Load a per-repository count table (`repo, count`) or a membership table,
/// whose counts are taken from its developer lists.
///
/// # Errors
///
/// Returns [`DevmoveError::MissingColumn`] if neither `count` nor
/// `developers` is present, and the errors of [`read_membership`].
pub fn load_tallies(path: &Path) -> Result<Vec<RepositoryTally>, DevmoveError> {
    if !path.exists() {
        return Err(DevmoveError::FileNotFound(path.to_path_buf()));
    }
    read_tallies(std::fs::File::open(path)?, path)
}

/// Read a per-repository count table from any reader.
///
/// # Errors
///
/// See [`load_tallies`].
pub fn read_tallies<R: Read>(reader: R, source: &Path) -> Result<Vec<RepositoryTally>, DevmoveError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers().map_err(csv_error(source))?.clone();

    let repository_col = require_column(&headers, SIDE_REPOSITORY_COLUMNS, source)?;
    let count_col = header_index(&headers, &["count"]);
    let developers_col = header_index(&headers, &["developers"]);
    if count_col.is_none() && developers_col.is_none() {
        return Err(DevmoveError::MissingColumn {
            column: "count | developers".into(),
            path: source.to_path_buf(),
        });
    }

    let mut tallies = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.map_err(csv_error(source))?;
        let row = line + 2;
        let repository = record.get(repository_col).unwrap_or_default().trim();
        if repository.is_empty() {
            return Err(DevmoveError::InputValidation(format!(
                "{} row {row}: blank repository",
                source.display()
            )));
        }

        let developers = match developers_col {
            Some(i) => parse_developers(record.get(i).unwrap_or_default(), source, row)?,
            None => Vec::new(),
        };
        let count = match count_col {
            Some(i) => parse_count(record.get(i).unwrap_or_default()).ok_or_else(|| {
                DevmoveError::InputValidation(format!(
                    "{} row {row}: count is not a number",
                    source.display()
                ))
            })?,
            None => developers.len(),
        };

        tallies.push(RepositoryTally {
            repository: repository.to_string(),
            count,
            developers,
        });
    }
    Ok(tallies)
}

/// Counts written by dataframe tools may carry a `.0` suffix.
fn parse_count(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    raw.parse::<usize>()
        .ok()
        .or_else(|| raw.strip_suffix(".0").and_then(|s| s.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bom_in_header_is_ignored() {
        let csv = "\u{feff}before,count,developers\nr1,1,['A']\n";
        let table = read_membership(csv.as_bytes(), Path::new("bom.csv")).unwrap();
        assert_eq!(table.side, Some(Side::Before));
        assert_eq!(table.membership.len(), 1);
    }

    #[test]
    fn generic_repository_column_has_no_side() {
        let csv = "repository,developers\nr1,\"['A', 'B']\"\n";
        let table = read_membership(csv.as_bytes(), Path::new("m.csv")).unwrap();
        assert_eq!(table.side, None);
    }

    #[test]
    fn malformed_list_names_the_row() {
        let csv = "after,developers\nr1,['A']\nr2,A B\n";
        let err = read_membership(csv.as_bytes(), Path::new("m.csv")).unwrap_err();
        assert!(err.to_string().contains("row 3"), "{err}");
    }

    #[test]
    fn blank_developer_id_is_rejected() {
        let csv = "after,developers\nr1,\"['', 'A']\"\nr2,\"['', 'A']\"\n";
        let err = read_membership(csv.as_bytes(), Path::new("m.csv")).unwrap_err();
        assert!(matches!(err, DevmoveError::InputValidation(_)));
        assert!(err.to_string().contains("row 2"), "{err}");
        assert!(err.to_string().contains("blank developer"), "{err}");
    }

    #[test]
    fn whitespace_developer_id_is_rejected_in_tallies() {
        let csv = "before,developers\nr1,\"['A', '  ']\"\n";
        assert!(read_tallies(csv.as_bytes(), Path::new("t.csv")).is_err());
    }

    #[test]
    fn developer_ids_are_trimmed() {
        let csv = "after,developers\nr1,\"[' A', 'B ']\"\n";
        let table = read_membership(csv.as_bytes(), Path::new("m.csv")).unwrap();
        let members: Vec<_> = table.membership.get("r1").unwrap().iter().cloned().collect();
        assert_eq!(members, vec!["A", "B"]);
    }

    #[test]
    fn missing_developers_column_is_an_error() {
        let csv = "after,count\nr1,2\n";
        let err = read_membership(csv.as_bytes(), Path::new("m.csv")).unwrap_err();
        assert!(matches!(err, DevmoveError::MissingColumn { .. }));
    }

    #[test]
    fn count_tables_load() {
        let csv = "repo,count\nr1,3\nr2,4.0\n";
        let tallies = read_tallies(csv.as_bytes(), Path::new("t.csv")).unwrap();
        assert_eq!(tallies.len(), 2);
        assert_eq!(tallies[1].count, 4);
        assert!(tallies[0].developers.is_empty());
    }

    #[test]
    fn tallies_fall_back_to_developer_lists() {
        let csv = "before,developers\nr1,\"['A', 'B', 'C']\"\n";
        let tallies = read_tallies(csv.as_bytes(), Path::new("t.csv")).unwrap();
        assert_eq!(tallies[0].count, 3);
    }

    #[test]
    fn non_numeric_count_is_rejected() {
        let csv = "repo,count\nr1,many\n";
        assert!(read_tallies(csv.as_bytes(), Path::new("t.csv")).is_err());
    }

    #[test]
    fn tally_table_without_counts_is_rejected() {
        let csv = "repo,other\nr1,x\n";
        let err = read_tallies(csv.as_bytes(), Path::new("t.csv")).unwrap_err();
        assert!(err.to_string().contains("count"));
    }
}
