//! CSV writers for analysis results.
//!
//! Column layouts follow the research exports so that downstream notebooks
//! and the loaders in [`crate::table`] read them unchanged.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use devmove_core::{DevmoveError, Side};
use devmove_movement::copresence::CoContribution;
use devmove_movement::groups::GroupCommonRepoRecord;
use devmove_movement::keyperson::KeyPersonMovement;
use devmove_movement::membership::RepositoryMembership;
use devmove_movement::monthly::{DeveloperMonthlyTally, RepositoryMonthlyTally};
use devmove_movement::partition::PartitionResult;
use devmove_movement::summary::{
    repository_tallies, EventTally, MergedTally, RepositoryOverlap,
};

use crate::lists::render_list;

/// Create `path` for writing, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`DevmoveError::Io`] if the directory or file cannot be created.
pub fn create_output(path: &Path) -> Result<File, DevmoveError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(File::create(path)?)
}

fn write_table<W, I>(writer: W, header: &[String], rows: I) -> Result<(), DevmoveError>
where
    W: Write,
    I: IntoIterator<Item = Vec<String>>,
{
    let csv_err = |e: csv::Error| DevmoveError::Csv(e.to_string());
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(header).map_err(csv_err)?;
    for row in rows {
        wtr.write_record(&row).map_err(csv_err)?;
    }
    wtr.flush()?;
    Ok(())
}

fn header(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Write one side's membership: `<side>, count, developers`, busiest first.
///
/// # Examples
///
/// ```
/// use devmove_core::Side;
/// use devmove_ingest::export::write_membership;
/// use devmove_movement::membership::RepositoryMembership;
///
/// let mut membership = RepositoryMembership::new();
/// membership.insert("r1", "A");
/// membership.insert("r1", "B");
///
/// let mut out = Vec::new();
/// write_membership(&mut out, Side::After, &membership).unwrap();
/// assert_eq!(
///     String::from_utf8(out).unwrap(),
///     "after,count,developers\nr1,2,\"['A', 'B']\"\n",
/// );
/// ```
///
/// # Errors
///
/// Returns [`DevmoveError::Csv`] or [`DevmoveError::Io`] on write failure.
pub fn write_membership<W: Write>(
    writer: W,
    side: Side,
    membership: &RepositoryMembership,
) -> Result<(), DevmoveError> {
    let side_name = side.to_string();
    let rows = repository_tallies(membership).into_iter().map(|t| {
        vec![
            t.repository,
            t.count.to_string(),
            render_list(&t.developers),
        ]
    });
    write_table(writer, &header(&[&side_name, "count", "developers"]), rows)
}

/// Write one row per developer: `developer, before, after`.
///
/// # Errors
///
/// Returns [`DevmoveError::Csv`] or [`DevmoveError::Io`] on write failure.
pub fn write_developer_partitions<W: Write>(
    writer: W,
    results: &[PartitionResult],
) -> Result<(), DevmoveError> {
    let rows = results.iter().map(|r| {
        vec![
            r.developer.clone(),
            render_list(&r.before),
            render_list(&r.after),
        ]
    });
    write_table(writer, &header(&["developer", "before", "after"]), rows)
}

/// Write per-(repository, developer) event counts: `repo, developer, count`.
///
/// # Errors
///
/// Returns [`DevmoveError::Csv`] or [`DevmoveError::Io`] on write failure.
pub fn write_event_tallies<W: Write>(writer: W, tallies: &[EventTally]) -> Result<(), DevmoveError> {
    let rows = tallies.iter().map(|t| {
        vec![
            t.repository.clone(),
            t.developer.clone(),
            t.count.to_string(),
        ]
    });
    write_table(writer, &header(&["repo", "developer", "count"]), rows)
}

/// Write merged before/after counts: `repo, before_count, after_count`.
///
/// # Errors
///
/// Returns [`DevmoveError::Csv`] or [`DevmoveError::Io`] on write failure.
pub fn write_merged_tallies<W: Write>(
    writer: W,
    merged: &[MergedTally],
) -> Result<(), DevmoveError> {
    let rows = merged.iter().map(|m| {
        vec![
            m.repository.clone(),
            m.before_count.to_string(),
            m.after_count.to_string(),
        ]
    });
    write_table(writer, &header(&["repo", "before_count", "after_count"]), rows)
}

/// Write group records for group size `k`:
/// `developer_1..developer_k, common_repos_count, common_repos`.
///
/// # Errors
///
/// Returns [`DevmoveError::InputValidation`] if a record does not have `k`
/// members, or [`DevmoveError::Csv`] / [`DevmoveError::Io`] on write failure.
pub fn write_groups<W: Write>(
    writer: W,
    k: usize,
    records: &[GroupCommonRepoRecord],
) -> Result<(), DevmoveError> {
    if let Some(bad) = records.iter().find(|r| r.size() != k) {
        return Err(DevmoveError::InputValidation(format!(
            "group {:?} does not have {k} members",
            bad.developers
        )));
    }

    let mut columns: Vec<String> = (1..=k).map(|i| format!("developer_{i}")).collect();
    columns.push("common_repos_count".into());
    columns.push("common_repos".into());

    let rows = records.iter().map(|r| {
        let mut row = r.developers.clone();
        row.push(r.common_repos_count.to_string());
        row.push(render_list(&r.common_repos));
        row
    });
    write_table(writer, &columns, rows)
}

/// Write co-contribution rows:
/// `developer, repository, co_contributors, co_count`.
///
/// # Errors
///
/// Returns [`DevmoveError::Csv`] or [`DevmoveError::Io`] on write failure.
pub fn write_co_contributions<W: Write>(
    writer: W,
    rows: &[CoContribution],
) -> Result<(), DevmoveError> {
    let rows = rows.iter().map(|r| {
        vec![
            r.developer.clone(),
            r.repository.clone(),
            render_list(&r.co_contributors),
            r.co_count.to_string(),
        ]
    });
    write_table(
        writer,
        &header(&["developer", "repository", "co_contributors", "co_count"]),
        rows,
    )
}

/// Write key-person follower rows:
/// `key_person, from_repository, to_repository, follower, time`.
///
/// # Errors
///
/// Returns [`DevmoveError::Csv`] or [`DevmoveError::Io`] on write failure.
pub fn write_key_person_movements<W: Write>(
    writer: W,
    rows: &[KeyPersonMovement],
) -> Result<(), DevmoveError> {
    let rows = rows.iter().map(|r| {
        vec![
            r.key_person.clone(),
            r.from_repository.clone(),
            r.to_repository.clone(),
            r.follower.clone(),
            r.time.to_rfc3339(),
        ]
    });
    write_table(
        writer,
        &header(&[
            "key_person",
            "from_repository",
            "to_repository",
            "follower",
            "time",
        ]),
        rows,
    )
}

/// Write shared-developer counts per repository pair:
/// `pre_repo, post_repo, overlap_count`.
///
/// # Errors
///
/// Returns [`DevmoveError::Csv`] or [`DevmoveError::Io`] on write failure.
pub fn write_overlaps<W: Write>(
    writer: W,
    overlaps: &[RepositoryOverlap],
) -> Result<(), DevmoveError> {
    let rows = overlaps.iter().map(|o| {
        vec![
            o.before_repository.clone(),
            o.after_repository.clone(),
            o.overlap_count.to_string(),
        ]
    });
    write_table(
        writer,
        &header(&["pre_repo", "post_repo", "overlap_count"]),
        rows,
    )
}

/// Write per-developer monthly counts:
/// `developer, repository, month, type, contribution_count`.
///
/// An unknown type is written as an empty cell.
///
/// # Errors
///
/// Returns [`DevmoveError::Csv`] or [`DevmoveError::Io`] on write failure.
pub fn write_developer_monthly<W: Write>(
    writer: W,
    tallies: &[DeveloperMonthlyTally],
) -> Result<(), DevmoveError> {
    let rows = tallies.iter().map(|t| {
        vec![
            t.developer.clone(),
            t.repository.clone(),
            t.month.clone(),
            t.kind.clone().unwrap_or_default(),
            t.contribution_count.to_string(),
        ]
    });
    write_table(
        writer,
        &header(&[
            "developer",
            "repository",
            "month",
            "type",
            "contribution_count",
        ]),
        rows,
    )
}

/// Write per-repository monthly counts:
/// `month, repository, type, contribution_count`.
///
/// # Errors
///
/// Returns [`DevmoveError::Csv`] or [`DevmoveError::Io`] on write failure.
pub fn write_repository_monthly<W: Write>(
    writer: W,
    tallies: &[RepositoryMonthlyTally],
) -> Result<(), DevmoveError> {
    let rows = tallies.iter().map(|t| {
        vec![
            t.month.clone(),
            t.repository.clone(),
            t.kind.clone().unwrap_or_default(),
            t.contribution_count.to_string(),
        ]
    });
    write_table(
        writer,
        &header(&["month", "repository", "type", "contribution_count"]),
        rows,
    )
}
