use std::path::Path;
use std::process::{Command, Output};

const EVENTS: &str = "developer,repository,created_at\n\
alice,x/one,2020-01-01T00:00:00Z\n\
alice,apache/zookeeper,2020-02-01T00:00:00Z\n\
alice,x/two,2020-03-01T00:00:00Z\n\
bob,x/one,2020-01-05T00:00:00Z\n\
bob,apache/zookeeper,2020-02-05T00:00:00Z\n\
bob,x/two,2020-03-05T00:00:00Z\n\
carol,x/three,2020-01-01T00:00:00Z\n";

fn devmove(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_devmove"))
        .args(args)
        .current_dir(dir)
        .env("DEVMOVE_LOG", "error")
        .output()
        .unwrap()
}

fn assert_ok(output: &Output) {
    assert!(
        output.status.success(),
        "devmove failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn partition_then_groups() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("events.csv"), EVENTS).unwrap();

    let output = devmove(
        dir.path(),
        &["partition", "--input", "events.csv", "--out-dir", "out", "--prefix", "zk"],
    );
    assert_ok(&output);

    let after = std::fs::read_to_string(dir.path().join("out/zk_post_contribution_with_developers.csv")).unwrap();
    assert_eq!(after, "after,count,developers\nx/two,2,\"['alice', 'bob']\"\n");

    let before = std::fs::read_to_string(dir.path().join("out/zk_pre_contribution_with_developers.csv")).unwrap();
    assert!(before.starts_with("before,count,developers\n"));
    assert!(before.contains("x/one,2,\"['alice', 'bob']\""));
    assert!(before.contains("x/three,1,['carol']"));
    assert!(!before.contains("zookeeper"));

    let output = devmove(
        dir.path(),
        &[
            "groups",
            "--membership",
            "out/zk_post_contribution_with_developers.csv",
            "--size",
            "2",
            "--out-dir",
            "out",
            "--format",
            "json",
        ],
    );
    assert_ok(&output);

    let groups = std::fs::read_to_string(dir.path().join("out/after_2_common_repos_with_details.csv")).unwrap();
    assert_eq!(
        groups,
        "developer_1,developer_2,common_repos_count,common_repos\nalice,bob,1,['x/two']\n"
    );

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["side"], "after");
    assert_eq!(report["sizes"][0]["totalGroups"], 1);
}

#[test]
fn developer_layout_writes_movements() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("events.csv"), EVENTS).unwrap();

    let output = devmove(
        dir.path(),
        &[
            "partition",
            "--input",
            "events.csv",
            "--layout",
            "developer",
            "--out-dir",
            "out",
            "--prefix",
            "zk",
        ],
    );
    assert_ok(&output);

    let movements = std::fs::read_to_string(dir.path().join("out/zk_movements.csv")).unwrap();
    assert!(movements.starts_with("developer,before,after\n"));
    assert!(movements.contains("alice,['x/one'],['x/two']"));
    assert!(movements.contains("carol,['x/three'],[]"));
}

#[test]
fn oversized_group_is_empty_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("members.csv"),
        "after,count,developers\nr1,3,\"['A', 'B', 'C']\"\n",
    )
    .unwrap();

    let output = devmove(
        dir.path(),
        &["groups", "--membership", "members.csv", "--size", "4", "--out-dir", "out"],
    );
    assert_ok(&output);

    let groups = std::fs::read_to_string(dir.path().join("out/after_4_common_repos_with_details.csv")).unwrap();
    assert_eq!(
        groups,
        "developer_1,developer_2,developer_3,developer_4,common_repos_count,common_repos\n"
    );
}

#[test]
fn missing_column_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("events.csv"), "developer,repository\nalice,x/one\n").unwrap();

    let output = devmove(dir.path(), &["partition", "--input", "events.csv"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("created_at"));
}

fn partition_detailed(dir: &Path) {
    std::fs::write(dir.join("events.csv"), EVENTS).unwrap();
    let output = devmove(
        dir,
        &[
            "partition",
            "--input",
            "events.csv",
            "--out-dir",
            "out",
            "--prefix",
            "zk",
            "--detailed",
        ],
    );
    assert_ok(&output);
}

#[test]
fn detailed_partition_writes_counts_and_overlap() {
    let dir = tempfile::tempdir().unwrap();
    partition_detailed(dir.path());

    let pre = std::fs::read_to_string(dir.path().join("out/zk_pre_contribution_detailed.csv")).unwrap();
    assert!(pre.starts_with("repo,developer,count\n"));
    assert!(pre.contains("x/one,alice,1"));

    let merged = std::fs::read_to_string(dir.path().join("out/zk_merged_contribution.csv")).unwrap();
    assert_eq!(
        merged,
        "repo,before_count,after_count\nx/one,2,0\nx/three,1,0\nx/two,0,2\n"
    );

    let overlap = std::fs::read_to_string(dir.path().join("out/zk_repository_overlap_counts.csv")).unwrap();
    assert_eq!(overlap, "pre_repo,post_repo,overlap_count\nx/one,x/two,2\n");
}

#[test]
fn summary_merges_membership_tables() {
    let dir = tempfile::tempdir().unwrap();
    partition_detailed(dir.path());

    let output = devmove(
        dir.path(),
        &[
            "summary",
            "--before",
            "out/zk_pre_contribution_with_developers.csv",
            "--after",
            "out/zk_post_contribution_with_developers.csv",
            "--out",
            "merged.csv",
            "--format",
            "json",
        ],
    );
    assert_ok(&output);

    let merged = std::fs::read_to_string(dir.path().join("merged.csv")).unwrap();
    assert_eq!(
        merged,
        "repo,before_count,after_count\nx/one,2,0\nx/three,1,0\nx/two,0,2\n"
    );
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report[2]["repository"], "x/two");
    assert_eq!(report[2]["afterCount"], 2);
}

#[test]
fn overlap_counts_shared_developers() {
    let dir = tempfile::tempdir().unwrap();
    partition_detailed(dir.path());

    let output = devmove(
        dir.path(),
        &[
            "overlap",
            "--before",
            "out/zk_pre_contribution_with_developers.csv",
            "--after",
            "out/zk_post_contribution_with_developers.csv",
            "--out",
            "overlap.csv",
        ],
    );
    assert_ok(&output);

    let overlap = std::fs::read_to_string(dir.path().join("overlap.csv")).unwrap();
    assert_eq!(overlap, "pre_repo,post_repo,overlap_count\nx/one,x/two,2\n");
    assert!(String::from_utf8_lossy(&output.stdout).contains("1 repository pairs share developers"));
}

#[test]
fn copresence_lists_side_by_side_contributors() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("events.csv"), EVENTS).unwrap();

    let output = devmove(
        dir.path(),
        &["copresence", "--input", "events.csv", "--out", "co.csv"],
    );
    assert_ok(&output);

    let co = std::fs::read_to_string(dir.path().join("co.csv")).unwrap();
    let lines: Vec<_> = co.lines().collect();
    assert_eq!(lines[0], "developer,repository,co_contributors,co_count");
    assert_eq!(lines[1], "alice,apache/zookeeper,['bob'],1");
    assert_eq!(lines.len(), 7);
    assert!(!co.contains("carol"));

    let output = devmove(
        dir.path(),
        &["copresence", "--input", "events.csv", "--window-days", "3", "--out", "narrow.csv"],
    );
    assert_ok(&output);
    let narrow = std::fs::read_to_string(dir.path().join("narrow.csv")).unwrap();
    assert_eq!(narrow, "developer,repository,co_contributors,co_count\n");
}

#[test]
fn negative_window_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("events.csv"), EVENTS).unwrap();

    let output = devmove(
        dir.path(),
        &["keyperson", "--input", "events.csv", "--window-days=-1"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("zero or positive"));
}

#[test]
fn keyperson_reports_top_mover_and_followers() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("events.csv"), EVENTS).unwrap();

    let output = devmove(
        dir.path(),
        &[
            "keyperson",
            "--input",
            "events.csv",
            "--window-days",
            "40",
            "--top",
            "1",
            "--out",
            "key.csv",
            "--format",
            "json",
        ],
    );
    assert_ok(&output);

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["keyPersons"].as_array().unwrap().len(), 1);
    assert_eq!(report["keyPersons"][0]["developer"], "alice");
    assert_eq!(report["keyPersons"][0]["count"], 4);
    assert_eq!(report["followerMoves"], 6);

    let moves = std::fs::read_to_string(dir.path().join("key.csv")).unwrap();
    assert!(moves.starts_with("key_person,from_repository,to_repository,follower,time\n"));
    assert!(moves.contains("alice,x/one,x/three,carol,2020-01-01T00:00:00+00:00"));
    assert!(!moves.contains(",alice,"));
}

#[test]
fn keyperson_markdown_table_is_aligned() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("events.csv"), EVENTS).unwrap();

    let output = devmove(
        dir.path(),
        &["keyperson", "--input", "events.csv", "--out", "key.csv", "--format", "markdown"],
    );
    assert_ok(&output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("| Developer | Moves |\n|-----------|-------|\n"));
}

fn write_developer_dir(dir: &Path) {
    let data = dir.join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(
        data.join("alice_issues.csv"),
        "repository_url,created_at\n\
         https://api.github.com/repos/apache/zookeeper,2020-02-01T00:00:00Z\n",
    )
    .unwrap();
    std::fs::write(
        data.join("alice_pulls.csv"),
        "repository_url,created_at\n\
         https://api.github.com/repos/apache/curator,2020-01-01T00:00:00Z\n\
         https://api.github.com/repos/apache/kafka,2020-03-01T00:00:00Z\n",
    )
    .unwrap();
    std::fs::write(
        data.join("bob_commits.csv"),
        "repository_url,created_at\n\
         https://api.github.com/repos/apache/hbase,2020-03-01T00:00:00Z\n",
    )
    .unwrap();
}

#[test]
fn partition_reads_developer_directory() {
    let dir = tempfile::tempdir().unwrap();
    write_developer_dir(dir.path());

    let output = devmove(
        dir.path(),
        &["partition", "--dir", "data", "--out-dir", "out", "--prefix", "zk"],
    );
    assert_ok(&output);

    let after = std::fs::read_to_string(dir.path().join("out/zk_post_contribution_with_developers.csv")).unwrap();
    assert_eq!(after, "after,count,developers\napache/kafka,1,['alice']\n");
    let before = std::fs::read_to_string(dir.path().join("out/zk_pre_contribution_with_developers.csv")).unwrap();
    assert!(before.contains("apache/curator,1,['alice']"));
    assert!(before.contains("apache/hbase,1,['bob']"));
}

#[test]
fn monthly_counts_use_file_name_types() {
    let dir = tempfile::tempdir().unwrap();
    write_developer_dir(dir.path());

    let output = devmove(dir.path(), &["monthly", "--dir", "data"]);
    assert_ok(&output);
    let per_developer = std::fs::read_to_string(
        dir.path().join("results/zookeeper_monthly_developer_contributions.csv"),
    )
    .unwrap();
    assert_eq!(
        per_developer,
        "developer,repository,month,type,contribution_count\n\
         alice,apache/curator,2020-01,pulls,1\n\
         alice,apache/kafka,2020-03,pulls,1\n\
         alice,apache/zookeeper,2020-02,issues,1\n\
         bob,apache/hbase,2020-03,commits,1\n"
    );

    let output = devmove(
        dir.path(),
        &["monthly", "--dir", "data", "--by", "repository", "--out", "repos.csv"],
    );
    assert_ok(&output);
    let per_repository = std::fs::read_to_string(dir.path().join("repos.csv")).unwrap();
    assert_eq!(
        per_repository,
        "month,repository,type,contribution_count\n\
         2020-01,apache/curator,pulls,1\n\
         2020-02,apache/zookeeper,issues,1\n\
         2020-03,apache/hbase,commits,1\n\
         2020-03,apache/kafka,pulls,1\n"
    );
}
