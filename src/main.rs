use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use devmove_core::{DevmoveConfig, OutputFormat, PartitionLayout, Side};
use devmove_ingest::events::{LoadReport, LoadedEvents};
use devmove_ingest::export;
use devmove_movement::groups::{GroupCommonRepoRecord, GroupOptions};
use devmove_movement::membership::RepositoryMembership;
use devmove_movement::summary::MergedTally;

#[derive(Parser)]
#[command(
    name = "devmove",
    version,
    about = "Track where developers contribute before and after a pivot repository",
    long_about = "devmove mines GitHub contribution exports to see where developers worked\n\
                   before they first touched a pivot repository and where they went afterwards.\n\n\
                   It also finds groups of developers who moved to the same repositories,\n\
                   repository pairs that share developers across the pivot, developers who\n\
                   contribute side by side, key persons who change repositories most often\n\
                   with the developers who follow them, and monthly contribution counts.\n\n\
                   Examples:\n  \
                     devmove partition --input events.csv --pivot apache/zookeeper\n  \
                     devmove partition --dir data/ --layout developer\n  \
                     devmove groups --membership results/zookeeper_post_contribution_with_developers.csv --size 2 --size 3\n  \
                     devmove summary --before pre.csv --after post.csv\n  \
                     devmove overlap --before pre.csv --after post.csv\n  \
                     devmove monthly --dir data/ --by repository\n  \
                     devmove keyperson --input events.csv --window-days 30 --top 3"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .devmove.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command summaries printed to stdout.\n\n\
                       Formats:\n  \
                         text      Human-readable summaries (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown\n\n\
                       Result tables are always written as CSV."
    )]
    format: OutputFormat,

    /// Enable verbose output (debug logging)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

/// Where contribution events come from.
#[derive(Args)]
struct EventSource {
    /// Merged contribution table (developer, repository, created_at)
    #[arg(long, conflicts_with = "dir", required_unless_present = "dir")]
    input: Option<PathBuf>,

    /// Directory of per-developer exports named <developer>_<kind>.csv
    #[arg(long)]
    dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Split each developer's history at their first pivot contribution
    #[command(long_about = "Split each developer's history at their first pivot contribution.\n\n\
        Repositories a developer touched before their first contribution to the pivot\n\
        land on the before side; repositories touched afterwards land on the after side.\n\
        Developers who never touch the pivot keep everything on the before side.\n\n\
        Examples:\n  devmove partition --input events.csv --pivot apache/zookeeper\n  \
        devmove partition --dir data/ --layout developer --detailed")]
    Partition {
        #[command(flatten)]
        source: EventSource,

        /// Pivot repository (default: movement.pivot from config)
        #[arg(long)]
        pivot: Option<String>,

        /// Output layout: repository (one table per side) or developer
        #[arg(long)]
        layout: Option<PartitionLayout>,

        /// Directory for result tables (default: output.dir from config)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// File name prefix (default: output.prefix from config)
        #[arg(long)]
        prefix: Option<String>,

        /// Also write event counts, merged before/after counts and repository overlaps
        #[arg(long)]
        detailed: bool,
    },
    /// Count repositories shared by every group of k developers
    #[command(long_about = "Count repositories shared by every group of k developers.\n\n\
        Reads a membership table (repository, developers) such as the one written by\n\
        `devmove partition` and, for each requested group size, lists every group of\n\
        developers with the repositories they all contributed to.\n\n\
        Examples:\n  devmove groups --membership post.csv --size 2\n  \
        devmove groups --membership pre.csv --side before --size 2 --size 3 --limit 5")]
    Groups {
        /// Membership table with a repository column and a developers list
        #[arg(long)]
        membership: PathBuf,

        /// Group size; repeat for several sizes (default: groups.sizes from config)
        #[arg(long = "size", short = 'k')]
        sizes: Vec<usize>,

        /// Side the membership describes, used in output file names
        #[arg(
            long,
            long_help = "Side the membership describes, used in output file names.\n\n\
                Defaults to the side named by the table's repository column\n\
                (before/after), then to groups.side from config."
        )]
        side: Option<Side>,

        /// Directory for result tables (default: output.dir from config)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Groups to print per size (default: 10)
        #[arg(long, default_value = "10")]
        limit: usize,

        /// Skip repositories with more developers than this (0 = unbounded)
        #[arg(long)]
        max_developers_per_repo: Option<usize>,
    },
    /// Merge before and after count tables into one comparison
    #[command(long_about = "Merge before and after count tables into one comparison.\n\n\
        Each input is either a count table (repo, count) or a membership table\n\
        (repository, developers), whose counts are the list lengths. Repositories\n\
        missing from one side count as zero there.\n\n\
        Example:\n  devmove summary --before pre.csv --after post.csv --out merged.csv")]
    Summary {
        /// Count or membership table for the before side
        #[arg(long)]
        before: PathBuf,

        /// Count or membership table for the after side
        #[arg(long)]
        after: PathBuf,

        /// Write the merged table here as CSV
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Count developers shared by each before/after repository pair
    #[command(long_about = "Count developers shared by each before/after repository pair.\n\n\
        Reads two membership tables (repository, developers) such as the ones written by\n\
        `devmove partition` and, for every before repository and after repository with\n\
        at least one developer in common, counts the developers they share.\n\n\
        Example:\n  devmove overlap --before pre.csv --after post.csv --out overlap.csv")]
    Overlap {
        /// Membership table for the before side
        #[arg(long)]
        before: PathBuf,

        /// Membership table for the after side
        #[arg(long)]
        after: PathBuf,

        /// Output CSV (default: <out-dir>/<prefix>_repository_overlap_counts.csv)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Pairs to print (default: 10)
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Count contributions per month
    #[command(long_about = "Count contributions per month.\n\n\
        Groups contribution events by calendar month (UTC) and contribution type, either\n\
        per developer and repository or per repository across developers. The type comes\n\
        from a `type` column, or from the file name in a per-developer directory.\n\n\
        Examples:\n  devmove monthly --dir data/\n  \
        devmove monthly --input events.csv --by repository")]
    Monthly {
        #[command(flatten)]
        source: EventSource,

        /// Grouping: developer (developer, repository, month) or repository
        #[arg(long, value_enum, default_value = "developer")]
        by: MonthlyGrouping,

        /// Output CSV (default: <out-dir>/<prefix>_monthly_<by>_contributions.csv)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Find developers contributing to the same repository within a window
    #[command(long_about = "Find developers contributing to the same repository within a window.\n\n\
        For each event, every other developer with an event on the same repository\n\
        within the window (either direction) counts as a co-contributor.\n\n\
        Example:\n  devmove copresence --input events.csv --window-days 5")]
    Copresence {
        #[command(flatten)]
        source: EventSource,

        /// Window in days (default: window.co_contribution_days from config)
        #[arg(long)]
        window_days: Option<i64>,

        /// Output CSV (default: <out-dir>/<prefix>_co_contribution.csv)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Rank developers who move between repositories most, and who follows them
    #[command(long_about = "Rank developers who move between repositories most, and who follows them.\n\n\
        A developer's movement count sums, over each repository they touch, the other\n\
        repositories they touch within the window. The top developers are key persons;\n\
        every other developer's event on a different repository within the window of a\n\
        key person's event is written out as a follower move.\n\n\
        Example:\n  devmove keyperson --input events.csv --window-days 30 --top 3")]
    Keyperson {
        #[command(flatten)]
        source: EventSource,

        /// Window in days (default: window.key_person_days from config)
        #[arg(long)]
        window_days: Option<i64>,

        /// Number of key persons (default: window.key_person_top from config)
        #[arg(long)]
        top: Option<usize>,

        /// Output CSV (default: <out-dir>/<prefix>_key_person_movements.csv)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Create a default .devmove.toml configuration file
    #[command(long_about = "Create a default .devmove.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .devmove.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MonthlyGrouping {
    /// One row per developer, repository, month and type
    Developer,
    /// One row per month, repository and type
    Repository,
}

impl MonthlyGrouping {
    fn file_tag(self) -> &'static str {
        match self {
            MonthlyGrouping::Developer => "developer",
            MonthlyGrouping::Repository => "repository",
        }
    }
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1mdevmove\x1b[0m v{version}: where developers went before and after a pivot repository\n");

        println!("Quick start:");
        println!("  \x1b[36mdevmove init\x1b[0m                          Create a .devmove.toml config file");
        println!("  \x1b[36mdevmove partition --input events.csv\x1b[0m  Split histories at the pivot");
        println!("  \x1b[36mdevmove groups --membership post.csv\x1b[0m  Find groups that moved together\n");

        println!("All commands:");
        println!("  \x1b[32mpartition\x1b[0m   Before/after repositories per developer");
        println!("  \x1b[32mgroups\x1b[0m      Repositories shared by groups of k developers");
        println!("  \x1b[32msummary\x1b[0m     Merge before and after counts");
        println!("  \x1b[32moverlap\x1b[0m     Developers shared by before/after repository pairs");
        println!("  \x1b[32mmonthly\x1b[0m     Contributions per month");
        println!("  \x1b[32mcopresence\x1b[0m  Developers contributing side by side");
        println!("  \x1b[32mkeyperson\x1b[0m   Frequent movers and who follows them");
        println!("  \x1b[32minit\x1b[0m        Create default configuration\n");
    } else {
        println!("devmove v{version}: where developers went before and after a pivot repository\n");

        println!("Quick start:");
        println!("  devmove init                          Create a .devmove.toml config file");
        println!("  devmove partition --input events.csv  Split histories at the pivot");
        println!("  devmove groups --membership post.csv  Find groups that moved together\n");

        println!("All commands:");
        println!("  partition   Before/after repositories per developer");
        println!("  groups      Repositories shared by groups of k developers");
        println!("  summary     Merge before and after counts");
        println!("  overlap     Developers shared by before/after repository pairs");
        println!("  monthly     Contributions per month");
        println!("  copresence  Developers contributing side by side");
        println!("  keyperson   Frequent movers and who follows them");
        println!("  init        Create default configuration\n");
    }

    println!("Run 'devmove <command> --help' for details.");
}

const DEFAULT_CONFIG: &str = r#"# devmove configuration

[movement]
# Repository whose first contribution splits each developer's history
# pivot = "apache/zookeeper"
# layout = "repository"   # or "developer"

[groups]
# sizes = [2, 3, 4]
# side = "after"
# max_developers_per_repo = 0   # 0 = unbounded

[window]
# co_contribution_days = 5
# key_person_days = 30
# key_person_top = 3

[output]
# dir = "results"
# prefix = "zookeeper"
"#;

fn init_tracing(verbose: bool, use_color: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_env("DEVMOVE_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(use_color)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<DevmoveConfig> {
    let config = match path {
        Some(path) => DevmoveConfig::from_file(path)?,
        None => {
            let default_path = Path::new(".devmove.toml");
            if default_path.exists() {
                DevmoveConfig::from_file(default_path)?
            } else {
                DevmoveConfig::default()
            }
        }
    };
    Ok(config)
}

fn load_events(source: &EventSource) -> Result<LoadedEvents> {
    let loaded = match (&source.input, &source.dir) {
        (Some(path), _) => devmove_ingest::events::load_contributions(path)?,
        (None, Some(dir)) => devmove_ingest::events::load_developer_dir(dir)?,
        (None, None) => miette::bail!(miette::miette!(
            help = "pass --input <csv> or --dir <directory>",
            "no contribution source given"
        )),
    };
    info!(
        events = loaded.events.len(),
        dropped = loaded.report.rows_dropped,
        "loaded contribution events"
    );
    Ok(loaded)
}

fn window(days: i64, flag: &str) -> Result<chrono::Duration> {
    if days < 0 {
        miette::bail!("{flag} must be zero or positive, got {days}");
    }
    Ok(chrono::Duration::days(days))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PartitionReport {
    pivot: String,
    layout: PartitionLayout,
    developers: usize,
    pivot_seen: usize,
    never_seen: usize,
    before_repositories: usize,
    after_repositories: usize,
    load: LoadReport,
    files: Vec<PathBuf>,
}

struct PartitionArgs {
    pivot: String,
    layout: PartitionLayout,
    out_dir: PathBuf,
    prefix: String,
    detailed: bool,
}

fn run_partition(loaded: &LoadedEvents, args: &PartitionArgs, format: OutputFormat) -> Result<()> {
    let results = devmove_movement::partition::partition_all(&loaded.events, &args.pivot)?;
    let before = RepositoryMembership::from_partitions(&results, Side::Before);
    let after = RepositoryMembership::from_partitions(&results, Side::After);

    let mut files = Vec::new();
    match args.layout {
        PartitionLayout::Repository => {
            for (side, membership) in [(Side::Before, &before), (Side::After, &after)] {
                let path = args.out_dir.join(format!(
                    "{}_{}_contribution_with_developers.csv",
                    args.prefix,
                    side.file_tag()
                ));
                export::write_membership(export::create_output(&path)?, side, membership)?;
                files.push(path);
            }
        }
        PartitionLayout::Developer => {
            let path = args.out_dir.join(format!("{}_movements.csv", args.prefix));
            export::write_developer_partitions(export::create_output(&path)?, &results)?;
            files.push(path);
        }
    }

    if args.detailed {
        let side_events = devmove_movement::partition::partition_all_events(&loaded.events, &args.pivot)?;
        for side in Side::ALL {
            let tallies = devmove_movement::summary::event_tallies(&side_events, side);
            let path = args.out_dir.join(format!(
                "{}_{}_contribution_detailed.csv",
                args.prefix,
                side.file_tag()
            ));
            export::write_event_tallies(export::create_output(&path)?, &tallies)?;
            files.push(path);
        }

        let merged = devmove_movement::summary::merge_tallies(
            &devmove_movement::summary::repository_tallies(&before),
            &devmove_movement::summary::repository_tallies(&after),
        );
        let path = args.out_dir.join(format!("{}_merged_contribution.csv", args.prefix));
        export::write_merged_tallies(export::create_output(&path)?, &merged)?;
        files.push(path);

        let overlaps = devmove_movement::summary::overlap(&before, &after);
        let path = args
            .out_dir
            .join(format!("{}_repository_overlap_counts.csv", args.prefix));
        export::write_overlaps(export::create_output(&path)?, &overlaps)?;
        files.push(path);
    }

    let pivot_seen = results.iter().filter(|r| r.pivot_seen).count();
    let report = PartitionReport {
        pivot: args.pivot.clone(),
        layout: args.layout,
        developers: results.len(),
        pivot_seen,
        never_seen: results.len() - pivot_seen,
        before_repositories: before.len(),
        after_repositories: after.len(),
        load: loaded.report,
        files,
    };

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Markdown => {
            println!("# Partition around `{}`\n", report.pivot);
            println!("| Metric | Value |");
            println!("|--------|-------|");
            println!("| Developers | {} |", report.developers);
            println!("| Contributed to pivot | {} |", report.pivot_seen);
            println!("| Never contributed to pivot | {} |", report.never_seen);
            println!("| Repositories before | {} |", report.before_repositories);
            println!("| Repositories after | {} |", report.after_repositories);
            println!("| Rows dropped | {} |", report.load.rows_dropped);
            println!("\n## Files\n");
            for f in &report.files {
                println!("- `{}`", f.display());
            }
        }
        OutputFormat::Text => {
            println!(
                "Partitioned {} developers around {} ({} never contributed to it)",
                report.developers, report.pivot, report.never_seen
            );
            println!("  before: {} repositories", report.before_repositories);
            println!("  after:  {} repositories", report.after_repositories);
            if report.load.rows_dropped > 0 {
                println!(
                    "  dropped {} of {} input rows",
                    report.load.rows_dropped, report.load.rows_read
                );
            }
            println!("Wrote:");
            for f in &report.files {
                println!("  {}", f.display());
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GroupSizeReport {
    k: usize,
    total_groups: usize,
    file: PathBuf,
    top: Vec<GroupCommonRepoRecord>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GroupsReport {
    side: Side,
    repositories: usize,
    developers: usize,
    sizes: Vec<GroupSizeReport>,
}

fn print_groups(report: &GroupsReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(report)?,
        OutputFormat::Markdown => {
            println!(
                "# Developer groups ({}, {} repositories, {} developers)\n",
                report.side, report.repositories, report.developers
            );
            for size in &report.sizes {
                println!(
                    "## Groups of {} ({} total)\n\nWritten to `{}`\n",
                    size.k,
                    size.total_groups,
                    size.file.display()
                );
                if size.top.is_empty() {
                    println!("No groups share a repository.\n");
                    continue;
                }
                println!("| Developers | Common repos | Repositories |");
                println!("|------------|--------------|--------------|");
                for g in &size.top {
                    println!(
                        "| {} | {} | {} |",
                        g.developers.join(", "),
                        g.common_repos_count,
                        g.common_repos.join(", ")
                    );
                }
                println!();
            }
        }
        OutputFormat::Text => {
            println!(
                "{} side: {} repositories, {} developers",
                report.side, report.repositories, report.developers
            );
            for size in &report.sizes {
                println!(
                    "\nGroups of {}: {} total -> {}",
                    size.k,
                    size.total_groups,
                    size.file.display()
                );
                for g in &size.top {
                    println!(
                        "  {:>4}  {}  [{}]",
                        g.common_repos_count,
                        g.developers.join(", "),
                        g.common_repos.join(", ")
                    );
                }
            }
        }
    }
    Ok(())
}

fn print_merged(merged: &[MergedTally], out: Option<&Path>, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(&merged)?,
        OutputFormat::Markdown => {
            println!("| Repository | Before | After |");
            println!("|------------|--------|-------|");
            for m in merged {
                println!("| {} | {} | {} |", m.repository, m.before_count, m.after_count);
            }
        }
        OutputFormat::Text => {
            let width = merged
                .iter()
                .map(|m| m.repository.len())
                .max()
                .unwrap_or(10)
                .max(10);
            println!("{:<width$}  {:>6}  {:>6}", "repository", "before", "after");
            for m in merged {
                println!(
                    "{:<width$}  {:>6}  {:>6}",
                    m.repository, m.before_count, m.after_count
                );
            }
            if let Some(path) = out {
                eprintln!("Wrote {}", path.display());
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KeyPersonReport {
    window_days: i64,
    key_persons: Vec<devmove_movement::keyperson::MovementCount>,
    follower_moves: usize,
    file: PathBuf,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };
    init_tracing(cli.verbose, use_color);

    let config = load_config(cli.config.as_deref())?;
    tracing::debug!(
        format = %cli.format,
        pivot = config.movement.pivot.as_str(),
        "configuration loaded"
    );

    match cli.command {
        None => {
            print_welcome(use_color);
            return Ok(());
        }
        Some(Command::Partition {
            ref source,
            ref pivot,
            layout,
            ref out_dir,
            ref prefix,
            detailed,
        }) => {
            let args = PartitionArgs {
                pivot: pivot.clone().unwrap_or_else(|| config.movement.pivot.clone()),
                layout: layout.unwrap_or(config.movement.layout),
                out_dir: out_dir.clone().unwrap_or_else(|| config.output.dir.clone()),
                prefix: prefix.clone().unwrap_or_else(|| config.output.prefix.clone()),
                detailed,
            };
            if args.pivot.trim().is_empty() {
                miette::bail!("--pivot must not be empty");
            }
            let loaded = load_events(source)?;
            run_partition(&loaded, &args, cli.format)?;
        }
        Some(Command::Groups {
            ref membership,
            ref sizes,
            side,
            ref out_dir,
            limit,
            max_developers_per_repo,
        }) => {
            let table = devmove_ingest::table::load_membership(membership)?;
            let side = match (side, table.side) {
                (Some(flag), Some(column)) if flag != column => {
                    warn!(
                        flag = %flag,
                        column = %column,
                        "--side disagrees with the table's repository column, using --side"
                    );
                    flag
                }
                (Some(flag), _) => flag,
                (None, Some(column)) => column,
                (None, None) => config.groups.side,
            };
            let sizes = if sizes.is_empty() {
                config.groups.sizes.clone()
            } else {
                sizes.clone()
            };
            let max = max_developers_per_repo.unwrap_or(config.groups.max_developers_per_repo);
            let options = GroupOptions {
                max_developers_per_repo: (max > 0).then_some(max),
            };
            let out_dir = out_dir.clone().unwrap_or_else(|| config.output.dir.clone());

            let spinner = if std::io::stderr().is_terminal() {
                let pb = indicatif::ProgressBar::new_spinner();
                pb.set_style(
                    indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
                        .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner()),
                );
                pb.set_message(format!(
                    "Aggregating groups over {} repositories...",
                    table.membership.len()
                ));
                pb.enable_steady_tick(std::time::Duration::from_millis(120));
                Some(pb)
            } else {
                None
            };

            let by_size =
                devmove_movement::groups::aggregate_many(&table.membership, &sizes, &options);

            if let Some(pb) = &spinner {
                pb.finish_and_clear();
            }

            let mut reports = Vec::new();
            for (k, records) in by_size {
                let path = out_dir.join(format!("{side}_{k}_common_repos_with_details.csv"));
                export::write_groups(export::create_output(&path)?, k, &records)?;
                reports.push(GroupSizeReport {
                    k,
                    total_groups: records.len(),
                    file: path,
                    top: records.into_iter().take(limit).collect(),
                });
            }

            let report = GroupsReport {
                side,
                repositories: table.membership.len(),
                developers: table.membership.developer_count(),
                sizes: reports,
            };
            print_groups(&report, cli.format)?;
        }
        Some(Command::Summary {
            ref before,
            ref after,
            ref out,
        }) => {
            let before = devmove_ingest::table::load_tallies(before)?;
            let after = devmove_ingest::table::load_tallies(after)?;
            let merged = devmove_movement::summary::merge_tallies(&before, &after);
            if let Some(path) = out {
                export::write_merged_tallies(export::create_output(path)?, &merged)?;
            }
            print_merged(&merged, out.as_deref(), cli.format)?;
        }
        Some(Command::Overlap {
            ref before,
            ref after,
            ref out,
            limit,
        }) => {
            let before = devmove_ingest::table::load_membership(before)?;
            let after = devmove_ingest::table::load_membership(after)?;
            let path = out.clone().unwrap_or_else(|| {
                config
                    .output
                    .dir
                    .join(format!("{}_repository_overlap_counts.csv", config.output.prefix))
            });

            let overlaps =
                devmove_movement::summary::overlap(&before.membership, &after.membership);
            export::write_overlaps(export::create_output(&path)?, &overlaps)?;

            match cli.format {
                OutputFormat::Json => print_json(&overlaps)?,
                OutputFormat::Markdown => {
                    println!("# Shared developers per repository pair\n");
                    println!("| Before | After | Developers |");
                    println!("|--------|-------|------------|");
                    for o in overlaps.iter().take(limit) {
                        println!(
                            "| {} | {} | {} |",
                            o.before_repository, o.after_repository, o.overlap_count
                        );
                    }
                }
                OutputFormat::Text => {
                    println!("{} repository pairs share developers", overlaps.len());
                    for o in overlaps.iter().take(limit) {
                        println!(
                            "  {:>4}  {} -> {}",
                            o.overlap_count, o.before_repository, o.after_repository
                        );
                    }
                    println!("Wrote {}", path.display());
                }
            }
        }
        Some(Command::Monthly {
            ref source,
            by,
            ref out,
        }) => {
            let path = out.clone().unwrap_or_else(|| {
                config.output.dir.join(format!(
                    "{}_monthly_{}_contributions.csv",
                    config.output.prefix,
                    by.file_tag()
                ))
            });

            let loaded = load_events(source)?;
            let rows = match by {
                MonthlyGrouping::Developer => {
                    let tallies = devmove_movement::monthly::developer_monthly(&loaded.events);
                    export::write_developer_monthly(export::create_output(&path)?, &tallies)?;
                    if cli.format == OutputFormat::Json {
                        print_json(&tallies)?;
                    }
                    tallies.len()
                }
                MonthlyGrouping::Repository => {
                    let tallies = devmove_movement::monthly::repository_monthly(&loaded.events);
                    export::write_repository_monthly(export::create_output(&path)?, &tallies)?;
                    if cli.format == OutputFormat::Json {
                        print_json(&tallies)?;
                    }
                    tallies.len()
                }
            };

            match cli.format {
                OutputFormat::Json => {}
                OutputFormat::Markdown => {
                    println!("Wrote {rows} monthly rows to `{}`", path.display());
                }
                OutputFormat::Text => {
                    println!("{rows} monthly rows from {} events", loaded.events.len());
                    println!("Wrote {}", path.display());
                }
            }
        }
        Some(Command::Copresence {
            ref source,
            window_days,
            ref out,
        }) => {
            let days = window_days.unwrap_or(config.window.co_contribution_days);
            let span = window(days, "--window-days")?;
            let path = out.clone().unwrap_or_else(|| {
                config
                    .output
                    .dir
                    .join(format!("{}_co_contribution.csv", config.output.prefix))
            });

            let loaded = load_events(source)?;
            let rows = devmove_movement::copresence::co_contributions(&loaded.events, span);
            export::write_co_contributions(export::create_output(&path)?, &rows)?;

            match cli.format {
                OutputFormat::Json => print_json(&rows)?,
                OutputFormat::Markdown => {
                    println!("# Co-contribution within {days} days\n");
                    println!("| Developer | Repository | Co-contributors |");
                    println!("|-----------|------------|-----------------|");
                    for r in &rows {
                        println!(
                            "| {} | {} | {} |",
                            r.developer,
                            r.repository,
                            r.co_contributors.join(", ")
                        );
                    }
                }
                OutputFormat::Text => {
                    println!(
                        "{} developer/repository pairs with co-contributors within {days} days",
                        rows.len()
                    );
                    println!("Wrote {}", path.display());
                }
            }
        }
        Some(Command::Keyperson {
            ref source,
            window_days,
            top,
            ref out,
        }) => {
            let days = window_days.unwrap_or(config.window.key_person_days);
            let span = window(days, "--window-days")?;
            let top = top.unwrap_or(config.window.key_person_top);
            let path = out.clone().unwrap_or_else(|| {
                config
                    .output
                    .dir
                    .join(format!("{}_key_person_movements.csv", config.output.prefix))
            });

            let loaded = load_events(source)?;
            let names = devmove_movement::keyperson::key_persons(&loaded.events, span, top);
            let ranked: Vec<_> = devmove_movement::keyperson::movement_counts(&loaded.events, span)
                .into_iter()
                .filter(|m| names.contains(&m.developer))
                .collect();
            let moves =
                devmove_movement::keyperson::follower_movements(&loaded.events, &names, span);
            export::write_key_person_movements(export::create_output(&path)?, &moves)?;

            let report = KeyPersonReport {
                window_days: days,
                key_persons: ranked,
                follower_moves: moves.len(),
                file: path,
            };
            match cli.format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Markdown => {
                    println!("# Key persons ({days}-day window)\n");
                    println!("| Developer | Moves |");
                    println!("|-----------|-------|");
                    for m in &report.key_persons {
                        println!("| {} | {} |", m.developer, m.count);
                    }
                    println!(
                        "\n{} follower moves written to `{}`",
                        report.follower_moves,
                        report.file.display()
                    );
                }
                OutputFormat::Text => {
                    println!("Key persons ({days}-day window):");
                    for (i, m) in report.key_persons.iter().enumerate() {
                        println!("  {}. {} ({} repository moves)", i + 1, m.developer, m.count);
                    }
                    println!(
                        "{} follower moves written to {}",
                        report.follower_moves,
                        report.file.display()
                    );
                }
            }
        }
        Some(Command::Init) => {
            let path = Path::new(".devmove.toml");
            if path.exists() {
                miette::bail!(".devmove.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .devmove.toml with default configuration");
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "devmove", &mut std::io::stdout());
        }
    }

    Ok(())
}
