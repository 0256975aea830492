use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use flagrefs_coderefs::{calculate_stale_branches, parse_search_output, GitRepo, Scanner};
use flagrefs_protocol::BranchRep;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

mod config;
mod report;

use config::OptionOverrides;

#[derive(Parser)]
#[command(name = "flagrefs")]
#[command(about = "Find feature flag references in source code", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a directory and print the branch payload as JSON
    Scan(ScanArgs),

    /// Print known branches that no longer exist on the remote
    #[command(name = "stale-branches")]
    StaleBranches(StaleBranchesArgs),
}

#[derive(Args)]
struct ScanArgs {
    /// Directory to scan (defaults to current directory)
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// TOML config file (defaults to .flagrefs.toml in DIR when present)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: OptionOverrides,

    /// Use captured `rg --null --line-number` output instead of running the search tool
    #[arg(long)]
    search_output: Option<PathBuf>,

    /// Branch name (defaults to the checked out branch)
    #[arg(long)]
    branch: Option<String>,

    /// Head commit (defaults to HEAD)
    #[arg(long)]
    head: Option<String>,

    /// Write the payload to a file instead of stdout
    #[arg(long)]
    out: Option<PathBuf>,

    /// Pretty-print JSON
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct StaleBranchesArgs {
    /// Git checkout used to list remote branches
    #[arg(default_value = ".")]
    dir: PathBuf,

    /// JSON array of known branches
    #[arg(long)]
    known: PathBuf,

    /// Remote branch name (repeatable; queries git when omitted)
    #[arg(long = "remote")]
    remotes: Vec<String>,

    /// Pretty-print JSON
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Scan(args) => run_scan(args),
        Commands::StaleBranches(args) => run_stale_branches(args),
    }
}

fn run_scan(args: ScanArgs) -> Result<()> {
    let options = config::load_options(&args.dir, args.config.as_deref(), &args.overrides)?;
    let scanner = Scanner::new(options).context("Invalid scan configuration")?;

    let rows = match &args.search_output {
        Some(path) => {
            let raw = fs::read(path)
                .with_context(|| format!("Failed to read search output {}", path.display()))?;
            parse_search_output(&String::from_utf8_lossy(&raw))?
        }
        None => scanner
            .search(&args.dir)
            .with_context(|| format!("Search failed in {}", args.dir.display()))?,
    };

    let outcome = scanner.process(&rows)?;
    report::log_summary(&outcome, scanner.flag_keys());

    let repo = GitRepo::new(&args.dir);
    let name = match args.branch {
        Some(name) => name,
        None => repo
            .current_branch()
            .context("Unable to determine branch; pass --branch")?,
    };
    let head = match args.head {
        Some(head) => head,
        None => repo
            .head_sha()
            .context("Unable to determine head commit; pass --head")?,
    };

    let branch = BranchRep {
        name,
        head,
        update_sequence_id: None,
        sync_time: now_millis(),
        references: outcome.references,
    };
    log::debug!(
        "Branch {} carries {} hunk(s)",
        branch.name,
        branch.total_hunks()
    );
    report::write_json(&branch, args.pretty, args.out.as_deref())
}

fn run_stale_branches(args: StaleBranchesArgs) -> Result<()> {
    let raw = fs::read_to_string(&args.known)
        .with_context(|| format!("Failed to read {}", args.known.display()))?;
    let known: Vec<BranchRep> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse branches from {}", args.known.display()))?;

    let remote: HashSet<String> = if args.remotes.is_empty() {
        GitRepo::new(&args.dir)
            .remote_branches()
            .context("Unable to list remote branches; pass --remote")?
    } else {
        args.remotes.into_iter().collect()
    };

    let mut stale = calculate_stale_branches(&known, &remote);
    stale.sort();
    log::info!("{} of {} known branch(es) are stale", stale.len(), known.len());
    report::write_json(&stale, args.pretty, None)
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
