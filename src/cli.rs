//! CLI implementation for retest

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use retest::config::{find_project_root, Config};
use retest::impact::Selection;
use retest::session::{Session, SessionOptions};

#[derive(Parser)]
#[command(name = "retest")]
#[command(about = "Change-impact test selection: run only the tests a change can affect")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root (default: walk up from cwd to a pyproject.toml/.git marker)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Snapshot file location
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Ignore the existing snapshot and treat this as a first run
    #[arg(long, global = true)]
    rebuild: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Suppress diagnostic output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Show debug info
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show changed/new/deleted counts and the would-be selection
    Status,
    /// Print the test files to run, one per line (pipe into your runner)
    Select,
    /// Record a passing run and persist the new baseline
    Accept {
        /// Compute everything but do not write the snapshot
        #[arg(long)]
        no_save: bool,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Log to stderr to keep stdout clean for piped selections
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::new("retest=debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let root = cli
        .root
        .clone()
        .unwrap_or_else(find_project_root);
    let config = Config::load(&root);

    let snapshot_path = cli
        .snapshot
        .clone()
        .unwrap_or_else(|| config.snapshot_path(&root));

    let mut options = SessionOptions::new(&root)
        .with_snapshot_path(snapshot_path)
        .with_force_rebuild(cli.rebuild);
    if let Some(size) = config.max_file_size {
        options.max_file_size = size;
    }
    options.always_run = config.always_run.clone();

    match cli.command {
        Commands::Status => status(options, &cli),
        Commands::Select => select(options, &cli),
        Commands::Accept { no_save } => accept(options, &cli, no_save),
    }
}

/// Run the pipeline up to selection and return the session + selection
fn compute(mut session: Session) -> Result<(Session, Selection)> {
    session.load().context("failed to scan project")?;
    session.diff().context("failed to diff against snapshot")?;
    let units = session.collect_test_units();
    let selection = session
        .select(&units)
        .context("failed to compute selection")?
        .clone();
    Ok((session, selection))
}

fn status(options: SessionOptions, cli: &Cli) -> Result<()> {
    let (session, selection) = compute(Session::new(options))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&selection.summary)?);
        return Ok(());
    }

    let s = &selection.summary;
    if session.is_first_run() {
        println!("{} no usable snapshot — next run is a full run", "retest".bold());
    }
    println!(
        "files: {} changed, {} new, {} deleted",
        color_count(s.changed),
        color_count(s.added),
        color_count(s.deleted),
    );
    println!("affected files: {}", s.affected_files);
    println!(
        "tests: {} selected, {} deselected ({} mode)",
        s.selected.to_string().green(),
        s.deselected,
        s.mode,
    );
    Ok(())
}

fn select(options: SessionOptions, cli: &Cli) -> Result<()> {
    let (_session, selection) = compute(Session::new(options))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&selection)?);
        return Ok(());
    }

    for unit in &selection.selected {
        println!("{}", unit.origin);
    }
    if !cli.quiet {
        let s = &selection.summary;
        eprintln!(
            "{} {} of {} test file(s) selected ({} mode)",
            "retest:".bold(),
            s.selected,
            s.selected + s.deselected,
            s.mode,
        );
        if selection.selected.is_empty() && selection.ok_if_empty {
            eprintln!("{} nothing affected by the current changes", "retest:".bold());
        }
    }
    Ok(())
}

fn accept(options: SessionOptions, cli: &Cli, no_save: bool) -> Result<()> {
    let options = options.with_read_only(no_save);
    let (mut session, selection) = compute(Session::new(options))?;

    session
        .record_outcome(true)
        .context("failed to record outcome")?;
    let saved = session.persist().context("failed to persist baseline")?;

    if cli.json {
        println!(
            "{}",
            serde_json::json!({ "saved": saved, "summary": selection.summary })
        );
        return Ok(());
    }
    if saved {
        println!(
            "{} baseline updated ({} file(s) tracked)",
            "retest:".bold(),
            session.tracked_files()
        );
    } else if !cli.quiet {
        println!("{} baseline left untouched (--no-save)", "retest:".bold());
    }
    Ok(())
}

fn color_count(n: usize) -> String {
    if n > 0 {
        n.to_string().yellow().to_string()
    } else {
        n.to_string()
    }
}
