use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use uuid::Uuid;

use comic_migrator::execution::{preflight_undo, undo, ExecutionEngine, ExecutionMode, UndoLog};
use comic_migrator::inventory::{save_inventory, verify_backup_from_file, InventoryScanner};
use comic_migrator::planner::{approved_actions, MigrationAction, PlanReport, PlanSummary, Planner};
use comic_migrator::{LoggingContext, Result, Settings};

/// Settings file picked up from the working directory when --config is absent
const DEFAULT_CONFIG_FILE: &str = "comic-migrator.toml";

#[derive(Debug, Parser)]
#[command(name = "comic-migrator")]
#[command(about = "Plan and apply a comic collection migration", long_about = None)]
struct Cli {
    /// Settings file (TOML)
    #[arg(long, global = true, env = "COMIC_MIGRATOR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Inventory operations
    #[command(subcommand)]
    Inventory(InventoryCommands),
    /// Dry run: scan, resolve and plan without touching the library
    Plan(PlanArgs),
    /// Plan, then copy or move the approved files
    Migrate(MigrateArgs),
    /// Reverse operations recorded in the undo log
    Undo(UndoArgs),
}

#[derive(Debug, Subcommand)]
enum InventoryCommands {
    /// Scan a directory and write its inventory as JSON
    Scan {
        root: PathBuf,
        #[arg(long, short, default_value = "inventory.json")]
        output: PathBuf,
    },
    /// Check that a backup holds every file of a saved inventory
    Verify { inventory: PathBuf, backup: PathBuf },
}

#[derive(Debug, Args)]
struct PlanArgs {
    root: PathBuf,
    /// Write the full plan as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct MigrateArgs {
    root: PathBuf,
    /// Move files instead of copying them
    #[arg(long = "move")]
    move_files: bool,
    /// Execute at most this many approved actions
    #[arg(long)]
    limit: Option<usize>,
    /// Do not ask for confirmation
    #[arg(long, short)]
    yes: bool,
    /// Write the full plan as JSON before executing
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct UndoArgs {
    /// Only reverse this execution run
    #[arg(long)]
    run: Option<Uuid>,
    /// Report what would be reversed without changing anything
    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = LoggingContext::new(settings.logging.clone()).and_then(|ctx| ctx.init()) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli.command, &settings) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, fatal = e.is_fatal(), "Command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load(path),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => Settings::load(Path::new(DEFAULT_CONFIG_FILE)),
        None => Ok(Settings::default()),
    }
}

/// Run a command; `Ok(false)` means it finished but reported failures
fn run(command: Commands, settings: &Settings) -> Result<bool> {
    match command {
        Commands::Inventory(InventoryCommands::Scan { root, output }) => {
            let inventory = InventoryScanner::from_settings(settings).scan(&root)?;
            save_inventory(&inventory.records, &output)?;
            println!(
                "Scanned {} files ({} bytes, {} skipped) -> {}",
                inventory.stats.total_files,
                inventory.stats.total_size_bytes,
                inventory.stats.errors,
                output.display()
            );
            Ok(true)
        }
        Commands::Inventory(InventoryCommands::Verify { inventory, backup }) => {
            let scanner = InventoryScanner::from_settings(settings);
            let report = verify_backup_from_file(&inventory, &backup, &scanner)?;
            println!(
                "Original: {}  Backup: {}  Matched: {}  Missing: {}  Extra: {}",
                report.total_original,
                report.total_backup,
                report.matches.len(),
                report.missing.len(),
                report.extra.len()
            );
            for missing in &report.missing {
                println!("  missing: {}", missing.rel_path.display());
            }
            Ok(report.is_complete())
        }
        Commands::Plan(args) => {
            let actions = plan(settings, &args.root, args.report.as_deref())?;
            print_problems(&actions);
            Ok(true)
        }
        Commands::Migrate(args) => migrate(settings, args),
        Commands::Undo(args) => run_undo(settings, args),
    }
}

fn plan(settings: &Settings, root: &Path, report: Option<&Path>) -> Result<Vec<MigrationAction>> {
    let actions = Planner::new(settings).simulate(root)?;
    println!("{}", PlanSummary::from_actions(&actions));

    if let Some(path) = report {
        let report = PlanReport::new(actions.clone());
        report.write_json(path)?;
        println!("Plan written to {}", path.display());
    }
    Ok(actions)
}

fn print_problems(actions: &[MigrationAction]) {
    for action in actions.iter().filter(|a| !a.is_approved()) {
        println!(
            "  {:<8} {}  ({})",
            action.status().to_string(),
            action.source_path().display(),
            action.reason().unwrap_or_default()
        );
    }
}

fn migrate(settings: &Settings, args: MigrateArgs) -> Result<bool> {
    let actions = plan(settings, &args.root, args.report.as_deref())?;
    let approved = approved_actions(&actions, args.limit);

    if approved.is_empty() {
        println!("Nothing to migrate.");
        return Ok(true);
    }

    let mode = if args.move_files {
        ExecutionMode::Move
    } else {
        ExecutionMode::Copy
    };

    if !args.yes && !confirm(&format!("{} {} files?", mode, approved.len()))? {
        println!("Aborted.");
        return Ok(true);
    }

    let engine = ExecutionEngine::from_settings(settings)?;
    let result = engine.execute(&approved, mode)?;

    println!(
        "Run {}: {} succeeded, {} failed (undo log: {})",
        result.run_id,
        result.completed_count(),
        result.failed_count(),
        engine.undo_log().path().display()
    );
    for error in result.errors() {
        println!("  failed: {}", error);
    }

    Ok(result.success())
}

fn run_undo(settings: &Settings, args: UndoArgs) -> Result<bool> {
    let log = UndoLog::open(&settings.undo_log_path)?;
    let preflight = preflight_undo(&log, args.run)?;

    println!(
        "{} operations: {} reversible, {} missing, {} blocked, {} modified",
        preflight.total_operations,
        preflight.safe_operations,
        preflight.missing_files.len(),
        preflight.blocking_files.len(),
        preflight.modified_files.len()
    );
    for path in &preflight.blocking_files {
        println!("  blocked: {}", path.display());
    }
    for path in &preflight.modified_files {
        println!("  modified: {}", path.display());
    }

    if args.dry_run || preflight.safe_operations == 0 {
        return Ok(true);
    }

    let result = undo(&log, args.run)?;
    println!(
        "Reversed {} operations, skipped {}",
        result.operations_undone, result.operations_skipped
    );
    for error in &result.errors {
        println!("  failed: {}", error);
    }
    Ok(result.success)
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
