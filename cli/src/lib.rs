//! `hrdash` command line
//!
//! Record management and dashboard rendering on top of the insights
//! pipeline and the SQLite record store.
//!
//! ## Commands
//!
//! - `hrdash dashboard` - Run the pipeline and print every chart plus the summary
//! - `hrdash import <file>` / `hrdash export [file]` - JSON transfer
//! - `hrdash list` / `show` / `delete` - Record management
//! - `hrdash taxonomy` - Print the active taxonomy
//! - `hrdash check` - Validate stored records against the taxonomy
//!
//! ## Exit Codes
//!
//! - 0: Success
//! - 1: Invalid input, unknown record, or `check` found issues
//! - 2: Configuration, taxonomy or storage failure

use anyhow::Context as _;
use clap::{ArgAction, Parser, Subcommand};
use hrdash_insights::{DashboardConfig, DashboardEngine};
use hrdash_store::{RecordStore, StoreError};
use std::path::PathBuf;
use thiserror::Error;

pub mod dashboard_cmd;
pub mod records_cmd;
pub mod taxonomy_cmd;

/// hrdash version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit codes for every command
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const INVALID_INPUT: i32 = 1;
    pub const FAILURE: i32 = 2;
}

/// Rights-violation dashboard: records, charts and summary statistics
#[derive(Debug, Parser)]
#[command(name = "hrdash", version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, clap::Args)]
pub struct GlobalArgs {
    /// Config file (default: $HRDASH_CONFIG or ~/.config/hrdash/dashboard.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Record database, overriding `db_path` from the config
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the dashboard pipeline and print the charts
    Dashboard(dashboard_cmd::DashboardArgs),

    /// Import records from a JSON array
    ///
    /// Province, district, category, sub-category, indicator and status may be
    /// given as ids or display names.
    Import(records_cmd::ImportArgs),

    /// Export every record as JSON
    Export(records_cmd::ExportArgs),

    /// List records, newest event first
    List(records_cmd::ListArgs),

    /// Show one record by id or entry number
    Show(records_cmd::KeyArgs),

    /// Delete one record by id or entry number
    Delete(records_cmd::KeyArgs),

    /// Print the active taxonomy
    Taxonomy(taxonomy_cmd::TaxonomyArgs),

    /// Validate every stored record against the taxonomy
    Check(records_cmd::CheckArgs),
}

impl Cli {
    pub fn run(self) -> i32 {
        let result = match self.command {
            Command::Dashboard(args) => dashboard_cmd::run_dashboard(&self.global, args),
            Command::Import(args) => records_cmd::run_import(&self.global, args),
            Command::Export(args) => records_cmd::run_export(&self.global, args),
            Command::List(args) => records_cmd::run_list(&self.global, args),
            Command::Show(args) => records_cmd::run_show(&self.global, args),
            Command::Delete(args) => records_cmd::run_delete(&self.global, args),
            Command::Taxonomy(args) => taxonomy_cmd::run_taxonomy(&self.global, args),
            Command::Check(args) => records_cmd::run_check(&self.global, args),
        };

        match result {
            Ok(code) => code,
            Err(err) => {
                eprintln!("error: {err:#}");
                exit_code_for(&err)
            }
        }
    }
}

/// Bad flag values or unknown keys supplied on the command line
#[derive(Debug, Error)]
#[error("{0}")]
pub struct UsageError(pub String);

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<UsageError>().is_some() {
        return exit_codes::INVALID_INPUT;
    }
    if let Some(store) = err.downcast_ref::<StoreError>()
        && store.is_user_error()
    {
        return exit_codes::INVALID_INPUT;
    }
    exit_codes::FAILURE
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared setup
// ─────────────────────────────────────────────────────────────────────────────

/// Config, engine and store for one command
pub(crate) struct Context {
    pub engine: DashboardEngine,
    pub store: RecordStore,
}

impl Context {
    pub(crate) fn load(global: &GlobalArgs) -> anyhow::Result<Self> {
        let engine = load_engine(global)?;
        let db_path = global
            .db
            .clone()
            .unwrap_or_else(|| engine.config().resolved_db_path());
        let store = RecordStore::open(&db_path)
            .with_context(|| format!("opening record store at {}", db_path.display()))?;

        tracing::debug!(db = %db_path.display(), "Record store ready");

        Ok(Self { engine, store })
    }
}

pub(crate) fn load_engine(global: &GlobalArgs) -> anyhow::Result<DashboardEngine> {
    let config = match &global.config {
        Some(path) => DashboardConfig::load_from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => DashboardConfig::load().context("loading config")?,
    };
    Ok(DashboardEngine::from_config(config)?)
}

/// Log filter for `-v` counts; `RUST_LOG` takes precedence in the binary
pub fn default_log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["hrdash", "list", "--db", "/tmp/x.db", "-vv"])
            .expect("parse");
        assert_eq!(cli.global.db, Some(PathBuf::from("/tmp/x.db")));
        assert_eq!(cli.global.verbose, 2);
        assert!(matches!(cli.command, Command::List(_)));
    }

    #[test]
    fn test_exit_codes() {
        let usage = anyhow::Error::new(UsageError("bad".into()));
        assert_eq!(exit_code_for(&usage), exit_codes::INVALID_INPUT);

        let missing = anyhow::Error::new(StoreError::NotFound { id: "x".into() })
            .context("showing record");
        assert_eq!(exit_code_for(&missing), exit_codes::INVALID_INPUT);

        let io = anyhow::anyhow!("disk on fire");
        assert_eq!(exit_code_for(&io), exit_codes::FAILURE);
    }

    #[test]
    fn test_log_filter() {
        assert_eq!(default_log_filter(0), "warn");
        assert_eq!(default_log_filter(1), "info");
        assert_eq!(default_log_filter(5), "debug");
    }
}
