//! Dashboard CLI - builds macro dashboards from a workbook template

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dashboard::{Account, Config};
use dashboard_xlsm::XlsmBook;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dashboard")]
#[command(author, version, about = "Build macro dashboards from a workbook template")]
struct Cli {
    /// Log progress at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the configured components into a timestamped copy of a workbook
    Build {
        /// Macro-enabled workbook holding the template sheet
        workbook: PathBuf,

        /// TOML config file (default: built-in settings, sources next to the workbook)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// User name substituted for {name}
        #[arg(long, requires = "login")]
        name: Option<String>,

        /// Login name substituted for {login}
        #[arg(long, requires = "name")]
        login: Option<String>,

        /// File with the user name and login name on two lines
        #[arg(long, conflicts_with_all = ["name", "login"])]
        account_file: Option<PathBuf>,
    },

    /// List all sheets in a workbook
    Sheets {
        /// Input workbook
        workbook: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Build {
            workbook,
            config,
            name,
            login,
            account_file,
        } => build(
            &workbook,
            config.as_deref(),
            name.as_deref(),
            login.as_deref(),
            account_file.as_deref(),
        ),
        Commands::Sheets { workbook } => list_sheets(&workbook),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build(
    workbook: &Path,
    config_path: Option<&Path>,
    name: Option<&str>,
    login: Option<&str>,
    account_file: Option<&Path>,
) -> Result<()> {
    let config = match config_path {
        Some(path) => Config::load(path)?,
        None => {
            let mut config = Config::default();
            if let Some(dir) = workbook.parent() {
                config.resolve_sources(dir);
            }
            config
        }
    };
    tracing::debug!(?config, "Resolved configuration");
    let account = Account::resolve(name, login, account_file)
        .context("Pass --name and --login, or --account-file")?;

    let output = dashboard::build(workbook, &config, &account)
        .with_context(|| format!("Failed to build dashboard from '{}'", workbook.display()))?;

    println!("{}", output.display());
    Ok(())
}

fn list_sheets(workbook: &Path) -> Result<()> {
    let book = XlsmBook::open(workbook)
        .with_context(|| format!("Failed to open '{}'", workbook.display()))?;

    for (i, name) in book.sheet_names().enumerate() {
        println!("{}\t{}", i, name);
    }

    Ok(())
}
