use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;
use partslist_merge::config::Settings;
use partslist_merge::io::excel_read::FolderStore;
use partslist_merge::run::{self, RunReport};
use partslist_merge::{MergeError, Result};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "PARTSLIST_LOG";

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging(cli.verbose) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }

    let report = execute(&cli);
    match report.to_json() {
        Ok(json) => println!("{json}"),
        Err(error) => {
            eprintln!("error: {error}");
            std::process::exit(1);
        }
    }
    if !report.success {
        std::process::exit(1);
    }
}

fn execute(cli: &Cli) -> RunReport {
    let prepared = load_settings(cli).and_then(|settings| {
        let store = FolderStore::open(&cli.root)?;
        Ok((settings, store))
    });
    let (settings, store) = match prepared {
        Ok(prepared) => prepared,
        Err(error) => return RunReport::failed(&error),
    };

    let output_dir = cli
        .output
        .clone()
        .or_else(|| settings.output_folder_id.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    let now = Utc::now().with_timezone(&settings.time_zone());

    run::run(&store, &settings, &output_dir, now)
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    match &cli.config {
        Some(path) => Settings::load(path),
        None => Ok(Settings::default()),
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| MergeError::Logging(error.to_string()))
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Merge per-project parts lists into one deduplicated workbook."
)]
struct Cli {
    /// Folder whose parts-list subfolders are merged.
    #[arg(long)]
    root: PathBuf,

    /// Settings file (TOML). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for the merged workbook. Falls back to OUTPUT_FOLDER_ID, then the current directory.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Log at debug level regardless of PARTSLIST_LOG.
    #[arg(long)]
    verbose: bool,
}
