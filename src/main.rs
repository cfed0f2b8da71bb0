use anyhow::Result;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use wikisplit::config::{
    ExtractConfig, DEFAULT_INDEX_FILE, DEFAULT_INPUT_FILE, DEFAULT_OUTPUT_DIR,
};
use wikisplit::filter::ExclusionRules;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "wikisplit")]
#[command(about = "Write every article of a Wikipedia XML dump to its own file")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to the Wikipedia dump (.xml or .xml.bz2)
    #[arg(long, default_value = DEFAULT_INPUT_FILE)]
    infile: PathBuf,

    /// Article list output file
    #[arg(long, default_value = DEFAULT_INDEX_FILE)]
    indexfile: PathBuf,

    /// Don't write the article list
    #[arg(long)]
    no_index: bool,

    /// Directory receiving one file per article
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Extra title prefix to skip, on top of the built-in namespaces (repeatable)
    #[arg(long = "exclude-prefix")]
    exclude_prefixes: Vec<String>,

    /// Limit number of pages to process (for testing)
    #[arg(long)]
    limit: Option<u64>,

    /// Dry run - don't write output files
    #[arg(long)]
    dry_run: bool,
}

/// Failures here are not fatal: every article write will fail and be counted.
fn prepare_dir(dir: &Path) {
    if dir.as_os_str().is_empty() {
        return;
    }
    if let Err(e) = fs::create_dir_all(dir) {
        warn!(error = %e, dir = %dir.display(), "Failed to create directory");
    }
}

fn run(cli: Cli) -> Result<()> {
    let rules = ExclusionRules::with_extra(cli.exclude_prefixes.as_slice())?;

    let config = ExtractConfig {
        input_path: cli.infile,
        output_dir: cli.output_dir,
        index_path: (!cli.no_index).then_some(cli.indexfile),
        limit: cli.limit,
        dry_run: cli.dry_run,
    };

    if !config.dry_run {
        prepare_dir(&config.output_dir);
        if let Some(parent) = config.index_path.as_deref().and_then(Path::parent) {
            prepare_dir(parent);
        }
    }

    let start = Instant::now();
    let summary = wikisplit::extract::run_extraction(&config, &rules)?;
    info!(
        duration_secs = start.elapsed().as_secs_f64(),
        "Extraction complete"
    );

    println!("Total articles: {}", summary.articles());

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    match run(cli) {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
