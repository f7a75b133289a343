use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sacct_reconcile::cache;
use sacct_reconcile::collect::{self, SacctQuery};
use sacct_reconcile::config::Config;
use sacct_reconcile::display::DisplayManager;
use sacct_reconcile::logging;
use sacct_reconcile::projector::{self, TableLayout};
use sacct_reconcile::reconciler::reconcile_with_stats;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "sacct-reconcile")]
#[command(about = "Reconcile Slurm sacct job/step exports into filtered, sorted job reports")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to sacct-reconcile.toml lookup)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Query sacct week by week and append the export to the cache file
    Collect {
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start: String,
        /// End date, inclusive (YYYY-MM-DD)
        #[arg(long)]
        end: String,
        /// Cache file to append to
        #[arg(long)]
        cache: Option<PathBuf>,
        /// Days per sacct query
        #[arg(long)]
        window_days: Option<u32>,
        /// Also request ExitCode and User
        #[arg(long)]
        extended: bool,
    },
    /// Reconcile the cache file and write a JSON or CSV report
    Report {
        /// Export to read (defaults to the cache file)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Report destination, "-" for stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Output format (defaults to the output file extension, else json)
        #[arg(long, value_enum)]
        format: Option<Format>,
        /// Substring the job comment must contain
        #[arg(long, conflicts_with = "no_require")]
        require: Option<String>,
        /// Keep jobs regardless of their comment
        #[arg(long)]
        no_require: bool,
        /// Minimum peak memory in kilobytes
        #[arg(long)]
        min_memory: Option<u64>,
        /// Use the extended table columns (JobID, ExitCode, User)
        #[arg(long)]
        extended: bool,
        /// List the N heaviest jobs after writing
        #[arg(long)]
        top: Option<usize>,
        /// Print the summary and errors as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete the cache file after confirmation
    Clean {
        /// Cache file to remove
        #[arg(long)]
        cache: Option<PathBuf>,
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let json_errors = matches!(cli.command, Commands::Report { json: true, .. });

    if let Err(e) = run(cli) {
        handle_error(e, json_errors);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => {
            let mut config = Config::load_from_file(path)?;
            config.apply_env_overrides()?;
            config.validate()?;
            config
        }
        None => Config::load()?,
    };
    let _log_guard = logging::init_logging(&config.logging);

    match cli.command {
        Commands::Collect {
            start,
            end,
            cache: cache_path,
            window_days,
            extended,
        } => {
            let start = collect::parse_date(&start)?;
            let end = collect::parse_date(&end)?;
            let cache_path = cache_path.unwrap_or_else(|| config.collect.cache_path.clone());
            let window_days = window_days.unwrap_or(config.collect.window_days);

            if cache_path.exists() {
                warn!(path = %cache_path.display(), "Cache file exists, appending to it");
            }

            let windows = collect::date_windows(start, end, window_days)?;
            let query = SacctQuery::new(
                config.collect.sacct_program.clone(),
                extended || config.output.extended,
            );
            let bytes = collect::collect(&query, &windows, &cache_path)?;
            info!(windows = windows.len(), bytes, "Collection complete");
            eprintln!("Collected {} windows into {}", windows.len(), cache_path.display());
            Ok(())
        }
        Commands::Report {
            input,
            output,
            format,
            require,
            no_require,
            min_memory,
            extended,
            top,
            json,
        } => {
            let input = input.unwrap_or_else(|| config.collect.cache_path.clone());
            let output = output.unwrap_or_else(|| config.output.path.clone());
            let format = format.unwrap_or_else(|| infer_format(&output));
            let layout = if extended || config.output.extended {
                TableLayout::Extended
            } else {
                TableLayout::Standard
            };

            let mut filters = config.filters();
            if let Some(require) = require {
                filters.required_substring = Some(require);
            }
            if no_require {
                filters.required_substring = None;
            }
            if let Some(min_memory) = min_memory {
                filters.min_memory = Some(min_memory);
            }
            let classifier = config.classifier()?;

            let export = fs::read_to_string(&input)
                .with_context(|| format!("Failed to read export: {}", input.display()))?;
            let (jobs, stats) = reconcile_with_stats(export.lines(), &filters, &classifier)
                .with_context(|| format!("Malformed export: {}", input.display()))?;
            let records = projector::sort(jobs);

            write_report(&records, format, layout, &output)?;

            if output == Path::new("-") {
                return Ok(());
            }
            if json {
                let summary = serde_json::json!({
                    "output": output.display().to_string(),
                    "jobs": records.len(),
                    "totalMemory": sacct_reconcile::total_memory(&records),
                    "skipped": stats.skipped_lines,
                    "belowThreshold": stats.below_threshold,
                    "folded": stats.folded,
                });
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                DisplayManager::new().print_summary(&records, &output, top);
            }
            Ok(())
        }
        Commands::Clean { cache: cache_path, yes } => {
            let cache_path = cache_path.unwrap_or_else(|| config.collect.cache_path.clone());
            let removed = if yes {
                cache::remove_cache(&cache_path, |_| Ok(true))?
            } else {
                cache::remove_cache(&cache_path, cache::stdin_confirm)?
            };
            if removed {
                eprintln!("*** Removed {} ***", cache_path.display());
            }
            Ok(())
        }
    }
}

fn infer_format(output: &Path) -> Format {
    match output.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => Format::Csv,
        _ => Format::Json,
    }
}

fn write_report(
    records: &[sacct_reconcile::JobRecord],
    format: Format,
    layout: TableLayout,
    output: &Path,
) -> Result<()> {
    let writer: Box<dyn Write> = if output == Path::new("-") {
        Box::new(io::stdout().lock())
    } else {
        let file = File::create(output)
            .with_context(|| format!("Failed to create report: {}", output.display()))?;
        Box::new(BufWriter::new(file))
    };

    match format {
        Format::Json => projector::render_document(records, writer),
        Format::Csv => projector::render_table(records, layout, writer),
    }
    .with_context(|| format!("Failed to write report: {}", output.display()))
}

fn handle_error(e: anyhow::Error, json: bool) -> ! {
    if json {
        println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
    } else {
        eprintln!("Error: {:#}", e);
    }
    process::exit(1);
}
