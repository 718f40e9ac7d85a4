//! Nearest-neighbor subsequence search under DTW
//!
//! Scans a data file for the window closest to a query under z-normalized,
//! band-constrained DTW.
//!
//! Usage:
//!   dtw_search <DATA> <QUERY> <M> <R> [OPTIONS]
//!
//! `R <= 1` is a fraction of `M`, larger values are a radius in samples.
//! Files hold whitespace-separated numbers, `--channels` values per sample.
//!
//! Example:
//!   dtw_search data.txt query.txt 128 0.05 --format json

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dtw_search::{
    read_query, ReaderSource, SearchConfig, SearchEngine, SearchError, SearchReport, WarpingWindow,
    DEFAULT_CHUNK_CAPACITY,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "dtw_search")]
#[command(version, about = "Find the subsequence of a stream nearest to a query under DTW")]
struct Cli {
    /// Data file
    data: PathBuf,

    /// Query file (only the first M samples are used)
    query: PathBuf,

    /// Query length
    m: usize,

    /// Warping window: fraction of M if <= 1, otherwise a radius in samples
    r: f64,

    /// Number of interleaved channels per sample
    #[arg(short, long, default_value_t = 1)]
    channels: usize,

    /// Samples held in memory per chunk
    #[arg(long, default_value_t = DEFAULT_CHUNK_CAPACITY)]
    chunk_capacity: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<SearchReport, SearchError> {
    let config = SearchConfig::new(cli.m, WarpingWindow::from_raw(cli.r)?)
        .with_channels(cli.channels)
        .with_chunk_capacity(cli.chunk_capacity);
    config.validate()?;

    let query = read_query(BufReader::new(File::open(&cli.query)?), cli.m, cli.channels)?;
    let query: Vec<&[f64]> = query.iter().map(Vec::as_slice).collect();
    let engine = SearchEngine::new(config, &query)?;

    let data = ReaderSource::new(BufReader::new(File::open(&cli.data)?), cli.channels)?;
    engine.search(data)
}

fn print_text(report: &SearchReport, elapsed: f64) {
    match &report.best {
        Some(best) => {
            println!("Location : {}", best.location);
            for (c, d) in best.distances.iter().enumerate() {
                println!("Distance({}) : {}", c + 1, d);
            }
        }
        None => println!("Location : none (stream shorter than the query or entirely flat)"),
    }
    println!("Data Scanned : {}", report.samples_scanned);
    println!("Total Execution Time : {elapsed:.3} sec");
    println!();

    let s = &report.stats;
    println!("Pruned by LB_Kim    : {:6.4}%", 100.0 * s.kim_fraction());
    println!("Pruned by LB_Keogh  : {:6.4}%", 100.0 * s.keogh_query_fraction());
    println!("Pruned by LB_Keogh2 : {:6.4}%", 100.0 * s.keogh_data_fraction());
    println!("Flat windows        : {:6.4}%", 100.0 * s.flat_fraction());
    println!("DTW Calculation     : {:6.4}%", 100.0 * s.dtw_fraction());
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let start = Instant::now();
    let report = match run(&cli) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let elapsed = start.elapsed().as_secs_f64();
    info!(elapsed, "done");

    match cli.format {
        Format::Text => print_text(&report, elapsed),
        Format::Json => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        },
    }
    ExitCode::SUCCESS
}
