use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use mp3_duration::report::{self, json, FileDuration, Summary};
use mp3_duration::{Config, Input, Scanner};

/// Argument that reads the stream from standard input
const STDIN_ARG: &str = "-";

#[derive(Parser)]
#[command(name = "mp3-duration")]
#[command(author, version, about = "Measure MP3 playback duration without decoding")]
struct Cli {
    /// MP3 files to measure ("-" reads standard input)
    #[arg(required = true)]
    files: Vec<String>,

    /// Estimate from the first frame's bitrate (fast, exact only for CBR files)
    #[arg(long)]
    cbr: bool,

    /// Write a report file (.json for JSON, anything else for CSV)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print a JSON report on stdout instead of the listing
    #[arg(long)]
    json: bool,

    /// Path to config file (default: ./mp3-duration.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Respect RUST_LOG if set, otherwise pick a level from the verbose count
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "mp3_duration=debug",
        _ => "mp3_duration=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Returns whether every input was measured
fn run(cli: &Cli) -> Result<bool> {
    let config = Config::load_or_default(cli.config.as_deref()).context("Failed to load config")?;

    if cli.no_color || !config.output.color {
        colored::control::set_override(false);
    }

    let scanner = Scanner::new().with_cbr_estimate(cli.cbr || config.scan.cbr_estimate);
    tracing::debug!(cbr_estimate = scanner.cbr_estimate, files = cli.files.len(), "starting");

    let results: Vec<FileDuration> = cli.files.iter().map(|f| measure(&scanner, f)).collect();

    if cli.json {
        json::write(&mut io::stdout().lock(), &results).context("Failed to write JSON")?;
    } else {
        for r in &results {
            print_result(r);
        }
        if results.len() > 1 {
            print_summary(&Summary::from_results(&results));
        }
    }

    if let Some(path) = &cli.output {
        report::generate(path, &results)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        tracing::info!(path = %path.display(), "report written");
    }

    Ok(results.iter().all(|r| r.error.is_none()))
}

fn read_input(arg: &str) -> mp3_duration::Result<Input> {
    if arg == STDIN_ARG {
        let mut bytes = Vec::new();
        io::stdin().lock().read_to_end(&mut bytes)?;
        Ok(Input::Bytes(bytes))
    } else {
        Ok(Input::from(arg))
    }
}

fn measure(scanner: &Scanner, arg: &str) -> FileDuration {
    match read_input(arg).and_then(|input| scanner.scan_input(&input)) {
        Ok(report) => FileDuration::from_report(arg, &report),
        Err(e) => {
            tracing::warn!(file = arg, error = %e, "could not measure");
            FileDuration::from_error(arg, &e)
        }
    }
}

/// `m:ss.mmm`, or `h:mm:ss.mmm` past an hour
fn format_duration(secs: f64) -> String {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    let ms = total_ms % 1000;
    let s = (total_ms / 1000) % 60;
    let m = (total_ms / 60_000) % 60;
    let h = total_ms / 3_600_000;

    if h > 0 {
        format!("{}:{:02}:{:02}.{:03}", h, m, s, ms)
    } else {
        format!("{}:{:02}.{:03}", m, s, ms)
    }
}

fn print_result(r: &FileDuration) {
    if let Some(error) = &r.error {
        println!("{:>12}  {}  {}", "ERROR".red().bold(), r.file_path, error.red());
        return;
    }

    let mut details = match (&r.version, &r.layer) {
        (Some(version), Some(layer)) => format!(
            "{} {}, {} kbps, {} Hz, {} frames",
            version, layer, r.bitrate, r.sample_rate, r.frame_count
        ),
        _ => "no audio frames".to_string(),
    };
    if r.is_vbr {
        details.push_str(", VBR");
    }
    if r.estimated {
        details.push_str(", estimated");
    }

    println!(
        "{:>12}  {}  {}",
        format_duration(r.duration_secs).green(),
        r.file_path,
        details.dimmed()
    );
}

fn print_summary(summary: &Summary) {
    let errors = if summary.error > 0 {
        format!("{} failed", summary.error).red().to_string()
    } else {
        "0 failed".to_string()
    };
    println!(
        "{:>12}  {} files, {} measured, {}",
        format_duration(summary.total_duration_secs).bold(),
        summary.total,
        summary.ok,
        errors
    );
}
