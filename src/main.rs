//! CLI entry point for the route checker.
//!
//! Reads a JSON stop list from stdin or a file, validates every record and
//! prints the field error, line and stop category reports.

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use route_checker::{
    output::{append_record, print_pretty, render_categories, render_errors, render_lines, render_report, to_json},
    parser::{STDIN, parse_records, read_source},
    stats::RouteStats,
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "route_checker")]
#[command(about = "A tool to check bus route stop lists", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct InputArgs {
    /// Path to a JSON stop list, or `-` for stdin
    #[arg(value_name = "SOURCE", default_value = STDIN)]
    source: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the full report: field errors, lines and stop categories
    Report {
        #[command(flatten)]
        input: InputArgs,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Optional: CSV file to append a run summary to
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Print field error counts only
    Validate {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print stops per bus line only
    Lines {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print start, transfer, finish and on-demand stops only
    Stops {
        #[command(flatten)]
        input: InputArgs,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr, plus a JSON rolling log file when LOG_FILE_PATH is set
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive(LevelFilter::INFO.into()));

    let (json_layer, _file_guard) = match std::env::var("LOG_FILE_PATH") {
        Ok(log_file_path) => {
            let log_dir = Path::new(&log_file_path)
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let log_file_name = Path::new(&log_file_path)
                .file_name()
                .unwrap_or(OsStr::new("route_checker.log"));

            let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

            let layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(non_blocking_file)
                .with_filter(
                    EnvFilter::from_env("RUST_LOG_JSON").add_directive(LevelFilter::DEBUG.into()),
                );
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            input,
            format,
            output,
        } => {
            let stats = check(&input.source)?;
            print_pretty(&stats);

            match format {
                Format::Text => print!("{}", render_report(&stats)),
                Format::Json => println!("{}", to_json(&stats)?),
            }

            if let Some(path) = output {
                append_record(&path, &stats.summary())?;
                info!(path = %path, "Run summary appended");
            }
        }
        Commands::Validate { input } => {
            let stats = check(&input.source)?;
            print!("{}", render_errors(&stats.errors));
        }
        Commands::Lines { input } => {
            let stats = check(&input.source)?;
            print!("{}", render_lines(&stats.lines));
        }
        Commands::Stops { input } => {
            let stats = check(&input.source)?;
            print!("{}", render_categories(&stats.categories));
        }
    }

    Ok(())
}

/// Reads, parses and checks one stop list.
#[tracing::instrument]
fn check(source: &str) -> Result<RouteStats> {
    let bytes = read_source(source)?;
    let records = parse_records(&bytes)?;
    Ok(RouteStats::from_records(&records).with_source(source))
}
