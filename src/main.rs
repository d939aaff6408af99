use clap::{crate_version, App, Arg, ArgMatches};
use codeview::build::{self, build_site, Report};
use codeview::config::Config;
use std::path::Path;
use std::process;
use std::str::FromStr;
use tracing::{debug, error, info};

/// Exit status when the run finished but something in the [`Report`] failed.
const EXIT_PARTIAL_FAILURE: i32 = 2;

/// Exit status for errors that stopped the run.
const EXIT_FATAL: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    Silent,
}

impl LogLevel {
    const NAMES: &'static [&'static str] = &["debug", "info", "warn", "error", "silent"];

    fn to_tracing_level(self) -> Option<tracing::Level> {
        match self {
            LogLevel::Debug => Some(tracing::Level::DEBUG),
            LogLevel::Info => Some(tracing::Level::INFO),
            LogLevel::Warn => Some(tracing::Level::WARN),
            LogLevel::Error => Some(tracing::Level::ERROR),
            LogLevel::Silent => None,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "silent" => Ok(LogLevel::Silent),
            _ => Err(format!("unknown log level `{}`", s)),
        }
    }
}

fn main() {
    let matches = App::new("codeview")
        .version(crate_version!())
        .about("Generate HTML files for code browsing.")
        .arg(
            Arg::with_name("SOURCE_DIR")
                .help("Source directory containing code files.")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("OUTPUT_DIR")
                .help("Output directory for HTML files.")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::with_name("zip")
                .long("zip")
                .help("Create a zip archive of the output directory."),
        )
        .arg(
            Arg::with_name("config")
                .long("config")
                .short("c")
                .takes_value(true)
                .value_name("FILE")
                .help("Project file (defaults to SOURCE_DIR/codeview.yaml if present)."),
        )
        .arg(
            Arg::with_name("log-level")
                .long("log-level")
                .short("l")
                .takes_value(true)
                .possible_values(LogLevel::NAMES)
                .default_value("info")
                .help("How much to log."),
        )
        .get_matches();

    setup_tracing(&matches);
    process::exit(run(&matches));
}

fn setup_tracing(matches: &ArgMatches) {
    let level = matches
        .value_of("log-level")
        .and_then(|s| s.parse::<LogLevel>().ok())
        .unwrap_or(LogLevel::Info);
    if let Some(level) = level.to_tracing_level() {
        tracing_subscriber::fmt()
            .with_max_level(level)
            .without_time()
            .compact()
            .init();
    }
}

// Returns the process exit status.
fn run(matches: &ArgMatches) -> i32 {
    // clap enforces both positional arguments.
    let source_directory = Path::new(matches.value_of_os("SOURCE_DIR").unwrap_or_default());
    let output_directory = Path::new(matches.value_of_os("OUTPUT_DIR").unwrap_or_default());

    match generate(
        matches.value_of_os("config").map(Path::new),
        source_directory,
        output_directory,
        matches.is_present("zip"),
    ) {
        Ok(report) => summarize(&report),
        Err(err) => fatal(&err),
    }
}

fn generate(
    project_file: Option<&Path>,
    source_directory: &Path,
    output_directory: &Path,
    zip: bool,
) -> build::Result<Report> {
    let mut config = Config::load(project_file, source_directory, output_directory)?;
    config.zip = zip;
    debug!("Loaded config: {:?}", config);
    build_site(&config)
}

fn summarize(report: &Report) -> i32 {
    info!(
        "Processing complete: {} pages, index at {}",
        report.pages,
        report.index.display()
    );
    if let Some(archive) = &report.archive {
        info!("Archive at {}", archive.display());
    }
    if report.is_success() {
        return 0;
    }

    error!("{} failure(s) during generation", report.failures.len());
    for failure in &report.failures {
        eprintln!("failed: {}", failure);
    }
    EXIT_PARTIAL_FAILURE
}

fn fatal(err: &dyn std::error::Error) -> i32 {
    let mut lines = error_chain(err).into_iter();
    if let Some(first) = lines.next() {
        eprintln!("error: {}", first);
    }
    for cause in lines {
        eprintln!("  caused by: {}", cause);
    }
    EXIT_FATAL
}

// The messages of `err` and its sources, outermost first. A cause whose
// message is already part of the previous one is left out.
fn error_chain(err: &dyn std::error::Error) -> Vec<String> {
    let mut lines = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        let repeated = lines.last().map_or(false, |last| last.contains(&message));
        if !repeated {
            lines.push(message);
        }
        source = cause.source();
    }
    lines
}
