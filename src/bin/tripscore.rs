//! tripscore CLI - Command-line interface for trip safety scoring
//!
//! Commands:
//! - score: Score a trip file and print the report
//! - validate: Run only the validity gate
//! - config: Print the default scoring configuration
//! - doctor: Check configuration and environment

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;
use trip_safety::adapter::parse_trip;
use trip_safety::{ScoreError, ScoringConfig, SafetyScorer, ENGINE_VERSION, PRODUCER_NAME};

/// tripscore - Deterministic driver-safety scoring for phone telemetry
#[derive(Parser)]
#[command(name = "tripscore")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Score driving trips from location and inertial telemetry", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a trip and print the report
    Score {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Scoring configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Reject trips whose samples are out of chronological order
        #[arg(long)]
        strict: bool,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Run the validity gate without scoring
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Scoring configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output the verdict as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the default scoring configuration
    Config,

    /// Diagnose configuration and environment
    Doctor {
        /// Configuration file to check
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON report
    Json,
    /// Pretty-printed JSON report
    JsonPretty,
    /// One-line summary and recommendation
    Summary,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), TripCliError> {
    match cli.command {
        Commands::Score {
            input,
            output,
            config,
            strict,
            output_format,
        } => cmd_score(&input, &output, config.as_deref(), strict, output_format),

        Commands::Validate {
            input,
            config,
            json,
        } => cmd_validate(&input, config.as_deref(), json),

        Commands::Config => {
            println!("{}", ScoringConfig::default().to_json()?);
            Ok(())
        }

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn cmd_score(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    strict: bool,
    output_format: OutputFormat,
) -> Result<(), TripCliError> {
    let mut config = load_config(config)?;
    if strict {
        config.require_chronological_order = true;
    }
    let scorer = SafetyScorer::with_config(config)?;

    let trip = parse_trip(&read_input(input)?)?;
    let report = scorer.report(&trip)?;

    let output_data = match output_format {
        OutputFormat::Json => serde_json::to_string(&report)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&report)?,
        OutputFormat::Summary => format!(
            "{}\n{}",
            report.summary.summary, report.summary.recommendation
        ),
    };

    if output.to_string_lossy() == "-" {
        println!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_validate(input: &Path, config: Option<&Path>, json: bool) -> Result<(), TripCliError> {
    let scorer = SafetyScorer::with_config(load_config(config)?)?;
    let trip = parse_trip(&read_input(input)?)?;
    let report = scorer.validate(&trip)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let metrics = &report.trip_metrics;
        println!("Trip Validation Report");
        println!("======================");
        println!("Distance:     {:.2} km", metrics.distance_km);
        println!("Duration:     {:.1} min", metrics.duration_minutes);
        println!("Avg speed:    {:.1} km/h", metrics.avg_speed_kmh);
        println!("Moving time:  {:.1} min", metrics.moving_time_minutes);

        if report.validation.is_valid {
            println!("\nTrip is eligible for scoring.");
        } else {
            println!("\nTrip is not eligible:");
            for issue in &report.validation.errors {
                println!("  [{}] {}", issue.code, issue.message);
            }
        }
    }

    if report.validation.is_valid {
        Ok(())
    } else {
        Err(TripCliError::TripInvalid(report.validation.errors.len()))
    }
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), TripCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(match config {
        None => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: "Using default scoring configuration".to_string(),
        },
        Some(path) => match load_config(Some(path)) {
            Ok(_) => DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Ok,
                message: format!("{} is a valid configuration", path.display()),
            },
            Err(e) => DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Error,
                message: CliError::from(e).message,
            },
        },
    });

    checks.push(if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Warning,
            message: "stdin is a TTY; pass --input <file> or pipe a trip in".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (ready for --input -)".to_string(),
        }
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("tripscore Doctor Report");
        println!("=======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    if report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error))
    {
        Err(TripCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(input: &Path) -> Result<String, TripCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn load_config(path: Option<&Path>) -> Result<ScoringConfig, TripCliError> {
    match path {
        Some(path) => Ok(ScoringConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(ScoringConfig::default()),
    }
}

// Error types

#[derive(Debug)]
enum TripCliError {
    Io(io::Error),
    Score(ScoreError),
    Json(serde_json::Error),
    TripInvalid(usize),
    DoctorFailed,
}

impl From<io::Error> for TripCliError {
    fn from(e: io::Error) -> Self {
        TripCliError::Io(e)
    }
}

impl From<ScoreError> for TripCliError {
    fn from(e: ScoreError) -> Self {
        TripCliError::Score(e)
    }
}

impl From<serde_json::Error> for TripCliError {
    fn from(e: serde_json::Error) -> Self {
        TripCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<TripCliError> for CliError {
    fn from(e: TripCliError) -> Self {
        match e {
            TripCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            TripCliError::Score(e) => {
                let (code, hint) = match &e {
                    ScoreError::ParseError(_) | ScoreError::JsonError(_) => (
                        "PARSE_ERROR",
                        "Input must be a JSON array of chunks or {\"chunks\": [...]}",
                    ),
                    ScoreError::InvalidConfig(_) => (
                        "CONFIG_ERROR",
                        "Run 'tripscore config' to see valid defaults",
                    ),
                    ScoreError::UnorderedSamples { .. } => (
                        "ORDER_ERROR",
                        "Sort samples by timestamp or drop --strict",
                    ),
                    ScoreError::StreamMismatch(_) => (
                        "STREAM_ERROR",
                        "Accelerometer and gyroscope readings must pair up",
                    ),
                    ScoreError::EncodingError(_) => {
                        ("ENCODING_ERROR", "Report could not be serialized")
                    }
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            TripCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            TripCliError::TripInvalid(count) => CliError {
                code: "TRIP_INVALID".to_string(),
                message: format!("Trip failed {} validity check(s)", count),
                hint: Some("Run 'tripscore validate' without --json for details".to_string()),
            },
            TripCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
