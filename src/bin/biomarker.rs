//! Biomarker CLI - command-line interface for the biomarker progress engine
//!
//! Commands:
//! - evaluate: Evaluate baseline and retest measurements into a report
//! - classify: Classify a single value
//! - compare: Compare a baseline and retest value
//! - registry: Print the biomarker registry
//! - doctor: Diagnose configuration

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use biomarker_progress::encoder::ReportEncoder;
use biomarker_progress::{
    classify, compare, BiomarkerRegistry, BiomarkerResult, EngineError, EvaluationReport,
    Evaluator, MeasurementSet, MeasurementValue, Side, ENGINE_VERSION, PRODUCER_NAME,
};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Biomarker - evaluate lab biomarker progress between a baseline and a retest
#[derive(Parser)]
#[command(name = "biomarker")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Evaluate lab biomarker progress", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate baseline and retest measurements
    Evaluate {
        /// Combined input file with "baseline" and "retest" objects (use - for stdin)
        #[arg(short, long, conflicts_with_all = ["baseline", "retest"])]
        input: Option<PathBuf>,

        /// Baseline measurements file (JSON object of name → value)
        #[arg(long, requires = "retest")]
        baseline: Option<PathBuf>,

        /// Retest measurements file (JSON object of name → value)
        #[arg(long, requires = "baseline")]
        retest: Option<PathBuf>,

        /// Custom registry file
        #[arg(long)]
        registry: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Classify a single value against its optimal range
    Classify {
        /// Biomarker name
        #[arg(short, long)]
        name: String,

        /// Measured value
        #[arg(long, allow_hyphen_values = true)]
        value: String,

        /// Custom registry file
        #[arg(long)]
        registry: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare a baseline and retest value
    Compare {
        /// Biomarker name
        #[arg(short, long)]
        name: String,

        /// Baseline value
        #[arg(long, allow_hyphen_values = true)]
        baseline: String,

        /// Retest value
        #[arg(long, allow_hyphen_values = true)]
        retest: String,

        /// Custom registry file
        #[arg(long)]
        registry: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the biomarker registry
    Registry {
        /// Custom registry file
        #[arg(long)]
        registry: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration
    Doctor {
        /// Check a custom registry file
        #[arg(long)]
        registry: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable table and insights
    Text,
    /// Report envelope as compact JSON
    Json,
    /// Report envelope as pretty-printed JSON
    JsonPretty,
}

#[derive(serde::Deserialize)]
struct CombinedInput {
    baseline: MeasurementSet,
    retest: MeasurementSet,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string()));
            ExitCode::FAILURE
        }
    }
}

fn init_logger(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("biomarker_progress=debug,biomarker=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

fn run(cli: Cli) -> Result<(), BiomarkerCliError> {
    match cli.command {
        Commands::Evaluate {
            input,
            baseline,
            retest,
            registry,
            format,
        } => {
            let registry = load_registry(registry.as_deref())?;
            let (baseline, retest) = read_measurements(input, baseline, retest)?;
            cmd_evaluate(&registry, &baseline, &retest, format)
        }

        Commands::Classify {
            name,
            value,
            registry,
            json,
        } => {
            let registry = load_registry(registry.as_deref())?;
            cmd_classify(&registry, &name, &value, json)
        }

        Commands::Compare {
            name,
            baseline,
            retest,
            registry,
            json,
        } => {
            let registry = load_registry(registry.as_deref())?;
            cmd_compare(&registry, &name, &baseline, &retest, json)
        }

        Commands::Registry { registry, json } => {
            let registry = load_registry(registry.as_deref())?;
            cmd_registry(&registry, json)
        }

        Commands::Doctor { registry, json } => cmd_doctor(registry.as_deref(), json),
    }
}

fn load_registry(path: Option<&Path>) -> Result<BiomarkerRegistry, BiomarkerCliError> {
    match path {
        Some(path) => {
            let registry = BiomarkerRegistry::from_file(path)?;
            info!(path = %path.display(), biomarkers = registry.len(), "loaded custom registry");
            Ok(registry)
        }
        None => Ok(BiomarkerRegistry::standard().clone()),
    }
}

fn read_input(path: &Path) -> Result<String, BiomarkerCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn read_measurements(
    input: Option<PathBuf>,
    baseline: Option<PathBuf>,
    retest: Option<PathBuf>,
) -> Result<(MeasurementSet, MeasurementSet), BiomarkerCliError> {
    match (input, baseline, retest) {
        (Some(input), _, _) => {
            let combined: CombinedInput = serde_json::from_str(&read_input(&input)?)?;
            Ok((combined.baseline, combined.retest))
        }
        (None, Some(baseline), Some(retest)) => Ok((
            MeasurementSet::from_json(&read_input(&baseline)?)?,
            MeasurementSet::from_json(&read_input(&retest)?)?,
        )),
        _ => Err(BiomarkerCliError::NoInput),
    }
}

fn parse_cli_value(name: &str, side: Side, raw: &str) -> Result<f64, BiomarkerCliError> {
    Ok(MeasurementValue::parse(raw).require(name, side)?)
}

fn cmd_evaluate(
    registry: &BiomarkerRegistry,
    baseline: &MeasurementSet,
    retest: &MeasurementSet,
    format: OutputFormat,
) -> Result<(), BiomarkerCliError> {
    let report = Evaluator::new(registry).evaluate(baseline, retest)?;
    debug!(score = report.score, "report ready");

    match format {
        OutputFormat::Text => print!("{}", format_report(&report)),
        OutputFormat::Json => {
            let payload = ReportEncoder::new().encode(&report);
            println!("{}", serde_json::to_string(&payload)?);
        }
        OutputFormat::JsonPretty => {
            println!("{}", ReportEncoder::new().encode_to_json(&report)?);
        }
    }

    Ok(())
}

fn cmd_classify(
    registry: &BiomarkerRegistry,
    name: &str,
    raw: &str,
    json: bool,
) -> Result<(), BiomarkerCliError> {
    let def = registry.definition_for(name)?;
    let value = parse_cli_value(name, Side::Retest, raw)?;
    let result = classify(def, Some(value));

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "{}: {} {} -> {} (optimal {}-{} {})",
            def.name, value, def.unit, result.label, def.optimal_low, def.optimal_high, def.unit
        );
    }
    Ok(())
}

fn cmd_compare(
    registry: &BiomarkerRegistry,
    name: &str,
    baseline: &str,
    retest: &str,
    json: bool,
) -> Result<(), BiomarkerCliError> {
    let def = registry.definition_for(name)?;
    let base = parse_cli_value(name, Side::Baseline, baseline)?;
    let retest = parse_cli_value(name, Side::Retest, retest)?;
    let result = compare(def, Some(base), Some(retest));

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let pct = result.percent_change.unwrap_or(0.0) * 100.0;
        println!(
            "{}: {} -> {} {} ({:.1}% of optimal range): {}",
            def.name, base, retest, def.unit, pct, result.status
        );
    }
    Ok(())
}

fn cmd_registry(registry: &BiomarkerRegistry, json: bool) -> Result<(), BiomarkerCliError> {
    if json {
        println!("{}", registry.to_json()?);
        return Ok(());
    }

    println!("{:<22} {:<8} {:<18} Better", "Biomarker", "Unit", "Optimal");
    for def in registry.definitions() {
        println!(
            "{:<22} {:<8} {:<18} {}",
            def.name,
            def.unit,
            format!("{}-{}", def.optimal_low, def.optimal_high),
            def.directionality.as_str()
        );
    }
    Ok(())
}

fn cmd_doctor(registry: Option<&Path>, json: bool) -> Result<(), BiomarkerCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Engine version {}", ENGINE_VERSION),
    });

    checks.push(DoctorCheck {
        name: "standard_registry".to_string(),
        status: CheckStatus::Ok,
        message: format!(
            "{} biomarkers built in",
            BiomarkerRegistry::standard().len()
        ),
    });

    if let Some(path) = registry {
        let check = if !path.exists() {
            DoctorCheck {
                name: "registry".to_string(),
                status: CheckStatus::Warning,
                message: "Registry file does not exist".to_string(),
            }
        } else {
            match BiomarkerRegistry::from_file(path) {
                Ok(custom) => DoctorCheck {
                    name: "registry".to_string(),
                    status: CheckStatus::Ok,
                    message: format!("Registry file valid ({} biomarkers)", custom.len()),
                },
                Err(e) => DoctorCheck {
                    name: "registry".to_string(),
                    status: CheckStatus::Error,
                    message: e.to_string(),
                },
            }
        };
        checks.push(check);
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (pass --input or --baseline/--retest files)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (--input - ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Biomarker Doctor Report");
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

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(BiomarkerCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn format_value(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{} {}", v, unit),
        None => String::new(),
    }
}

fn format_row(row: &BiomarkerResult) -> String {
    format!(
        "{:<22} {:<16} {:<16} {:<15} {}",
        row.name,
        format_value(row.baseline, &row.unit),
        format_value(row.retest, &row.unit),
        row.classification.label,
        row.progress.status
    )
}

fn format_report(report: &EvaluationReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<22} {:<16} {:<16} {:<15} {}\n",
        "Biomarker", "Baseline", "Retest", "Classification", "Progress"
    ));
    for row in &report.results {
        out.push_str(&format_row(row));
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&report.score_text());
    out.push('\n');
    let significant: Vec<&str> = report.significant_changes().map(|r| r.name.as_str()).collect();
    if !significant.is_empty() {
        out.push_str(&format!("Significant changes: {}\n", significant.join(", ")));
    }
    for line in &report.insights {
        out.push_str(&format!("  - {}\n", line));
    }
    out
}

// Error types

#[derive(Debug)]
enum BiomarkerCliError {
    Io(io::Error),
    Engine(EngineError),
    Json(serde_json::Error),
    NoInput,
    DoctorFailed,
}

impl From<io::Error> for BiomarkerCliError {
    fn from(e: io::Error) -> Self {
        BiomarkerCliError::Io(e)
    }
}

impl From<EngineError> for BiomarkerCliError {
    fn from(e: EngineError) -> Self {
        BiomarkerCliError::Engine(e)
    }
}

impl From<serde_json::Error> for BiomarkerCliError {
    fn from(e: serde_json::Error) -> Self {
        BiomarkerCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    missing: Vec<biomarker_progress::MissingField>,
}

impl From<BiomarkerCliError> for CliError {
    fn from(e: BiomarkerCliError) -> Self {
        match e {
            BiomarkerCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
                missing: Vec::new(),
            },
            BiomarkerCliError::Engine(e) => {
                let (code, hint) = match &e {
                    EngineError::UnknownBiomarker(_) => {
                        ("UNKNOWN_BIOMARKER", "Run 'biomarker registry' for valid names")
                    }
                    EngineError::IncompleteInput { .. } => {
                        ("INCOMPLETE_INPUT", "Provide a numeric baseline and retest value for every biomarker")
                    }
                    EngineError::NonNumericInput { .. } => ("NON_NUMERIC_INPUT", "Values must be plain numbers"),
                    EngineError::InvalidDefinition(_) | EngineError::ConfigError(_) => {
                        ("REGISTRY_ERROR", "Run 'biomarker doctor --registry <file>' for details")
                    }
                    EngineError::JsonError(_) => ("JSON_ERROR", "Check JSON syntax"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                    missing: e.missing_fields().to_vec(),
                }
            }
            BiomarkerCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Input must be {\"baseline\": {...}, \"retest\": {...}}".to_string()),
                missing: Vec::new(),
            },
            BiomarkerCliError::NoInput => CliError {
                code: "NO_INPUT".to_string(),
                message: "No measurements provided".to_string(),
                hint: Some("Pass --input <file> or both --baseline and --retest".to_string()),
                missing: Vec::new(),
            },
            BiomarkerCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
                missing: Vec::new(),
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
