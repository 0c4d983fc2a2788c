//! Ennea CLI - Command-line interface for the assessment engine
//!
//! Commands:
//! - score: Score one participant's answers against a question set
//! - team: Build a team balance report from recorded results
//! - validate: Validate a question set file
//! - doctor: Diagnose configuration and environment

use clap::{Parser, Subcommand, ValueEnum};
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use enneagram_core::responses;
use enneagram_core::{
    assess, team_report, BalanceReport, EngineConfig, EngineError, IndividualResult, QuestionSet,
    ENGINE_VERSION, PRODUCER_NAME,
};

/// Ennea - Nine-type assessment scoring and team reports
#[derive(Parser)]
#[command(name = "ennea")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Score personality assessments and summarize team composition", long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Engine configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one participant's answers
    Score {
        /// Question set file (JSON array of items)
        #[arg(short, long)]
        questions: PathBuf,

        /// Answers file, either {"q_<id>": value} or [{"item_id", "value"}] (use - for stdin)
        #[arg(short, long)]
        answers: PathBuf,

        /// Participant display name
        #[arg(short, long)]
        name: String,

        /// Team name
        #[arg(short, long)]
        team: Option<String>,

        /// Append the result as one NDJSON line to this file
        #[arg(long)]
        append: Option<PathBuf>,

        /// Pretty-print the result
        #[arg(long)]
        pretty: bool,
    },

    /// Build a balance report for one team
    Team {
        /// Recorded results (use - for stdin)
        #[arg(short, long)]
        results: PathBuf,

        /// Team name (matched case-insensitively)
        #[arg(short, long)]
        team: String,

        /// Results file format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        /// Report format
        #[arg(long, default_value = "json-pretty")]
        format: ReportFormat,
    },

    /// Validate a question set
    Validate {
        /// Question set file
        #[arg(short, long)]
        questions: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one result per line)
    Ndjson,
    /// JSON array of results
    Json,
}

#[derive(Clone, ValueEnum)]
enum ReportFormat {
    Json,
    JsonPretty,
    Text,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

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

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), EnneaCliError> {
    match cli.command {
        Commands::Score {
            questions,
            answers,
            name,
            team,
            append,
            pretty,
        } => {
            let config = load_config(cli.config.as_deref())?;
            cmd_score(
                &questions,
                &answers,
                &name,
                team.as_deref(),
                append.as_deref(),
                pretty,
                &config,
            )
        }

        Commands::Team {
            results,
            team,
            input_format,
            format,
        } => {
            let config = load_config(cli.config.as_deref())?;
            cmd_team(&results, &team, input_format, format, &config)
        }

        Commands::Validate { questions, json } => cmd_validate(&questions, json),

        Commands::Doctor { json } => cmd_doctor(cli.config.as_deref(), json),
    }
}

fn cmd_score(
    questions_path: &Path,
    answers_path: &Path,
    name: &str,
    team: Option<&str>,
    append: Option<&Path>,
    pretty: bool,
    config: &EngineConfig,
) -> Result<(), EnneaCliError> {
    let questions = QuestionSet::from_json(&fs::read_to_string(questions_path)?)?;
    let answers = responses::parse_json(&read_input(answers_path)?)?;
    debug!(answers = answers.len(), items = questions.len(), "Inputs loaded");

    let result = assess(name, team, &answers, &questions, config)?;
    info!(primary_type = %result.primary_type, wing = %result.wing, "Assessment scored");

    if let Some(path) = append {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", serde_json::to_string(&result)?)?;
    }

    if pretty {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", serde_json::to_string(&result)?);
    }
    Ok(())
}

fn cmd_team(
    results_path: &Path,
    team: &str,
    input_format: InputFormat,
    format: ReportFormat,
    config: &EngineConfig,
) -> Result<(), EnneaCliError> {
    let input = read_input(results_path)?;
    let results = match input_format {
        InputFormat::Ndjson => parse_ndjson(&input)?,
        InputFormat::Json => serde_json::from_str::<Vec<IndividualResult>>(&input)?,
    };

    if results.is_empty() {
        return Err(EnneaCliError::NoResults);
    }

    let report = team_report(&results, team, config)?;

    match format {
        ReportFormat::Json => println!("{}", serde_json::to_string(&report)?),
        ReportFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(&report)?),
        ReportFormat::Text => print_report(&report),
    }
    Ok(())
}

fn cmd_validate(questions_path: &Path, json: bool) -> Result<(), EnneaCliError> {
    let questions = QuestionSet::from_json(&fs::read_to_string(questions_path)?)?;

    let report = ValidationReport {
        total_items: questions.len(),
        reverse_items: questions.items().iter().filter(|i| i.reverse).count(),
        balanced: questions.is_balanced(),
        items_per_type: questions
            .items_per_type()
            .into_iter()
            .map(|(t, count)| TypeItemCount {
                r#type: t.id(),
                items: count,
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Question Set Report");
        println!("===================");
        println!("Total items:   {}", report.total_items);
        println!("Reverse items: {}", report.reverse_items);
        println!("Balanced:      {}", if report.balanced { "yes" } else { "no" });
        println!("\nItems per type:");
        for row in &report.items_per_type {
            println!("  Type {}: {}", row.r#type, row.items);
        }
    }

    if report.balanced {
        Ok(())
    } else {
        Err(EnneaCliError::Unbalanced)
    }
}

fn cmd_doctor(config_path: Option<&Path>, json: bool) -> Result<(), EnneaCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Engine version {}", ENGINE_VERSION),
    });

    match config_path {
        Some(path) if path.exists() => {
            let loaded = fs::read_to_string(path)
                .map_err(EnneaCliError::from)
                .and_then(|content| EngineConfig::from_json(&content).map_err(EnneaCliError::from));
            let check = match loaded {
                Ok(config) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: format!(
                        "Config valid (tie_break: {:?}, cache: {:?})",
                        config.tie_break, config.cache
                    ),
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Invalid config: {}", CliError::from(e).message),
                },
            };
            checks.push(check);
        }
        Some(_) => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Warning,
            message: "Config file does not exist".to_string(),
        }),
        None => checks.push(DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: "Using default configuration".to_string(),
        }),
    }

    let stdin_message = if atty::is(atty::Stream::Stdin) {
        "stdin is a TTY (interactive mode)"
    } else {
        "stdin is a pipe (answers and results can be streamed)"
    };
    checks.push(DoctorCheck {
        name: "stdin".to_string(),
        status: CheckStatus::Ok,
        message: stdin_message.to_string(),
    });

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Ennea Doctor Report");
        println!("===================");
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

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(EnneaCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn load_config(path: Option<&Path>) -> Result<EngineConfig, EnneaCliError> {
    match path {
        Some(path) => Ok(EngineConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(EngineConfig::default()),
    }
}

fn read_input(path: &Path) -> Result<String, EnneaCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn parse_ndjson(input: &str) -> Result<Vec<IndividualResult>, EnneaCliError> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|e| {
                EnneaCliError::ParseError(format!("Failed to parse result {}: {}", index + 1, e))
            })
        })
        .collect()
}

fn print_report(report: &BalanceReport) {
    println!("Team Report: {}", report.team);
    println!("============");
    println!("Members:       {}", report.total_members);
    println!("Balance score: {:.3}", report.balance_score);
    println!("Dominant type: {}", report.dominant_type);

    println!("\nDistribution:");
    for share in &report.shares {
        println!(
            "  Type {}: {} ({:.1}%)",
            share.primary_type, share.count, share.percentage
        );
    }

    let missing: Vec<String> = report
        .underrepresented_types
        .iter()
        .map(|t| t.to_string())
        .collect();
    if !missing.is_empty() {
        println!("\nUnrepresented types: {}", missing.join(", "));
    }

    if !report.insights.is_empty() {
        println!("\nInsights:");
        for insight in &report.insights {
            println!("  - {}", insight.message());
        }
    }
}

// Error types

#[derive(Debug)]
enum EnneaCliError {
    Io(io::Error),
    Engine(EngineError),
    Json(serde_json::Error),
    NoResults,
    Unbalanced,
    DoctorFailed,
    ParseError(String),
}

impl From<io::Error> for EnneaCliError {
    fn from(e: io::Error) -> Self {
        EnneaCliError::Io(e)
    }
}

impl From<EngineError> for EnneaCliError {
    fn from(e: EngineError) -> Self {
        EnneaCliError::Engine(e)
    }
}

impl From<serde_json::Error> for EnneaCliError {
    fn from(e: serde_json::Error) -> Self {
        EnneaCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<EnneaCliError> for CliError {
    fn from(e: EnneaCliError) -> Self {
        match e {
            EnneaCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            EnneaCliError::Engine(e) => engine_error(e),
            EnneaCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            EnneaCliError::NoResults => CliError {
                code: "NO_RESULTS".to_string(),
                message: "No results found in input".to_string(),
                hint: Some("Record results with 'ennea score --append'".to_string()),
            },
            EnneaCliError::Unbalanced => CliError {
                code: "UNBALANCED_QUESTION_SET".to_string(),
                message: "Types are measured by different numbers of items".to_string(),
                hint: Some("Summed scores are only comparable with equal item counts".to_string()),
            },
            EnneaCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            EnneaCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Each line must be one JSON result".to_string()),
            },
        }
    }
}

fn engine_error(e: EngineError) -> CliError {
    let (code, hint) = match &e {
        EngineError::UnknownItem { .. } => (
            "UNKNOWN_ITEM",
            "Answers must use ids from the same question set",
        ),
        EngineError::IncompleteResponse { .. } => (
            "INCOMPLETE_RESPONSE",
            "Answer every question before scoring",
        ),
        EngineError::EmptyTeam(_) => ("EMPTY_TEAM", "No data yet for this team"),
        EngineError::InvalidResponseValue { .. } => (
            "INVALID_VALUE",
            "Answers must be between 1 and 5",
        ),
        EngineError::DuplicateResponse { .. } => (
            "DUPLICATE_RESPONSE",
            "Answer each question once",
        ),
        EngineError::InvalidType(_) => ("INVALID_TYPE", "Types are numbered 1 to 9"),
        EngineError::InvalidQuestionSet(_) => (
            "INVALID_QUESTION_SET",
            "Run 'ennea validate' for details",
        ),
        EngineError::InvalidAnswerKey(_) => ("INVALID_ANSWER_KEY", "Answer keys look like q_<id>"),
        EngineError::InvalidDisplayName(_) => ("INVALID_NAME", "Provide a non-empty name"),
        EngineError::InvalidConfig(_) => ("INVALID_CONFIG", "Run 'ennea doctor --config <file>'"),
        EngineError::Json(_) => ("JSON_ERROR", "Check JSON syntax"),
    };

    CliError {
        code: code.to_string(),
        message: e.to_string(),
        hint: Some(hint.to_string()),
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_items: usize,
    reverse_items: usize,
    balanced: bool,
    items_per_type: Vec<TypeItemCount>,
}

#[derive(serde::Serialize)]
struct TypeItemCount {
    r#type: u8,
    items: usize,
}

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
