//! Fertility CLI - Command-line interface for fertility-insight
//!
//! Commands:
//! - predict: Estimate the fertile window (JSON)
//! - report: Full report with advisories and health scores
//! - calendar: Month grid with the fertile window marked
//! - insights: Free-form insights from the text generator
//! - chat: Interactive assistant on stdin
//! - doctor: Diagnose configuration and input files

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use fertility_insight::calendar::CalendarMonth;
use fertility_insight::chat::QuickQuestion;
use fertility_insight::config::{Availability, InsightConfig};
use fertility_insight::estimator::Estimator;
use fertility_insight::pipeline::{FertilityProcessor, FertilityReport};
use fertility_insight::types::CycleProfile;
use fertility_insight::wearable::{WearableFormat, WearableParser, WearableSeries};
use fertility_insight::{InsightError, INSIGHT_VERSION, PRODUCER_NAME};

/// Fertility - fertile window estimation and cycle guidance
#[derive(Parser)]
#[command(name = "fertility")]
#[command(version = INSIGHT_VERSION)]
#[command(about = "Estimate fertile windows from cycle profiles and wearable data", long_about = None)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the fertile window
    Predict {
        /// Profile JSON file (use - for stdin)
        #[arg(short, long)]
        profile: PathBuf,

        /// Wearable file (.csv, .json or .ndjson)
        #[arg(short, long)]
        wearable: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "json")]
        format: OutputFormat,
    },

    /// Full report: estimate, advisories, risk factors and health scores
    Report {
        /// Profile JSON file (use - for stdin)
        #[arg(short, long)]
        profile: PathBuf,

        /// Wearable file (.csv, .json or .ndjson)
        #[arg(short, long)]
        wearable: Option<PathBuf>,

        /// Output format
        #[arg(long, default_value = "json")]
        format: OutputFormat,
    },

    /// Print the month calendar with the fertile window marked
    Calendar {
        /// Profile JSON file (use - for stdin)
        #[arg(short, long)]
        profile: PathBuf,

        /// Wearable file (.csv, .json or .ndjson)
        #[arg(short, long)]
        wearable: Option<PathBuf>,
    },

    /// Generate free-form insights (requires GEMINI_API_KEY)
    Insights {
        /// Profile JSON file (use - for stdin)
        #[arg(short, long)]
        profile: PathBuf,

        /// Wearable file (.csv, .json or .ndjson)
        #[arg(short, long)]
        wearable: Option<PathBuf>,
    },

    /// Chat with the assistant; one question per line on stdin
    Chat {
        /// Profile JSON file
        #[arg(short, long)]
        profile: PathBuf,

        /// Wearable file (.csv, .json or .ndjson)
        #[arg(short, long)]
        wearable: Option<PathBuf>,

        /// Load a saved chat session
        #[arg(long)]
        load_session: Option<PathBuf>,

        /// Save the chat session on exit
        #[arg(long)]
        save_session: Option<PathBuf>,
    },

    /// Diagnose configuration and input files
    Doctor {
        /// Check a profile file
        #[arg(long)]
        profile: Option<PathBuf>,

        /// Check a wearable file
        #[arg(long)]
        wearable: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Human-readable text
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
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), FertilityCliError> {
    match cli.command {
        Commands::Predict {
            profile,
            wearable,
            format,
        } => cmd_predict(&profile, wearable.as_deref(), format),

        Commands::Report {
            profile,
            wearable,
            format,
        } => cmd_report(&profile, wearable.as_deref(), format),

        Commands::Calendar { profile, wearable } => cmd_calendar(&profile, wearable.as_deref()),

        Commands::Insights { profile, wearable } => cmd_insights(&profile, wearable.as_deref()),

        Commands::Chat {
            profile,
            wearable,
            load_session,
            save_session,
        } => cmd_chat(
            &profile,
            wearable.as_deref(),
            load_session.as_deref(),
            save_session.as_deref(),
        ),

        Commands::Doctor {
            profile,
            wearable,
            json,
        } => cmd_doctor(profile.as_deref(), wearable.as_deref(), json),
    }
}

fn cmd_predict(
    profile: &Path,
    wearable: Option<&Path>,
    format: OutputFormat,
) -> Result<(), FertilityCliError> {
    let (profile, wearable) = load_inputs(profile, wearable)?;
    let estimate = Estimator::estimate(&profile, wearable.as_ref());

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&estimate)?),
        OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(&estimate)?),
        OutputFormat::Text => {
            println!(
                "Fertile window: {} to {}",
                estimate.fertile_window_start.format("%B %d, %Y"),
                estimate.fertile_window_end.format("%B %d, %Y")
            );
            println!("Ovulation:      {}", estimate.ovulation_date.format("%B %d, %Y"));
            println!("Confidence:     {}%", estimate.confidence_percent());
            for factor in &estimate.factors {
                println!("  - {}", factor.kind.description());
            }
        }
    }

    Ok(())
}

fn cmd_report(
    profile: &Path,
    wearable: Option<&Path>,
    format: OutputFormat,
) -> Result<(), FertilityCliError> {
    let (profile, wearable) = load_inputs(profile, wearable)?;
    let report = FertilityProcessor::new().report(&profile, wearable.as_ref());

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&report)?),
        OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", format_report_text(&report)),
    }

    Ok(())
}

fn cmd_calendar(profile: &Path, wearable: Option<&Path>) -> Result<(), FertilityCliError> {
    let (profile, wearable) = load_inputs(profile, wearable)?;
    let estimate = Estimator::estimate(&profile, wearable.as_ref());
    print!("{}", CalendarMonth::for_estimate(&estimate).render_text());
    Ok(())
}

fn cmd_insights(profile: &Path, wearable: Option<&Path>) -> Result<(), FertilityCliError> {
    let (profile, wearable) = load_inputs(profile, wearable)?;
    let processor = FertilityProcessor::from_config(&InsightConfig::from_env()?);

    let text = processor
        .insights(&profile, wearable.as_ref())
        .map_err(|e| FertilityCliError::Generation(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

fn cmd_chat(
    profile: &Path,
    wearable: Option<&Path>,
    load_session: Option<&Path>,
    save_session: Option<&Path>,
) -> Result<(), FertilityCliError> {
    let (profile, wearable) = load_inputs(profile, wearable)?;
    let estimate = Estimator::estimate(&profile, wearable.as_ref());
    let mut processor = FertilityProcessor::from_config(&InsightConfig::from_env()?);

    if let Some(session_path) = load_session {
        let session_json = fs::read_to_string(session_path)?;
        processor.load_session(&session_json)?;
        debug!(messages = processor.session().len(), "loaded chat session");
    }

    let stdin = io::stdin();
    let interactive = atty::is(atty::Stream::Stdin);
    let mut stdout = io::stdout();

    if interactive {
        println!("Ask a question, or use /quick <n>, /clear, /quit.");
        for (idx, quick) in QuickQuestion::ALL.iter().enumerate() {
            println!("  /quick {}  {}", idx + 1, quick.label());
        }
    }

    for line in stdin.lock().lines() {
        let line = line?;
        let input = line.trim();

        let question = match parse_chat_command(input) {
            ChatCommand::Skip => continue,
            ChatCommand::Quit => break,
            ChatCommand::Clear => {
                processor.session_mut().clear();
                println!("Chat cleared.");
                continue;
            }
            ChatCommand::UnknownQuick => {
                println!("Choose a quick question between 1 and {}.", QuickQuestion::ALL.len());
                continue;
            }
            ChatCommand::Ask(question) => question,
        };

        let reply = processor.chat(&question, &profile, Some(&estimate));
        writeln!(stdout, "{}\n", reply.content)?;
        stdout.flush()?;
    }

    if let Some(session_path) = save_session {
        fs::write(session_path, processor.save_session()?)?;
    }

    Ok(())
}

fn cmd_doctor(
    profile: Option<&Path>,
    wearable: Option<&Path>,
    json: bool,
) -> Result<(), FertilityCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("fertility-insight version {}", INSIGHT_VERSION),
    });

    // Text generation credential
    let credential_check = match InsightConfig::from_env() {
        Ok(config) => match config.availability() {
            Availability::Available => DoctorCheck {
                name: "text_generation".to_string(),
                status: CheckStatus::Ok,
                message: format!("Available (model {})", config.model),
            },
            Availability::Unavailable(reason) => DoctorCheck {
                name: "text_generation".to_string(),
                status: CheckStatus::Warning,
                message: format!("Unavailable: {}; chat uses canned replies", reason),
            },
        },
        Err(e) => DoctorCheck {
            name: "text_generation".to_string(),
            status: CheckStatus::Error,
            message: e.to_string(),
        },
    };
    checks.push(credential_check);

    if let Some(profile_path) = profile {
        checks.push(check_file("profile", profile_path, |content| {
            let profile = CycleProfile::from_json(content)?;
            Ok(format!(
                "Profile valid (cycle starts {}, {} days)",
                profile.cycle_start_date, profile.cycle_length_days
            ))
        }));
    }

    if let Some(wearable_path) = wearable {
        checks.push(check_file("wearable", wearable_path, |content| {
            let series = WearableParser::parse(content, WearableFormat::from_path(wearable_path)?)?;
            Ok(format!(
                "Wearable file valid ({} records, channels: {})",
                series.len(),
                series.channel_names().join(", ")
            ))
        }));
    }

    // Check stdin is available (for chat mode)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive chat)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (scripted chat ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: INSIGHT_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Fertility Doctor Report");
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
        Err(FertilityCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(path: &Path) -> Result<String, FertilityCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn load_inputs(
    profile: &Path,
    wearable: Option<&Path>,
) -> Result<(CycleProfile, Option<WearableSeries>), FertilityCliError> {
    let profile = CycleProfile::from_json(&read_input(profile)?)?;
    let wearable = wearable.map(WearableParser::parse_file).transpose()?;

    if let Some(series) = &wearable {
        debug!(records = series.len(), "loaded wearable series");
    }
    Ok((profile, wearable))
}

fn check_file<F>(name: &str, path: &Path, validate: F) -> DoctorCheck
where
    F: FnOnce(&str) -> Result<String, InsightError>,
{
    if !path.exists() {
        return DoctorCheck {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: format!("{} file does not exist", name),
        };
    }

    let result = fs::read_to_string(path)
        .map_err(InsightError::from)
        .and_then(|content| validate(&content));

    match result {
        Ok(message) => DoctorCheck {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message,
        },
        Err(e) => DoctorCheck {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: format!("Invalid {} file: {}", name, e),
        },
    }
}

enum ChatCommand {
    Skip,
    Quit,
    Clear,
    UnknownQuick,
    Ask(String),
}

fn parse_chat_command(input: &str) -> ChatCommand {
    match input {
        "" => ChatCommand::Skip,
        "/quit" | "/exit" => ChatCommand::Quit,
        "/clear" => ChatCommand::Clear,
        _ => match input.strip_prefix("/quick") {
            Some(rest) => rest
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|idx| QuickQuestion::ALL.get(idx))
                .map_or(ChatCommand::UnknownQuick, |q| {
                    ChatCommand::Ask(q.question().to_string())
                }),
            None => ChatCommand::Ask(input.to_string()),
        },
    }
}

fn format_report_text(report: &FertilityReport) -> String {
    let estimate = &report.estimate;
    let mut out = String::new();

    out.push_str("Fertility Report\n================\n");
    out.push_str(&format!(
        "Fertile window: {} to {}\n",
        estimate.fertile_window_start.format("%B %d, %Y"),
        estimate.fertile_window_end.format("%B %d, %Y")
    ));
    out.push_str(&format!(
        "Ovulation:      {}\n",
        estimate.ovulation_date.format("%B %d, %Y")
    ));
    out.push_str(&format!("Confidence:     {}%\n", estimate.confidence_percent()));
    out.push_str(&format!(
        "Baseline:       {} to {}\n",
        report.baseline.fertile_window_start, report.baseline.fertile_window_end
    ));

    out.push_str(&format!(
        "\nHealth score: {} ({})\n",
        report.health.overall, report.health.message
    ));
    for score in &report.health.scores {
        out.push_str(&format!("  {:<12} {}\n", score.category.label(), score.score));
    }

    if !report.risk_factors.is_empty() {
        out.push_str("\nRisk factors:\n");
        for risk in &report.risk_factors {
            out.push_str(&format!("  - {}\n", risk));
        }
    }

    out.push_str("\nAdvisories:\n");
    for advisory in &report.advisories {
        out.push_str(&format!(
            "  [{}] {}\n",
            advisory.severity.as_str(),
            advisory.message
        ));
    }

    if let Some(wearable) = &report.wearable {
        out.push_str(&format!(
            "\nWearable data: {} records, {}% complete\n",
            wearable.records, wearable.data_quality_pct
        ));
        for warning in &wearable.warnings {
            out.push_str(&format!("  ! {}\n", warning));
        }
        for trend in &wearable.trends {
            out.push_str(&format!("  {}\n", trend.describe()));
        }
    }

    out
}

// Error types

#[derive(Debug)]
enum FertilityCliError {
    Io(io::Error),
    Input(InsightError),
    Json(serde_json::Error),
    Generation(String),
    DoctorFailed,
}

impl From<io::Error> for FertilityCliError {
    fn from(e: io::Error) -> Self {
        FertilityCliError::Io(e)
    }
}

impl From<InsightError> for FertilityCliError {
    fn from(e: InsightError) -> Self {
        FertilityCliError::Input(e)
    }
}

impl From<serde_json::Error> for FertilityCliError {
    fn from(e: serde_json::Error) -> Self {
        FertilityCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<FertilityCliError> for CliError {
    fn from(e: FertilityCliError) -> Self {
        match e {
            FertilityCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            FertilityCliError::Input(InsightError::Config(msg)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: msg,
                hint: Some("Run 'fertility doctor' to inspect configuration".to_string()),
            },
            FertilityCliError::Input(e) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure the profile is JSON and the wearable file is CSV, JSON or NDJSON".to_string()),
            },
            FertilityCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            FertilityCliError::Generation(msg) => CliError {
                code: "GENERATION_ERROR".to_string(),
                message: msg,
                hint: Some("Set GEMINI_API_KEY or retry later".to_string()),
            },
            FertilityCliError::DoctorFailed => CliError {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_command() {
        assert!(matches!(parse_chat_command(""), ChatCommand::Skip));
        assert!(matches!(parse_chat_command("/quit"), ChatCommand::Quit));
        assert!(matches!(parse_chat_command("/clear"), ChatCommand::Clear));
        assert!(matches!(parse_chat_command("/quick 0"), ChatCommand::UnknownQuick));
        assert!(matches!(parse_chat_command("/quick 7"), ChatCommand::UnknownQuick));

        match parse_chat_command("/quick 3") {
            ChatCommand::Ask(q) => assert_eq!(q, QuickQuestion::Nutrition.question()),
            _ => panic!("expected a quick question"),
        }
        match parse_chat_command("How long is a cycle?") {
            ChatCommand::Ask(q) => assert_eq!(q, "How long is a cycle?"),
            _ => panic!("expected a question"),
        }
    }

    #[test]
    fn test_report_text_lists_advisories() {
        let profile = CycleProfile::starting(
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            28,
        );
        let report = FertilityProcessor::new().report(&profile, None);
        let text = format_report_text(&report);

        assert!(text.contains("Ovulation:      January 12, 2024"));
        assert!(text.contains("Health score: 65"));
        assert!(!text.contains("Wearable data"));
    }
}
