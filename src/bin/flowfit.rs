//! flowfit CLI - Command-line interface for flowfit
//!
//! Commands:
//! - convert: Repair a decoded recording
//! - inspect: Show the pause segmentation of a recording

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use flowfit::types::{Message, Timestamp};
use flowfit::{
    ConvertError, ConvertOptions, FlowFitConverter, JsonCodec, MessageCodec, FLOWFIT_VERSION,
};

/// flowfit - Repair eBike FIT activity exports
#[derive(Parser)]
#[command(name = "flowfit")]
#[command(version = FLOWFIT_VERSION)]
#[command(about = "Rebuild pauses, laps and energy in eBike FIT exports", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Repair a recording given as a JSON message list
    Convert {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Total energy in kcal to distribute over laps
        #[arg(long)]
        calories: Option<f64>,

        /// Gap in seconds above which a pause starts
        #[arg(long)]
        pause_threshold: Option<u32>,

        /// Do not emit zero-activity laps for pauses
        #[arg(long)]
        no_pause_laps: bool,

        /// Load options from a JSON file; flags override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },

    /// Classify and segment a recording without rewriting it
    Inspect {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Gap in seconds above which a pause starts
        #[arg(long)]
        pause_threshold: Option<u32>,

        /// Output report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

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

fn run(cli: Cli) -> Result<(), FlowFitCliError> {
    match cli.command {
        Commands::Convert {
            input,
            output,
            calories,
            pause_threshold,
            no_pause_laps,
            config,
            pretty,
        } => {
            let mut options = match config {
                Some(path) => ConvertOptions::from_json(&fs::read_to_string(path)?)?,
                None => ConvertOptions::default(),
            };
            if calories.is_some() {
                options = options.with_total_energy(calories);
            }
            if let Some(secs) = pause_threshold {
                options = options.with_pause_threshold(secs);
            }
            if no_pause_laps {
                options = options.with_pause_laps(false);
            }
            cmd_convert(&input, &output, options, pretty)
        }
        Commands::Inspect {
            input,
            pause_threshold,
            json,
        } => {
            let mut options = ConvertOptions::default();
            if let Some(secs) = pause_threshold {
                options = options.with_pause_threshold(secs);
            }
            cmd_inspect(&input, options, json)
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

fn cmd_convert(
    input: &Path,
    output: &Path,
    options: ConvertOptions,
    pretty: bool,
) -> Result<(), FlowFitCliError> {
    let codec = if pretty {
        JsonCodec::pretty()
    } else {
        JsonCodec::new()
    };

    let converter = FlowFitConverter::new(options)?;
    let messages = codec.decode(&read_input(input)?)?;
    let input_count = messages.len();

    let repaired = converter.convert(messages)?;
    let output_data = codec.encode(&repaired)?;

    if is_stdio(output) {
        io::stdout().write_all(&output_data)?;
    } else {
        fs::write(output, output_data)?;
    }

    eprintln!("{}", conversion_summary(input_count, &repaired));
    Ok(())
}

fn cmd_inspect(input: &Path, options: ConvertOptions, json: bool) -> Result<(), FlowFitCliError> {
    let converter = FlowFitConverter::new(options)?;
    let messages = JsonCodec::new().decode(&read_input(input)?)?;
    let input_records = messages
        .iter()
        .filter(|m| matches!(m, Message::Record(_)))
        .count();

    let segments = converter.analyze(messages)?;

    let report = InspectReport {
        input_records,
        records: segments.iter().map(|s| s.segment.records().len()).sum(),
        segments: segments
            .iter()
            .map(|s| SegmentReport {
                index: s.segment.index(),
                start: s.segment.start_time(),
                end: s.segment.end_time(),
                records: s.segment.records().len(),
                active_secs: s.segment.active_secs(),
                average_intensity: s.average_intensity,
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("flowfit Inspect Report");
        println!("======================");
        println!(
            "Records: {} ({} after consolidation)",
            report.input_records, report.records
        );
        println!("Segments: {}", report.segments.len());
        println!();
        for segment in &report.segments {
            println!(
                "  #{:<3} {} -> {}  {:>5} records  {:>6}s active  {:>8.1} avg",
                segment.index,
                segment.start.to_rfc3339(),
                segment.end.to_rfc3339(),
                segment.records,
                segment.active_secs,
                segment.average_intensity
            );
        }
    }

    Ok(())
}

fn is_stdio(path: &Path) -> bool {
    path.to_string_lossy() == "-"
}

fn read_input(input: &Path) -> Result<Vec<u8>, FlowFitCliError> {
    if is_stdio(input) {
        if atty::is(atty::Stream::Stdin) {
            return Err(FlowFitCliError::InteractiveStdin);
        }
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read(input)?)
    }
}

fn conversion_summary(input_count: usize, messages: &[Message]) -> String {
    let laps = messages
        .iter()
        .filter(|m| matches!(m, Message::Lap(_)))
        .count();
    let session = messages.iter().find_map(|m| match m {
        Message::Session(s) => Some(s),
        _ => None,
    });

    let mut summary = format!(
        "Converted {} messages into {} ({} laps",
        input_count,
        messages.len(),
        laps
    );
    if let Some(session) = session {
        summary.push_str(&format!(
            ", elapsed {}s, timer {}s",
            session.total_elapsed_time.unwrap_or_default(),
            session.total_timer_time.unwrap_or_default()
        ));
        if let Some(calories) = session.total_calories {
            summary.push_str(&format!(", {calories} kcal"));
        }
    }
    summary.push(')');
    summary
}

#[derive(Debug)]
enum FlowFitCliError {
    Io(io::Error),
    Convert(ConvertError),
    Json(serde_json::Error),
    InteractiveStdin,
}

impl From<io::Error> for FlowFitCliError {
    fn from(e: io::Error) -> Self {
        FlowFitCliError::Io(e)
    }
}

impl From<ConvertError> for FlowFitCliError {
    fn from(e: ConvertError) -> Self {
        FlowFitCliError::Convert(e)
    }
}

impl From<serde_json::Error> for FlowFitCliError {
    fn from(e: serde_json::Error) -> Self {
        FlowFitCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<FlowFitCliError> for CliError {
    fn from(e: FlowFitCliError) -> Self {
        match e {
            FlowFitCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            FlowFitCliError::Convert(e) => {
                let (code, hint) = match &e {
                    ConvertError::CardinalityError { .. } => (
                        "CARDINALITY_ERROR",
                        "Input must hold one file_id, one session and one lap",
                    ),
                    ConvertError::UnsupportedMessageKind { .. } => (
                        "UNSUPPORTED_MESSAGE",
                        "Remove activity and event messages, or whitelist the message name",
                    ),
                    ConvertError::StructuralError(_) => (
                        "STRUCTURAL_ERROR",
                        "Every active segment needs at least two records",
                    ),
                    ConvertError::ArithmeticError(_) => (
                        "ARITHMETIC_ERROR",
                        "Energy needs power samples; omit --calories for this recording",
                    ),
                    ConvertError::InvalidParameter(_) => {
                        ("INVALID_PARAMETER", "Check option values")
                    }
                    ConvertError::CodecError(_) | ConvertError::JsonError(_) => {
                        ("PARSE_ERROR", "Ensure input is a JSON array of messages")
                    }
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            FlowFitCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            FlowFitCliError::InteractiveStdin => CliError {
                code: "INTERACTIVE_STDIN".to_string(),
                message: "Refusing to read input from a terminal".to_string(),
                hint: Some("Pipe a file into stdin or pass --input <path>".to_string()),
            },
        }
    }
}

#[derive(serde::Serialize)]
struct InspectReport {
    input_records: usize,
    records: usize,
    segments: Vec<SegmentReport>,
}

#[derive(serde::Serialize)]
struct SegmentReport {
    index: usize,
    start: Timestamp,
    end: Timestamp,
    records: usize,
    active_secs: i64,
    average_intensity: f64,
}
