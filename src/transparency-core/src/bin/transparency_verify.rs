//! transparency-verify CLI - check signed meter values from charge points.
//!
//! Reads payloads from files (or `-` for stdin), detects their format and
//! prints the verification outcome as text or JSON.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use transparency_core::{
    decode_public_key_text, EngineConfig, IntrinsicVerified, TransactionReport,
    VerificationEngine, VerificationResult,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// transparency-verify - verification of signed meter values.
///
/// Supports OCMF, SML (full frame and signature-only), Alfen and
/// Mennekes billing exports.
#[derive(Parser)]
#[command(name = "transparency-verify")]
#[command(version = VERSION)]
#[command(about = "Verify signed meter values from charge points")]
#[command(long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// TOML engine configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify one signed payload
    Verify {
        /// Payload file, `-` for stdin
        #[arg(short, long)]
        data: PathBuf,

        /// Public key file as PEM, base64 or hex (overrides an embedded key)
        #[arg(short, long)]
        key: Option<PathBuf>,

        /// Trust the payload without checking its signature
        #[arg(long)]
        intrinsic: bool,
    },

    /// Verify a transaction's start and stop payloads
    Transaction {
        /// Start payload file
        #[arg(long)]
        start: PathBuf,

        /// Stop payload file (defaults to the start payload)
        #[arg(long)]
        stop: Option<PathBuf>,

        /// Public key file as PEM, base64 or hex
        #[arg(short, long)]
        key: Option<PathBuf>,
    },

    /// Verify every charging process in a Mennekes billing export
    Billing {
        /// Billing export file, `-` for stdin
        #[arg(short, long)]
        data: PathBuf,

        /// Public key file as PEM, base64 or hex
        #[arg(short, long)]
        key: Option<PathBuf>,
    },

    /// Print the detected format of a payload
    Detect {
        /// Payload file, `-` for stdin
        #[arg(short, long)]
        data: PathBuf,
    },
}

fn read_input(path: &Path) -> Result<String, String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| format!("cannot read stdin: {e}"))?;
        return Ok(text);
    }
    std::fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))
}

fn read_key(path: Option<&Path>) -> Result<Option<Vec<u8>>, String> {
    path.map(|p| {
        let text = read_input(p)?;
        decode_public_key_text(&text).map_err(|e| format!("{}: {e}", p.display()))
    })
    .transpose()
}

fn print_result(result: &VerificationResult, json: bool, key_group: usize) {
    if json {
        match serde_json::to_string_pretty(result) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("error: {e}"),
        }
        return;
    }

    let status = if result.is_verified() {
        "VERIFIED"
    } else {
        "NOT VERIFIED"
    };
    println!("Status:      {status}");

    if let Some(data) = result.verified_data() {
        println!("Format:      {}", data.format());
        println!("Encoding:    {:?}", data.encoding());
        if let Some(id) = data.meter_id() {
            println!("Meter:       {id}");
        }
        if let Some(model) = data.meter_model() {
            println!("Model:       {model}");
        }
        let key = data.formatted_public_key(key_group);
        if !key.is_empty() {
            println!("Public key:  {key}");
        }
        for meter in data.meters() {
            let time = meter
                .timestamp
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {:<12} {} {} at {time}",
                format!("{:?}", meter.role),
                meter.value,
                meter.unit
            );
        }
        for detail in data.additional_data() {
            println!("  {}: {}", detail.name, detail.value);
        }
    }

    for error in result.errors() {
        println!("Error [{:?}]: {} ({})", error.kind, error.message, error.localized_key);
    }
    for warning in result.warnings() {
        println!("Warning: {} ({})", warning.message, warning.localized_key);
    }
}

fn print_report(report: &TransactionReport, json: bool) {
    if json {
        match serde_json::to_string_pretty(report) {
            Ok(text) => println!("{text}"),
            Err(e) => eprintln!("error: {e}"),
        }
        return;
    }

    let status = if report.verified {
        "VERIFIED"
    } else {
        "NOT VERIFIED"
    };
    println!("TRANSACTION");
    println!("===========\n");
    println!("Status:      {status}");
    if let Some(format) = report.format {
        println!("Format:      {format}");
    }
    if let Some(serial) = &report.meter_serial {
        println!("Meter:       {serial}");
    }
    if let Some(meter) = &report.start_meter {
        println!("Start:       {} {}", meter.value, meter.unit);
    }
    if let Some(meter) = &report.stop_meter {
        println!("Stop:        {} {}", meter.value, meter.unit);
    }
    if let Some(energy) = &report.energy_kwh {
        println!("Energy:      {energy} kWh");
    }
    if let Some(seconds) = report.duration_seconds {
        println!("Duration:    {seconds} s");
    }
    for error in &report.errors {
        println!("Error [{:?}]: {} ({})", error.kind, error.message, error.localized_key);
    }
    for warning in &report.warnings {
        println!("Warning: {} ({})", warning.message, warning.localized_key);
    }
}

fn run(cli: Cli) -> Result<bool, String> {
    let json = cli.format == "json";
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path).map_err(|e| e.to_string())?,
        None => EngineConfig::default(),
    };
    let engine = VerificationEngine::with_config(config);

    match cli.command {
        Commands::Verify {
            data,
            key,
            intrinsic,
        } => {
            let text = read_input(&data)?;
            let key = read_key(key.as_deref())?;
            let result = engine.verify(&text, key.as_deref(), IntrinsicVerified::from(intrinsic));
            print_result(&result, json, engine.config().key_group_size);
            Ok(result.is_verified())
        },
        Commands::Transaction { start, stop, key } => {
            let start_text = read_input(&start)?;
            let stop_text = match &stop {
                Some(path) => read_input(path)?,
                None => start_text.clone(),
            };
            let key = read_key(key.as_deref())?;
            let report = engine.verify_transaction(
                &start_text,
                &stop_text,
                key.as_deref(),
                IntrinsicVerified::NotVerified,
            );
            print_report(&report, json);
            Ok(report.verified)
        },
        Commands::Billing { data, key } => {
            let text = read_input(&data)?;
            let key = read_key(key.as_deref())?;
            let results = engine
                .verify_billing(&text, key.as_deref(), IntrinsicVerified::NotVerified)
                .map_err(|e| e.to_string())?;
            if json {
                let text = serde_json::to_string_pretty(&results).map_err(|e| e.to_string())?;
                println!("{text}");
            } else {
                for (index, result) in results.iter().enumerate() {
                    println!("\nCHARGING PROCESS {}", index + 1);
                    println!("------------------\n");
                    print_result(result, false, engine.config().key_group_size);
                }
            }
            Ok(results.iter().all(VerificationResult::is_verified))
        },
        Commands::Detect { data } => {
            let text = read_input(&data)?;
            let detected = engine.detect(&text);
            if json {
                let output = serde_json::json!({ "format": detected });
                println!("{output}");
            } else {
                match detected {
                    Some(format) => println!("{format}"),
                    None => println!("none"),
                }
            }
            Ok(detected.is_some())
        },
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let json_output = cli.format == "json";

    // Keep stdout clean for JSON consumers
    if json_output {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::ERROR)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    } else if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::from(2)
        },
    }
}
