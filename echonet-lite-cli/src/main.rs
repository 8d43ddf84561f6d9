use anyhow::{Context, Result, bail};
use bytes::Bytes;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use echonet_lite_lib::{CalibrationState, MeterProfile, MeterProperty, MeterReading, ObjectId, Packet, ServiceCode};
use num_enum::FromPrimitive;
use std::fs::File;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Build and inspect ECHONET Lite smart meter frames")]
struct Cli {
    /// Optional path to a file to write logs to, in addition to stderr.
    #[arg(short, long, global = true)]
    log_file: Option<PathBuf>,

    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the hex Get request for the given property codes (e.g. E7 E8)
    Request {
        #[arg(required = true, value_parser = parse_code)]
        codes: Vec<u8>,
        /// Transaction id to put in the header
        #[arg(long, default_value_t = 1)]
        tid: u16,
    },
    /// Decode a response frame given as hex
    Decode {
        frame: String,
        /// Print the reading as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_code(s: &str) -> Result<u8, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u8::from_str_radix(digits, 16).map_err(|e| format!("invalid property code '{}': {}", s, e))
}

fn property_name(code: u8) -> String {
    match MeterProperty::from_primitive(code) {
        MeterProperty::Other(_) => "?".to_string(),
        known => known.to_string(),
    }
}

fn service_name(service: ServiceCode) -> String {
    match service {
        ServiceCode::Other(code) => format!("ESV 0x{:02X}", code),
        known => known.to_string(),
    }
}

fn setup_logging(log_file_path: Option<PathBuf>, verbosity: &Verbosity<InfoLevel>) -> Result<Option<WorkerGuard>> {
    // Logs go to stderr so stdout carries only the decoded output
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    let (file_layer, guard) = if let Some(ref path) = log_file_path {
        let log_file =
            File::create(path).with_context(|| format!("Failed to create log file at: {:?}", path))?;
        let (non_blocking_writer, guard) = tracing_appender::non_blocking(log_file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking_writer)
            .with_ansi(false)
            .with_target(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    let filter = EnvFilter::builder()
        .with_default_directive(verbosity.tracing_level_filter().into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    if let Some(path) = log_file_path {
        info!("Logging to file: {:?}", path);
    }

    Ok(guard)
}

fn request(codes: &[u8], tid: u16) -> Result<()> {
    let profile = MeterProfile::default();
    let packet = Packet::build_get_request(ObjectId::controller(), profile.destination(), codes, tid);
    let bytes = packet.encode().context("Failed to encode Get request")?;
    println!("{}", hex::encode_upper(&bytes));
    Ok(())
}

fn decode(frame: &str, json: bool) -> Result<()> {
    let cleaned: String = frame.chars().filter(|c| !c.is_whitespace()).collect();
    let raw = hex::decode(&cleaned).context("Frame is not valid hex")?;
    debug!("Decoding {} bytes", raw.len());

    let packet = Packet::decode(Bytes::from(raw)).context("Malformed ECHONET Lite frame")?;
    if !packet.service.is_response() {
        bail!("Frame is a {} frame, not a response", service_name(packet.service));
    }

    let profile = MeterProfile::default();
    let mut calibration = CalibrationState::default();
    calibration.refresh(&packet, &profile);
    let reading = MeterReading::from_packet(&packet, &profile, &calibration);

    if json {
        println!("{}", serde_json::to_string_pretty(&reading)?);
        return Ok(());
    }

    println!("TID:         {}", packet.transaction_id());
    println!("Service:     {}", service_name(packet.service));
    println!("Source:      {}", packet.source);
    println!("Destination: {}", packet.destination);
    println!("Properties:");
    for property in &packet.properties {
        println!(
            "  0x{:02X} {:<36} [{}] {}",
            property.code,
            property_name(property.code),
            property.payload.len(),
            hex::encode_upper(&property.payload)
        );
    }
    println!("Reading:");
    println!("  {}", reading);
    if let Some(digits) = reading.effective_digits {
        println!("  Effective digits: {}", digits);
    }
    if let Some(status) = reading.operation_status {
        println!("  Operation status: {:?}", status);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging(cli.log_file, &cli.verbose)?;

    match cli.command {
        Command::Request { codes, tid } => request(&codes, tid),
        Command::Decode { frame, json } => decode(&frame, json),
    }
}
