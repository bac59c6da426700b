//! # Brasa CLI
//!
//! Command-line utility for serial thermal printers.
//!
//! ## Usage
//!
//! ```bash
//! # Print an image (resized and dithered to the head width)
//! brasa --dev /dev/ttyAMA0 print-image photo.png
//!
//! # Print a QR code
//! brasa print-qrcode "https://example.com"
//!
//! # Style and bitmap smoke test
//! brasa test
//!
//! # Interactive thermal calibration, then save the printed JSON
//! brasa calibrate
//! brasa --config brasa.conf print-image photo.png
//! ```

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use brasa::{
    printer::{Printer, PrinterConfig, CHARS_PER_LINE},
    protocol::FormatNode,
    range::Range,
    render,
    transport::serial::{DEFAULT_BAUDRATE, DEFAULT_DEVICE},
    BrasaError, SerialLink,
};

/// Brasa - serial thermal printer utility
#[derive(Parser, Debug)]
#[command(name = "brasa")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Printer device to use
    #[arg(short = 'd', long, conflicts_with = "config")]
    dev: Option<String>,

    /// Configuration file with calibrated printer settings
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print an image file
    PrintImage {
        /// Image file to print
        imagefile: PathBuf,
    },
    /// Print a QR code encoding the given text
    PrintQrcode {
        /// Payload text
        text: String,
    },
    /// Print formatting and bitmap samples
    Test,
    /// Interactively determine heat settings for this device
    Calibrate {
        /// Do not calibrate heat_time, use this fixed value
        #[arg(long)]
        heat_time: Option<u32>,

        /// Do not calibrate interval, use this fixed value
        #[arg(long)]
        interval: Option<u32>,

        /// Do not calibrate max_dots, use this fixed value
        #[arg(long)]
        max_dots: Option<u32>,

        /// Do not ask for confirmation before starting
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), BrasaError> {
    let cli = Cli::parse();

    // --dev and --config are mutually exclusive (enforced by clap); with
    // neither, fall back to the default device.
    let (mut printer, cfg) = match (&cli.dev, &cli.config) {
        (None, Some(path)) => {
            let cfg = PrinterConfig::load(path)?;
            (Printer::from_config(&cfg)?, cfg)
        }
        (dev, None) => {
            let cfg = PrinterConfig {
                dev: dev.clone().unwrap_or_else(|| DEFAULT_DEVICE.to_string()),
                baudrate: DEFAULT_BAUDRATE,
                ..Default::default()
            };
            (Printer::on_serial(&cfg.dev, cfg.baudrate)?, cfg)
        }
        (Some(_), Some(_)) => unreachable!("clap rejects --dev with --config"),
    };
    eprintln!("Connected to printer {}", cfg.dev);

    match cli.command {
        Commands::PrintImage { imagefile } => {
            let raster = render::load_image(&imagefile)?;
            printer.print_image(raster.row_width, &raster.data)?;
            printer.feed(32)
        }
        Commands::PrintQrcode { text } => {
            let raster = render::qr_to_raster(&text)?;
            printer.print_image(raster.row_width, &raster.data)?;
            printer.feed(32)
        }
        Commands::Test => test(&mut printer, &cfg),
        Commands::Calibrate {
            heat_time,
            interval,
            max_dots,
            yes,
        } => calibrate(&mut printer, cfg, heat_time, interval, max_dots, yes),
    }
}

/// Print one line per style so every escape pair is exercised on paper.
fn test(printer: &mut Printer<SerialLink>, cfg: &PrinterConfig) -> Result<(), BrasaError> {
    printer.print_text(&format!("dev: {}\n\n", cfg.dev))?;

    let samples = FormatNode::group(vec![
        FormatNode::text("plain\n"),
        FormatNode::bold(vec![FormatNode::text("bold\n")]),
        FormatNode::invert(vec![FormatNode::text("invert\n")]),
        FormatNode::underline(vec![FormatNode::text("underline\n")]),
        FormatNode::upside_down(vec![FormatNode::text("upside down\n")]),
        FormatNode::double_width(vec![FormatNode::text("wide\n")]),
        FormatNode::double_height(vec![FormatNode::text("tall\n")]),
        FormatNode::double_width(vec![FormatNode::double_height(vec![FormatNode::text(
            "wide+tall\n",
        )])]),
    ]);
    printer.print_formatted(&samples)?;

    let raster = render::qr_to_raster("brasa test page")?;
    printer.print_image(raster.row_width, &raster.data)?;

    printer.print_text("\n\n")
}

const PROMPT_MAX_DOTS: Range = Range::new("max_dots", 8, 2048 + 8, 8);
const PROMPT_HEAT_TIME: Range = Range::new("heat_time", 30, 2550 + 10, 10);
const PROMPT_INTERVAL: Range = Range::new("interval", 0, 2550 + 10, 10);

/// Interactive heat calibration: sweep each parameter, let the user pick the
/// best-looking line, repeat. Re-prompting on invalid input is the only
/// retry behavior in the whole system.
fn calibrate(
    printer: &mut Printer<SerialLink>,
    mut cfg: PrinterConfig,
    heat_time: Option<u32>,
    interval: Option<u32>,
    max_dots: Option<u32>,
    yes: bool,
) -> Result<(), BrasaError> {
    // a few extra resets to clear stale data from a crashed session
    for _ in 0..10 {
        printer.reset()?;
    }

    printer.print_text("ready to calibrate\n\n\n")?;
    if !yes {
        println!(
            "About to calibrate your printer. It should have printed \
             \"ready to calibrate\". Calibration will use up roughly half \
             a meter of paper roll."
        );
        if !confirm("Continue?")? {
            return Ok(());
        }
    }

    cfg.heat_time = heat_time.unwrap_or(cfg.heat_time);
    cfg.interval = interval.unwrap_or(cfg.interval);
    cfg.max_dots = max_dots.unwrap_or(cfg.max_dots);
    apply_settings(printer, &cfg)?;

    if heat_time.is_none() {
        println!(
            "Determining heat. Pick the lowest setting that yields flawless \
             black lines; do not worry about bad text rendering."
        );
        for value in (200..2551).step_by(200) {
            printer.set_heat(cfg.max_dots, value, cfg.interval)?;
            printer.print_formatted(&sample_line(&format!("heat_time: {:>4} us", value)))?;
        }
        printer.print_text("\n\n\n")?;

        cfg.heat_time = prompt_u32("heat_time", PROMPT_HEAT_TIME)?;
        apply_settings(printer, &cfg)?;
    }

    if interval.is_none() {
        println!("Determining interval. Pick the lowest setting with crisp characters.");
        for value in (0..300).step_by(20) {
            printer.set_heat(cfg.max_dots, cfg.heat_time, value)?;
            printer.print_formatted(&sample_line(&format!("interval: {:>4} us", value)))?;
        }
        printer.print_text("\n\n\n")?;

        cfg.interval = prompt_u32("interval", PROMPT_INTERVAL)?;
        apply_settings(printer, &cfg)?;
    }

    if max_dots.is_none() {
        println!(
            "Determining maximum speed (max dots). Pick the highest setting \
             that still prints correctly."
        );
        for value in (8..320).step_by(16) {
            printer.set_heat(value, cfg.heat_time, cfg.interval)?;
            printer.print_formatted(&sample_line(&format!("max_dots: {:>3} dots", value)))?;
        }
        printer.print_text("\n\n\n")?;

        cfg.max_dots = prompt_u32("max_dots", PROMPT_MAX_DOTS)?;
        apply_settings(printer, &cfg)?;
    }

    printer.print_text("calibration finished\n\n\n\n")?;

    println!("Calibration finished. Put the following into your brasa.conf:");
    println!("{}", cfg.to_json());

    Ok(())
}

/// Send the current settings to the printer and echo them on paper.
fn apply_settings(
    printer: &mut Printer<SerialLink>,
    cfg: &PrinterConfig,
) -> Result<(), BrasaError> {
    printer.set_heat(cfg.max_dots, cfg.heat_time, cfg.interval)?;
    printer.print_text(&format!(
        "heat_time: {} us\ninterval: {} us\nmax_dots: {} dots\n",
        cfg.heat_time, cfg.interval, cfg.max_dots
    ))
}

/// An inverted, full-width sample line: dense special characters up front,
/// the label right-justified behind them.
fn sample_line(label: &str) -> FormatNode {
    let prefix = "#.$%_=ABCDE ";
    let width = CHARS_PER_LINE as usize - prefix.len();
    let line = format!("{}{:>width$}\n", prefix, label, width = width);
    FormatNode::invert(vec![FormatNode::text(line)])
}

/// Ask a yes/no question on stdin, defaulting to yes.
fn confirm(question: &str) -> Result<bool, BrasaError> {
    print!("{} [Y/n] ", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(!matches!(answer.trim().to_lowercase().as_str(), "n" | "no"))
}

/// Prompt for an integer until it passes the range check.
fn prompt_u32(name: &str, range: Range) -> Result<u32, BrasaError> {
    let stdin = io::stdin();
    loop {
        print!("{}: ", name);
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Err(BrasaError::InvalidValue(format!(
                "end of input while reading {}",
                name
            )));
        }
        match line.trim().parse::<u32>() {
            Ok(value) if range.contains(value) => return Ok(value),
            _ => println!("Invalid {} value", name),
        }
    }
}
