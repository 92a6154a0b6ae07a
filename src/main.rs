//! rawkeys - show every keystroke byte in raw mode
//!
//! rawkeys switches the terminal on standard input into raw mode and prints
//! each byte it reads, so you can see exactly what a key sends once the line
//! discipline stops interpreting it.
//!
//! # Quick Start
//!
//! ```text
//! rawkeys              # Press keys, 'q' to quit
//! rawkeys -q x         # Quit on 'x' instead
//! rawkeys -t 500       # Wait up to 500 ms per read
//! rawkeys -l keys.log  # Log diagnostics to keys.log
//! ```
//!
//! # Output
//!
//! | Input | Line printed |
//! |-------|--------------|
//! | a | `97 ('a')` |
//! | Ctrl-C | `3` |
//! | Enter | `13` |
//!
//! The terminal is restored on every exit path, including errors.

#[cfg(unix)]
mod config;
#[cfg(unix)]
mod core;
#[cfg(unix)]
mod ui;

use std::env;
use std::path::PathBuf;

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Exit status for terminal and I/O failures
const EXIT_FAILURE: i32 = 1;
/// Exit status for bad arguments or configuration
const EXIT_USAGE: i32 = 2;

/// Command-line options
#[derive(Debug, Default, PartialEq)]
struct Options {
    /// Explicit configuration file
    config_path: Option<PathBuf>,
    /// Log file (logging is off without it)
    log_path: Option<PathBuf>,
    /// Overrides `quit_key`
    quit_key: Option<char>,
    /// Overrides `timeout_ms`
    timeout_ms: Option<u64>,
    /// Print the effective configuration and exit
    print_config: bool,
}

#[derive(Debug, PartialEq)]
enum Command {
    Run(Options),
    Help,
    Version,
}

fn print_version() {
    eprintln!("rawkeys {}", VERSION);
}

fn print_help() {
    eprintln!("rawkeys {} - show every keystroke byte in raw mode", VERSION);
    eprintln!();
    eprintln!("Usage: rawkeys [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config <PATH>     Load settings from a TOML file");
    eprintln!("  -q, --quit-key <CHAR>   Byte that ends the session (default: q)");
    eprintln!("  -t, --timeout <MS>      Read timeout in milliseconds (default: 100)");
    eprintln!("  -l, --log <PATH>        Append diagnostic logs to PATH");
    eprintln!("      --print-config      Print the effective configuration and exit");
    eprintln!("  -v, --version           Show version");
    eprintln!("  -h, --help              Show this help");
    eprintln!();
    eprintln!("Each byte is printed as its decimal value, followed by the");
    eprintln!("character in parentheses when it is printable ASCII.");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  rawkeys                 Quit with 'q'");
    eprintln!("  rawkeys -q x -t 500     Quit with 'x', 500 ms reads");
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut options = Options::default();
    let mut i = 1;

    fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, String> {
        args.get(i)
            .map(String::as_str)
            .ok_or_else(|| format!("Missing value for {}", flag))
    }

    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "-h" | "--help" => return Ok(Command::Help),
            "-v" | "--version" => return Ok(Command::Version),
            "-c" | "--config" => {
                i += 1;
                options.config_path = Some(PathBuf::from(value(args, i, flag)?));
            }
            "-l" | "--log" => {
                i += 1;
                options.log_path = Some(PathBuf::from(value(args, i, flag)?));
            }
            "-q" | "--quit-key" => {
                i += 1;
                let raw = value(args, i, flag)?;
                let mut chars = raw.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => options.quit_key = Some(c),
                    _ => return Err(format!("Quit key must be one character, got {:?}", raw)),
                }
            }
            "-t" | "--timeout" => {
                i += 1;
                let raw = value(args, i, flag)?;
                let ms = raw
                    .parse()
                    .map_err(|_| format!("Invalid timeout: {}", raw))?;
                options.timeout_ms = Some(ms);
            }
            "--print-config" => {
                options.print_config = true;
            }
            arg => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
        }
        i += 1;
    }

    Ok(Command::Run(options))
}

#[cfg(not(unix))]
fn main() {
    let args: Vec<String> = env::args().collect();
    match parse_args(&args) {
        Ok(Command::Help) => print_help(),
        Ok(Command::Version) => print_version(),
        _ => {
            eprintln!("rawkeys needs a Unix terminal (termios).");
            std::process::exit(EXIT_FAILURE);
        }
    }
}

#[cfg(unix)]
fn main() {
    let args: Vec<String> = env::args().collect();
    let options = match parse_args(&args) {
        Ok(Command::Run(options)) => options,
        Ok(Command::Help) => {
            print_help();
            return;
        }
        Ok(Command::Version) => {
            print_version();
            return;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(EXIT_USAGE);
        }
    };

    std::process::exit(app::main(options));
}

#[cfg(unix)]
mod app {
    use std::fs::{self, OpenOptions};
    use std::io::{self, Write};
    use std::path::Path;
    use std::sync::Mutex;

    use anyhow::Context;
    use tracing::{debug, error, info};
    use tracing_subscriber::FmtSubscriber;

    use super::{Options, EXIT_FAILURE, EXIT_USAGE};
    use crate::config::{Config, ConfigError};
    use crate::core::{DecodedByte, RawModeSession, RawReader, TermError, TerminalDevice, Tty};
    use crate::ui::{Flow, KeyEcho};

    /// Run with parsed options and return the process exit status
    pub fn main(options: Options) -> i32 {
        let config = match load_config(&options) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                return EXIT_USAGE;
            }
        };

        if options.print_config {
            print!("{}", config.to_toml());
            return 0;
        }

        if let Some(path) = &options.log_path {
            if let Err(e) = init_logging(path, &config) {
                eprintln!("Warning: logging disabled: {:#}", e);
            }
        }

        info!("rawkeys {} starting...", super::VERSION);
        info!(
            "Quit key: {:?}, read timeout: {} ms",
            config.quit_key, config.timeout_ms
        );

        let result = run(&config);
        let code = exit_code(&result);
        match result {
            Ok(count) => info!("Exited cleanly after {} bytes", count),
            Err(e) => {
                error!("Fatal: {}", e);
                eprintln!("Error: {}", e);
            }
        }
        code
    }

    /// Defaults, then the config file, then command-line overrides
    pub(super) fn load_config(options: &Options) -> Result<Config, ConfigError> {
        let mut config = match &options.config_path {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(key) = options.quit_key {
            config.quit_key = key;
        }
        if let Some(ms) = options.timeout_ms {
            config.timeout_ms = ms;
        }
        config.validate()?;
        Ok(config)
    }

    /// Append logs to `path`. Standard error is left alone because raw mode
    /// is active while most events are emitted.
    fn init_logging(path: &Path, config: &Config) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        let subscriber = FmtSubscriber::builder()
            .with_env_filter(config.log_filter()?)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
        Ok(())
    }

    fn run(config: &Config) -> anyhow::Result<u64> {
        let tty = Tty::stdin()?;
        let stdout = io::stdout();
        let mut out = stdout.lock();
        run_session(tty, config, &mut out)
    }

    /// Raw mode around the echo loop.
    ///
    /// The terminal is restored before any error leaves this function. A
    /// failed restore is always returned, carrying the loop error with it.
    pub(super) fn run_session<D, W>(
        device: D,
        config: &Config,
        out: &mut W,
    ) -> anyhow::Result<u64>
    where
        D: TerminalDevice,
        W: Write,
    {
        let echo = KeyEcho::new(config.quit_byte()?);
        let timeout = config.read_timeout()?;
        info!("Effective read timeout: {:?}", timeout.as_duration());

        let mut session = RawModeSession::activate(device, timeout)?;
        debug!("Installed terminal attributes: {:?}", session.active());

        let looped = echo_loop(&mut session.reader(), &echo, out);
        match (looped, session.restore()) {
            (Ok(count), Ok(())) => Ok(count),
            (Ok(_), Err(restore)) => Err(restore.into()),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(restore)) => Err(restore_failed(e, restore)),
        }
    }

    /// The terminal is still raw; name the restore failure first
    fn restore_failed(cause: anyhow::Error, restore: TermError) -> anyhow::Error {
        error!("Failed to restore terminal attributes: {}", restore);
        let message = format!("{}, after {}", restore, cause);
        cause.context(message)
    }

    /// Read and echo until the quit byte; returns the number of bytes read
    fn echo_loop<D, W>(
        reader: &mut RawReader<'_, D>,
        echo: &KeyEcho,
        out: &mut W,
    ) -> anyhow::Result<u64>
    where
        D: TerminalDevice,
        W: Write,
    {
        let mut count = 0u64;
        loop {
            let byte = match reader.read_one()? {
                DecodedByte::Byte(byte) => byte,
                DecodedByte::Pending => continue,
            };
            count += 1;

            let flow = echo
                .handle(byte, out)
                .context("Failed to write to standard output")?;
            if flow == Flow::Quit {
                info!("Quit byte {} received", echo.quit_byte());
                return Ok(count);
            }
        }
    }

    /// Map the outcome of a session to the process exit status
    pub(super) fn exit_code(result: &anyhow::Result<u64>) -> i32 {
        match result {
            Ok(_) => 0,
            Err(e) if e.downcast_ref::<ConfigError>().is_some() => EXIT_USAGE,
            Err(_) => EXIT_FAILURE,
        }
    }
}
