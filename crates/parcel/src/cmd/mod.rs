use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod receive;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one file to a receiver.
    Send(SendArgs),
    /// Accept connections and save incoming files.
    Receive(ReceiveArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format),
        Command::Receive(args) => receive::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Receiver address (host:port).
    pub addr: String,
    /// Local file to send.
    pub file: PathBuf,
    /// Destination path on the receiver. Default: the local file name.
    #[arg(long, short = 'r')]
    pub remote: Option<String>,
    /// Connect and per-operation socket timeout (e.g. 5s, 500ms).
    #[arg(long, default_value = "30s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct ReceiveArgs {
    /// Address to listen on (host:port).
    pub addr: String,
    /// Save files under this directory; reject paths that leave it.
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,
    /// Exit after N transfers have finished.
    #[arg(long)]
    pub count: Option<usize>,
    /// Abort a transfer whose sender is silent this long (e.g. 30s).
    #[arg(long)]
    pub timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `500ms`, `30s`, `2m`, or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    let unit_start = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (digits, unit) = input.split_at(unit_start);
    let invalid = || {
        CliError::new(
            USAGE,
            format!("invalid duration {input:?} (expected e.g. 500ms, 30s, 2m)"),
        )
    };

    let value: u64 = digits.parse().map_err(|_| invalid())?;
    let duration = match unit {
        "ms" => Duration::from_millis(value),
        "" | "s" => Duration::from_secs(value),
        "m" => Duration::from_secs(value.saturating_mul(60)),
        _ => return Err(invalid()),
    };

    if duration.is_zero() {
        return Err(CliError::new(USAGE, "timeout must be non-zero"));
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_with_units() {
        let cases = [
            ("150ms", Duration::from_millis(150)),
            ("30s", Duration::from_secs(30)),
            ("2m", Duration::from_secs(120)),
            (" 7 ", Duration::from_secs(7)),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_duration(input).unwrap(), expected, "{input}");
        }
    }

    #[test]
    fn malformed_or_zero_durations_are_usage_errors() {
        for input in ["", "0s", "0ms", "s", "1.5s", "5h", "-3"] {
            let err = parse_duration(input).unwrap_err();
            assert_eq!(err.code, USAGE, "{input}");
        }
    }
}
