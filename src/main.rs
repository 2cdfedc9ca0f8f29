//! wscat binary entry point.
//!
//! Parses arguments, sets up logging on stderr, connects and bridges the
//! session to stdin/stdout. Exit code is `0` on a clean end-of-stream and
//! `1` on any failure.

// ============================================================================
// Imports
// ============================================================================

use std::process::ExitCode;

use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use tokio::runtime::Builder;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use wscat::{ClientConfig, Framing, MessageKind, Origin, Result};

// ============================================================================
// Types
// ============================================================================

/// Connect to a WebSocket endpoint and bridge it to stdin/stdout.
#[derive(Parser, Debug)]
#[command(name = "wscat", version, about)]
struct Args {
    /// Target URL (ws://, wss://, http:// or https://).
    url: String,

    /// Origin header value, or `samehost` to use `//host:port` of the target.
    #[arg(short, long, env = "WSCAT_ORIGIN", default_value = wscat::SAME_HOST)]
    origin: Origin,

    /// Extra request header as `Name: value`; repeatable.
    #[arg(short = 'H', long = "header", env = "WSCAT_HEADERS", value_delimiter = '\n')]
    headers: Vec<String>,

    /// Skip TLS certificate validation.
    #[arg(short = 'k', long, env = "WSCAT_INSECURE")]
    insecure: bool,

    /// How stdin is cut into outbound messages.
    #[arg(long, env = "WSCAT_FRAMING", value_enum, default_value_t = Framing::Line)]
    framing: Framing,

    /// Send text messages instead of binary ones.
    #[arg(long, env = "WSCAT_TEXT")]
    text: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// Builds arguments from matches.
    ///
    /// `WSCAT_HEADERS` is split on newlines, so blank pieces from a trailing
    /// newline are dropped there. Blank `-H` values are kept and rejected later.
    fn from_matches(matches: &ArgMatches) -> clap::error::Result<Self> {
        let mut args = Self::from_arg_matches(matches)?;
        if matches.value_source("headers") == Some(ValueSource::EnvVariable) {
            args.headers.retain(|h| !h.trim().is_empty());
        }
        Ok(args)
    }

    /// Converts parsed arguments into a client configuration.
    fn config(&self) -> Result<ClientConfig> {
        let kind = if self.text {
            MessageKind::Text
        } else {
            MessageKind::Binary
        };

        ClientConfig::builder()
            .url(self.url.as_str())
            .headers(self.headers.iter().cloned())
            .origin(self.origin.clone())
            .insecure(self.insecure)
            .framing(self.framing)
            .message_kind(kind)
            .build()
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging on stderr.
///
/// `RUST_LOG` takes precedence over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "wscat=warn",
        1 => "wscat=info",
        2 => "wscat=debug",
        _ => "wscat=trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Connects and relays until either direction ends.
async fn run(args: Args) -> Result<()> {
    let config = args.config()?;
    let session = config.connect().await?;

    info!(url = %session.target(), "Bridging stdin/stdout");

    let ended = session
        .run(tokio::io::stdin(), tokio::io::stdout())
        .await?;

    info!(direction = %ended, "Session finished");
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() -> ExitCode {
    let matches = Args::command().get_matches();
    let args = Args::from_matches(&matches).unwrap_or_else(|e| e.exit());
    init_logging(args.verbose);

    let runtime = match Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    let result = runtime.block_on(run(args));

    // The relay direction that did not finish may be parked on a blocking
    // stdin read; do not wait for it.
    runtime.shutdown_background();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_setup_error() => {
            error!(status = ?e.handshake_status(), "Could not establish session: {e}");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
