use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use sonos_api::SonosClient;
use sonos_discovery::DiscoveryOptions;
use sonos_nodeserver::harness::{dispatch, Inbound, StdioHost};
use sonos_nodeserver::logging::{init_logging, init_logging_from_env, LoggingMode};
use sonos_nodeserver::{Controller, CustomParams, PollKind, SonosConnector, SonosNetwork};
use tracing::{debug, info, warn};

/// Sonos node server
///
/// Speaks a JSON-lines host protocol: node registrations, driver updates and
/// notices go to stdout; commands, custom parameters and discover/query
/// requests are read from stdin. Logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "sonos-nodeserver")]
#[command(version)]
pub struct Args {
    /// JSON object of custom parameters to start with
    #[arg(short, long)]
    pub params: Option<PathBuf>,

    /// Seconds between short polls (driver refresh)
    #[arg(long, default_value = "10")]
    pub short_poll: u64,

    /// Seconds between long polls
    #[arg(long, default_value = "30")]
    pub long_poll: u64,

    /// Seconds a discovery pass listens for speakers
    #[arg(short = 'd', long, default_value = "5")]
    pub discovery_timeout: u64,

    /// silent, development, debug or json (default: SONOS_LOG_MODE, else development)
    #[arg(long)]
    pub log_mode: Option<LoggingMode>,
}

enum Event {
    Inbound(Inbound),
    Shutdown,
}

/// Schedule of one poll kind
struct Ticker {
    kind: PollKind,
    every: Duration,
    next: Instant,
}

impl Ticker {
    fn new(kind: PollKind, every: Duration, now: Instant) -> Self {
        Self { kind, every, next: now + every }
    }

    /// Whether the tick is due, advancing the schedule if so
    fn fire(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }
        self.next = now + self.every;
        true
    }
}

fn load_params(path: Option<&PathBuf>) -> Result<CustomParams> {
    let Some(path) = path else {
        return Ok(CustomParams::new());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read custom parameters from {}", path.display()))?;
    CustomParams::from_json(&json).with_context(|| format!("Invalid custom parameters in {}", path.display()))
}

/// Forward parsed stdin lines; EOF means shutdown
fn spawn_reader(tx: mpsc::Sender<Event>) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new().name("stdin-reader".to_string()).spawn(move || {
        for line in io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match Inbound::parse(&line) {
                Ok(message) => {
                    if tx.send(Event::Inbound(message)).is_err() {
                        return;
                    }
                }
                Err(e) => warn!(error = %e, line = %line, "Ignoring malformed input"),
            }
        }
        debug!("stdin closed");
        let _ = tx.send(Event::Shutdown);
    })
}

fn main() -> Result<()> {
    let args = Args::parse();

    let logging = match args.log_mode {
        Some(mode) => init_logging(mode),
        None => init_logging_from_env(),
    };
    logging.context("Failed to initialize logging")?;

    let params = load_params(args.params.as_ref())?;

    let client = SonosClient::new();
    let network = SonosNetwork::with_options(
        DiscoveryOptions::default().with_timeout(Duration::from_secs(args.discovery_timeout)),
        client.clone(),
    );
    let mut controller = Controller::new(Box::new(network), Box::new(SonosConnector::with_client(client)));
    controller.on_custom_params(params);

    let (tx, rx) = mpsc::channel();
    let ctrlc_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = ctrlc_tx.send(Event::Shutdown);
    })
    .context("Failed to install Ctrl-C handler")?;
    spawn_reader(tx).context("Failed to start stdin reader")?;

    let mut host = StdioHost::new(io::stdout());
    controller.start(&mut host);

    let now = Instant::now();
    let mut tickers = [
        Ticker::new(PollKind::ShortPoll, Duration::from_secs(args.short_poll.max(1)), now),
        Ticker::new(PollKind::LongPoll, Duration::from_secs(args.long_poll.max(1)), now),
    ];

    loop {
        let now = Instant::now();
        let next = tickers.iter().map(|t| t.next).min().unwrap_or(now);

        match rx.recv_timeout(next.saturating_duration_since(now)) {
            Ok(Event::Inbound(message)) => dispatch(&mut controller, message, &mut host),
            Ok(Event::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        // a busy stdin must not starve the polls
        let now = Instant::now();
        for ticker in tickers.iter_mut() {
            if ticker.fire(now) {
                controller.on_poll(ticker.kind, &mut host);
            }
        }
    }

    info!("Sonos NodeServer stopped");
    Ok(())
}
