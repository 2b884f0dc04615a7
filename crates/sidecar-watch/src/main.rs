use clap::Parser;
use sidecar_client::connection::ConnEventKind;
use sidecar_client::session::{Session, SessionUpdate, STATUS_TICK};
use sidecar_client::status::Severity;
use sidecar_client::ClientError;
use sidecar_core::wire::Action;
use sidecar_core::CategoryRegistry;
use std::io;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEVEL_URL: &str = "ws://localhost:10000/";
const PRODUCTION_URL: &str = "wss://r2lab-sidecar.inria.fr:443/";

#[derive(Parser, Debug)]
#[command(name = "sidecar-watch", about = "terminal dashboard for a sidecar relay")]
struct Args {
    /// Relay endpoint; defaults to the devel relay.
    #[arg(long, default_value = DEVEL_URL)]
    url: String,
    /// Shorthand for the production relay endpoint.
    #[arg(long, default_value_t = false)]
    production: bool,
    /// Issue a refresh request for every category once connected.
    #[arg(long, default_value_t = false)]
    refresh_on_connect: bool,
    #[arg(long, default_value_t = false)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    let url = if args.production {
        PRODUCTION_URL.to_string()
    } else {
        args.url.clone()
    };

    let (mut session, updates) = Session::new(CategoryRegistry::sidecar_default());
    info!(%url, "sidecar-watch starting");
    session.connect(&url);

    run_dashboard(&mut session, updates, args.refresh_on_connect).await;

    session.disconnect();
    info!("sidecar-watch exiting");
}

async fn run_dashboard(
    session: &mut Session,
    mut updates: mpsc::UnboundedReceiver<SessionUpdate>,
    refresh_on_connect: bool,
) {
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(STATUS_TICK);
    let mut last_banner = String::new();
    let mut refresh_pending = refresh_on_connect;

    println!("commands: request <category> | publish <category> <action> <json> |");
    println!("          history <category> | clear [category] | connect <url> |");
    println!("          disconnect | status | quit");

    loop {
        tokio::select! {
            event = session.next_event() => match event {
                Some(event) => session.handle_event(event),
                None => break,
            },
            update = updates.recv() => match update {
                Some(SessionUpdate::Status(status)) => {
                    if status.label != last_banner {
                        last_banner = status.label.clone();
                        println!("[{}] {}", severity_tag(status.severity), status.label);
                    }
                    if refresh_pending && status.severity == Severity::Normal {
                        refresh_pending = false;
                        refresh_all(session);
                    }
                }
                Some(SessionUpdate::Category { category, payload }) => {
                    println!("<{category}> {payload}");
                }
                None => break,
            },
            _ = ticker.tick() => session.poll_status(),
            line = stdin.next_line() => match line {
                Ok(Some(line)) => {
                    if !handle_command(session, line.trim()) {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!("stdin error: {err}");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
}

fn refresh_all(session: &mut Session) {
    let categories: Vec<String> = session
        .registry()
        .names()
        .into_iter()
        .map(str::to_string)
        .collect();
    for category in categories {
        if let Err(err) = session.request_refresh(&category) {
            warn!(%category, "refresh failed: {err}");
        }
    }
}

/// Returns false when the operator asked to quit.
fn handle_command(session: &mut Session, line: &str) -> bool {
    if line.is_empty() {
        return true;
    }
    let mut parts = line.splitn(4, ' ');
    let verb = parts.next().unwrap_or("");
    match verb {
        "quit" | "exit" => return false,
        "status" => {
            session.poll_status();
        }
        "connect" => match parts.next() {
            Some(url) => session.connect(url),
            None => eprintln!("usage: connect <url>"),
        },
        "disconnect" => session.disconnect(),
        "request" => match parts.next() {
            Some(category) => report_outcome(session.request_refresh(category)),
            None => eprintln!("usage: request <category>"),
        },
        "publish" => {
            let category = parts.next();
            let action = parts.next().and_then(parse_action);
            let payload = parts.next();
            match (category, action, payload) {
                (Some(category), Some(action), Some(payload)) => {
                    report_outcome(session.publish(category, action, payload));
                }
                _ => eprintln!("usage: publish <category> request|info <json>"),
            }
        }
        "history" => match parts.next() {
            Some(category) => {
                let entries = session.history(category);
                if entries.is_empty() {
                    println!("<{category}> history empty");
                }
                for entry in entries {
                    println!("{} <{}> {}", entry.at.to_rfc3339(), entry.category, entry.payload);
                }
            }
            None => eprintln!("usage: history <category>"),
        },
        "clear" => {
            session.clear_history(parts.next());
            println!("history cleared");
        }
        // lets an operator simulate an inbound frame, mostly for debugging
        "inject" => {
            let generation = session.generation();
            let rest = line.trim_start_matches("inject").trim().to_string();
            let _ = session.events_sender().send(sidecar_client::ConnEvent {
                generation,
                kind: ConnEventKind::Frame(rest),
            });
        }
        other => eprintln!("unknown command: {other}"),
    }
    true
}

fn parse_action(text: &str) -> Option<Action> {
    match text {
        "request" => Some(Action::Request),
        "info" => Some(Action::Info),
        _ => None,
    }
}

fn report_outcome(result: Result<(), ClientError>) {
    if let Err(err) = result {
        eprintln!("rejected: {err}");
    }
}

fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Neutral => " . ",
        Severity::Caution => " ? ",
        Severity::Normal => " ok",
        Severity::Alarm => "!! ",
    }
}

fn init_logging(debug: bool) {
    let level = if debug {
        "debug".to_string()
    } else if let Ok(level) = std::env::var("SIDECAR_LOG_LEVEL") {
        level
    } else {
        "info".to_string()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
