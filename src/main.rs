//! Aurora packet replay tool
//!
//! Feeds a text packet capture through the client protocol core, one packet
//! per tick, and prints what the client sends back, the events it raises
//! and the resulting session.
//!
//! Usage:
//!   aurora-replay --capture <file> [--user <name>] [--password <pass>] [--config <file>]

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use aurora_client::config::ClientConfig;
use aurora_client::net::capture;
use aurora_client::net::transport::{self, ConnectionState};
use aurora_client::{Client, Credentials, VERSION};

/// Command line arguments
struct Args {
    capture: PathBuf,
    user: Option<String>,
    password: String,
    config: Option<PathBuf>,
}

fn print_help() {
    println!("aurora-replay {}", VERSION);
    println!();
    println!("Replays a packet capture through the client protocol core.");
    println!();
    println!("USAGE:");
    println!("    aurora-replay --capture <file> [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --capture <file>     Capture file, one '<opcode hex> <payload hex>' per line");
    println!("    -u, --user <name>        Submit the login form with this account first");
    println!("    -p, --password <pass>    Password for --user (default: empty)");
    println!("        --config <file>      Client configuration file");
    println!("    -h, --help               Print this help");
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = std::env::args().collect();

    let mut capture: Option<PathBuf> = None;
    let mut user: Option<String> = None;
    let mut password = String::new();
    let mut config: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--capture" | "-c" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --capture".to_string());
                }
                capture = Some(PathBuf::from(&args[i]));
            }
            "--user" | "-u" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --user".to_string());
                }
                user = Some(args[i].clone());
            }
            "--password" | "-p" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --password".to_string());
                }
                password = args[i].clone();
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --config".to_string());
                }
                config = Some(PathBuf::from(&args[i]));
            }
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            other => {
                return Err(format!("Unknown argument: {}", other));
            }
        }
        i += 1;
    }

    let capture = capture.ok_or_else(|| "Missing required argument --capture".to_string())?;

    Ok(Args {
        capture,
        user,
        password,
        config,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            process::exit(1);
        }
    };

    // Load configuration
    let config = match &args.config {
        Some(path) => ClientConfig::load_from(path).await?,
        None => ClientConfig::load().await?,
    };

    init_logging(&config);
    info!("Aurora replay v{}", VERSION);
    info!("Configuration loaded from: {}", config.config_path.display());

    let text = tokio::fs::read_to_string(&args.capture)
        .await
        .with_context(|| format!("Failed to read capture: {}", args.capture.display()))?;
    let packets = capture::parse_capture(&text)
        .with_context(|| format!("Failed to parse capture: {}", args.capture.display()))?;
    info!(packets = packets.len(), "Capture loaded");

    run_replay(&config, &args, packets);
    Ok(())
}

/// Initialize the logging/tracing system
fn init_logging(config: &ClientConfig) {
    let default_filter = if config.debug {
        "debug"
    } else {
        "info,aurora_client=debug"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    if config.json_logs {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_level(true)
            .init();
    }
}

/// Push every captured packet through the core, ticking after each one
fn run_replay(config: &ClientConfig, args: &Args, packets: Vec<aurora_client::net::Packet>) {
    let mut client = Client::new(config);
    let (mut transport, mut handle) = transport::channel();
    handle.set_state(ConnectionState::Connected);

    if let Some(user) = &args.user {
        client.begin_login(Credentials::new(user.clone(), args.password.clone()));
    }

    let mut handled = 0;
    let mut failed = 0;
    for packet in packets {
        println!("<< {}", capture::format_line(&packet));
        if let Err(e) = handle.push(packet) {
            warn!(error = %e, "Failed to queue packet");
            continue;
        }

        let report = client.tick(&mut transport);
        handled += report.handled();
        failed += report.failed();

        for outbound in handle.drain_outbound() {
            println!(">> {}", capture::format_line(&outbound));
        }
        for event in client.drain_events() {
            println!("!! {:?}", event);
        }
    }

    let session = client.session();
    println!();
    println!("Phase:      {}", session.phase());
    println!("Handled:    {}", handled);
    println!("Failed:     {}", failed);
    if session.is_logged_in() {
        println!("Account:    {}", session.account_name());
        println!("Session:    {:016X}", session.session_key());
        for server in session.servers() {
            println!("Server:     {} ({} channels)", server.name, server.channels.len());
        }
        for character in session.characters() {
            let kind = if character.is_pet() { "pet" } else { "character" };
            println!(
                "Character:  {} [{}] {:016X} on {}",
                character.name, kind, character.entity_id, character.server
            );
        }
    } else if let Some(message) = session.last_message() {
        println!("Message:    {}", message);
    }
}
