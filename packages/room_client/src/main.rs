//! `roomchat` — log in to the chat backend and talk in the assigned room.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use room_client::auth::AuthClient;
use room_client::channel::{ChannelEvent, SessionChannel};
use room_client::config::ClientConfig;
use room_client::protocol::InboundFrame;

#[derive(Parser)]
#[command(name = "roomchat")]
#[command(about = "Token-authenticated chat room client")]
struct Cli {
    /// Path to a config.toml (defaults + ROOMCHAT_* env vars apply either way)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL, overriding the config file
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new account
    Register(Credentials),

    /// Log in and join the room the server assigns
    Chat(Credentials),
}

#[derive(clap::Args)]
struct Credentials {
    #[arg(short, long)]
    username: String,

    #[arg(short, long)]
    password: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match cli.server {
        Some(server) => ClientConfig::for_server(server),
        None => ClientConfig::load(cli.config.as_deref())
            .context("failed to load configuration")?,
    };

    match cli.command {
        Commands::Register(creds) => {
            AuthClient::new(&config)
                .register(&creds.username, &creds.password)
                .await
                .context("registration failed")?;
            eprintln!(
                "Registered '{}'. You can now run `roomchat chat`.",
                creds.username
            );
            Ok(())
        }
        Commands::Chat(creds) => chat_command(&config, &creds).await,
    }
}

/// Login, open the channel, then relay between stdin and the room until
/// either side goes away.
async fn chat_command(config: &ClientConfig, creds: &Credentials) -> Result<()> {
    let token = AuthClient::new(config)
        .login(&creds.username, &creds.password)
        .await
        .context("login failed")?;

    let (channel, mut events) = SessionChannel::open(config, &token);
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    eprintln!("Connecting...");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(ChannelEvent::Opened) => {
                    eprintln!("Connected. Type a message and press enter; Ctrl-D to leave.");
                }
                Some(ChannelEvent::Frame(InboundFrame::RoomAssignment { room_id })) => {
                    eprintln!("Room: {room_id}");
                }
                Some(ChannelEvent::Frame(InboundFrame::Chat(msg))) => {
                    println!("{}: {}", msg.sender, msg.message);
                }
                Some(ChannelEvent::Frame(InboundFrame::Malformed)) => {}
                Some(ChannelEvent::Closed) | None => {
                    eprintln!("Disconnected.");
                    break;
                }
            },
            line = stdin.next_line() => match line {
                // Blank lines are swallowed by the send gate.
                Ok(Some(line)) => channel.send(&line).await,
                Ok(None) | Err(_) => break,
            },
        }
    }

    channel.close().await;
    Ok(())
}
