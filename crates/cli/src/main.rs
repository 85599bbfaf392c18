// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hb - Hubbub chat CLI

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{chat, daemon};
use std::path::PathBuf;

use crate::client::{find_room_root, DaemonClient};

#[derive(Parser)]
#[command(name = "hb", version, about = "Hubbub - long-poll chat rooms")]
struct Cli {
    /// Room directory
    #[arg(long, global = true)]
    room: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Daemon management
    Daemon(daemon::DaemonArgs),
    /// Enter the room and get a pseudo-identity
    Join,
    /// Publish a message
    Say(chat::SayArgs),
    /// Wait for new messages and print them as they arrive
    Listen(chat::ListenArgs),
    /// Print every message currently held by the room
    History(chat::HistoryArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();

    let cli = Cli::parse();
    let room_root = cli.room.map_or_else(find_room_root, Ok)?;

    // Handle daemon command separately (doesn't need an auto-started daemon)
    if let Commands::Daemon(args) = cli.command {
        return daemon::handle(args.command, &room_root).await;
    }

    // All other commands go through the daemon
    let client = DaemonClient::connect_or_start(room_root).await?;

    match cli.command {
        Commands::Join => chat::join(&client).await?,
        Commands::Say(args) => chat::say(&client, args).await?,
        Commands::Listen(args) => chat::listen(&client, args).await?,
        Commands::History(args) => chat::history(&client, args).await?,
        Commands::Daemon(_) => unreachable!(),
    }

    Ok(())
}

fn setup_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
