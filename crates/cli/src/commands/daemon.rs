// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon management commands

use std::fmt;
use std::path::Path;

use anyhow::Result;
use clap::Subcommand;
use hb_daemon::lifecycle::Config;
use serde::Serialize;

use crate::client::{daemon_stop, ClientError, DaemonClient, DaemonStatus};
use crate::output::{self, OutputFormat};

#[derive(clap::Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the room daemon if it is not already running
    Start,
    /// Stop the room daemon
    Stop,
    /// Show the tail of the daemon log
    Logs {
        /// Number of lines to show
        #[arg(short = 'n', long, default_value = "50")]
        lines: usize,
    },
    /// Show daemon status
    Status {
        /// Output format
        #[arg(short = 'o', long, value_enum, default_value_t)]
        output: OutputFormat,
    },
}

#[derive(Serialize)]
struct StatusView {
    uptime_secs: u64,
    messages: usize,
    capacity: usize,
    waiters: usize,
    visitors: u64,
}

impl From<DaemonStatus> for StatusView {
    fn from(status: DaemonStatus) -> Self {
        Self {
            uptime_secs: status.uptime_secs,
            messages: status.messages,
            capacity: status.capacity,
            waiters: status.waiters,
            visitors: status.visitors,
        }
    }
}

impl fmt::Display for StatusView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Status: running")?;
        writeln!(f, "  Uptime: {}", format_uptime(self.uptime_secs))?;
        writeln!(f, "  Messages: {}/{}", self.messages, self.capacity)?;
        writeln!(f, "  Waiting polls: {}", self.waiters)?;
        write!(f, "  Visitors: {}", self.visitors)
    }
}

pub async fn handle(command: DaemonCommand, room_root: &Path) -> Result<()> {
    match command {
        DaemonCommand::Start => start(room_root).await,
        DaemonCommand::Stop => stop(room_root).await,
        DaemonCommand::Logs { lines } => logs(room_root, lines),
        DaemonCommand::Status { output } => status(room_root, output).await,
    }
}

fn logs(room_root: &Path, lines: usize) -> Result<()> {
    let config = Config::for_room(room_root)?;
    let content = match std::fs::read_to_string(&config.log_path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            println!("No log file at {}", config.log_path.display());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    for line in tail(&content, lines) {
        println!("{}", line);
    }
    Ok(())
}

/// The last `n` lines of `content`
fn tail(content: &str, n: usize) -> Vec<&str> {
    let all: Vec<&str> = content.lines().collect();
    all[all.len().saturating_sub(n)..].to_vec()
}

async fn start(room_root: &Path) -> Result<()> {
    if let Ok(client) = DaemonClient::connect(room_root) {
        if let Ok(version) = client.hello().await {
            println!("Daemon already running (version {})", version);
            return Ok(());
        }
    }

    let client = DaemonClient::connect_or_start(room_root.to_path_buf()).await?;
    let version = client.hello().await?;
    println!("Daemon started (version {})", version);
    Ok(())
}

async fn stop(room_root: &Path) -> Result<()> {
    if daemon_stop(room_root).await? {
        println!("Daemon stopped");
    } else {
        println!("Daemon not running");
    }
    Ok(())
}

async fn status(room_root: &Path, format: OutputFormat) -> Result<()> {
    let client = match DaemonClient::connect(room_root) {
        Ok(client) => client,
        Err(ClientError::DaemonNotRunning) => {
            println!("Daemon not running");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    match client.status().await {
        Ok(status) => output::print(&StatusView::from(status), format),
        // Socket file left behind by a daemon that died without cleanup
        Err(ClientError::Io(_)) => println!("Daemon not running"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn format_uptime(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}
