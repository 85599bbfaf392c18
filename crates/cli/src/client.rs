// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use hb_core::{Cursor, Message};
use hb_daemon::lifecycle::{Config, LifecycleError};
use hb_daemon::protocol::{self, ProtocolError};
use hb_daemon::{Request, Response};
use thiserror::Error;
use tokio::net::UnixStream;
use tracing::debug;

// Timeout configuration (env vars in milliseconds)
fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Timeout for IPC requests (everything except polls, which may wait indefinitely)
pub fn timeout_ipc() -> Duration {
    parse_duration_ms("HB_TIMEOUT_IPC_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for daemon to start
pub fn timeout_connect() -> Duration {
    parse_duration_ms("HB_TIMEOUT_CONNECT_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for waiting for process to exit
pub fn timeout_exit() -> Duration {
    parse_duration_ms("HB_TIMEOUT_EXIT_MS").unwrap_or(Duration::from_secs(2))
}

/// Polling interval for retries
pub fn poll_interval() -> Duration {
    parse_duration_ms("HB_POLL_INTERVAL_MS").unwrap_or(Duration::from_millis(50))
}

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running")]
    DaemonNotRunning,

    #[error("Failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("Connection timeout waiting for daemon to start")]
    DaemonStartTimeout,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Unexpected response from daemon")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not locate room: {0}")]
    Room(#[from] LifecycleError),

    #[error("Could not determine room directory")]
    NoRoomRoot,
}

/// What the daemon answered to a publish
#[derive(Debug, Clone, PartialEq)]
pub enum Published {
    Message(Message),
    Redirect(String),
}

/// Daemon status summary
#[derive(Debug, Clone, PartialEq)]
pub struct DaemonStatus {
    pub uptime_secs: u64,
    pub messages: usize,
    pub capacity: usize,
    pub waiters: usize,
    pub visitors: u64,
}

/// Daemon client
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// Connect to daemon, auto-starting if not running
    pub async fn connect_or_start(room_root: PathBuf) -> Result<Self, ClientError> {
        let config = Config::for_room(&room_root)?;

        // Restart the daemon if it was built from a different version
        if let Ok(daemon_version) = std::fs::read_to_string(&config.version_path) {
            if daemon_version.trim() != env!("CARGO_PKG_VERSION") {
                debug!(
                    daemon_version = daemon_version.trim(),
                    "restarting daemon from another version"
                );
                let _ = daemon_stop(&room_root).await;
            }
        }

        match Self::connect(&room_root) {
            Ok(client) => Ok(client),
            Err(ClientError::DaemonNotRunning) => {
                debug!(room = %config.room_root.display(), "starting daemon");
                let child = start_daemon_background(&config.room_root)?;
                // Wait for socket with retry, watching for early exit
                Self::connect_with_retry(&config, timeout_connect(), child).await
            }
            Err(e) => Err(wrap_with_startup_error(e, &config)),
        }
    }

    /// Connect to existing daemon (no auto-start)
    pub fn connect(room_root: &Path) -> Result<Self, ClientError> {
        let config = Config::for_room(room_root)?;

        if !config.socket_path.exists() {
            return Err(ClientError::DaemonNotRunning);
        }

        Ok(Self {
            socket_path: config.socket_path,
        })
    }

    async fn connect_with_retry(
        config: &Config,
        timeout: Duration,
        mut child: std::process::Child,
    ) -> Result<Self, ClientError> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            // Check if daemon process exited early (startup failure)
            if let Ok(Some(status)) = child.try_wait() {
                // Poll for startup error in log (filesystem may need to sync)
                let poll_start = Instant::now();
                while poll_start.elapsed() < timeout_exit() {
                    if let Some(err) = read_startup_error(config) {
                        return Err(ClientError::DaemonStartFailed(err));
                    }
                    tokio::time::sleep(poll_interval()).await;
                }
                return Err(ClientError::DaemonStartFailed(format!(
                    "exited with {}",
                    status
                )));
            }

            match Self::connect(&config.room_root) {
                Ok(client) => return Ok(client),
                Err(ClientError::DaemonNotRunning) => {
                    tokio::time::sleep(poll_interval()).await;
                }
                Err(e) => return Err(wrap_with_startup_error(e, config)),
            }
        }

        // Timeout - check log for startup errors
        Err(wrap_with_startup_error(
            ClientError::DaemonStartTimeout,
            config,
        ))
    }

    /// Send a request; `read_timeout` of None waits for the response indefinitely
    async fn send_with_timeout(
        &self,
        request: Request,
        read_timeout: Option<Duration>,
        write_timeout: Duration,
    ) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        // Encode and send request with write timeout
        let data = protocol::encode(&request)?;
        tokio::time::timeout(write_timeout, protocol::write_message(&mut writer, &data))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        let response_bytes = match read_timeout {
            Some(timeout) => tokio::time::timeout(timeout, protocol::read_message(&mut reader))
                .await
                .map_err(|_| ProtocolError::Timeout)??,
            None => protocol::read_message(&mut reader).await?,
        };

        let response: Response = protocol::decode(&response_bytes)?;
        Ok(response)
    }

    /// Send a request and receive a response
    pub async fn send(&self, request: Request) -> Result<Response, ClientError> {
        self.send_with_timeout(request, Some(timeout_ipc()), timeout_ipc())
            .await
    }

    /// Get daemon version via Hello handshake
    pub async fn hello(&self) -> Result<String, ClientError> {
        match self
            .send(Request::Hello {
                version: env!("CARGO_PKG_VERSION").to_string(),
            })
            .await?
        {
            Response::Hello { version } => Ok(version),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Enter the room, returning (name, visitor number)
    pub async fn join(&self) -> Result<(String, u64), ClientError> {
        match self.send(Request::Join).await? {
            Response::Joined { name, visitor } => Ok((name, visitor)),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Publish a message
    pub async fn publish(
        &self,
        body: &str,
        author: Option<String>,
        next: Option<String>,
    ) -> Result<Published, ClientError> {
        match self
            .send(Request::Publish {
                body: body.to_string(),
                author,
                next,
            })
            .await?
        {
            Response::Message { message } => Ok(Published::Message(message)),
            Response::Redirect { location } => Ok(Published::Redirect(location)),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Long-poll for messages newer than `cursor`. Waits as long as it takes.
    pub async fn poll(&self, cursor: &Cursor) -> Result<Vec<Message>, ClientError> {
        let request = Request::Poll {
            cursor: cursor.clone(),
        };
        match self.send_with_timeout(request, None, timeout_ipc()).await? {
            Response::Messages { messages } => Ok(messages),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Everything currently in the room's log
    pub async fn history(&self) -> Result<Vec<Message>, ClientError> {
        match self.send(Request::History).await? {
            Response::Messages { messages } => Ok(messages),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Get daemon status
    pub async fn status(&self) -> Result<DaemonStatus, ClientError> {
        match self.send(Request::Status).await? {
            Response::Status {
                uptime_secs,
                messages,
                capacity,
                waiters,
                visitors,
            } => Ok(DaemonStatus {
                uptime_secs,
                messages,
                capacity,
                waiters,
                visitors,
            }),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// Request daemon shutdown
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send(Request::Shutdown).await? {
            Response::Ok | Response::ShuttingDown => Ok(()),
            Response::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }
}

/// Start the daemon in the background, returning the child process handle
fn start_daemon_background(room_root: &Path) -> Result<std::process::Child, ClientError> {
    let hbd_path = find_hbd_binary();

    Command::new(&hbd_path)
        .arg(room_root)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(e.to_string()))
}

/// Stop the daemon (graceful first, then forceful)
/// Returns true if daemon was stopped, false if it wasn't running
pub async fn daemon_stop(room_root: &Path) -> Result<bool, ClientError> {
    let config = Config::for_room(room_root)?;
    let client = match DaemonClient::connect(room_root) {
        Ok(c) => c,
        Err(ClientError::DaemonNotRunning) => {
            cleanup_stale_pid(&config);
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    // Try graceful shutdown (timeout handled by send())
    let shutdown_result = client.shutdown().await;

    if let Some(pid) = read_daemon_pid(&config) {
        if shutdown_result.is_ok() {
            // Graceful shutdown succeeded, wait for process to exit
            wait_for_exit(pid, timeout_exit()).await;
        }

        // Force kill if still running
        if process_exists(pid) {
            force_kill_daemon(pid);
            wait_for_exit(pid, timeout_exit()).await;
        }
    }

    cleanup_stale_pid(&config);
    Ok(true)
}

/// Wait for a process to exit
async fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if !process_exists(pid) {
            return true;
        }
        tokio::time::sleep(poll_interval()).await;
    }
    false
}

/// Find the hbd binary
fn find_hbd_binary() -> PathBuf {
    // Explicit override (used by tests to ensure correct binary)
    if let Ok(path) = std::env::var("HB_DAEMON_BINARY") {
        return PathBuf::from(path);
    }

    // Check current executable's directory
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("hbd");
            if sibling.exists() {
                return sibling;
            }
        }
    }

    // Fall back to PATH lookup
    PathBuf::from("hbd")
}

/// Find the room root by walking up from current directory
///
/// Checks HB_ROOM env var first, then walks up looking for hubbub.toml.
pub fn find_room_root() -> Result<PathBuf, ClientError> {
    if let Ok(root) = std::env::var("HB_ROOM") {
        return Ok(PathBuf::from(root));
    }

    let mut current = std::env::current_dir().map_err(|_| ClientError::NoRoomRoot)?;

    loop {
        if current.join(hb_core::SETTINGS_FILE).is_file() {
            return Ok(current);
        }
        if !current.pop() {
            // No settings file found, the current directory is the room
            return std::env::current_dir().map_err(|_| ClientError::NoRoomRoot);
        }
    }
}

/// Remove an orphaned PID file left by a daemon that is no longer running
fn cleanup_stale_pid(config: &Config) {
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

/// Get the PID from the daemon PID file, if it exists
pub fn read_daemon_pid(config: &Config) -> Option<u32> {
    std::fs::read_to_string(&config.lock_path)
        .ok()
        .and_then(|content| content.trim().parse::<u32>().ok())
}

/// Check if a process with the given PID exists
pub fn process_exists(pid: u32) -> bool {
    // Use kill -0 to check if process exists without sending a signal
    Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Force kill a daemon process
pub fn force_kill_daemon(pid: u32) -> bool {
    Command::new("kill")
        .args(["-9", &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Startup marker prefix that daemon writes to log before anything else.
/// Full format: "--- hbd: starting (pid: 12345) ---"
const STARTUP_MARKER_PREFIX: &str = "--- hbd: starting (pid: ";

/// Read daemon log from the last startup marker, looking for errors.
pub fn read_startup_error(config: &Config) -> Option<String> {
    let content = std::fs::read_to_string(&config.log_path).ok()?;
    startup_error_from_log(&content)
}

fn startup_error_from_log(content: &str) -> Option<String> {
    // Find the last startup marker
    let start_pos = content.rfind(STARTUP_MARKER_PREFIX)?;
    let startup_log = &content[start_pos..];

    let errors: Vec<&str> = startup_log
        .lines()
        .filter(|line| line.contains(" ERROR ") || line.contains("Failed to start"))
        .collect();

    if errors.is_empty() {
        return None;
    }

    // Format: "timestamp LEVEL target: message" - keep the message part
    let error_messages: Vec<String> = errors
        .iter()
        .filter_map(|line| line.split_once(": ").map(|(_, msg)| msg.to_string()))
        .collect();

    if error_messages.is_empty() {
        Some(errors.join("\n"))
    } else {
        Some(error_messages.join("\n"))
    }
}

/// Wrap an error with startup log info if available.
fn wrap_with_startup_error(err: ClientError, config: &Config) -> ClientError {
    // Don't double-wrap
    if matches!(err, ClientError::DaemonStartFailed(_)) {
        return err;
    }

    match read_startup_error(config) {
        Some(startup_error) => ClientError::DaemonStartFailed(startup_error),
        None => err,
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
