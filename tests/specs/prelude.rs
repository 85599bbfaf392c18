//! Shared helpers for CLI specs

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};

use tempfile::TempDir;

/// Upper bound for polling conditions in specs
pub const SPEC_WAIT_MAX_MS: u64 = 5000;

/// An isolated room directory with its own state and socket directories
pub struct Room {
    dir: TempDir,
    state: TempDir,
}

impl Room {
    /// A room with no settings file (all defaults)
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            state: TempDir::new().unwrap(),
        }
    }

    /// A room with the given `hubbub.toml`
    pub fn with_settings(settings: &str) -> Self {
        let room = Self::empty();
        room.file("hubbub.toml", settings);
        room
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Isolated XDG_STATE_HOME for this room's daemon
    pub fn state_path(&self) -> &Path {
        self.state.path()
    }

    /// Write a file relative to the room directory
    pub fn file(&self, rel: &str, content: &str) {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    /// Build an `hb` invocation scoped to this room
    pub fn hb(&self) -> CliBuilder {
        CliBuilder {
            cmd: self.command(),
        }
    }

    /// Start an `hb` invocation in the background, capturing its output
    pub fn spawn_hb(&self, args: &[&str]) -> Child {
        self.command()
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap()
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(binary("hb"));
        cmd.current_dir(self.dir.path())
            .env("HB_ROOM", self.dir.path())
            .env("XDG_STATE_HOME", self.state.path())
            .env("HB_SOCKET_DIR", self.state.path())
            .env("HB_DAEMON_BINARY", binary("hbd"))
            .env("HB_TIMEOUT_CONNECT_MS", "5000")
            .env_remove("RUST_LOG");
        cmd
    }
}

impl Drop for Room {
    fn drop(&mut self) {
        // Best effort: never leave a daemon behind
        let _ = self.command().args(["daemon", "stop"]).output();
    }
}

fn binary(name: &str) -> PathBuf {
    assert_cmd::cargo::cargo_bin(name)
}

/// Fluent wrapper around a CLI invocation
pub struct CliBuilder {
    cmd: Command,
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    /// Run and assert a zero exit code
    pub fn passes(mut self) -> RunAssert {
        let output = self.cmd.output().unwrap();
        let run = RunAssert { output };
        assert!(
            run.output.status.success(),
            "expected success, got {:?}\nstdout: {}\nstderr: {}",
            run.output.status,
            run.stdout(),
            run.stderr()
        );
        run
    }

    /// Run and assert a non-zero exit code
    pub fn fails(mut self) -> RunAssert {
        let output = self.cmd.output().unwrap();
        let run = RunAssert { output };
        assert!(
            !run.output.status.success(),
            "expected failure\nstdout: {}",
            run.stdout()
        );
        run
    }
}

/// Assertions over a finished invocation
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout does not contain {:?}\nstdout: {}",
            expected,
            stdout
        );
        self
    }

    pub fn stdout_lacks(self, unexpected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            !stdout.contains(unexpected),
            "stdout unexpectedly contains {:?}\nstdout: {}",
            unexpected,
            stdout
        );
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(expected),
            "stderr does not contain {:?}\nstderr: {}",
            expected,
            stderr
        );
        self
    }
}

/// Poll `condition` until it holds or `max_ms` elapses
pub fn wait_for(max_ms: u64, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < Duration::from_millis(max_ms) {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    false
}

/// Wait for a background `hb` process to exit and return its stdout
pub fn finish(mut child: Child) -> String {
    let exited = wait_for(SPEC_WAIT_MAX_MS, || matches!(child.try_wait(), Ok(Some(_))));
    if !exited {
        let _ = child.kill();
        panic!("background hb did not exit in time");
    }
    let output = child.wait_with_output().unwrap();
    String::from_utf8_lossy(&output.stdout).into_owned()
}
