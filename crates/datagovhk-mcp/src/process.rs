//! Lifecycle of a locally spawned MCP server.
//!
//! The server is started with piped stdio, watched on stderr until it prints
//! a readiness marker, and stopped by closing its stdin (the server's request
//! to shut down) followed by a kill once the grace period runs out.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStderr, ChildStdin, Command};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::{McpError, Result};

/// How long a single readiness poll waits for a stderr line.
pub const READY_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Program and arguments used to start a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCommand {
    /// Executable name or path.
    pub program: String,
    /// Arguments passed to the executable.
    pub args: Vec<String>,
}

impl ServerCommand {
    /// Create a command with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add several arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Split a shell-like command line on whitespace.
    ///
    /// Returns `None` for a blank line. Quoting is not interpreted.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let program = parts.next()?;
        Some(Self::new(program).with_args(parts))
    }
}

impl std::fmt::Display for ServerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Where a spawned server is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Spawned, readiness not yet observed.
    Starting,
    /// Readiness marker seen on stderr.
    Ready,
    /// Stopped and reaped.
    Terminated,
}

/// A server child process owned by the client for one invocation.
pub struct ServerProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    stderr: Option<Lines<BufReader<ChildStderr>>>,
    drain: Option<JoinHandle<()>>,
    state: ProcessState,
    command: ServerCommand,
}

impl ServerProcess {
    /// Start the server with piped stdio and the current environment.
    pub fn spawn(command: &ServerCommand) -> Result<Self> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| McpError::spawn_failed(format!("{}: {}", command.program, e)))?;

        let stdin = child.stdin.take();
        let stderr = child
            .stderr
            .take()
            .map(|stderr| BufReader::new(stderr).lines());

        tracing::info!(command = %command, pid = ?child.id(), "spawned MCP server");

        Ok(Self {
            child,
            stdin,
            stderr,
            drain: None,
            state: ProcessState::Starting,
            command: command.clone(),
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// OS process id, while the child is running.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Watch stderr until a line containing `marker` (case-insensitive) appears.
    ///
    /// Returns `false` when `timeout` elapses or stderr closes first; the
    /// caller decides whether to proceed anyway. Either way the remaining
    /// stderr output is forwarded to the debug log from then on.
    pub async fn wait_ready(&mut self, marker: &str, timeout: Duration) -> bool {
        let Some(mut lines) = self.stderr.take() else {
            return self.state == ProcessState::Ready;
        };

        let marker = marker.to_lowercase();
        let deadline = Instant::now() + timeout;

        let ready = loop {
            let now = Instant::now();
            if now >= deadline {
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    "server did not report readiness in time, proceeding anyway"
                );
                break false;
            }

            let wait = (deadline - now).min(READY_POLL_INTERVAL);
            match tokio::time::timeout(wait, lines.next_line()).await {
                Ok(Ok(Some(line))) => {
                    tracing::debug!(target: "datagovhk::server_stderr", "{}", line);
                    if line.to_lowercase().contains(&marker) {
                        break true;
                    }
                }
                Ok(Ok(None)) => {
                    let status = self.child.try_wait().ok().flatten();
                    tracing::warn!(exit_status = ?status, "server closed stderr before reporting readiness");
                    break false;
                }
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "failed to read server stderr");
                    break false;
                }
                Err(_) => continue,
            }
        };

        if ready {
            tracing::info!(command = %self.command, "MCP server is ready");
            self.state = ProcessState::Ready;
        }

        self.drain = Some(tokio::spawn(async move {
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::debug!(target: "datagovhk::server_stderr", "{}", line);
            }
        }));

        ready
    }

    /// Stop the server.
    ///
    /// Closes stdin, waits up to `grace` for the process to exit, then kills
    /// it. Calling this on a terminated process is a no-op.
    pub async fn terminate(&mut self, grace: Duration) -> Result<Option<ExitStatus>> {
        if self.state == ProcessState::Terminated {
            return Ok(None);
        }

        drop(self.stdin.take());

        let status = match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(status) => Some(status?),
            Err(_) => {
                tracing::warn!(
                    grace_secs = grace.as_secs(),
                    "server did not exit after shutdown request, killing"
                );
                self.child.kill().await?;
                self.child.try_wait()?
            }
        };

        if let Some(drain) = self.drain.take() {
            drain.abort();
        }
        self.state = ProcessState::Terminated;

        tracing::debug!(exit_status = ?status, "MCP server terminated");
        Ok(status)
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        if let Some(drain) = self.drain.take() {
            drain.abort();
        }
    }
}
