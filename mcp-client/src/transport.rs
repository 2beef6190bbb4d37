//! Child process transport (spec §4.2).
//!
//! Owns the spawned process and its three pipes. stdin/stdout carry the
//! JSON-RPC frames; stderr is drained into a small ring buffer so it never
//! blocks the child on a full pipe, and so a few diagnostic lines survive a
//! startup failure without requiring a full log pipeline.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::process::Child;
use tokio::process::ChildStdin;
use tokio::process::ChildStdout;
use tokio::process::Command;
use tokio::sync::Mutex;

use crate::error::Error;

/// Grace period `shutdown` waits for the child to exit before force-killing it.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Cap on how many trailing stderr lines are retained for diagnostics.
const STDERR_TAIL_LINES: usize = 32;

/// Shared, bounded tail of the child's stderr output.
#[derive(Clone, Default)]
pub struct StderrTail(Arc<Mutex<VecDeque<String>>>);

impl StderrTail {
    /// Join the retained lines into one diagnostic string, newest last.
    pub async fn snapshot(&self) -> String {
        self.0.lock().await.iter().cloned().collect::<Vec<_>>().join("\n")
    }

    async fn push(&self, line: String) {
        let mut lines = self.0.lock().await;
        if lines.len() == STDERR_TAIL_LINES {
            lines.pop_front();
        }
        lines.push_back(line);
    }
}

pub struct ChildTransport {
    child: Child,
    pub stdin: Option<ChildStdin>,
    pub stdout: Option<ChildStdout>,
    pub stderr_tail: StderrTail,
}

impl ChildTransport {
    /// Spawn `command` with `args`, resolved via PATH lookup, with
    /// `env_overlay` layered on top of the inherited environment (overlay
    /// wins on key conflict).
    pub async fn spawn(
        command: &str,
        args: &[String],
        env_overlay: &HashMap<String, String>,
    ) -> Result<Self, Error> {
        let mut cmd = Command::new(command);
        cmd.args(args);
        cmd.envs(env_overlay);
        cmd.stdin(std::process::Stdio::piped());
        cmd.stdout(std::process::Stdio::piped());
        cmd.stderr(std::process::Stdio::piped());
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| Error::Process {
            message: format!("failed to spawn '{command}'"),
            source: Some(e),
        })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let stderr_tail = StderrTail::default();
        if let Some(stderr) = stderr {
            let tail = stderr_tail.clone();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    tracing::debug!(line = %line, "child stderr");
                    tail.push(line).await;
                }
            });
        }

        Ok(Self {
            child,
            stdin,
            stdout,
            stderr_tail,
        })
    }

    /// Signal the child to terminate, wait a bounded grace period, then
    /// force-kill. Idempotent: calling this on an already-exited child is a
    /// no-op beyond the wait.
    pub async fn shutdown(&mut self) {
        // Closing stdin is usually enough for a well-behaved MCP server to
        // notice EOF and exit on its own.
        drop(self.stdin.take());

        match tokio::time::timeout(SHUTDOWN_GRACE, self.child.wait()).await {
            Ok(_) => {}
            Err(_) => {
                if let Err(e) = self.child.start_kill() {
                    tracing::warn!(error = %e, "failed to force-kill child after grace period");
                }
                let _ = self.child.wait().await;
            }
        }
    }
}

impl Drop for ChildTransport {
    fn drop(&mut self) {
        // kill_on_drop(true) on the Command already arms this, but reaping
        // eagerly avoids leaving a zombie around until the runtime gets to it.
        let _ = self.child.try_wait();
    }
}
