//! Process-backed worker using an external worker binary

use super::protocol::{WorkerRequest, decode_response, encode_request};
use super::{WorkerHandle, WorkerSpawner};
use crate::error::{Result, WorkerError};
use crate::options::Options;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Spawns [`ProcessWorker`]s running `<program> <args..> <task name>`
///
/// # Examples
///
/// ```no_run
/// use taskkit::worker::ProcessSpawner;
/// use std::path::PathBuf;
///
/// // Explicit binary with extra arguments
/// let spawner = ProcessSpawner::new(PathBuf::from("/usr/local/bin/pipeline-worker"))
///     .arg("--quiet");
///
/// // Or auto-discover from PATH
/// let spawner = ProcessSpawner::from_path("pipeline-worker")
///     .expect("pipeline-worker not found in PATH");
/// ```
#[derive(Debug, Clone)]
pub struct ProcessSpawner {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessSpawner {
    /// Create a spawner for an explicit worker binary
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Attempt to find the worker binary in PATH
    ///
    /// Returns `None` if the binary cannot be found.
    pub fn from_path(binary: &str) -> Option<Self> {
        which::which(binary).ok().map(Self::new)
    }

    /// Append an argument placed before the task name
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Worker binary path
    pub fn program(&self) -> &PathBuf {
        &self.program
    }
}

impl WorkerSpawner for ProcessSpawner {
    fn spawn(&self, task: &str) -> Result<Box<dyn WorkerHandle>> {
        Ok(Box::new(ProcessWorker {
            program: self.program.clone(),
            args: self.args.clone(),
            task: task.to_string(),
        }))
    }
}

/// One child process running one pass of a task
///
/// The request goes to the child's stdin as a single JSON line; the last
/// non-empty line on its stdout is the reply. The child is killed if the
/// round trip is abandoned.
#[derive(Debug)]
pub struct ProcessWorker {
    program: PathBuf,
    args: Vec<String>,
    task: String,
}

#[async_trait]
impl WorkerHandle for ProcessWorker {
    async fn round_trip(self: Box<Self>, options: Options) -> Result<Value> {
        let request = encode_request(&WorkerRequest {
            task: self.task.clone(),
            options,
        })?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(&self.task)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| WorkerError::Spawn {
                task: self.task.clone(),
                reason: format!("failed to execute {}: {}", self.program.display(), e),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            let sent = async {
                stdin.write_all(request.as_bytes()).await?;
                stdin.write_all(b"\n").await?;
                stdin.flush().await
            }
            .await;
            match sent {
                Ok(()) => {}
                // the child stopped reading; its exit status tells the rest
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    debug!(task = %self.task, "worker closed stdin before reading the request");
                }
                Err(e) => return Err(e.into()),
            }
            // dropping stdin closes it
        }

        let output = child.wait_with_output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let reply = stdout.lines().rev().find(|line| !line.trim().is_empty());

        match reply {
            Some(line) => decode_response(line)?.into_result(&self.task),
            None if !output.status.success() => Err(WorkerError::Failed {
                task: self.task.clone(),
                message: format!("worker exited with {}", output.status),
            }
            .into()),
            None => Err(WorkerError::ChannelClosed {
                task: self.task.clone(),
            }
            .into()),
        }
    }
}
