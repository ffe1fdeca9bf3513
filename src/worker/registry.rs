//! Child side of a process worker: task lookup and the serve loop

use super::protocol::{WorkerResponse, decode_request};
use crate::error::{Result, WorkerError};
use crate::options::{MULTITHREAD, Options};
use crate::task::{Collaborators, RunnableTask, Task, TaskHooks};
use serde_json::Value;
use std::collections::HashMap;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

type TaskFactory = Box<dyn Fn(Options) -> Box<dyn RunnableTask> + Send + Sync>;

/// Named task constructors available to a worker binary
#[derive(Default)]
pub struct TaskRegistry {
    factories: HashMap<String, TaskFactory>,
}

impl TaskRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task under `name`; `make_hooks` builds fresh hooks per request
    pub fn register<H, F>(&mut self, name: impl Into<String>, make_hooks: F) -> &mut Self
    where
        H: TaskHooks,
        F: Fn() -> H + Send + Sync + 'static,
    {
        let name = name.into();
        let task_name = name.clone();
        self.factories.insert(
            name,
            Box::new(move |options| {
                Box::new(Task::new(
                    task_name.clone(),
                    options,
                    make_hooks(),
                    Collaborators::default(),
                )) as Box<dyn RunnableTask>
            }),
        );
        self
    }

    /// Whether a task is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Build the named task with `options`
    pub fn build(&self, name: &str, options: Options) -> Result<Box<dyn RunnableTask>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| WorkerError::UnknownTask(name.to_string()))?;
        Ok(factory(options))
    }
}

/// Answer exactly one request read from `reader`, writing the reply to `writer`
///
/// Failures of the task itself are reported in the reply; only a missing or
/// unreadable request, or a broken `writer`, is returned as an error.
pub async fn serve<R, W>(registry: &TaskRegistry, reader: R, mut writer: W) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let line = lines
        .next_line()
        .await?
        .ok_or_else(|| WorkerError::Protocol("no request received".to_string()))?;

    let response = WorkerResponse::from_result(run_line(registry, &line).await);
    debug!(
        ok = matches!(response, WorkerResponse::Done { .. }),
        "worker request handled"
    );

    writer.write_all(response.encode().as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

/// [`serve`] over the process's stdin and stdout
pub async fn serve_stdio(registry: &TaskRegistry) -> Result<()> {
    serve(registry, tokio::io::stdin(), tokio::io::stdout()).await
}

async fn run_line(registry: &TaskRegistry, line: &str) -> Result<Value> {
    let request = decode_request(line)?;
    let mut options = request.options;
    // a worker never delegates further
    options.insert(MULTITHREAD, false);

    let task = registry.build(&request.task, options)?;
    info!(task = %task.name(), "running task in worker process");
    task.run().await
}
