//! Thread-backed worker

use super::WorkerHandle;
use super::protocol::{
    WorkerRequest, WorkerResponse, decode_request, decode_response, encode_request,
};
use crate::error::{Result, WorkerError};
use crate::logging::Logger;
use crate::options::Options;
use crate::task::{Task, TaskHooks};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;

/// Runs one pass of a task on a dedicated OS thread
///
/// The thread gets its own current-thread tokio runtime. Options travel to it,
/// and the result back, as encoded protocol messages over a oneshot channel,
/// so the worker holds a private copy of everything it runs with. The thread is
/// joined once the reply has arrived.
pub struct ThreadWorker<H> {
    task: String,
    hooks: Arc<H>,
    logger: Arc<dyn Logger>,
}

impl<H: TaskHooks> ThreadWorker<H> {
    /// Bind a worker to a task name and its hooks
    pub fn new(task: String, hooks: Arc<H>, logger: Arc<dyn Logger>) -> Self {
        Self {
            task,
            hooks,
            logger,
        }
    }
}

#[async_trait]
impl<H: TaskHooks> WorkerHandle for ThreadWorker<H> {
    async fn round_trip(self: Box<Self>, options: Options) -> Result<Value> {
        let ThreadWorker {
            task,
            hooks,
            logger,
        } = *self;

        let request = encode_request(&WorkerRequest {
            task: task.clone(),
            options,
        })?;
        let (reply_tx, reply_rx) = oneshot::channel::<String>();

        let thread = std::thread::Builder::new()
            .name(format!("taskkit-worker-{}", task))
            .spawn(move || {
                let reply = serve_request(hooks, logger, &request);
                // the parent only stops listening if its own future was dropped
                let _ = reply_tx.send(reply.encode());
            })
            .map_err(|e| WorkerError::Spawn {
                task: task.clone(),
                reason: e.to_string(),
            })?;

        let reply = reply_rx.await;

        match tokio::task::spawn_blocking(move || thread.join()).await {
            Ok(Ok(())) => debug!(task = %task, "worker thread joined"),
            _ => debug!(task = %task, "worker thread panicked"),
        }

        let reply = reply.map_err(|_| WorkerError::ChannelClosed { task: task.clone() })?;
        decode_response(&reply)?.into_result(&task)
    }
}

/// Worker-thread side: decode the request, run the task, build the reply
fn serve_request<H: TaskHooks>(
    hooks: Arc<H>,
    logger: Arc<dyn Logger>,
    request: &str,
) -> WorkerResponse {
    WorkerResponse::from_result(run_request(hooks, logger, request))
}

fn run_request<H: TaskHooks>(
    hooks: Arc<H>,
    logger: Arc<dyn Logger>,
    request: &str,
) -> Result<Value> {
    let WorkerRequest { task, options } = decode_request(request)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let task = Task::with_shared_hooks(task, options, hooks, logger);
    runtime.block_on(task.execute())
}
