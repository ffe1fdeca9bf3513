//! Isolated workers for `multithread` execution
//!
//! A worker performs one complete pass of a task in a separate execution
//! context and reports back exactly once. The boundary is message based: the
//! parent sends the task's options (with `multithread` forced off) and receives
//! either the aggregated result or an error. Workers are never pooled or reused.
//!
//! ## Backends
//!
//! - [`ThreadWorker`]: a dedicated OS thread with its own tokio runtime (default)
//! - [`ProcessWorker`]: a child process speaking the JSON line [`protocol`],
//!   spawned by a [`ProcessSpawner`]
//!
//! The child side of a process worker is a binary that registers its tasks in
//! a [`TaskRegistry`] and calls [`serve_stdio`].
//!
//! ```no_run
//! use taskkit::NoopHooks;
//! use taskkit::worker::{TaskRegistry, serve_stdio};
//!
//! #[tokio::main]
//! async fn main() -> taskkit::Result<()> {
//!     let mut registry = TaskRegistry::new();
//!     registry.register("scripts", || NoopHooks);
//!     serve_stdio(&registry).await
//! }
//! ```

use crate::error::Result;
use crate::options::Options;
use async_trait::async_trait;
use serde_json::Value;

pub mod protocol;

mod process;
mod registry;
mod thread;


pub use process::{ProcessSpawner, ProcessWorker};
pub use registry::{TaskRegistry, serve, serve_stdio};
pub use thread::ThreadWorker;

/// One isolated worker, good for a single round trip
///
/// `round_trip` consumes the handle: send the options, wait for the one reply,
/// tear the worker down.
#[async_trait]
pub trait WorkerHandle: Send {
    /// Run the task in the worker with `options` and return its result
    async fn round_trip(self: Box<Self>, options: Options) -> Result<Value>;
}

/// Creates workers bound to a task name
pub trait WorkerSpawner: Send + Sync {
    /// Create a fresh worker for the named task
    fn spawn(&self, task: &str) -> Result<Box<dyn WorkerHandle>>;
}
