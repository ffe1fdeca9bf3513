//! # taskkit
//!
//! Task base for file-based build pipelines.
//!
//! A task is one pipeline stage (compile scripts, bundle styles, copy assets).
//! It owns a map from output names to inputs, runs a user hook for every item
//! concurrently, and writes the produced artifacts to a destination directory
//! while reporting their sizes.
//!
//! ## Design Philosophy
//!
//! taskkit is designed to be:
//! - **Hook-driven** - Implement [`TaskHooks::process`]; the engine does the rest
//! - **Sensible defaults** - Options are deep-merged over the task's declared defaults
//! - **Library-first** - The orchestrator (watching, ordering stages) lives elsewhere
//! - **Isolated on request** - `multithread: true` runs a whole pass in one worker
//!
//! ## Quick Start
//!
//! ```no_run
//! use async_trait::async_trait;
//! use serde_json::{Value, json};
//! use taskkit::{Collaborators, ItemContext, Options, Result, Task, TaskHooks};
//!
//! struct Uppercase;
//!
//! #[async_trait]
//! impl TaskHooks for Uppercase {
//!     async fn process(
//!         &self,
//!         input: &str,
//!         output: &str,
//!         _options: &Options,
//!         ctx: &ItemContext,
//!     ) -> Result<Value> {
//!         let text = tokio::fs::read_to_string(input).await?;
//!         ctx.write(output, text.to_uppercase()).await?;
//!         Ok(Value::Null)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let options = Options::from_value(json!({
//!         "dist": "build",
//!         "items": {
//!             "README.txt": "docs/readme.txt",
//!             "NOTES.txt": {"input": "docs/notes.txt", "sizeThreshold": 4096},
//!         },
//!     }))?;
//!
//!     let task = Task::new("uppercase", options, Uppercase, Collaborators::default());
//!     task.execute().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Typed settings view over options
pub mod config;
/// Error types
pub mod error;
/// Logging collaborator
pub mod logging;
/// Option maps, item specs, merge and overlay
pub mod options;
/// Task lifecycle and hooks (decomposed into focused submodules)
pub mod task;
/// Utility functions
pub mod utils;
/// Isolated workers for `multithread` execution
pub mod worker;
/// Artifact writer
pub mod writer;

// Re-export commonly used types
pub use config::TaskSettings;
pub use error::{Error, Result, WorkerError};
pub use logging::{Logger, MemoryLogger, TracingLogger};
pub use options::{ItemMap, ItemSpec, Options, merge, overlay};
pub use task::{
    Collaborators, ItemContext, NoopHooks, RunnableTask, Task, TaskHooks, TaskRunner,
    collapse_results,
};
pub use worker::{WorkerHandle, WorkerSpawner};
pub use writer::{ArtifactWriter, CompressedSize, Contents, SizeMetric};
