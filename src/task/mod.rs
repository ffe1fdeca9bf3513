//! Task: one stage of a file-based build pipeline
//!
//! A [`Task`] owns its resolved options (declared defaults deep-merged with the
//! caller's options), the [`TaskHooks`] that implement the stage, and its
//! collaborators (logger, pipeline config, task runner, worker spawner).
//!
//! Split into focused submodules:
//! - [`context`] - Per-item context handed to the process hook
//! - [`execution`] - The execute lifecycle: resolve, dispatch or delegate, aggregate

mod context;
mod execution;


pub use context::ItemContext;
pub use execution::collapse_results;

use crate::error::{Error, Result};
use crate::logging::{Logger, TracingLogger};
use crate::options::{LOG_COLOR, Options, merge};
use crate::worker::WorkerSpawner;
use crate::writer::{ArtifactWriter, Contents, SizeMetric};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// The customization points of a task
///
/// Only [`process`](TaskHooks::process) does real work; everything else has a
/// sensible default.
///
/// # Examples
///
/// ```no_run
/// use async_trait::async_trait;
/// use serde_json::Value;
/// use taskkit::{ItemContext, Options, Result, TaskHooks};
///
/// struct Copy;
///
/// #[async_trait]
/// impl TaskHooks for Copy {
///     async fn process(
///         &self,
///         input: &str,
///         output: &str,
///         _options: &Options,
///         ctx: &ItemContext,
///     ) -> Result<Value> {
///         let text = tokio::fs::read_to_string(input).await?;
///         let size = ctx.write(output, text).await?;
///         Ok(Value::from(size.bytes))
///     }
/// }
/// ```
#[async_trait]
pub trait TaskHooks: Send + Sync + 'static {
    /// Options the caller's options are deep-merged over
    fn default_options(&self) -> Options {
        Options::new()
    }

    /// Human-readable description of the task
    fn description(&self) -> &str {
        ""
    }

    /// Called once at construction, after options are resolved
    fn init(&mut self, _name: &str, _options: &Options) {}

    /// Produce the content for one item
    ///
    /// Receives the item's input reference, its output name and its effective
    /// options (task options plus the item's own overrides). Returning
    /// `Value::Null` means "nothing".
    async fn process(
        &self,
        _input: &str,
        _output: &str,
        _options: &Options,
        _ctx: &ItemContext,
    ) -> Result<Value> {
        Ok(Value::Null)
    }

    /// Reshape the per-item results, which arrive in item-map order
    ///
    /// The default collapses a single result to itself and otherwise returns
    /// the results as an array. See [`collapse_results`].
    async fn on_finish(&self, results: Vec<Value>) -> Result<Value> {
        Ok(collapse_results(results))
    }
}

/// Hooks that process nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

#[async_trait]
impl TaskHooks for NoopHooks {}

/// Runs other pipeline stages by name on behalf of a task
#[async_trait]
pub trait TaskRunner: Send + Sync {
    /// Run the named task and return its result
    async fn run_task(&self, name: &str) -> Result<Value>;
}

/// Type-erased task, as stored in a [`TaskRegistry`](crate::worker::TaskRegistry)
#[async_trait]
pub trait RunnableTask: Send + Sync {
    /// Task name
    fn name(&self) -> &str;

    /// Run the full execute lifecycle
    async fn run(&self) -> Result<Value>;
}

/// Optional collaborators supplied by the orchestrator
#[derive(Clone, Default)]
pub struct Collaborators {
    /// Log sink (default: [`TracingLogger`])
    pub logger: Option<Arc<dyn Logger>>,
    /// Pipeline-wide configuration, opaque to the task
    pub config: Option<Value>,
    /// Runner for triggering other stages
    pub runner: Option<Arc<dyn TaskRunner>>,
    /// Worker backend for `multithread` (default: a dedicated thread)
    pub worker: Option<Arc<dyn WorkerSpawner>>,
}

impl Collaborators {
    /// Use `logger` as the log sink
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Attach pipeline-wide configuration
    #[must_use]
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = Some(config);
        self
    }

    /// Attach a runner for other stages
    #[must_use]
    pub fn with_runner(mut self, runner: Arc<dyn TaskRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Use `worker` to spawn isolated workers
    #[must_use]
    pub fn with_worker(mut self, worker: Arc<dyn WorkerSpawner>) -> Self {
        self.worker = Some(worker);
        self
    }
}

/// One pipeline stage
pub struct Task<H> {
    name: String,
    options: Arc<Options>,
    hooks: Arc<H>,
    logger: Arc<dyn Logger>,
    config: Option<Value>,
    runner: Option<Arc<dyn TaskRunner>>,
    worker: Option<Arc<dyn WorkerSpawner>>,
}

impl<H: TaskHooks> Task<H> {
    /// Create a task, deep-merging `options` over the hooks' default options
    /// and then calling [`TaskHooks::init`]
    pub fn new(
        name: impl Into<String>,
        options: Options,
        mut hooks: H,
        collaborators: Collaborators,
    ) -> Self {
        let name = name.into();
        let options = merge(&hooks.default_options(), &options);
        hooks.init(&name, &options);
        let logger = collaborators
            .logger
            .unwrap_or_else(|| default_logger(&name, &options));

        Self {
            name,
            options: Arc::new(options),
            hooks: Arc::new(hooks),
            logger,
            config: collaborators.config,
            runner: collaborators.runner,
            worker: collaborators.worker,
        }
    }

    /// Rebuild a task around hooks that are already initialized
    ///
    /// Used on the worker side of a delegated execution: options arrive
    /// resolved and `init` already ran in the parent.
    pub(crate) fn with_shared_hooks(
        name: String,
        options: Options,
        hooks: Arc<H>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            name,
            options: Arc::new(options),
            hooks,
            logger,
            config: None,
            runner: None,
            worker: None,
        }
    }

    /// Task name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Task description, from the hooks
    pub fn description(&self) -> &str {
        self.hooks.description()
    }

    /// Currently active options
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The task's hooks
    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// The log sink
    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    /// Pipeline-wide configuration, if the orchestrator supplied one
    pub fn pipeline_config(&self) -> Option<&Value> {
        self.config.as_ref()
    }

    /// Replace the active options wholesale (no merge with defaults)
    pub fn update_options(&mut self, options: Options) {
        self.options = Arc::new(options);
    }

    /// Log through the task's logger
    pub fn log(&self, tags: &[&str], message: &str) {
        self.logger.log(tags, message);
    }

    /// Artifact writer configured from the active options
    pub fn writer(&self) -> Result<ArtifactWriter> {
        ArtifactWriter::from_options(&self.options, Arc::clone(&self.logger))
    }

    /// Write one artifact below `dist`
    pub async fn write(
        &self,
        filename: &str,
        contents: impl Into<Contents>,
    ) -> Result<SizeMetric> {
        self.writer()?.write(filename, contents).await
    }

    /// Write several artifacts below `dist`
    pub async fn write_many<I, K, C>(&self, files: I) -> Result<IndexMap<String, SizeMetric>>
    where
        I: IntoIterator<Item = (K, C)>,
        K: Into<String>,
        C: Into<Contents>,
    {
        self.writer()?.write_many(files).await
    }

    /// Run another stage through the runner collaborator
    pub async fn run_task(&self, name: &str) -> Result<Value> {
        match &self.runner {
            Some(runner) => runner.run_task(name).await,
            None => Err(Error::Config {
                message: format!(
                    "task {} cannot run {}: no task runner configured",
                    self.name, name
                ),
                key: None,
            }),
        }
    }
}

#[async_trait]
impl<H: TaskHooks> RunnableTask for Task<H> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> Result<Value> {
        self.execute().await
    }
}

fn default_logger(name: &str, options: &Options) -> Arc<dyn Logger> {
    let color = options
        .get(LOG_COLOR)
        .and_then(Value::as_str)
        .map(str::to_string);
    Arc::new(TracingLogger::new(name).with_color(color))
}
