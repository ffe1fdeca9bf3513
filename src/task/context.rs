//! Per-item context handed to the process hook

use crate::error::Result;
use crate::logging::Logger;
use crate::options::Options;
use crate::writer::{ArtifactWriter, Contents, SizeMetric};
use indexmap::IndexMap;
use std::sync::Arc;

/// What a process hook can reach besides its arguments
///
/// Writes go through the item's effective options, so an item that overrides
/// `dist` or `sizeThreshold` gets those settings for its own artifacts.
#[derive(Clone)]
pub struct ItemContext {
    task: String,
    output: String,
    options: Options,
    logger: Arc<dyn Logger>,
}

impl ItemContext {
    pub(crate) fn new(
        task: String,
        output: String,
        options: Options,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            task,
            output,
            options,
            logger,
        }
    }

    /// Name of the task processing this item
    pub fn task_name(&self) -> &str {
        &self.task
    }

    /// Output name of this item
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Effective options of this item
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Log through the task's logger
    pub fn log(&self, tags: &[&str], message: &str) {
        self.logger.log(tags, message);
    }

    /// Artifact writer configured from this item's effective options
    pub fn writer(&self) -> Result<ArtifactWriter> {
        ArtifactWriter::from_options(&self.options, Arc::clone(&self.logger))
    }

    /// Write one artifact using this item's effective options
    pub async fn write(
        &self,
        filename: &str,
        contents: impl Into<Contents>,
    ) -> Result<SizeMetric> {
        self.writer()?.write(filename, contents).await
    }

    /// Write several artifacts using this item's effective options
    pub async fn write_many<I, K, C>(&self, files: I) -> Result<IndexMap<String, SizeMetric>>
    where
        I: IntoIterator<Item = (K, C)>,
        K: Into<String>,
        C: Into<Contents>,
    {
        self.writer()?.write_many(files).await
    }
}
