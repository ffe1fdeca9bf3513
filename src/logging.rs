//! Logging collaborator
//!
//! Tasks report progress and diagnostics through a [`Logger`], which receives a
//! list of tags (`info`, `warning`, `error`, ...) and a message. The default
//! [`TracingLogger`] forwards to `tracing`; [`MemoryLogger`] keeps entries in
//! memory for inspection.

use std::sync::Mutex;

/// Tag for informational messages
pub const INFO: &str = "info";
/// Tag for diagnostics that do not fail the operation
pub const WARNING: &str = "warning";
/// Tag for failures
pub const ERROR: &str = "error";

/// Sink for task log messages
pub trait Logger: Send + Sync {
    /// Record one message with its tags
    fn log(&self, tags: &[&str], message: &str);
}

/// Default logger, emitting `tracing` events
///
/// The most severe tag picks the level: `error` → ERROR, `warning` → WARN,
/// `debug` → DEBUG, anything else → INFO. The task name and the joined tags
/// are attached as fields.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    task: String,
    color: Option<String>,
}

impl TracingLogger {
    /// Create a logger for the named task
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            color: None,
        }
    }

    /// Attach the task's `logColor` hint as an event field
    #[must_use]
    pub fn with_color(mut self, color: Option<String>) -> Self {
        self.color = color;
        self
    }
}

impl Logger for TracingLogger {
    fn log(&self, tags: &[&str], message: &str) {
        let joined = tags.join(",");
        let color = self.color.as_deref().unwrap_or("");
        if tags.contains(&ERROR) {
            tracing::error!(task = %self.task, tags = %joined, color, "{}", message);
        } else if tags.contains(&WARNING) {
            tracing::warn!(task = %self.task, tags = %joined, color, "{}", message);
        } else if tags.contains(&"debug") {
            tracing::debug!(task = %self.task, tags = %joined, color, "{}", message);
        } else {
            tracing::info!(task = %self.task, tags = %joined, color, "{}", message);
        }
    }
}

/// One recorded log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Tags the message was logged with
    pub tags: Vec<String>,
    /// The message text
    pub message: String,
}

impl LogEntry {
    /// Whether the entry carries `tag`
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Logger that keeps every entry in memory
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogger {
    /// Create an empty logger
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries logged so far
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    /// Entries carrying `tag`
    pub fn tagged(&self, tag: &str) -> Vec<LogEntry> {
        self.lock()
            .iter()
            .filter(|entry| entry.has_tag(tag))
            .cloned()
            .collect()
    }

    /// Whether any entry carries `tag`
    pub fn has_tag(&self, tag: &str) -> bool {
        self.lock().iter().any(|entry| entry.has_tag(tag))
    }

    /// Whether any message contains `needle`
    pub fn contains(&self, needle: &str) -> bool {
        self.lock().iter().any(|entry| entry.message.contains(needle))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogEntry>> {
        // push is the only mutation; a poisoned vec is still consistent
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Logger for MemoryLogger {
    fn log(&self, tags: &[&str], message: &str) {
        self.lock().push(LogEntry {
            tags: tags.iter().map(|t| t.to_string()).collect(),
            message: message.to_string(),
        });
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_logger_records_entries_in_order() {
        let logger = MemoryLogger::new();
        logger.log(&[INFO], "first");
        logger.log(&["clientkit", WARNING], "second");

        let entries = logger.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "first");
        assert_eq!(entries[1].tags, vec!["clientkit", "warning"]);
    }

    #[test]
    fn memory_logger_filters_by_tag() {
        let logger = MemoryLogger::new();
        logger.log(&[INFO], "a");
        logger.log(&[WARNING], "b");
        logger.log(&[ERROR, "stream"], "c");

        assert!(logger.has_tag(ERROR));
        assert!(!logger.has_tag("debug"));
        assert_eq!(logger.tagged(WARNING).len(), 1);
        assert!(logger.contains("c"));
    }

    #[test]
    fn tracing_logger_accepts_every_level() {
        // no subscriber installed: this only checks the dispatch does not panic
        let logger = TracingLogger::new("styles").with_color(Some("cyan".into()));
        logger.log(&[ERROR], "e");
        logger.log(&[WARNING], "w");
        logger.log(&["debug"], "d");
        logger.log(&[], "i");
    }
}
