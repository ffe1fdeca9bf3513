//! Typed view of the option keys the engine and writer understand
//!
//! Options stay an open map so tasks can carry their own keys; the keys below
//! are the ones taskkit itself reads. Unknown keys are ignored here.

use crate::error::{Error, Result};
use crate::options::Options;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings recognized by the execution engine and artifact writer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSettings {
    /// Destination root for written artifacts (default: empty, i.e. relative to cwd)
    #[serde(default)]
    pub dist: PathBuf,

    /// Whether the task runs at all (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Delegate the whole pass to one isolated worker (default: false)
    #[serde(default)]
    pub multithread: bool,

    /// Also compute the gzip size of written artifacts and compare that
    /// against the threshold (default: false)
    #[serde(default)]
    pub gzip_size: bool,

    /// Byte ceiling above which a written artifact is reported (None = no check)
    #[serde(default)]
    pub size_threshold: Option<f64>,

    /// Logging hint passed through to the logger, opaque to the engine
    #[serde(default)]
    pub log_color: Option<String>,
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            dist: PathBuf::new(),
            enabled: true,
            multithread: false,
            gzip_size: false,
            size_threshold: None,
            log_color: None,
        }
    }
}

impl TaskSettings {
    /// Read the recognized keys out of an option map
    ///
    /// Fails with a configuration error if a recognized key holds the wrong type.
    pub fn from_options(options: &Options) -> Result<Self> {
        serde_json::from_value(options.clone().into_value()).map_err(|e| Error::Config {
            message: format!("invalid task options: {}", e),
            key: None,
        })
    }
}

fn default_true() -> bool {
    true
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_apply_to_empty_options() {
        let settings = TaskSettings::from_options(&Options::new()).unwrap();
        assert_eq!(settings, TaskSettings::default());
        assert!(settings.enabled);
        assert!(!settings.multithread);
        assert!(!settings.gzip_size);
        assert_eq!(settings.dist, PathBuf::new());
    }

    #[test]
    fn reads_camel_case_keys_and_ignores_unknown_ones() {
        let options = Options::from_value(json!({
            "dist": "public/assets",
            "enabled": false,
            "multithread": true,
            "gzipSize": true,
            "sizeThreshold": 200000,
            "logColor": "magenta",
            "items": { "a.js": "src/a.js" },
            "minify": true
        }))
        .unwrap();

        let settings = options.settings().unwrap();
        assert_eq!(settings.dist, PathBuf::from("public/assets"));
        assert!(!settings.enabled);
        assert!(settings.multithread);
        assert!(settings.gzip_size);
        assert_eq!(settings.size_threshold, Some(200000.0));
        assert_eq!(settings.log_color.as_deref(), Some("magenta"));
    }

    #[test]
    fn wrong_type_is_a_config_error() {
        let options = Options::new().with("enabled", "nope");
        let err = TaskSettings::from_options(&options).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
