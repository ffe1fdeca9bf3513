//! Source trees and hooks shared by the pipeline tests

use async_trait::async_trait;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use taskkit::{ItemContext, Options, Result, TaskHooks};

/// Stylesheet that shrinks noticeably when whitespace is stripped
pub const MAIN_CSS: &str = "body {\n    margin: 0;\n    padding: 0;\n}\n\nh1 {\n    color: red;\n}\n";

/// Small script source
pub const APP_JS: &str = "function hello() {\n    return 'world';\n}\n";

/// Write `files` below `root` and return their absolute paths in order
pub fn write_sources(root: &Path, files: &[(&str, &str)]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|(name, contents)| {
            let path = root.join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(&path, contents).unwrap();
            path
        })
        .collect()
}

/// Reads the input file, strips whitespace and writes the result
///
/// Returns `{"output": .., "bytes": ..}` for each item.
pub struct Minify;

#[async_trait]
impl TaskHooks for Minify {
    fn default_options(&self) -> Options {
        Options::new().with("gzipSize", true)
    }

    fn description(&self) -> &str {
        "strip whitespace"
    }

    async fn process(
        &self,
        input: &str,
        output: &str,
        _options: &Options,
        ctx: &ItemContext,
    ) -> Result<Value> {
        let source = tokio::fs::read_to_string(input).await?;
        let minified: String = source.split_whitespace().collect();
        let metric = ctx.write(output, minified).await?;
        Ok(json!({"output": output, "bytes": metric.bytes}))
    }
}
