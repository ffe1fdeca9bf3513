//! Artifact writer: persists task output under the destination root
//!
//! A write goes through these steps:
//! 1. Warn (but continue) when the content is empty
//! 2. Create the destination directory if it is missing
//! 3. Persist the content, draining streams straight into the file
//! 4. Measure the written size, and its gzip size when `gzipSize` is set
//! 5. Warn when the measured size exceeds `sizeThreshold`
//! 6. Log the write with its human-readable size

use crate::config::TaskSettings;
use crate::error::{Error, Result};
use crate::logging::{ERROR, INFO, Logger, WARNING};
use crate::options::Options;
use crate::utils::{destination_path, format_size, gzip_len};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

mod contents;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use contents::Contents;

/// Read buffer size used when draining stream content
const STREAM_CHUNK: usize = 64 * 1024;

/// Size of one written artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeMetric {
    /// Bytes written to disk
    pub bytes: u64,
    /// Human-readable rendering of `bytes`
    pub display: String,
    /// Gzip size, when `gzipSize` is configured
    pub gzip: Option<CompressedSize>,
}

/// Gzip-compressed size of an artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedSize {
    /// Compressed byte count
    pub bytes: u64,
    /// Human-readable rendering of `bytes`
    pub display: String,
}

impl SizeMetric {
    fn new(bytes: u64, gzip_bytes: Option<u64>) -> Self {
        Self {
            bytes,
            display: format_size(bytes),
            gzip: gzip_bytes.map(|bytes| CompressedSize {
                bytes,
                display: format_size(bytes),
            }),
        }
    }

    /// The size compared against the threshold: gzip when measured, raw otherwise
    pub fn threshold_bytes(&self) -> u64 {
        self.gzip.as_ref().map_or(self.bytes, |gz| gz.bytes)
    }

    /// Human-readable form of [`threshold_bytes`](Self::threshold_bytes)
    pub fn threshold_display(&self) -> &str {
        self.gzip.as_ref().map_or(&self.display, |gz| &gz.display)
    }
}

impl std::fmt::Display for SizeMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.gzip {
            Some(gz) => write!(f, "{}, {} gzipped", self.display, gz.display),
            None => f.write_str(&self.display),
        }
    }
}

/// Writes artifacts below a destination root and reports their sizes
#[derive(Clone)]
pub struct ArtifactWriter {
    dist: PathBuf,
    gzip_size: bool,
    size_threshold: Option<f64>,
    logger: Arc<dyn Logger>,
}

impl ArtifactWriter {
    /// Create a writer from already-parsed settings
    pub fn new(settings: &TaskSettings, logger: Arc<dyn Logger>) -> Self {
        Self {
            dist: settings.dist.clone(),
            gzip_size: settings.gzip_size,
            size_threshold: settings.size_threshold,
            logger,
        }
    }

    /// Create a writer configured by `dist`, `gzipSize` and `sizeThreshold`
    pub fn from_options(options: &Options, logger: Arc<dyn Logger>) -> Result<Self> {
        Ok(Self::new(&options.settings()?, logger))
    }

    /// Destination root
    pub fn dist(&self) -> &Path {
        &self.dist
    }

    /// Write one artifact at `dist/filename`
    ///
    /// Empty content and threshold overages are logged, not returned as errors.
    ///
    /// # Errors
    ///
    /// - [`Error::Stream`] if stream content fails while draining (also logged
    ///   under the `error` tag)
    /// - [`Error::Persistence`] if the directory or file cannot be written
    pub async fn write(
        &self,
        filename: &str,
        contents: impl Into<Contents>,
    ) -> Result<SizeMetric> {
        let contents = contents.into();
        if contents.is_empty() == Some(true) {
            self.warn_empty(filename);
        }

        let path = destination_path(&self.dist, filename);
        if let Some(parent) = path.parent() {
            ensure_dir(parent).await?;
        }

        let (bytes, data) = match contents {
            Contents::Text(text) => {
                let data = text.into_bytes();
                persist(&path, &data).await?;
                (data.len() as u64, Some(data))
            }
            Contents::Bytes(data) => {
                persist(&path, &data).await?;
                (data.len() as u64, Some(data))
            }
            Contents::Stream(reader) => {
                let written = self.drain(filename, &path, reader).await?;
                if written == 0 {
                    self.warn_empty(filename);
                }
                (written, None)
            }
        };

        let gzip_bytes = if self.gzip_size {
            Some(self.gzip_size_of(&path, data).await?)
        } else {
            None
        };
        let metric = SizeMetric::new(bytes, gzip_bytes);

        self.check_threshold(filename, &metric);
        self.logger.log(
            &[INFO],
            &format!("Writing file {} ({})", filename, metric),
        );
        Ok(metric)
    }

    /// Write several artifacts concurrently
    ///
    /// Every write runs to completion independently. Sizes come back in input
    /// order; if any write failed, the first failure in input order is returned.
    pub async fn write_many<I, K, C>(&self, files: I) -> Result<IndexMap<String, SizeMetric>>
    where
        I: IntoIterator<Item = (K, C)>,
        K: Into<String>,
        C: Into<Contents>,
    {
        let writes = files.into_iter().map(|(filename, contents)| {
            let filename: String = filename.into();
            let contents: Contents = contents.into();
            async move {
                let result = self.write(&filename, contents).await;
                (filename, result)
            }
        });
        let settled = futures::future::join_all(writes).await;

        let mut sizes = IndexMap::with_capacity(settled.len());
        for (filename, result) in settled {
            sizes.insert(filename, result?);
        }
        Ok(sizes)
    }

    fn warn_empty(&self, filename: &str) {
        self.logger.log(
            &[WARNING],
            &format!("attempting to write empty string to {}", filename),
        );
    }

    async fn drain(
        &self,
        filename: &str,
        path: &Path,
        reader: Box<dyn AsyncRead + Send + Unpin>,
    ) -> Result<u64> {
        let file = fs::File::create(path)
            .await
            .map_err(|source| Error::Persistence {
                path: path.to_path_buf(),
                source,
            })?;
        self.drain_into(filename, path, file, reader).await
    }

    /// Copy `reader` into `sink`, removing the partial artifact at `path` on
    /// any read or write failure
    async fn drain_into<W>(
        &self,
        filename: &str,
        path: &Path,
        sink: W,
        reader: Box<dyn AsyncRead + Send + Unpin>,
    ) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let result = self.copy_stream(filename, path, sink, reader).await;
        if result.is_err() {
            if let Err(e) = fs::remove_file(path).await {
                debug!(?path, error = %e, "failed to remove partial artifact");
            }
        }
        result
    }

    async fn copy_stream<W>(
        &self,
        filename: &str,
        path: &Path,
        mut sink: W,
        mut reader: Box<dyn AsyncRead + Send + Unpin>,
    ) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let persist_err = |source: std::io::Error| Error::Persistence {
            path: path.to_path_buf(),
            source,
        };

        let mut buf = vec![0u8; STREAM_CHUNK];
        let mut written = 0u64;
        loop {
            let n = match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(source) => {
                    self.logger.log(
                        &[ERROR],
                        &format!("stream error while writing {}: {}", filename, source),
                    );
                    return Err(Error::Stream {
                        filename: filename.to_string(),
                        source,
                    });
                }
            };
            sink.write_all(&buf[..n]).await.map_err(persist_err)?;
            written += n as u64;
        }
        sink.flush().await.map_err(persist_err)?;
        Ok(written)
    }

    async fn gzip_size_of(&self, path: &Path, data: Option<Vec<u8>>) -> Result<u64> {
        let data = match data {
            Some(data) => data,
            None => fs::read(path).await?,
        };
        let len = tokio::task::spawn_blocking(move || gzip_len(&data))
            .await
            .map_err(|e| Error::Other(format!("gzip size task panicked: {}", e)))??;
        Ok(len)
    }

    fn check_threshold(&self, filename: &str, metric: &SizeMetric) {
        let Some(threshold) = self.size_threshold else {
            return;
        };
        let size = metric.threshold_bytes();
        if size as f64 > threshold {
            self.logger.log(
                &[WARNING],
                &format!(
                    "{} exceeds the size threshold of {} bytes (gzip: {}): {} ({} bytes)",
                    filename,
                    threshold,
                    metric.gzip.is_some(),
                    metric.threshold_display(),
                    size
                ),
            );
        }
    }
}

/// Create `dir` and its ancestors; an existing directory counts as success,
/// including one created concurrently by a sibling write
async fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    match fs::create_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            if fs::metadata(dir).await.is_ok_and(|m| m.is_dir()) {
                Ok(())
            } else {
                Err(Error::Persistence {
                    path: dir.to_path_buf(),
                    source: e,
                })
            }
        }
        Err(source) => Err(Error::Persistence {
            path: dir.to_path_buf(),
            source,
        }),
    }
}

async fn persist(path: &Path, data: &[u8]) -> Result<()> {
    fs::write(path, data)
        .await
        .map_err(|source| Error::Persistence {
            path: path.to_path_buf(),
            source,
        })
}
