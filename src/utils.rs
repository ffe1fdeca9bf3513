//! Utility functions for size reporting and path handling

use bytesize::ByteSize;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

/// Render a byte count for humans, using binary (1024) multiples
///
/// # Examples
///
/// ```
/// use taskkit::utils::format_size;
///
/// assert_eq!(format_size(8), "8 B");
/// assert_eq!(format_size(1536), "1.5 KiB");
/// assert_eq!(format_size(5 * 1024 * 1024), "5.0 MiB");
/// ```
#[must_use]
pub fn format_size(bytes: u64) -> String {
    ByteSize::b(bytes).to_string()
}

/// Length in bytes of `data` after gzip compression at the default level
///
/// This is CPU-bound; async callers should run it via `spawn_blocking`.
pub fn gzip_len(data: &[u8]) -> std::io::Result<u64> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    let compressed = encoder.finish()?;
    Ok(compressed.len() as u64)
}

/// Join a logical filename onto the destination root
///
/// The filename always lands below a non-empty root: leading `/` and drive
/// prefixes are dropped instead of replacing the root. An empty root leaves
/// the filename as given.
#[must_use]
pub fn destination_path(dist: &Path, filename: &str) -> PathBuf {
    if dist.as_os_str().is_empty() {
        return PathBuf::from(filename);
    }
    let mut path = dist.to_path_buf();
    for component in Path::new(filename).components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            other => path.push(other),
        }
    }
    path
}
