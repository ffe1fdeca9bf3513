use super::*;
use crate::logging::MemoryLogger;
use std::io::Cursor;
use std::pin::Pin;
use std::task::{Context, Poll};
use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

fn writer(dist: &Path, settings: TaskSettings) -> (ArtifactWriter, Arc<MemoryLogger>) {
    let logger = Arc::new(MemoryLogger::new());
    let settings = TaskSettings {
        dist: dist.to_path_buf(),
        ..settings
    };
    (ArtifactWriter::new(&settings, logger.clone()), logger)
}

/// Yields `prefix`, then fails every subsequent read
struct FailingReader {
    prefix: Option<Vec<u8>>,
}

impl AsyncRead for FailingReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.prefix.take() {
            Some(prefix) => {
                buf.put_slice(&prefix);
                Poll::Ready(Ok(()))
            }
            None => Poll::Ready(Err(std::io::Error::other("upstream closed"))),
        }
    }
}

/// Sink whose every write fails, like a disk that filled up mid-stream
struct FullDisk;

impl AsyncWrite for FullDisk {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Poll::Ready(Err(std::io::Error::other("no space left on device")))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[tokio::test]
async fn test_write_creates_directories_and_reports_size() {
    let temp_dir = TempDir::new().unwrap();
    let dist = temp_dir.path().join("test").join("dist");
    let (writer, logger) = writer(&dist, TaskSettings::default());

    let metric = writer.write("output.txt", "contents").await.unwrap();

    let written = fs::read_to_string(dist.join("output.txt")).await.unwrap();
    assert_eq!(written, "contents");
    assert_eq!(metric.bytes, 8);
    assert_eq!(metric.display, "8 B");
    assert!(metric.gzip.is_none());
    assert!(logger.contains("Writing file output.txt (8 B)"));
    assert!(!logger.has_tag(WARNING));
}

#[tokio::test]
async fn test_write_nested_filename() {
    let temp_dir = TempDir::new().unwrap();
    let (writer, _logger) = writer(temp_dir.path(), TaskSettings::default());

    writer.write("css/theme/site.css", "body{}").await.unwrap();

    assert!(temp_dir.path().join("css/theme/site.css").exists());
}

#[tokio::test]
async fn test_write_bytes() {
    let temp_dir = TempDir::new().unwrap();
    let (writer, _logger) = writer(temp_dir.path(), TaskSettings::default());

    let data = vec![0u8, 159, 146, 150];
    let metric = writer.write("blob.bin", data.clone()).await.unwrap();

    assert_eq!(metric.bytes, 4);
    assert_eq!(fs::read(temp_dir.path().join("blob.bin")).await.unwrap(), data);
}

#[tokio::test]
async fn test_write_over_threshold_warns() {
    let temp_dir = TempDir::new().unwrap();
    let (writer, logger) = writer(
        temp_dir.path(),
        TaskSettings {
            size_threshold: Some(1.0),
            ..TaskSettings::default()
        },
    );

    writer.write("output.txt", "contents").await.unwrap();

    let warnings = logger.tagged(WARNING);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("output.txt"));
    assert!(warnings[0].message.contains("gzip: false"));
    assert!(warnings[0].message.contains("8 B (8 bytes)"));
}

#[tokio::test]
async fn test_write_under_threshold_is_quiet() {
    let temp_dir = TempDir::new().unwrap();
    let (writer, logger) = writer(
        temp_dir.path(),
        TaskSettings {
            size_threshold: Some(200000.0),
            ..TaskSettings::default()
        },
    );

    writer.write("output.txt", "contents").await.unwrap();

    assert!(!logger.has_tag(WARNING));
}

#[tokio::test]
async fn test_gzip_size_is_used_for_threshold() {
    let temp_dir = TempDir::new().unwrap();
    let expected_gzip = gzip_len(b"contents").unwrap();
    // raw length (8) is under the threshold, gzip length is over it
    let threshold = 10.0;
    assert!(expected_gzip as f64 > threshold);

    let (plain, plain_logger) = writer(
        temp_dir.path(),
        TaskSettings {
            size_threshold: Some(threshold),
            ..TaskSettings::default()
        },
    );
    plain.write("plain.txt", "contents").await.unwrap();
    assert!(!plain_logger.has_tag(WARNING));

    let (gzipped, gz_logger) = writer(
        temp_dir.path(),
        TaskSettings {
            gzip_size: true,
            size_threshold: Some(threshold),
            ..TaskSettings::default()
        },
    );
    let metric = gzipped.write("gzipped.txt", "contents").await.unwrap();

    assert_eq!(metric.bytes, 8);
    assert_eq!(metric.gzip.as_ref().unwrap().bytes, expected_gzip);
    assert_eq!(metric.threshold_bytes(), expected_gzip);
    let warnings = gz_logger.tagged(WARNING);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("gzip: true"));
    assert!(gz_logger.contains("gzipped)"));
}

#[tokio::test]
async fn test_write_empty_content_warns_but_succeeds() {
    let temp_dir = TempDir::new().unwrap();
    let (writer, logger) = writer(temp_dir.path(), TaskSettings::default());

    let metric = writer.write("empty.txt", "").await.unwrap();
    assert_eq!(metric.bytes, 0);

    let absent: Option<String> = None;
    writer.write("absent.txt", absent).await.unwrap();

    let warnings = logger.tagged(WARNING);
    assert_eq!(warnings.len(), 2);
    assert_eq!(
        warnings[0].message,
        "attempting to write empty string to empty.txt"
    );
    assert!(temp_dir.path().join("absent.txt").exists());
}

#[tokio::test]
async fn test_write_stream_is_drained_to_file() {
    let temp_dir = TempDir::new().unwrap();
    let (writer, logger) = writer(
        temp_dir.path(),
        TaskSettings {
            gzip_size: true,
            ..TaskSettings::default()
        },
    );
    let body = "x".repeat(200_000);

    let metric = writer
        .write("big.txt", Contents::stream(Cursor::new(body.clone().into_bytes())))
        .await
        .unwrap();

    assert_eq!(metric.bytes, 200_000);
    assert!(metric.gzip.as_ref().unwrap().bytes < 2_000);
    let written = fs::read_to_string(temp_dir.path().join("big.txt")).await.unwrap();
    assert_eq!(written, body);
    assert!(!logger.has_tag(WARNING));
}

#[tokio::test]
async fn test_write_empty_stream_warns() {
    let temp_dir = TempDir::new().unwrap();
    let (writer, logger) = writer(temp_dir.path(), TaskSettings::default());

    writer
        .write("nothing.txt", Contents::stream(Cursor::new(Vec::new())))
        .await
        .unwrap();

    assert!(logger.contains("attempting to write empty string to nothing.txt"));
}

#[tokio::test]
async fn test_stream_failure_is_logged_and_returned() {
    let temp_dir = TempDir::new().unwrap();
    let (writer, logger) = writer(temp_dir.path(), TaskSettings::default());

    let reader = FailingReader {
        prefix: Some(b"partial".to_vec()),
    };
    let err = writer
        .write("broken.js", Contents::stream(reader))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Stream { ref filename, .. } if filename == "broken.js"));
    assert!(logger.has_tag(ERROR));
    assert!(!temp_dir.path().join("broken.js").exists());
    assert!(!logger.contains("Writing file broken.js"));
}

#[tokio::test]
async fn test_sink_failure_removes_partial_artifact() {
    let temp_dir = TempDir::new().unwrap();
    let (writer, logger) = writer(temp_dir.path(), TaskSettings::default());
    let path = temp_dir.path().join("half.bin");
    std::fs::write(&path, "stale").unwrap();

    let reader: Box<dyn AsyncRead + Send + Unpin> = Box::new(Cursor::new(b"payload".to_vec()));
    let err = writer
        .drain_into("half.bin", &path, FullDisk, reader)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Persistence { .. }));
    assert!(!path.exists());
    assert!(!logger.has_tag(ERROR));
}

#[cfg(unix)]
#[tokio::test]
async fn test_absolute_filename_stays_under_dist() {
    let temp_dir = TempDir::new().unwrap();
    let dist = temp_dir.path().join("dist");
    let (writer, _logger) = writer(&dist, TaskSettings::default());
    let outside = temp_dir.path().join("outside.txt");

    writer
        .write(outside.to_str().unwrap(), "x")
        .await
        .unwrap();

    assert!(!outside.exists());
    let relative = outside.strip_prefix("/").unwrap();
    assert_eq!(
        std::fs::read_to_string(dist.join(relative)).unwrap(),
        "x"
    );
}

#[tokio::test]
async fn test_persistence_failure_when_dist_is_a_file() {
    let temp_dir = TempDir::new().unwrap();
    let blocker = temp_dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    let (writer, _logger) = writer(&blocker, TaskSettings::default());

    let err = writer.write("out.txt", "data").await.unwrap_err();

    assert!(matches!(err, Error::Persistence { .. }));
}

#[tokio::test]
async fn test_write_many_keeps_input_order() {
    let temp_dir = TempDir::new().unwrap();
    let (writer, _logger) = writer(temp_dir.path(), TaskSettings::default());

    let sizes = writer
        .write_many([("output2.txt", "contents22"), ("output1.txt", "contents1")])
        .await
        .unwrap();

    let names: Vec<_> = sizes.keys().cloned().collect();
    assert_eq!(names, vec!["output2.txt", "output1.txt"]);
    assert_eq!(sizes["output2.txt"].bytes, 10);
    assert_eq!(sizes["output1.txt"].bytes, 9);
    assert_eq!(
        fs::read_to_string(temp_dir.path().join("output1.txt"))
            .await
            .unwrap(),
        "contents1"
    );
    assert_eq!(
        fs::read_to_string(temp_dir.path().join("output2.txt"))
            .await
            .unwrap(),
        "contents22"
    );
}

#[tokio::test]
async fn test_write_many_into_same_new_directory() {
    let temp_dir = TempDir::new().unwrap();
    let (writer, _logger) = writer(&temp_dir.path().join("a/b/c"), TaskSettings::default());

    let files: Vec<(String, String)> = (0..32)
        .map(|i| (format!("chunk-{i}.js"), format!("chunk {i}")))
        .collect();
    let sizes = writer.write_many(files).await.unwrap();

    assert_eq!(sizes.len(), 32);
    for i in 0..32 {
        assert!(temp_dir.path().join(format!("a/b/c/chunk-{i}.js")).exists());
    }
}

#[tokio::test]
async fn test_write_many_surfaces_failure_after_siblings_finish() {
    let temp_dir = TempDir::new().unwrap();
    let (writer, _logger) = writer(temp_dir.path(), TaskSettings::default());

    let files: Vec<(&str, Contents)> = vec![
        ("good.txt", Contents::from("fine")),
        (
            "bad.txt",
            Contents::stream(FailingReader { prefix: None }),
        ),
        ("also-good.txt", Contents::from("fine too")),
    ];
    let err = writer.write_many(files).await.unwrap_err();

    assert!(matches!(err, Error::Stream { .. }));
    assert!(temp_dir.path().join("good.txt").exists());
    assert!(temp_dir.path().join("also-good.txt").exists());
}

#[test]
fn test_size_metric_display() {
    assert_eq!(SizeMetric::new(8, None).to_string(), "8 B");
    assert_eq!(
        SizeMetric::new(2048, Some(100)).to_string(),
        "2.0 KiB, 100 B gzipped"
    );
    assert_eq!(SizeMetric::new(2048, Some(100)).threshold_display(), "100 B");
}
