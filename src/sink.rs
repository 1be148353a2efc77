//! Byte destinations for fetched resources.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

/// A destination that accepts the decoded resource body.
///
/// The fetcher owns the sink for the duration of a call: it opens it with
/// [`begin`](Sink::begin) at the start of every attempt and closes it with
/// [`close`](Sink::close) on every exit path, so a successful fetch closes
/// the sink exactly once. `begin` must discard bytes written by a previous
/// failed attempt; only the final successful attempt's bytes survive.
#[async_trait]
pub trait Sink: Send {
    /// Prepares the sink for a fresh attempt, discarding any earlier bytes.
    async fn begin(&mut self) -> io::Result<()>;

    /// Appends decoded bytes.
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flushes and releases the destination.
    async fn close(&mut self) -> io::Result<()>;
}

#[async_trait]
impl Sink for Vec<u8> {
    async fn begin(&mut self) -> io::Result<()> {
        self.clear();
        Ok(())
    }

    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.extend_from_slice(data);
        Ok(())
    }

    async fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Sink that writes to a local file.
///
/// The file is created (or truncated) when an attempt begins, so a retry
/// after a timeout starts over from an empty file. Missing parent
/// directories are created on first use.
pub struct FileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl FileSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            writer: None,
        }
    }

    /// Destination path of this sink.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Sink for FileSink {
    async fn begin(&mut self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        self.writer = Some(BufWriter::new(File::create(&self.path).await?));
        Ok(())
    }

    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.write_all(data).await,
            None => Err(io::Error::other("file sink was not opened")),
        }
    }

    async fn close(&mut self) -> io::Result<()> {
        match self.writer.take() {
            Some(mut writer) => writer.shutdown().await,
            None => Ok(()),
        }
    }
}

/// Adapter exposing any [`AsyncWrite`] as a [`Sink`].
///
/// The wrapped writer cannot be rewound, so bytes written by an attempt
/// that later times out stay in place and the next attempt appends after
/// them. Use [`FileSink`] or `Vec<u8>` when retried fetches must leave only
/// the final body behind.
pub struct WriterSink<W> {
    writer: W,
}

impl<W> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the adapter and returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> Sink for WriterSink<W> {
    async fn begin(&mut self) -> io::Result<()> {
        Ok(())
    }

    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data).await
    }

    async fn close(&mut self) -> io::Result<()> {
        self.writer.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn vec_sink_discards_bytes_from_a_failed_attempt() {
        let mut sink = Vec::new();
        sink.begin().await.unwrap();
        Sink::write_all(&mut sink, b"partial bytes").await.unwrap();
        sink.close().await.unwrap();

        sink.begin().await.unwrap();
        Sink::write_all(&mut sink, b"final body").await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(sink, b"final body");
    }

    #[tokio::test]
    async fn file_sink_truncates_on_each_attempt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resource.bin");
        let mut sink = FileSink::new(&path);

        sink.begin().await.unwrap();
        sink.write_all(b"partial bytes from a timed out attempt")
            .await
            .unwrap();
        sink.close().await.unwrap();

        sink.begin().await.unwrap();
        sink.write_all(b"final body").await.unwrap();
        sink.close().await.unwrap();

        let contents = tokio::fs::read(&path).await.unwrap();
        assert_eq!(contents, b"final body");
    }

    #[tokio::test]
    async fn file_sink_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("resource.bin");
        let mut sink = FileSink::new(&path);

        sink.begin().await.unwrap();
        sink.write_all(b"data").await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"data");
    }

    #[tokio::test]
    async fn writer_sink_passes_bytes_through() {
        let mut sink = WriterSink::new(std::io::Cursor::new(Vec::new()));
        sink.begin().await.unwrap();
        sink.write_all(b"streamed").await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(sink.into_inner().into_inner(), b"streamed");
    }
}
