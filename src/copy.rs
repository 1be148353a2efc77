//! Raw stream-to-stream copying.

use crate::error::FetchError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Size of the intermediate copy buffer: 100 KiB.
pub const DEFAULT_BUFFER_SIZE: usize = 102_400;

/// Copies `reader` to `writer` through a fixed [`DEFAULT_BUFFER_SIZE`]
/// buffer and returns the number of bytes transferred.
///
/// Both streams are released on every exit path: the writer is shut down
/// even when the copy fails, and the read error (if any) still propagates
/// afterwards. No retry or decoding happens here; this is the raw copy
/// step for callers that already hold open streams.
pub async fn copy_stream<R, W>(mut reader: R, mut writer: W) -> Result<u64, FetchError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = vec![0u8; DEFAULT_BUFFER_SIZE];
    let mut total = 0u64;

    let outcome = loop {
        match reader.read(&mut buffer).await {
            Ok(0) => break Ok(()),
            Ok(n) => {
                if let Err(e) = writer.write_all(&buffer[..n]).await {
                    break Err(e);
                }
                total += n as u64;
            }
            Err(e) => break Err(e),
        }
    };

    // Close the writer before reporting the copy outcome.
    let shutdown = writer.shutdown().await;
    drop(reader);

    outcome?;
    shutdown?;
    Ok(total)
}
