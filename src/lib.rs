//! refetch - Resilient HTTP resource fetching with transparent decompression
//!
//! This library retrieves the byte content addressed by a URL and streams it
//! into a caller-supplied sink, retrying transparently on read timeouts up
//! to a configured bound.
//!
//! # Features
//!
//! - **Bounded Retry**: Read and connect timeouts are retried on a fresh
//!   connection, up to a configured attempt count; any other failure is
//!   surfaced immediately
//! - **Transparent Decompression**: `gzip` and `deflate` response bodies
//!   are decoded on the fly; anything else is copied as-is
//! - **Streaming Delivery**: Bodies are copied chunk by chunk through a
//!   100 KiB buffer, never fully buffered in memory
//! - **Proxy Support**: HTTP and SOCKS5 proxies via a resolved descriptor
//! - **Flexible Destinations**: In-memory buffers, local files, or any
//!   async writer
//!
//! # Example
//!
//! ```no_run
//! use refetch::{FetchConfig, Fetcher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Fetcher::new(FetchConfig::default())?;
//! let url: refetch::Url = "https://example.com/data.bin".parse()?;
//! let body = fetcher.fetch_bytes(&url).await?;
//! println!("fetched {} bytes", body.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod copy;
pub mod decode;
pub mod error;
pub mod fetch;
pub mod sink;

pub use config::{FetchConfig, ProxyConfig, ProxyKind, DEFAULT_ATTEMPTS, DEFAULT_TIMEOUT};
pub use copy::{copy_stream, DEFAULT_BUFFER_SIZE};
pub use decode::ContentEncoding;
pub use error::FetchError;
pub use fetch::Fetcher;
pub use sink::{FileSink, Sink, WriterSink};
pub use url::Url;
