//! The fetcher: bounded retry, transparent decoding, streaming delivery.

use crate::config::FetchConfig;
use crate::decode::{BodyDecoder, ContentEncoding};
use crate::error::FetchError;
use crate::sink::{FileSink, Sink};
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT_ENCODING, CONTENT_ENCODING, USER_AGENT};
use std::io;
use std::path::Path;
use std::time::Duration;
use tokio::time;
use tracing::{debug, warn};
use url::Url;

/// Retrieves the byte content addressed by a URL and delivers it to a
/// [`Sink`], retrying on read timeouts up to a configured bound.
///
/// Every attempt opens a fresh connection, applies the identification and
/// encoding headers, inspects the response's `Content-Encoding`, and
/// streams the (transparently decompressed) body into the sink. Only
/// timeouts are retried; every other failure propagates immediately.
///
/// Attempts within one call are strictly sequential, so a call blocks for
/// at most `timeout * attempts`. Independent calls on a shared fetcher may
/// run concurrently; the configuration is immutable once the fetcher is
/// built.
pub struct Fetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

/// Per-attempt outcome classification. Timeouts are the only condition
/// handled locally; everything else surfaces to the caller unmodified.
enum AttemptError {
    TimedOut(FetchError),
    Fatal(FetchError),
}

fn classify(error: reqwest::Error) -> AttemptError {
    if error.is_timeout() {
        AttemptError::TimedOut(error.into())
    } else {
        AttemptError::Fatal(error.into())
    }
}

fn elapsed() -> FetchError {
    FetchError::Io(io::Error::new(
        io::ErrorKind::TimedOut,
        "read timed out waiting for the server",
    ))
}

impl Fetcher {
    /// Builds a fetcher from an explicit configuration, resolving the proxy
    /// and the request headers once.
    ///
    /// The built-in defaults `User-Agent: Lynx` and
    /// `Accept-Encoding: gzip, deflate` are applied first; configured
    /// headers overwrite them on name collision.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("Lynx"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate"));
        for (name, value) in &config.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| FetchError::InvalidHeader(name.clone()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| FetchError::InvalidHeader(format!("{name}: {value}")))?;
            headers.insert(header_name, header_value);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy.url())?);
        }
        let client = builder.build()?;

        Ok(Self { client, config })
    }

    /// The configuration this fetcher was built with.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetches `url` into `sink` using the configured timeout and attempt
    /// bound. Returns the number of decoded bytes delivered.
    pub async fn fetch<S>(&self, url: &Url, sink: &mut S) -> Result<u64, FetchError>
    where
        S: Sink + ?Sized,
    {
        self.fetch_with(url, sink, self.config.timeout, self.config.attempts)
            .await
    }

    /// Like [`fetch`](Fetcher::fetch) with the timeout and attempt bound
    /// overridden for this call.
    pub async fn fetch_with<S>(
        &self,
        url: &Url,
        sink: &mut S,
        timeout: Duration,
        attempts: u32,
    ) -> Result<u64, FetchError>
    where
        S: Sink + ?Sized,
    {
        if attempts == 0 {
            return Err(FetchError::Config("attempts must be at least 1".into()));
        }
        if timeout.is_zero() {
            return Err(FetchError::Config("timeout must be non-zero".into()));
        }

        let mut made = 0u32;
        loop {
            made += 1;
            match self.attempt(url, sink, timeout).await {
                Ok(transferred) => {
                    debug!(
                        "Fetched {} bytes from {} in {} attempt(s)",
                        transferred, url, made
                    );
                    return Ok(transferred);
                }
                Err(AttemptError::TimedOut(cause)) => {
                    warn!(
                        "Timeout while fetching {} (attempt {}/{}): {}",
                        url, made, attempts, cause
                    );
                    if made == attempts {
                        return Err(FetchError::ExhaustedRetries {
                            url: url.clone(),
                            attempts,
                        });
                    }
                }
                Err(AttemptError::Fatal(error)) => return Err(error),
            }
        }
    }

    /// String-URL form of [`fetch`](Fetcher::fetch). An unparsable string
    /// fails with [`FetchError::MalformedUrl`] before any connection is
    /// opened.
    pub async fn fetch_str<S>(&self, url: &str, sink: &mut S) -> Result<u64, FetchError>
    where
        S: Sink + ?Sized,
    {
        let parsed = parse_url(url)?;
        self.fetch(&parsed, sink).await
    }

    /// Fetches `url` and returns the decoded body as an in-memory byte
    /// sequence.
    pub async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let mut body = Vec::new();
        self.fetch(url, &mut body).await?;
        Ok(body)
    }

    /// String-URL form of [`fetch_bytes`](Fetcher::fetch_bytes).
    pub async fn fetch_bytes_str(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let parsed = parse_url(url)?;
        self.fetch_bytes(&parsed).await
    }

    /// Fetches `url` into a local file, creating it (and any missing parent
    /// directories) as needed. The file is re-created on every attempt, so
    /// only the final successful body is left behind.
    pub async fn fetch_to_file(
        &self,
        url: &Url,
        path: impl AsRef<Path>,
    ) -> Result<u64, FetchError> {
        let mut sink = FileSink::new(path);
        self.fetch(url, &mut sink).await
    }

    /// String-URL and file-path convenience over
    /// [`fetch_to_file`](Fetcher::fetch_to_file).
    pub async fn save_file(&self, url: &str, path: impl AsRef<Path>) -> Result<u64, FetchError> {
        let parsed = parse_url(url)?;
        self.fetch_to_file(&parsed, path).await
    }

    /// One connect-decode-copy cycle. The response stream is dropped and
    /// the sink is closed on every exit path.
    async fn attempt<S>(
        &self,
        url: &Url,
        sink: &mut S,
        timeout: Duration,
    ) -> Result<u64, AttemptError>
    where
        S: Sink + ?Sized,
    {
        let response = match time::timeout(timeout, self.client.get(url.clone()).send()).await {
            Err(_) => return Err(AttemptError::TimedOut(elapsed())),
            Ok(Err(error)) => return Err(classify(error)),
            Ok(Ok(response)) => response,
        };
        let response = response
            .error_for_status()
            .map_err(|e| AttemptError::Fatal(e.into()))?;

        let encoding = ContentEncoding::from_header(
            response
                .headers()
                .get(CONTENT_ENCODING)
                .and_then(|v| v.to_str().ok()),
        );
        debug!("Transferring {} with {:?} content encoding", url, encoding);

        sink.begin()
            .await
            .map_err(|e| AttemptError::Fatal(e.into()))?;

        let mut stream = response.bytes_stream();
        let mut decoder = BodyDecoder::new(encoding);
        let mut transferred = 0u64;

        let outcome: Result<(), AttemptError> = loop {
            match time::timeout(timeout, stream.next()).await {
                Err(_) => break Err(AttemptError::TimedOut(elapsed())),
                Ok(None) => break Ok(()),
                Ok(Some(Err(error))) => break Err(classify(error)),
                Ok(Some(Ok(chunk))) => {
                    let decoded = match decoder.feed(chunk) {
                        Ok(decoded) => decoded,
                        Err(e) => break Err(AttemptError::Fatal(e.into())),
                    };
                    if !decoded.is_empty() {
                        if let Err(e) = sink.write_all(&decoded).await {
                            break Err(AttemptError::Fatal(e.into()));
                        }
                        transferred += decoded.len() as u64;
                    }
                }
            }
        };

        let result = match outcome {
            Ok(()) => match decoder.finish() {
                Ok(tail) if tail.is_empty() => Ok(transferred),
                Ok(tail) => match sink.write_all(&tail).await {
                    Ok(()) => Ok(transferred + tail.len() as u64),
                    Err(e) => Err(AttemptError::Fatal(e.into())),
                },
                Err(e) => Err(AttemptError::Fatal(e.into())),
            },
            Err(error) => Err(error),
        };

        // The sink is closed once per attempt, success or not.
        match sink.close().await {
            Ok(()) => result,
            Err(close_error) => result.and(Err(AttemptError::Fatal(close_error.into()))),
        }
    }
}

fn parse_url(url: &str) -> Result<Url, FetchError> {
    Url::parse(url).map_err(|source| FetchError::MalformedUrl {
        url: url.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_configured_header_is_rejected_at_build_time() {
        let config = FetchConfig {
            headers: vec![("bad header name".to_string(), "value".to_string())],
            ..FetchConfig::default()
        };
        assert!(matches!(
            Fetcher::new(config),
            Err(FetchError::InvalidHeader(_))
        ));
    }

    #[test]
    fn malformed_url_is_reported_with_the_offending_string() {
        let error = parse_url("ht!tp://bad").unwrap_err();
        match error {
            FetchError::MalformedUrl { url, .. } => assert_eq!(url, "ht!tp://bad"),
            other => panic!("expected MalformedUrl, got {other:?}"),
        }
    }
}
