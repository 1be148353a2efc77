//! Transparent body decompression.

use bytes::Bytes;
use flate2::write::{GzDecoder, ZlibDecoder};
use std::io::{self, Write};
use std::mem;

/// How the response bytes are compressed on the wire.
///
/// Anything other than `gzip` or `deflate` is treated as raw bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    /// Raw bytes, copied unchanged.
    Identity,
    /// RFC 1952 gzip stream.
    Gzip,
    /// RFC 1950 zlib stream, as sent by servers for `deflate`.
    Deflate,
}

impl ContentEncoding {
    /// Maps a `Content-Encoding` header value, matched case-insensitively.
    /// An absent or unrecognized value is [`ContentEncoding::Identity`].
    pub fn from_header(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("gzip") => ContentEncoding::Gzip,
            Some(v) if v.trim().eq_ignore_ascii_case("deflate") => ContentEncoding::Deflate,
            _ => ContentEncoding::Identity,
        }
    }
}

/// Incremental decoder fed with raw body chunks as they arrive, so the
/// full compressed payload is never buffered.
pub(crate) enum BodyDecoder {
    Identity,
    Gzip(GzDecoder<Vec<u8>>),
    Deflate(ZlibDecoder<Vec<u8>>),
}

impl BodyDecoder {
    pub(crate) fn new(encoding: ContentEncoding) -> Self {
        match encoding {
            ContentEncoding::Identity => BodyDecoder::Identity,
            ContentEncoding::Gzip => BodyDecoder::Gzip(GzDecoder::new(Vec::new())),
            ContentEncoding::Deflate => BodyDecoder::Deflate(ZlibDecoder::new(Vec::new())),
        }
    }

    /// Feeds one raw chunk and returns whatever decoded bytes it produced.
    /// Compressed input may legitimately yield nothing for a while.
    pub(crate) fn feed(&mut self, chunk: Bytes) -> io::Result<Bytes> {
        match self {
            BodyDecoder::Identity => Ok(chunk),
            BodyDecoder::Gzip(decoder) => {
                decoder.write_all(&chunk)?;
                Ok(mem::take(decoder.get_mut()).into())
            }
            BodyDecoder::Deflate(decoder) => {
                decoder.write_all(&chunk)?;
                Ok(mem::take(decoder.get_mut()).into())
            }
        }
    }

    /// Flushes the stream tail. Fails when the compressed stream was
    /// truncated or corrupt.
    pub(crate) fn finish(self) -> io::Result<Bytes> {
        match self {
            BodyDecoder::Identity => Ok(Bytes::new()),
            BodyDecoder::Gzip(decoder) => Ok(decoder.finish()?.into()),
            BodyDecoder::Deflate(decoder) => Ok(decoder.finish()?.into()),
        }
    }
}
