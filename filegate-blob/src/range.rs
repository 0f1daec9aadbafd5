//! Byte-range partial-content streaming.
//!
//! A `Range` header is resolved against the file length into a
//! [`ResolvedRange`], the backend handle is positioned at `start`, and the
//! handle is then drained into a body stream that stops at exactly
//! `content_length` bytes. The handle is owned by the body stream, so the
//! backend read resource is released when the transfer completes, when it
//! fails, or when the client goes away and the body is dropped.

use std::io::SeekFrom;

use bytes::Bytes;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncSeekExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::{ByteStream, FileError, FileHandle, FileResult, RangeConfig, RangeRequest, SeekableRead};

/// Range information for a partial content response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRange {
    pub start: u64,
    pub end: u64,
    pub total_size: u64,
    /// Bytes announced in `Content-Length` and transferred
    pub content_length: u64,
}

impl ResolvedRange {
    /// Value of the `Content-Range` header
    pub fn content_range(&self) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, self.total_size)
    }
}

/// Parse a `Range` header value such as `bytes=200-299`.
///
/// Only the first range of a list is considered. Returns `None` when a bound
/// is present but not a non-negative integer.
pub fn parse_range_header(value: &str) -> Option<RangeRequest> {
    let ranges = value.trim();
    let ranges = ranges.strip_prefix("bytes=").unwrap_or(ranges);
    let first = ranges.split(',').next().unwrap_or_default();
    let (start, end) = first.split_once('-').unwrap_or((first, ""));

    Some(RangeRequest::new(parse_bound(start)?, parse_bound(end)?))
}

fn parse_bound(raw: &str) -> Option<Option<u64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(None);
    }
    raw.parse::<u64>().ok().map(Some)
}

/// Resolve a `Range` header value against a file of `total_size` bytes.
pub fn resolve_range(
    header: &str,
    total_size: u64,
    config: &RangeConfig,
) -> FileResult<ResolvedRange> {
    let unsatisfiable = || FileError::RangeNotSatisfiable { total_size };
    let request = parse_range_header(header).ok_or_else(unsatisfiable)?;
    resolve_request(request, total_size, config).ok_or_else(unsatisfiable)
}

/// Resolve a parsed range. `None` means the range cannot be served.
pub fn resolve_request(
    request: RangeRequest,
    total_size: u64,
    config: &RangeConfig,
) -> Option<ResolvedRange> {
    if total_size == 0 {
        return None;
    }
    let last = total_size - 1;

    let mut start = request.start.unwrap_or(0);
    let requested_end = request.end.unwrap_or(last);
    let mut open_ended = request.end.is_none();
    if start > requested_end || start > last {
        return None;
    }

    // A single byte request is served as an open-ended range from zero.
    // Checked before clamping so `last-<past the end>` keeps its start.
    if requested_end == start {
        start = 0;
        open_ended = true;
    }
    let mut end = requested_end.min(last);

    if open_ended {
        end = if last - start < config.buffer_size {
            last
        } else {
            start + config.buffer_size
        };
    }

    let mut content_length = end - start + 1;
    if config.probe_quirk {
        content_length = apply_probe_quirk(start, end, content_length);
    }

    Some(ResolvedRange {
        start,
        end,
        total_size,
        content_length,
    })
}

/// Some media clients open with a `0-2` probe and expect a single byte back.
/// Only that exact window is affected.
pub fn apply_probe_quirk(start: u64, end: u64, content_length: u64) -> u64 {
    if start == 0 && end == 2 {
        1
    } else {
        content_length
    }
}

/// Counters for one partial transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeTransfer {
    buffered: u64,
    written: u64,
    wanted: u64,
}

impl RangeTransfer {
    pub fn new(wanted: u64) -> Self {
        Self {
            buffered: 0,
            written: 0,
            wanted,
        }
    }

    /// Take a fragment from the backend and return the part to forward.
    pub fn accept(&mut self, fragment: Bytes) -> Option<Bytes> {
        self.buffered += fragment.len() as u64;
        let remaining = self.remaining();
        if remaining == 0 || fragment.is_empty() {
            return None;
        }

        let take = remaining.min(fragment.len() as u64);
        self.written += take;
        if take == fragment.len() as u64 {
            Some(fragment)
        } else {
            // take < fragment.len() <= usize::MAX
            Some(fragment.slice(..take as usize))
        }
    }

    pub fn remaining(&self) -> u64 {
        self.wanted.saturating_sub(self.written)
    }

    pub fn is_complete(&self) -> bool {
        self.written >= self.wanted
    }

    pub fn buffered(&self) -> u64 {
        self.buffered
    }

    pub fn written(&self) -> u64 {
        self.written
    }
}

/// A resolved partial response, ready to be sent with status 206
pub struct PartialContent {
    pub range: ResolvedRange,
    pub content_type: String,
    pub body: ByteStream,
}

impl std::fmt::Debug for PartialContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartialContent")
            .field("range", &self.range)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Resolve `range_header` against `handle`, seek to the start of the window
/// and return the body stream for it.
///
/// Nothing is returned until the seek has completed, so callers never commit
/// headers for a handle that could not be positioned.
pub async fn serve_range(
    handle: FileHandle,
    range_header: &str,
    content_type: &str,
    config: &RangeConfig,
) -> FileResult<PartialContent> {
    let range = resolve_range(range_header, handle.length(), config)?;

    let mut reader = handle.into_reader();
    reader.seek(SeekFrom::Start(range.start)).await?;
    debug!(
        start = range.start,
        end = range.end,
        total = range.total_size,
        length = range.content_length,
        "serving partial content"
    );

    Ok(PartialContent {
        range,
        content_type: content_type.to_string(),
        body: transfer(reader, range.content_length, config.read_chunk_size),
    })
}

fn transfer(reader: Box<dyn SeekableRead>, wanted: u64, read_chunk_size: usize) -> ByteStream {
    let stream = async_stream::stream! {
        let mut state = RangeTransfer::new(wanted);
        let mut fragments = ReaderStream::with_capacity(reader, read_chunk_size.max(1));

        loop {
            let next = fragments.next().await;
            match next {
                Some(Ok(fragment)) => {
                    let out = state.accept(fragment);
                    if state.is_complete() {
                        // Release the backend handle before the last write.
                        drop(fragments);
                        debug!(written = state.written(), buffered = state.buffered(), "range transfer complete");
                        if let Some(out) = out {
                            yield Ok(out);
                        }
                        break;
                    }
                    if let Some(out) = out {
                        yield Ok(out);
                    }
                }
                Some(Err(err)) => {
                    warn!(written = state.written(), wanted, error = %err, "backend read failed mid-transfer");
                    yield Err(err);
                    break;
                }
                None => {
                    warn!(written = state.written(), wanted, "backend stream ended before range was satisfied");
                    yield Err(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        format!("backend ended after {} of {} bytes", state.written(), wanted),
                    ));
                    break;
                }
            }
        }
    };
    Box::pin(stream)
}
