use bytes::Bytes;
use futures_core::Stream;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncSeek};
use uuid::Uuid;

/// Stream of bytes for file content
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Context for file operations (application, request info)
#[derive(Debug, Clone)]
pub struct FileCtx {
    pub app_id: String,
    pub request_id: String,
}

impl FileCtx {
    pub fn new<S: Into<String>>(app_id: S) -> Self {
        Self {
            app_id: app_id.into(),
            request_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn with_request_id<S: Into<String>>(mut self, request_id: S) -> Self {
        self.request_id = request_id.into();
        self
    }
}

/// Anything the range engine can seek and read from
pub trait SeekableRead: AsyncRead + AsyncSeek + Send + Unpin {}

impl<T: AsyncRead + AsyncSeek + Send + Unpin> SeekableRead for T {}

/// Seekable read handle on a stored file, with its total length.
///
/// The handle owns the backend read resource; dropping it releases that
/// resource.
pub struct FileHandle {
    reader: Box<dyn SeekableRead>,
    length: u64,
}

impl FileHandle {
    pub fn new<R: SeekableRead + 'static>(reader: R, length: u64) -> Self {
        Self {
            reader: Box::new(reader),
            length,
        }
    }

    /// Total length of the stored file
    pub fn length(&self) -> u64 {
        self.length
    }

    pub(crate) fn into_reader(self) -> Box<dyn SeekableRead> {
        self.reader
    }
}

impl std::fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileHandle")
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

/// Byte range as written by the client, before resolution against a length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RangeRequest {
    pub start: Option<u64>,
    pub end: Option<u64>,
}

impl RangeRequest {
    pub fn new(start: Option<u64>, end: Option<u64>) -> Self {
        Self { start, end }
    }
}
