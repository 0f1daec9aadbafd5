use async_trait::async_trait;
use bytes::Bytes;

use crate::{FileCtx, FileError, FileHandle, FileResult};

/// Storage capability - implemented by every storage backend
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store a file under `name`, replacing any previous content
    async fn create_file(
        &self,
        ctx: &FileCtx,
        name: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> FileResult<()>;

    /// Delete a file
    async fn delete_file(&self, ctx: &FileCtx, name: &str) -> FileResult<()>;

    /// Fetch the whole file
    async fn get_file_data(&self, ctx: &FileCtx, name: &str) -> FileResult<Bytes>;

    /// Open a seekable read handle on the file
    async fn get_file_stream(&self, _ctx: &FileCtx, _name: &str) -> FileResult<FileHandle> {
        Err(FileError::Unsupported)
    }

    /// Get store capabilities
    fn capabilities(&self) -> StoreCapabilities;
}

/// Store capabilities
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCapabilities {
    /// `get_file_stream` is implemented
    pub supports_stream: bool,
    /// Streams can be positioned anywhere without reading the whole file
    pub supports_partial_read: bool,
}

impl StoreCapabilities {
    /// Whole-file semantics only
    pub fn basic() -> Self {
        Self {
            supports_stream: false,
            supports_partial_read: false,
        }
    }

    pub fn with_stream(mut self) -> Self {
        self.supports_stream = true;
        self
    }

    pub fn with_partial_read(mut self) -> Self {
        self.supports_partial_read = true;
        self
    }
}
