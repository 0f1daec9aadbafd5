use std::collections::HashMap;
use std::io::Cursor;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{FileCtx, FileError, FileHandle, FileResult, FileStore, StoreCapabilities};

type FileKey = (String, String);

#[derive(Debug, Clone)]
struct MemoryEntry {
    data: Bytes,
    content_type: Option<String>,
}

/// In-memory file store, keyed by application id and file name.
///
/// `new()` only offers whole-file reads. `seekable()` also hands out
/// positioned read handles, so ranged downloads get streamed.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    files: RwLock<HashMap<FileKey, MemoryEntry>>,
    seekable: bool,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seekable() -> Self {
        Self {
            files: RwLock::default(),
            seekable: true,
        }
    }

    /// Stored content type of a file, if any was recorded
    pub async fn content_type(&self, ctx: &FileCtx, name: &str) -> Option<String> {
        let files = self.files.read().await;
        files
            .get(&Self::key(ctx, name))
            .and_then(|entry| entry.content_type.clone())
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }

    fn key(ctx: &FileCtx, name: &str) -> FileKey {
        (ctx.app_id.clone(), name.to_string())
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn create_file(
        &self,
        ctx: &FileCtx,
        name: &str,
        data: Bytes,
        content_type: Option<&str>,
    ) -> FileResult<()> {
        let mut files = self.files.write().await;
        files.insert(
            Self::key(ctx, name),
            MemoryEntry {
                data,
                content_type: content_type.map(str::to_string),
            },
        );
        Ok(())
    }

    async fn delete_file(&self, ctx: &FileCtx, name: &str) -> FileResult<()> {
        let mut files = self.files.write().await;
        files
            .remove(&Self::key(ctx, name))
            .map(|_| ())
            .ok_or_else(|| FileError::not_found(name))
    }

    async fn get_file_data(&self, ctx: &FileCtx, name: &str) -> FileResult<Bytes> {
        let files = self.files.read().await;
        files
            .get(&Self::key(ctx, name))
            .map(|entry| entry.data.clone())
            .ok_or_else(|| FileError::not_found(name))
    }

    async fn get_file_stream(&self, ctx: &FileCtx, name: &str) -> FileResult<FileHandle> {
        if !self.seekable {
            return Err(FileError::Unsupported);
        }

        let data = self.get_file_data(ctx, name).await?;
        debug!(name, length = data.len(), "opened in-memory read handle");
        let length = data.len() as u64;
        Ok(FileHandle::new(Cursor::new(data), length))
    }

    fn capabilities(&self) -> StoreCapabilities {
        if self.seekable {
            StoreCapabilities::basic().with_stream().with_partial_read()
        } else {
            StoreCapabilities::basic()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncSeekExt};

    #[tokio::test]
    async fn files_are_scoped_by_app() {
        let store = MemoryFileStore::new();
        let a = FileCtx::new("a");
        let b = FileCtx::new("b");

        store
            .create_file(&a, "x.txt", Bytes::from_static(b"one"), Some("text/plain"))
            .await
            .unwrap();

        assert_eq!(store.get_file_data(&a, "x.txt").await.unwrap(), "one");
        assert!(matches!(
            store.get_file_data(&b, "x.txt").await,
            Err(FileError::FileNotFound { .. })
        ));
        assert_eq!(store.content_type(&a, "x.txt").await.as_deref(), Some("text/plain"));
    }

    #[tokio::test]
    async fn create_overwrites_and_delete_removes() {
        let store = MemoryFileStore::new();
        let ctx = FileCtx::new("app");

        store.create_file(&ctx, "f", Bytes::from_static(b"old"), None).await.unwrap();
        store.create_file(&ctx, "f", Bytes::from_static(b"new"), None).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get_file_data(&ctx, "f").await.unwrap(), "new");

        tokio_test::assert_ok!(store.delete_file(&ctx, "f").await);
        assert!(store.is_empty().await);
        tokio_test::assert_err!(store.delete_file(&ctx, "f").await);
    }

    #[tokio::test]
    async fn basic_store_has_no_stream() {
        let store = MemoryFileStore::new();
        let ctx = FileCtx::new("app");
        store.create_file(&ctx, "f", Bytes::from_static(b"abc"), None).await.unwrap();

        assert_eq!(store.capabilities(), StoreCapabilities::basic());
        assert!(matches!(
            store.get_file_stream(&ctx, "f").await,
            Err(FileError::Unsupported)
        ));
    }

    #[tokio::test]
    async fn seekable_store_positions_reads() {
        let store = MemoryFileStore::seekable();
        let ctx = FileCtx::new("app");
        store
            .create_file(&ctx, "f", Bytes::from_static(b"0123456789"), None)
            .await
            .unwrap();

        let caps = store.capabilities();
        assert!(caps.supports_stream && caps.supports_partial_read);

        let handle = store.get_file_stream(&ctx, "f").await.unwrap();
        assert_eq!(handle.length(), 10);

        let mut reader = handle.into_reader();
        reader.seek(std::io::SeekFrom::Start(4)).await.unwrap();
        let mut buf = [0u8; 3];
        reader.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"456");
    }
}
