use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{FileCtx, FileError, FileHandle, FileResult, FileStore, StoreCapabilities};

/// Filesystem store. Files live at `{root}/{app_id}/{name}`.
///
/// Writes go to a temporary sibling first and are renamed into place.
#[derive(Debug, Clone)]
pub struct FsFileStore {
    root: PathBuf,
}

impl FsFileStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> FileResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        info!(path = %root.display(), "filesystem file store ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, ctx: &FileCtx, name: &str) -> FileResult<PathBuf> {
        Ok(self
            .root
            .join(Self::segment(&ctx.app_id)?)
            .join(Self::segment(name)?))
    }

    // One path component, never a traversal
    fn segment(value: &str) -> FileResult<&str> {
        if value.is_empty()
            || value == "."
            || value == ".."
            || value.contains(['/', '\\', '\0'])
        {
            return Err(FileError::backend(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid path segment: {value:?}"),
            )));
        }
        Ok(value)
    }
}

#[async_trait]
impl FileStore for FsFileStore {
    async fn create_file(
        &self,
        ctx: &FileCtx,
        name: &str,
        data: Bytes,
        _content_type: Option<&str>,
    ) -> FileResult<()> {
        let path = self.path_for(ctx, name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Stored names never start with a dot, so this cannot clash
        let temp_path = path.with_file_name(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()));
        tokio::fs::write(&temp_path, &data).await?;
        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        debug!(path = %path.display(), size = data.len(), "wrote file");
        Ok(())
    }

    async fn delete_file(&self, ctx: &FileCtx, name: &str) -> FileResult<()> {
        let path = self.path_for(ctx, name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FileError::not_found(name)),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_file_data(&self, ctx: &FileCtx, name: &str) -> FileResult<Bytes> {
        let path = self.path_for(ctx, name)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FileError::not_found(name)),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_file_stream(&self, ctx: &FileCtx, name: &str) -> FileResult<FileHandle> {
        let path = self.path_for(ctx, name)?;
        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FileError::not_found(name))
            }
            Err(e) => return Err(e.into()),
        };
        let length = file.metadata().await?.len();
        Ok(FileHandle::new(file, length))
    }

    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities::basic().with_stream().with_partial_read()
    }
}
