use std::sync::Arc;

use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::delivery::{content_type_for, select_delivery_path, DeliveryPath};
use crate::multipart::{self, MultipartBody};
use crate::range::serve_range;
use crate::validation::validate_file_name;
use crate::{
    Download, FileCtx, FileError, FileResult, FileStore, FilegateConfig, StoreCapabilities,
    StoredFile,
};

/// Field name one mobile client always uses for its upload, whatever the file
/// is called.
pub const FALLBACK_FIELD_NAME: &str = "wx-file.jpg";

/// Characters left alone by JavaScript's `encodeURIComponent`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Upload, download and delete orchestration on top of a [`FileStore`]
#[derive(Clone)]
pub struct FilesController {
    store: Arc<dyn FileStore>,
    config: FilegateConfig,
}

impl FilesController {
    /// Create a new controller
    pub fn new<S: FileStore + 'static>(store: S, config: FilegateConfig) -> Self {
        Self {
            store: Arc::new(store),
            config,
        }
    }

    /// Store a raw upload
    pub async fn create_file(
        &self,
        ctx: &FileCtx,
        filename: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> FileResult<StoredFile> {
        Self::validate_upload(filename, &body)?;

        let content_type = content_type
            .filter(|ct| !ct.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| content_type_for(filename));

        self.store_file(ctx, filename, body, &content_type).await
    }

    /// Store the file carried in a multipart envelope.
    ///
    /// The payload is the part named after the file, or the part under
    /// [`FALLBACK_FIELD_NAME`] when there is none.
    pub async fn create_from_envelope(
        &self,
        ctx: &FileCtx,
        filename: &str,
        body: Bytes,
        content_type: Option<&str>,
    ) -> FileResult<StoredFile> {
        Self::validate_upload(filename, &body)?;

        let content_type = content_type.ok_or(FileError::MalformedContentType)?;
        let mut form = multipart::decode(MultipartBody::Raw(&body), content_type)?;
        debug!(fields = ?form.names().collect::<Vec<_>>(), "decoded multipart envelope");

        let data = form
            .take(filename)
            .or_else(|| form.take(FALLBACK_FIELD_NAME))
            .ok_or(FileError::NoFileDataFound)?
            .into_bytes();

        self.store_file(ctx, filename, data, &content_type_for(filename))
            .await
    }

    /// Delete a file
    pub async fn delete_file(&self, ctx: &FileCtx, filename: &str) -> FileResult<()> {
        match self.store.delete_file(ctx, filename).await {
            Ok(()) => {
                info!(app_id = %ctx.app_id, request_id = %ctx.request_id, filename, "file deleted");
                Ok(())
            }
            Err(e) => {
                error!(app_id = %ctx.app_id, request_id = %ctx.request_id, filename, error = %e, "could not delete file");
                Err(FileError::delete_failed(e))
            }
        }
    }

    /// Answer a download, streaming a window when a Range header is present
    /// and the store supports partial reads.
    pub async fn download(
        &self,
        ctx: &FileCtx,
        filename: &str,
        range: Option<&str>,
    ) -> FileResult<Download> {
        let content_type = content_type_for(filename);

        match (select_delivery_path(range.is_some(), &self.capabilities()), range) {
            (DeliveryPath::Stream, Some(range)) => {
                let handle = self.store.get_file_stream(ctx, filename).await.map_err(|e| {
                    debug!(request_id = %ctx.request_id, filename, error = %e, "stream lookup failed");
                    FileError::not_found(filename)
                })?;
                let partial = serve_range(handle, range, &content_type, &self.config.range).await?;
                Ok(Download::Partial(partial))
            }
            _ => {
                let data = self.store.get_file_data(ctx, filename).await.map_err(|e| {
                    debug!(request_id = %ctx.request_id, filename, error = %e, "file lookup failed");
                    FileError::not_found(filename)
                })?;
                Ok(Download::Full { data, content_type })
            }
        }
    }

    /// Public URL for a stored file
    pub fn file_location(&self, ctx: &FileCtx, name: &str) -> String {
        format!(
            "{}/files/{}/{}",
            self.config.public_url,
            utf8_percent_encode(&ctx.app_id, URI_COMPONENT),
            utf8_percent_encode(name, URI_COMPONENT)
        )
    }

    /// Get configuration
    pub fn config(&self) -> &FilegateConfig {
        &self.config
    }

    /// Capabilities of the underlying store
    pub fn capabilities(&self) -> StoreCapabilities {
        self.store.capabilities()
    }

    fn validate_upload(filename: &str, body: &Bytes) -> FileResult<()> {
        if body.is_empty() {
            return Err(FileError::invalid_file_name("Invalid file upload."));
        }
        validate_file_name(filename)
    }

    async fn store_file(
        &self,
        ctx: &FileCtx,
        filename: &str,
        data: Bytes,
        content_type: &str,
    ) -> FileResult<StoredFile> {
        let name = if self.config.preserve_file_name {
            filename.to_string()
        } else {
            format!("{}_{}", Uuid::new_v4().simple(), filename)
        };
        let size = data.len();

        match self.store.create_file(ctx, &name, data, Some(content_type)).await {
            Ok(()) => {
                info!(app_id = %ctx.app_id, request_id = %ctx.request_id, name = %name, size, content_type, "file stored");
                let url = self.file_location(ctx, &name);
                Ok(StoredFile::new(name, url))
            }
            Err(e) => {
                error!(app_id = %ctx.app_id, request_id = %ctx.request_id, name = %name, error = %e, "could not store file");
                Err(FileError::save_failed(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryFileStore;
    use futures_util::StreamExt;

    fn envelope(boundary: &str, field: &str, content: &[u8]) -> Bytes {
        let mut body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
        Bytes::from(body)
    }

    fn ctx() -> FileCtx {
        FileCtx::new("app1")
    }

    #[tokio::test]
    async fn upload_then_buffered_download() {
        let files = FilesController::new(MemoryFileStore::new(), FilegateConfig::default());

        let stored = files
            .create_file(&ctx(), "test.txt", Bytes::from_static(b"hello"), Some("text/plain"))
            .await
            .unwrap();
        assert_eq!(stored.name, "test.txt");
        assert_eq!(stored.url, "http://localhost:1337/parse/files/app1/test.txt");

        let download = files.download(&ctx(), "test.txt", None).await.unwrap();
        assert!(!download.is_partial());
        assert_eq!(download.content_length(), 5);
        match download {
            Download::Full { data, content_type } => {
                assert_eq!(&data[..], b"hello");
                assert_eq!(content_type, "text/plain");
            }
            Download::Partial(_) => unreachable!(),
        }
    }

    #[tokio::test]
    async fn range_on_whole_file_store_is_buffered() {
        let files = FilesController::new(MemoryFileStore::new(), FilegateConfig::default());
        files
            .create_file(&ctx(), "a.bin", Bytes::from(vec![7u8; 100]), None)
            .await
            .unwrap();

        let download = files.download(&ctx(), "a.bin", Some("bytes=10-19")).await.unwrap();
        assert!(!download.is_partial());
        assert_eq!(download.content_length(), 100);
    }

    #[tokio::test]
    async fn range_on_seekable_store_is_streamed() {
        let files = FilesController::new(MemoryFileStore::seekable(), FilegateConfig::default());
        let data: Vec<u8> = (0..1000u32).map(|i| i as u8).collect();
        files
            .create_file(&ctx(), "clip.mp4", Bytes::from(data.clone()), None)
            .await
            .unwrap();

        let download = files.download(&ctx(), "clip.mp4", Some("bytes=200-299")).await.unwrap();
        let Download::Partial(mut partial) = download else {
            panic!("expected partial content");
        };
        assert_eq!(partial.range.content_range(), "bytes 200-299/1000");
        assert_eq!(partial.content_type, "video/mp4");

        let mut body = Vec::new();
        while let Some(chunk) = partial.body.next().await {
            body.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(body, &data[200..300]);
    }

    #[tokio::test]
    async fn missing_file_is_not_found_on_both_paths() {
        let files = FilesController::new(MemoryFileStore::seekable(), FilegateConfig::default());
        for range in [None, Some("bytes=0-10")] {
            let err = tokio_test::assert_err!(files.download(&ctx(), "nope.txt", range).await);
            assert!(matches!(err, FileError::FileNotFound { .. }));
        }
    }

    #[tokio::test]
    async fn upload_validation_runs_before_store() {
        let files = FilesController::new(MemoryFileStore::new(), FilegateConfig::default());

        let err = tokio_test::assert_err!(files.create_file(&ctx(), "ok.txt", Bytes::new(), None).await);
        assert_eq!(err.to_string(), "Invalid file upload.");

        let err = tokio_test::assert_err!(
            files
                .create_file(&ctx(), "../etc/passwd", Bytes::from_static(b"x"), None)
                .await
        );
        assert!(matches!(err, FileError::InvalidFileName { .. }));
    }

    #[tokio::test]
    async fn envelope_prefers_exact_name_then_fallback() {
        let files = FilesController::new(MemoryFileStore::new(), FilegateConfig::default());
        let ct = "multipart/form-data; boundary=XyZ";

        files
            .create_from_envelope(&ctx(), "pic.jpg", envelope("XyZ", "pic.jpg", b"exact"), Some(ct))
            .await
            .unwrap();
        let download = files.download(&ctx(), "pic.jpg", None).await.unwrap();
        assert_eq!(download.content_length(), 5);

        files
            .create_from_envelope(&ctx(), "other.jpg", envelope("XyZ", FALLBACK_FIELD_NAME, b"fallback"), Some(ct))
            .await
            .unwrap();
        let Download::Full { data, content_type } = files.download(&ctx(), "other.jpg", None).await.unwrap() else {
            panic!("expected full content");
        };
        assert_eq!(&data[..], b"fallback");
        assert_eq!(content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn envelope_errors() {
        let files = FilesController::new(MemoryFileStore::new(), FilegateConfig::default());

        let err = tokio_test::assert_err!(
            files
                .create_from_envelope(&ctx(), "pic.jpg", envelope("XyZ", "other", b"x"), Some("multipart/form-data; boundary=XyZ"))
                .await
        );
        assert!(matches!(err, FileError::NoFileDataFound));

        let err = tokio_test::assert_err!(
            files
                .create_from_envelope(&ctx(), "pic.jpg", envelope("XyZ", "pic.jpg", b"x"), Some("multipart/form-data"))
                .await
        );
        assert!(matches!(err, FileError::MalformedContentType));
    }

    #[tokio::test]
    async fn delete_of_missing_file_fails() {
        let files = FilesController::new(MemoryFileStore::new(), FilegateConfig::default());
        let err = tokio_test::assert_err!(files.delete_file(&ctx(), "ghost.txt").await);
        assert!(matches!(err, FileError::FileDeleteError { .. }));
        assert_eq!(err.to_string(), "Could not delete file.");
    }

    #[tokio::test]
    async fn unique_names_get_hex_prefix() {
        let files = FilesController::new(
            MemoryFileStore::new(),
            FilegateConfig::default().unique_file_names(),
        );
        let stored = files
            .create_file(&ctx(), "a b.txt", Bytes::from_static(b"x"), None)
            .await
            .unwrap();

        let (prefix, rest) = stored.name.split_once('_').unwrap();
        assert_eq!(prefix.len(), 32);
        assert!(prefix.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(rest, "a b.txt");
        assert!(stored.url.ends_with(&format!("{prefix}_a%20b.txt")));
    }
}
