//! # filegate-blob: file delivery core
//!
//! `filegate-blob` holds everything a file gateway needs below the HTTP layer:
//! the storage capability, byte-range streaming, multipart envelope decoding,
//! and the controller that ties them together.
//!
//! ## Quick Start
//!
//! ```rust
//! use filegate_blob::prelude::*;
//!
//! # #[tokio::main]
//! # async fn main() -> FileResult<()> {
//! let files = FilesController::new(MemoryFileStore::seekable(), FilegateConfig::default());
//! let ctx = FileCtx::new("my-app");
//!
//! let stored = files
//!     .create_file(&ctx, "hello.txt", bytes::Bytes::from_static(b"hello"), None)
//!     .await?;
//! assert_eq!(stored.url, "http://localhost:1337/parse/files/my-app/hello.txt");
//!
//! // Ranged reads on a seekable store are streamed
//! let download = files.download(&ctx, "hello.txt", Some("bytes=1-3")).await?;
//! assert!(download.is_partial());
//! assert_eq!(download.content_length(), 3);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │   HTTP handlers  │  ← filegate-axum
//! ├──────────────────┤
//! │  FilesController │  ← validation, delivery choice, error mapping
//! ├──────────────────┤
//! │    FileStore     │  ← storage primitives + capabilities
//! └──────────────────┘
//! ```
//!
//! Whether a ranged download is streamed depends only on
//! [`StoreCapabilities`], never on which backend is plugged in.

pub mod adapter;
mod config;
pub mod delivery;
mod error;
mod fs_store;
mod memory_store;
pub mod multipart;
pub mod range;
mod receipt;
pub mod store;
mod types;
pub mod validation;

pub use adapter::{FilesController, FALLBACK_FIELD_NAME};
pub use config::{FilegateConfig, RangeConfig};
pub use delivery::{select_delivery_path, DeliveryPath};
pub use error::{ErrorCode, FileError, FileResult};
pub use fs_store::FsFileStore;
pub use memory_store::MemoryFileStore;
pub use multipart::{FieldValue, MultipartBody, MultipartForm};
pub use range::{serve_range, PartialContent, ResolvedRange};
pub use receipt::{Download, StoredFile};
pub use store::{FileStore, StoreCapabilities};
pub use types::{ByteStream, FileCtx, FileHandle, RangeRequest, SeekableRead};
pub use validation::validate_file_name;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        ByteStream, Download, FileCtx, FileError, FileResult, FileStore, FilegateConfig,
        FilesController, FsFileStore, MemoryFileStore, StoreCapabilities, StoredFile,
    };
}
