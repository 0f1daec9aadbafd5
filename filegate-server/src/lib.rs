mod app;

use anyhow::Result;
use filegate_axum::{filegate, FilegateApp};
use filegate_blob::{FilesController, FsFileStore, MemoryFileStore};

pub use app::ServerSettings;

pub fn build(settings: &ServerSettings) -> Result<FilegateApp> {
    let config = settings.files.clone();

    let files = match &settings.storage_dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "using filesystem storage");
            FilesController::new(FsFileStore::new(dir)?, config)
        }
        None => {
            tracing::info!("using in-memory storage");
            FilesController::new(MemoryFileStore::seekable(), config)
        }
    };

    Ok(filegate(files).service("/health", || async { "ok" }))
}
