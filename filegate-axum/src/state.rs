use std::sync::Arc;

use filegate_blob::{FilegateConfig, FilesController};

#[derive(Clone)]
pub struct FilegateState {
    pub files: Arc<FilesController>,
}

impl FilegateState {
    pub fn new(files: FilesController) -> Self {
        Self {
            files: Arc::new(files),
        }
    }

    pub fn config(&self) -> &FilegateConfig {
        self.files.config()
    }
}
