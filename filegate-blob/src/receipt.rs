use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::range::PartialContent;

/// Descriptor returned after successfully storing a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    /// Name the file was stored under
    pub name: String,
    /// Public URL of the file
    pub url: String,
}

impl StoredFile {
    pub fn new<N: Into<String>, U: Into<String>>(name: N, url: U) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Content delivery result for a download
#[derive(Debug)]
pub enum Download {
    /// Whole file, status 200
    Full { data: Bytes, content_type: String },
    /// Byte range, status 206
    Partial(PartialContent),
}

impl Download {
    pub fn is_partial(&self) -> bool {
        matches!(self, Download::Partial(_))
    }

    /// Value for `Content-Length`
    pub fn content_length(&self) -> u64 {
        match self {
            Download::Full { data, .. } => data.len() as u64,
            Download::Partial(partial) => partial.range.content_length,
        }
    }
}
