use thiserror::Error;

/// Result type for file operations
pub type FileResult<T> = Result<T, FileError>;

/// Errors that can occur while storing, serving or deleting files
#[derive(Error, Debug)]
pub enum FileError {
    #[error("{message}")]
    InvalidFileName { message: String },

    #[error("Bad content-type header, no multipart boundary")]
    MalformedContentType,

    #[error("Bad multipart body parsing: no data file found")]
    NoFileDataFound,

    #[error("Could not store file.")]
    FileSaveError {
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Could not delete file.")]
    FileDeleteError {
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("File not found: {name}")]
    FileNotFound { name: String },

    #[error("Requested range not satisfiable for length {total_size}")]
    RangeNotSatisfiable { total_size: u64 },

    #[error("Operation not supported by this store")]
    Unsupported,

    #[error("Storage backend error: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl FileError {
    /// Create a backend error from any error type
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(error),
        }
    }

    /// Create an invalid file name error
    pub fn invalid_file_name<S: Into<String>>(message: S) -> Self {
        Self::InvalidFileName {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(name: S) -> Self {
        Self::FileNotFound { name: name.into() }
    }

    /// Wrap a backend failure as a save error, keeping the cause for logs only
    pub fn save_failed(source: FileError) -> Self {
        Self::FileSaveError {
            source: Some(Box::new(source)),
        }
    }

    /// Wrap a backend failure as a delete error, keeping the cause for logs only
    pub fn delete_failed(source: FileError) -> Self {
        Self::FileDeleteError {
            source: Some(Box::new(source)),
        }
    }

    /// Stable client-facing classification of this error
    pub fn code(&self) -> ErrorCode {
        match self {
            FileError::InvalidFileName { .. } => ErrorCode::InvalidFileName,
            FileError::MalformedContentType => ErrorCode::MalformedContentType,
            FileError::NoFileDataFound => ErrorCode::NoFileDataFound,
            FileError::FileSaveError { .. } => ErrorCode::FileSaveError,
            FileError::FileDeleteError { .. } => ErrorCode::FileDeleteError,
            FileError::FileNotFound { .. } => ErrorCode::FileNotFound,
            FileError::RangeNotSatisfiable { .. } => ErrorCode::RangeNotSatisfiable,
            FileError::Unsupported | FileError::Backend { .. } | FileError::Io { .. } => {
                ErrorCode::InternalError
            }
        }
    }
}

/// Error classes exposed to clients, with Parse-compatible numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidFileName,     // 122
    MalformedContentType, // 126
    FileSaveError,       // 130
    NoFileDataFound,     // 131
    FileDeleteError,     // 153
    FileNotFound,        // 404
    RangeNotSatisfiable, // 416
    InternalError,       // 1
}

impl ErrorCode {
    /// Numeric code carried in the JSON error body
    pub fn code(&self) -> i32 {
        match self {
            ErrorCode::InvalidFileName => 122,
            ErrorCode::MalformedContentType => 126,
            ErrorCode::FileSaveError => 130,
            ErrorCode::NoFileDataFound => 131,
            ErrorCode::FileDeleteError => 153,
            ErrorCode::FileNotFound => 404,
            ErrorCode::RangeNotSatisfiable => 416,
            ErrorCode::InternalError => 1,
        }
    }

    /// HTTP status for this class
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCode::InvalidFileName
            | ErrorCode::MalformedContentType
            | ErrorCode::FileSaveError
            | ErrorCode::NoFileDataFound
            | ErrorCode::FileDeleteError => 400,
            ErrorCode::FileNotFound => 404,
            ErrorCode::RangeNotSatisfiable => 416,
            ErrorCode::InternalError => 500,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorCode::InvalidFileName => "InvalidFileName",
            ErrorCode::MalformedContentType => "MalformedContentType",
            ErrorCode::FileSaveError => "FileSaveError",
            ErrorCode::NoFileDataFound => "NoFileDataFound",
            ErrorCode::FileDeleteError => "FileDeleteError",
            ErrorCode::FileNotFound => "FileNotFound",
            ErrorCode::RangeNotSatisfiable => "RangeNotSatisfiable",
            ErrorCode::InternalError => "InternalError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_error_hides_backend_cause_in_message() {
        let err = FileError::save_failed(FileError::backend(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "disk quota for /var/secret exceeded",
        )));
        assert_eq!(err.to_string(), "Could not store file.");
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.code(), ErrorCode::FileSaveError);
        assert_eq!(err.code().code(), 130);
    }

    #[test]
    fn codes_map_to_expected_statuses() {
        assert_eq!(FileError::invalid_file_name("x").code().status_code(), 400);
        assert_eq!(FileError::not_found("a.txt").code().status_code(), 404);
        assert_eq!(
            FileError::RangeNotSatisfiable { total_size: 3 }.code().status_code(),
            416
        );
        assert_eq!(FileError::Unsupported.code().status_code(), 500);
    }
}
