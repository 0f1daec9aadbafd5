use once_cell::sync::Lazy;
use regex::Regex;

use crate::{FileError, FileResult};

/// Longest accepted file name, in characters
pub const MAX_FILE_NAME_LENGTH: usize = 128;

static FILE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[_a-zA-Z0-9][a-zA-Z0-9@. ~_-]*$").expect("file name pattern is valid")
});

/// Check a client supplied file name.
pub fn validate_file_name(name: &str) -> FileResult<()> {
    if name.is_empty() {
        return Err(FileError::invalid_file_name("Filename not provided."));
    }
    if name.chars().count() > MAX_FILE_NAME_LENGTH {
        return Err(FileError::invalid_file_name("Filename too long."));
    }
    if !FILE_NAME.is_match(name) {
        return Err(FileError::invalid_file_name(
            "Filename contains invalid characters.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allowed_names() {
        for name in [
            "test.txt",
            "_hidden",
            "a",
            "photo 2024~final@2x.jpg",
            "archive.tar.gz",
            "0-9_a-z",
        ] {
            tokio_test::assert_ok!(validate_file_name(name), "{name}");
        }
        tokio_test::assert_ok!(validate_file_name(&"a".repeat(MAX_FILE_NAME_LENGTH)));
    }

    #[test]
    fn rejects_bad_names() {
        for name in [
            "",
            ".hidden",
            "-dash",
            " space",
            "dir/file.txt",
            "dir\\file.txt",
            "tab\there",
            "new\nline",
            "nul\0",
            "semi;colon",
            "ünicode.txt",
            "ends\n",
        ] {
            let err = tokio_test::assert_err!(validate_file_name(name), "{name:?}");
            assert!(matches!(err, FileError::InvalidFileName { .. }));
        }
    }

    #[test]
    fn rejects_overlong_names() {
        let err = tokio_test::assert_err!(validate_file_name(&"a".repeat(MAX_FILE_NAME_LENGTH + 1)));
        assert_eq!(err.to_string(), "Filename too long.");
    }
}
