//! filegate-axum: Axum HTTP surface for the filegate file gateway.
//!
//! Serves `/files` and `/wxfiles` on top of a
//! [`FilesController`](filegate_blob::FilesController), maps
//! [`FileError`](filegate_blob::FileError) to Parse-style responses and
//! guards deletes with the master key.

pub mod app;
mod error;
pub mod files;
pub mod state;
pub use error::FilegateAxumError;
pub use state::FilegateState;

pub use app::{filegate, FilegateApp};
