//! Error types for the duration library.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised at the library boundary.
///
/// Scanning itself never fails on malformed audio; only I/O on the input and
/// configuration loading can.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The path does not name a regular file (a directory, a socket, ...).
    #[error("not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("invalid config file {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
