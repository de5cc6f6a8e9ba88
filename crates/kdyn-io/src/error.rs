//! Error types for kdyn-io

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, KioError>;

#[derive(Error, Debug)]
pub enum KioError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("no file path recorded for provenance index {0}")]
    UnknownFile(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
