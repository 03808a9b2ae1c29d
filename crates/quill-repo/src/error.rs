use std::path::PathBuf;

use quill_types::ObjectId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("not a quill repository (or any parent): {}", .0.display())]
    NotARepository(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("{} is not empty", .0.display())]
    NotEmpty(PathBuf),

    #[error("configuration file missing: {}", .0.display())]
    MissingConfig(PathBuf),

    #[error("unsupported repositoryformatversion {0}")]
    UnsupportedFormatVersion(u32),

    #[error("config error: {0}")]
    Config(String),

    #[error("not a valid object name: {0}")]
    InvalidObjectId(String),

    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    #[error("store error: {0}")]
    Store(#[from] quill_store::StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;
