//! Repository handling for Quill.
//!
//! A repository is a worktree with a `.git` directory holding the loose
//! object database, refs, `HEAD`, and a TOML `config`. This crate creates and
//! discovers repositories and exposes the `hash-object` and `cat-file`
//! plumbing on top of [`quill_store`].

pub mod config;
pub mod error;
pub mod repository;

pub use config::{CoreConfig, RepoConfig};
pub use error::{RepoError, RepoResult};
pub use repository::{Repository, GIT_DIR};

// Re-export key types
pub use quill_store::{Blob, Commit, Object};
pub use quill_types::{ObjectId, ObjectKind};
