//! Content-addressed object storage for Quill.
//!
//! This crate implements a hash-keyed object store laid out like git's
//! `.git/objects/` directory. An object is framed as
//! `kind SP length NUL payload`, identified by the SHA-1 of that frame, and
//! stored zlib-compressed under `objects/<2 hex>/<38 hex>`.
//!
//! # Object Types
//!
//! - [`Blob`] -- raw content, stored verbatim
//! - [`Commit`] -- a [`Kvlm`] record (tree, parents, author, committer, message)
//!
//! `tree` and `tag` are recognized kind tokens without a codec.
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`LooseObjectStore`] -- one compressed file per object on disk
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written; writing an existing ID is a no-op.
//! 2. A missing object is `Ok(None)`; corrupt data is [`StoreError::Malformed`].
//! 3. An unknown kind token is [`StoreError::UnknownType`], never a blob.
//! 4. The declared frame length is checked on every read.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod frame;
pub mod kvlm;
pub mod loose;
pub mod memory;
pub mod object;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use frame::Frame;
pub use kvlm::Kvlm;
pub use loose::{loose_path, LooseObjectStore, OBJECTS_DIR};
pub use memory::InMemoryObjectStore;
pub use object::{Blob, Commit, Object, ObjectPayload};
pub use traits::{write_object, ObjectStore};
