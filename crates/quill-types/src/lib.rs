//! Foundation types for Quill.
//!
//! Every other Quill crate depends on `quill-types`.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Content-addressed identifier (SHA-1 digest of an object frame)
//! - [`ObjectKind`] -- The closed set of object kind tokens (`blob`, `commit`, `tree`, `tag`)

pub mod error;
pub mod kind;
pub mod object;

pub use error::TypeError;
pub use kind::ObjectKind;
pub use object::{ObjectId, OBJECT_ID_HEX_LEN, OBJECT_ID_LEN};
