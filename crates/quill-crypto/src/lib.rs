//! Hashing primitives for Quill.
//!
//! An object's identity is the SHA-1 digest of its frame: the kind token, a
//! space, the decimal payload length, a NUL byte, then the payload. All hashing
//! goes through the `sha1` crate; nothing here is custom cryptography.

pub mod hasher;

pub use hasher::ContentHasher;
