use quill_types::{ObjectId, ObjectKind};
use sha1::{Digest, Sha1};

/// Kind-tagged SHA-1 content hasher.
///
/// Each hasher carries an object kind whose frame header
/// (`kind SP length NUL`) is fed to the digest ahead of the payload. A blob
/// and a commit with identical payload bytes therefore produce different ids.
/// The header is streamed into the digest, so hashing never copies the
/// payload into a frame buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentHasher {
    kind: ObjectKind,
}

impl ContentHasher {
    /// Hasher for blob objects.
    pub const BLOB: Self = Self::new(ObjectKind::Blob);
    /// Hasher for commit objects.
    pub const COMMIT: Self = Self::new(ObjectKind::Commit);
    /// Hasher for tree objects.
    pub const TREE: Self = Self::new(ObjectKind::Tree);
    /// Hasher for tag objects.
    pub const TAG: Self = Self::new(ObjectKind::Tag);

    /// Create a hasher for the given kind.
    pub const fn new(kind: ObjectKind) -> Self {
        Self { kind }
    }

    /// Hash a payload under this hasher's kind.
    pub fn hash(&self, payload: &[u8]) -> ObjectId {
        let mut hasher = Sha1::new();
        hasher.update(self.kind.as_bytes());
        hasher.update(b" ");
        hasher.update(payload.len().to_string().as_bytes());
        hasher.update([0u8]);
        hasher.update(payload);
        ObjectId::from_hash(hasher.finalize().into())
    }

    /// Hash an already-framed object (header included).
    pub fn hash_frame(frame: &[u8]) -> ObjectId {
        ObjectId::from_hash(Sha1::digest(frame).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hash_is_deterministic() {
        let data = b"hello world";
        let id1 = ContentHasher::BLOB.hash(data);
        let id2 = ContentHasher::BLOB.hash(data);
        assert_eq!(id1, id2);
    }

    #[test]
    fn known_blob_digests() {
        assert_eq!(
            ContentHasher::BLOB.hash(b"test").to_hex(),
            "30d74d258442c7c65512eafab474568dd706c430"
        );
        assert_eq!(
            ContentHasher::BLOB.hash(b"").to_hex(),
            "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391"
        );
        assert_eq!(
            ContentHasher::BLOB.hash(b"hello\n").to_hex(),
            "ce013625030ba8dba906f756967f9e9ca394464a"
        );
    }

    #[test]
    fn blob_hash_equals_digest_of_literal_frame() {
        let framed = ContentHasher::hash_frame(b"blob 4\0test");
        assert_eq!(ContentHasher::BLOB.hash(b"test"), framed);
    }

    #[test]
    fn different_kinds_produce_different_hashes() {
        let data = b"same content";
        let blob = ContentHasher::BLOB.hash(data);
        let commit = ContentHasher::COMMIT.hash(data);
        let tree = ContentHasher::TREE.hash(data);
        let tag = ContentHasher::TAG.hash(data);
        assert_ne!(blob, commit);
        assert_ne!(blob, tree);
        assert_ne!(commit, tag);
        assert_ne!(tree, tag);
    }

    proptest! {
        #[test]
        fn streamed_header_matches_framed_digest(payload in proptest::collection::vec(any::<u8>(), 0..512)) {
            let mut frame = format!("blob {}\0", payload.len()).into_bytes();
            frame.extend_from_slice(&payload);
            prop_assert_eq!(ContentHasher::BLOB.hash(&payload), ContentHasher::hash_frame(&frame));
        }
    }
}
