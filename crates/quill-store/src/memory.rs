use std::collections::HashMap;
use std::sync::RwLock;

use quill_crypto::ContentHasher;
use quill_types::ObjectId;
use tracing::debug;

use crate::error::StoreResult;
use crate::object::Object;
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// Intended for tests and embedding. Objects are kept as uncompressed frames
/// and decoded on every read, so the frame codec and kind dispatch behave
/// exactly as they do for the on-disk store.
pub struct InMemoryObjectStore {
    frames: RwLock<HashMap<ObjectId, Vec<u8>>>,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            frames: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.frames.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.frames.read().expect("lock poisoned").is_empty()
    }

    /// Total framed bytes across all stored objects.
    pub fn total_bytes(&self) -> u64 {
        self.frames
            .read()
            .expect("lock poisoned")
            .values()
            .map(|frame| frame.len() as u64)
            .sum()
    }

    /// Return a sorted list of all object IDs in the store.
    pub fn all_ids(&self) -> Vec<ObjectId> {
        let map = self.frames.read().expect("lock poisoned");
        let mut ids: Vec<ObjectId> = map.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Store raw frame bytes under `id` without hashing or validation.
    pub fn insert_raw(&self, id: ObjectId, frame: Vec<u8>) {
        self.frames.write().expect("lock poisoned").insert(id, frame);
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<Object>> {
        let map = self.frames.read().expect("lock poisoned");
        let Some(frame) = map.get(id) else {
            return Ok(None);
        };
        Object::from_frame(frame)
            .map(Some)
            .map_err(|e| e.with_id(*id))
    }

    fn write(&self, object: &Object) -> StoreResult<ObjectId> {
        let frame = object.to_frame();
        let id = ContentHasher::hash_frame(&frame);
        let mut map = self.frames.write().expect("lock poisoned");
        // Same ID always maps to the same content, so an existing entry wins.
        map.entry(id).or_insert_with(|| {
            debug!(id = %id, kind = %object.kind(), "stored object in memory");
            frame
        });
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.frames.read().expect("lock poisoned");
        Ok(map.contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::object::{Blob, Commit};

    fn make_blob(content: &[u8]) -> Object {
        Object::from(Blob::new(content))
    }

    // -----------------------------------------------------------------------
    // Core read/write
    // -----------------------------------------------------------------------

    #[test]
    fn write_and_read_blob() {
        let store = InMemoryObjectStore::new();
        let obj = make_blob(b"hello world");
        let id = store.write(&obj).unwrap();
        assert_eq!(id, obj.compute_id());

        let read_back = store.read(&id).unwrap().expect("should exist");
        assert_eq!(read_back, obj);
    }

    #[test]
    fn write_and_read_commit() {
        let store = InMemoryObjectStore::new();
        let tree = store.write(&make_blob(b"tree stand-in")).unwrap();
        let commit = Commit::from_parts(tree, &[], "me", "me", "first");
        let id = store.write(&Object::from(commit.clone())).unwrap();

        let read_back = store.read(&id).unwrap().expect("should exist");
        assert_eq!(read_back.as_commit(), Some(&commit));
    }

    #[test]
    fn read_missing_object_returns_none() {
        let store = InMemoryObjectStore::new();
        let id = ContentHasher::BLOB.hash(b"missing");
        assert!(store.read(&id).unwrap().is_none());
        assert!(!store.exists(&id).unwrap());
    }

    // -----------------------------------------------------------------------
    // Content-addressing correctness
    // -----------------------------------------------------------------------

    #[test]
    fn same_content_produces_same_id() {
        let store = InMemoryObjectStore::new();
        let id1 = store.write(&make_blob(b"identical content")).unwrap();
        let id2 = store.write(&make_blob(b"identical content")).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn different_content_produces_different_ids() {
        let store = InMemoryObjectStore::new();
        let id1 = store.write(&make_blob(b"aaa")).unwrap();
        let id2 = store.write(&make_blob(b"bbb")).unwrap();
        assert_ne!(id1, id2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn id_matches_known_digest() {
        let store = InMemoryObjectStore::new();
        let id = store.write(&make_blob(b"test")).unwrap();
        assert_eq!(id, ContentHasher::hash_frame(b"blob 4\0test"));
    }

    // -----------------------------------------------------------------------
    // Corrupt frames
    // -----------------------------------------------------------------------

    #[test]
    fn raw_frame_with_bad_length_is_malformed() {
        let store = InMemoryObjectStore::new();
        let id = ContentHasher::BLOB.hash(b"test");
        store.insert_raw(id, b"blob 3\0test".to_vec());
        let err = store.read(&id).unwrap_err();
        assert!(matches!(err, StoreError::Malformed { id: Some(found), .. } if found == id));
    }

    #[test]
    fn raw_frame_with_unknown_kind_is_unknown_type() {
        let store = InMemoryObjectStore::new();
        let id = ContentHasher::hash_frame(b"widget 0\0");
        store.insert_raw(id, b"widget 0\0".to_vec());
        let err = store.read(&id).unwrap_err();
        assert!(matches!(err, StoreError::UnknownType { .. }));
    }

    // -----------------------------------------------------------------------
    // Utility methods
    // -----------------------------------------------------------------------

    #[test]
    fn len_and_is_empty() {
        let store = InMemoryObjectStore::new();
        assert!(store.is_empty());
        store.write(&make_blob(b"a")).unwrap();
        assert!(!store.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn total_bytes_counts_frames() {
        let store = InMemoryObjectStore::new();
        store.write(&make_blob(b"12345")).unwrap(); // "blob 5\0" + 5
        store.write(&make_blob(b"123456789")).unwrap(); // "blob 9\0" + 9
        assert_eq!(store.total_bytes(), 12 + 16);
    }

    #[test]
    fn all_ids_is_sorted() {
        let store = InMemoryObjectStore::new();
        for content in [&b"aaa"[..], b"bbb", b"ccc"] {
            store.write(&make_blob(content)).unwrap();
        }
        let ids = store.all_ids();
        assert_eq!(ids.len(), 3);
        for w in ids.windows(2) {
            assert!(w[0] <= w[1]);
        }
    }

    #[test]
    fn concurrent_reads_are_safe() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(InMemoryObjectStore::new());
        let id = store.write(&make_blob(b"shared data")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let read_obj = store.read(&id).unwrap().expect("should exist");
                    assert_eq!(read_obj.compute_id(), id);
                })
            })
            .collect();

        for h in handles {
            h.join().expect("thread should not panic");
        }
    }

    #[test]
    fn debug_format() {
        let store = InMemoryObjectStore::default();
        store.write(&make_blob(b"x")).unwrap();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryObjectStore"));
        assert!(debug.contains("object_count"));
    }
}
