use quill_types::ObjectId;

use crate::error::StoreResult;
use crate::object::Object;

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written. The same kind and payload always
///   produce the same ID, so an existing ID is never rewritten.
/// - A missing object is `Ok(None)`, never an error. Corrupt data is an error,
///   never `Ok(None)`.
/// - Unknown kinds are reported, never coerced to a default kind.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Read an object by its content-addressed ID.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    /// Returns `Err` on I/O failure or data corruption.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<Object>>;

    /// Write an object and return its content-addressed ID.
    ///
    /// If the object already exists, this is a no-op (idempotent).
    fn write(&self, object: &Object) -> StoreResult<ObjectId>;

    /// Check whether an object exists in the store.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Read multiple objects in a batch.
    ///
    /// Default implementation calls `read()` for each ID.
    fn read_batch(&self, ids: &[ObjectId]) -> StoreResult<Vec<Option<Object>>> {
        ids.iter().map(|id| self.read(id)).collect()
    }

    /// Write multiple objects in a batch and return their IDs.
    ///
    /// Default implementation calls `write()` for each object.
    fn write_batch(&self, objects: &[Object]) -> StoreResult<Vec<ObjectId>> {
        objects.iter().map(|obj| self.write(obj)).collect()
    }
}

/// Write `object` to `store` if one is given; otherwise only compute its ID.
///
/// The ID is the same either way, so passing `None` is a dry run.
pub fn write_object(object: &Object, store: Option<&dyn ObjectStore>) -> StoreResult<ObjectId> {
    match store {
        Some(store) => store.write(object),
        None => Ok(object.compute_id()),
    }
}
