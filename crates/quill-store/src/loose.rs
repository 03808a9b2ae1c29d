use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use quill_crypto::ContentHasher;
use quill_types::{ObjectId, OBJECT_ID_HEX_LEN};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::object::Object;
use crate::traits::ObjectStore;

/// Directory under the store root that holds loose objects.
pub const OBJECTS_DIR: &str = "objects";

/// Path of an object relative to the store root: `objects/<2 hex>/<38 hex>`.
///
/// The fixed two-character prefix bounds the fan-out of every directory
/// regardless of how many objects the store holds.
pub fn loose_path(id: &ObjectId) -> PathBuf {
    let (dir, file) = id.fan_out();
    Path::new(OBJECTS_DIR).join(dir).join(file)
}

/// On-disk store of zlib-compressed loose objects.
///
/// Each object is its frame (`kind SP length NUL payload`) compressed with
/// zlib and saved at [`loose_path`] under `root`. Writes go to a temporary
/// file in the destination directory and are published with a no-clobber
/// rename, so concurrent writers of the same object never expose a partial
/// file.
pub struct LooseObjectStore {
    root: PathBuf,
    compression: Compression,
}

impl LooseObjectStore {
    /// Create a store rooted at `root` (the repository metadata directory).
    /// Nothing is created on disk until the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            compression: Compression::default(),
        }
    }

    /// Use a specific zlib level (0-9).
    pub fn with_compression(mut self, level: u32) -> Self {
        self.compression = Compression::new(level.min(9));
        self
    }

    /// Absolute path of the file holding `id`.
    pub fn object_path(&self, id: &ObjectId) -> PathBuf {
        self.root.join(loose_path(id))
    }

    /// Read and inflate the stored frame for `id` without decoding it.
    pub fn read_frame(&self, id: &ObjectId) -> StoreResult<Option<Vec<u8>>> {
        let compressed = match fs::read(self.object_path(id)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let frame = inflate(&compressed).map_err(|reason| StoreError::Malformed {
            id: Some(*id),
            reason: format!("decompression failed: {reason}"),
        })?;
        Ok(Some(frame))
    }

    /// Every object ID present on disk, sorted.
    ///
    /// Entries that are not `<2 hex>/<38 hex>` (temporary files, stray
    /// directories) are ignored.
    pub fn all_ids(&self) -> StoreResult<Vec<ObjectId>> {
        let objects = self.root.join(OBJECTS_DIR);
        let mut ids = Vec::new();
        let dirs = match fs::read_dir(&objects) {
            Ok(dirs) => dirs,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ids),
            Err(e) => return Err(e.into()),
        };
        for dir in dirs {
            let dir = dir?;
            let prefix = dir.file_name();
            let Some(prefix) = prefix.to_str().filter(|p| p.len() == 2) else {
                continue;
            };
            if !dir.file_type()?.is_dir() {
                continue;
            }
            for file in fs::read_dir(dir.path())? {
                let name = file?.file_name();
                let Some(rest) = name.to_str() else { continue };
                if prefix.len() + rest.len() != OBJECT_ID_HEX_LEN {
                    continue;
                }
                if let Ok(id) = ObjectId::from_hex(&format!("{prefix}{rest}")) {
                    ids.push(id);
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn deflate(&self, frame: &[u8]) -> io::Result<Vec<u8>> {
        let mut encoder =
            ZlibEncoder::new(Vec::with_capacity(frame.len() / 2 + 16), self.compression);
        encoder.write_all(frame)?;
        encoder.finish()
    }
}

impl ObjectStore for LooseObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<Object>> {
        let Some(frame) = self.read_frame(id)? else {
            debug!(id = %id, "object not found");
            return Ok(None);
        };
        let object = Object::from_frame(&frame).map_err(|e| e.with_id(*id))?;
        debug!(id = %id, kind = %object.kind(), "read object");
        Ok(Some(object))
    }

    fn write(&self, object: &Object) -> StoreResult<ObjectId> {
        let frame = object.to_frame();
        let id = ContentHasher::hash_frame(&frame);

        let (dir_name, file_name) = id.fan_out();
        let dir = self.root.join(OBJECTS_DIR).join(dir_name);
        let path = dir.join(file_name);

        if path.exists() {
            debug!(id = %id, kind = %object.kind(), "object already stored, skipping");
            return Ok(id);
        }

        fs::create_dir_all(&dir)?;
        let compressed = self.deflate(&frame)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(&compressed)?;
        tmp.as_file().sync_all()?;

        match tmp.persist_noclobber(&path) {
            Ok(_) => {
                debug!(id = %id, kind = %object.kind(), size = frame.len(), "wrote object");
            }
            // Another writer published the same content first.
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                debug!(id = %id, "object appeared during write, keeping existing file");
            }
            Err(e) => return Err(e.error.into()),
        }

        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.object_path(id).is_file())
    }
}

impl std::fmt::Debug for LooseObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LooseObjectStore")
            .field("root", &self.root)
            .field("compression", &self.compression.level())
            .finish()
    }
}

/// Inflate a complete zlib stream.
///
/// `flate2`'s reader types report a truncated stream as a clean EOF, so this
/// drives [`Decompress`] directly and requires `StreamEnd` with every input
/// byte consumed. The output buffer grows between calls; a call that makes no
/// progress while there is room left means the input ran out.
fn inflate(compressed: &[u8]) -> Result<Vec<u8>, String> {
    let mut inflater = Decompress::new(true);
    let mut out = Vec::with_capacity(compressed.len().saturating_mul(4).max(64));

    loop {
        if out.len() == out.capacity() {
            out.reserve(out.capacity());
        }
        let consumed = inflater.total_in() as usize;
        let produced = inflater.total_out();
        let status = inflater
            .decompress_vec(&compressed[consumed..], &mut out, FlushDecompress::None)
            .map_err(|e| e.to_string())?;

        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                let stalled =
                    inflater.total_in() as usize == consumed && inflater.total_out() == produced;
                if stalled && out.len() < out.capacity() {
                    return Err("truncated zlib stream".into());
                }
            }
        }
    }

    if inflater.total_in() as usize != compressed.len() {
        return Err("trailing bytes after zlib stream".into());
    }
    Ok(out)
}
