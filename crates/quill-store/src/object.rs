use std::borrow::Cow;

use quill_crypto::ContentHasher;
use quill_types::{ObjectId, ObjectKind};

use crate::error::{StoreError, StoreResult};
use crate::frame;
use crate::kvlm::{self, Kvlm};

/// A payload codec for one object kind.
///
/// `serialize` and `deserialize` are inverses over the payload bytes; the
/// frame header is added by the store.
pub trait ObjectPayload: Sized {
    /// The kind token this type is registered under.
    const KIND: ObjectKind;

    /// Encode as payload bytes.
    fn serialize(&self) -> Cow<'_, [u8]>;

    /// Decode from payload bytes.
    fn deserialize(payload: &[u8]) -> StoreResult<Self>;
}

/// A typed object: one variant per kind with a payload codec.
///
/// `tree` and `tag` are valid kind tokens but have no codec; dispatching on
/// them yields [`StoreError::Unsupported`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Object {
    Blob(Blob),
    Commit(Commit),
}

impl Object {
    /// Construct a typed object from a raw kind token and payload.
    ///
    /// Unknown tokens fail with [`StoreError::UnknownType`]; nothing falls
    /// back to `blob`.
    pub fn deserialize(kind: &[u8], payload: &[u8]) -> StoreResult<Self> {
        let kind = ObjectKind::from_token(kind).ok_or_else(|| StoreError::UnknownType {
            kind: String::from_utf8_lossy(kind).into_owned(),
            id: None,
        })?;
        Self::from_payload(kind, payload)
    }

    /// Construct a typed object of a known kind.
    pub fn from_payload(kind: ObjectKind, payload: &[u8]) -> StoreResult<Self> {
        match kind {
            ObjectKind::Blob => Blob::deserialize(payload).map(Self::Blob),
            ObjectKind::Commit => Commit::deserialize(payload).map(Self::Commit),
            ObjectKind::Tree | ObjectKind::Tag => Err(StoreError::Unsupported(kind)),
        }
    }

    /// Decode a full frame (`kind SP length NUL payload`).
    pub fn from_frame(raw: &[u8]) -> StoreResult<Self> {
        let frame = frame::decode(raw)?;
        Self::deserialize(frame.kind, frame.payload)
    }

    /// The kind of this object.
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Blob(_) => Blob::KIND,
            Self::Commit(_) => Commit::KIND,
        }
    }

    /// Payload bytes for this object.
    pub fn serialize(&self) -> Cow<'_, [u8]> {
        match self {
            Self::Blob(blob) => blob.serialize(),
            Self::Commit(commit) => commit.serialize(),
        }
    }

    /// The framed bytes that are hashed and stored.
    pub fn to_frame(&self) -> Vec<u8> {
        frame::encode(self.kind(), &self.serialize())
    }

    /// Compute the content-addressed ID for this object.
    pub fn compute_id(&self) -> ObjectId {
        ContentHasher::new(self.kind()).hash(&self.serialize())
    }

    pub fn as_blob(&self) -> Option<&Blob> {
        match self {
            Self::Blob(blob) => Some(blob),
            _ => None,
        }
    }

    pub fn as_commit(&self) -> Option<&Commit> {
        match self {
            Self::Commit(commit) => Some(commit),
            _ => None,
        }
    }

    /// Unwrap a blob, failing with [`StoreError::KindMismatch`] otherwise.
    pub fn into_blob(self) -> StoreResult<Blob> {
        match self {
            Self::Blob(blob) => Ok(blob),
            other => Err(other.mismatch(ObjectKind::Blob)),
        }
    }

    /// Unwrap a commit, failing with [`StoreError::KindMismatch`] otherwise.
    pub fn into_commit(self) -> StoreResult<Commit> {
        match self {
            Self::Commit(commit) => Ok(commit),
            other => Err(other.mismatch(ObjectKind::Commit)),
        }
    }

    fn mismatch(&self, expected: ObjectKind) -> StoreError {
        StoreError::KindMismatch {
            id: self.compute_id(),
            expected,
            found: self.kind(),
        }
    }
}

impl From<Blob> for Object {
    fn from(blob: Blob) -> Self {
        Self::Blob(blob)
    }
}

impl From<Commit> for Object {
    fn from(commit: Commit) -> Self {
        Self::Commit(commit)
    }
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Raw content object. The payload is stored and returned verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    /// Create a new blob from raw bytes.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }
}

impl ObjectPayload for Blob {
    const KIND: ObjectKind = ObjectKind::Blob;

    fn serialize(&self) -> Cow<'_, [u8]> {
        Cow::Borrowed(&self.data)
    }

    fn deserialize(payload: &[u8]) -> StoreResult<Self> {
        Ok(Self::new(payload))
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// Commit object: a KVLM record with conventional keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Commit {
    pub kvlm: Kvlm,
}

impl Commit {
    pub fn new(kvlm: Kvlm) -> Self {
        Self { kvlm }
    }

    /// Build a commit from its conventional fields, in the order git writes
    /// them: tree, parents, author, committer, then the message.
    pub fn from_parts(
        tree: ObjectId,
        parents: &[ObjectId],
        author: &str,
        committer: &str,
        message: &str,
    ) -> Self {
        let mut kvlm = Kvlm::new();
        kvlm.push("tree", tree.to_hex());
        for parent in parents {
            kvlm.push("parent", parent.to_hex());
        }
        kvlm.push("author", author);
        kvlm.push("committer", committer);
        kvlm.set_message(message);
        Self { kvlm }
    }

    /// The root tree, if present and well-formed.
    pub fn tree(&self) -> Option<ObjectId> {
        self.kvlm.get(b"tree").and_then(parse_id)
    }

    /// Parent commits in recorded order. Values that are not valid ids are
    /// skipped.
    pub fn parents(&self) -> Vec<ObjectId> {
        self.kvlm
            .get_all(b"parent")
            .into_iter()
            .filter_map(parse_id)
            .collect()
    }

    pub fn author(&self) -> Option<&[u8]> {
        self.kvlm.get(b"author")
    }

    pub fn committer(&self) -> Option<&[u8]> {
        self.kvlm.get(b"committer")
    }

    pub fn message(&self) -> &[u8] {
        self.kvlm.message()
    }
}

impl ObjectPayload for Commit {
    const KIND: ObjectKind = ObjectKind::Commit;

    fn serialize(&self) -> Cow<'_, [u8]> {
        Cow::Owned(kvlm::serialize(&self.kvlm))
    }

    fn deserialize(payload: &[u8]) -> StoreResult<Self> {
        kvlm::parse(payload).map(Self::new)
    }
}

fn parse_id(value: &[u8]) -> Option<ObjectId> {
    std::str::from_utf8(value)
        .ok()
        .and_then(|s| ObjectId::from_hex(s).ok())
}
