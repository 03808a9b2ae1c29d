use quill_types::{ObjectId, ObjectKind};

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The object data cannot be trusted: bad frame, bad length, bad KVLM
    /// structure, or a compressed stream that does not inflate.
    #[error("malformed object{}: {reason}", id_suffix(.id))]
    Malformed {
        id: Option<ObjectId>,
        reason: String,
    },

    /// The frame names a kind outside the registry.
    #[error("unknown object type `{kind}`{}", for_object(.id))]
    UnknownType { kind: String, id: Option<ObjectId> },

    /// The kind is recognized but has no payload codec.
    #[error("object type `{0}` is not supported")]
    Unsupported(ObjectKind),

    /// A typed accessor was applied to an object of another kind.
    #[error("object {id} is a {found}, expected {expected}")]
    KindMismatch {
        id: ObjectId,
        expected: ObjectKind,
        found: ObjectKind,
    },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            id: None,
            reason: reason.into(),
        }
    }

    /// Attach the id of the object being decoded, if not already set.
    pub fn with_id(self, object_id: ObjectId) -> Self {
        match self {
            Self::Malformed { id: None, reason } => Self::Malformed {
                id: Some(object_id),
                reason,
            },
            Self::UnknownType { kind, id: None } => Self::UnknownType {
                kind,
                id: Some(object_id),
            },
            other => other,
        }
    }

    /// Returns `true` if the on-disk data is corrupt.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }
}

fn id_suffix(id: &Option<ObjectId>) -> String {
    id.map(|id| format!(" {id}")).unwrap_or_default()
}

fn for_object(id: &Option<ObjectId>) -> String {
    match id {
        Some(id) => format!(" for object {id}"),
        None => String::new(),
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
