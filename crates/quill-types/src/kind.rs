use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The kind of an object, as written in its frame header.
///
/// The set is closed. Parsing a token outside it fails; a kind is never
/// guessed from content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Raw content (file contents, arbitrary data).
    Blob,
    /// Snapshot metadata encoded as a key-value list with message.
    Commit,
    /// Directory listing.
    Tree,
    /// Annotated tag.
    Tag,
}

impl ObjectKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 4] = [Self::Blob, Self::Commit, Self::Tree, Self::Tag];

    /// The ASCII token used in frame headers.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Commit => "commit",
            Self::Tree => "tree",
            Self::Tag => "tag",
        }
    }

    /// The token as bytes.
    pub const fn as_bytes(&self) -> &'static [u8] {
        self.as_str().as_bytes()
    }

    /// Look up a kind from a raw header token.
    pub fn from_token(token: &[u8]) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_bytes() == token)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_token(s.as_bytes()).ok_or_else(|| TypeError::UnknownKind(s.to_string()))
    }
}
