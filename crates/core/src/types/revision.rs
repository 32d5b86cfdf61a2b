//! Local cart revision marker.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for one generation of a device-local cart.
///
/// A fresh revision is minted on every persisted local-cart mutation. The
/// remote cart document records the revisions it has already absorbed,
/// which is what makes a reconciliation retry safe when the remote write
/// landed but the local clear did not: an unedited retry matches and is
/// adopted, while any further local edit carries a new revision and still
/// merges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalCartRevision(Uuid);

impl LocalCartRevision {
    /// Mint a fresh revision.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for LocalCartRevision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_unique() {
        assert_ne!(LocalCartRevision::generate(), LocalCartRevision::generate());
    }

    #[test]
    fn test_serde_transparent() {
        let rev = LocalCartRevision::generate();
        let json = serde_json::to_string(&rev).unwrap();
        let parsed: LocalCartRevision = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, rev);
    }
}
