//! Drug–drug interactions.
//!
//! - [`catalog`]: the merged pair → description table and the pairwise detector
//! - [`thesaurus`]: loaders for the external interaction thesaurus

pub mod catalog;
pub mod thesaurus;

pub use catalog::{InteractionCatalog, InteractionPrecedence};

use bmp_types::Substance;

/// Unordered substance pair, stored with the lexicographically smaller substance first.
///
/// `PairKey::new("B", "A") == PairKey::new("a", "b")`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey(Substance, Substance);

impl PairKey {
    pub fn new(a: impl AsRef<str>, b: impl AsRef<str>) -> Self {
        let (a, b) = (Substance::new(a), Substance::new(b));
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    pub fn first(&self) -> &Substance {
        &self.0
    }

    pub fn second(&self) -> &Substance {
        &self.1
    }

    /// Whether both sides name the same substance.
    pub fn is_self_pair(&self) -> bool {
        self.0 == self.1
    }
}

impl std::fmt::Display for PairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.0, self.1)
    }
}
