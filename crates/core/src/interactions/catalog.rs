//! Interaction catalog and pairwise detector.
//!
//! The catalog starts from a short list of well-known severe interactions and overlays the
//! external thesaurus on top of it. Which side wins when both describe the same pair is a
//! configuration choice ([`InteractionPrecedence`]); the thesaurus wins by default.

use super::thesaurus::{self, Thesaurus};
use super::PairKey;
use crate::{BmpError, BmpResult};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;

const BUILTIN_INTERACTIONS: &[(&str, &str, &str)] = &[
    (
        "LISINOPRIL",
        "IBUPROFEN",
        "Association d’un IEC et d’un AINS : risque d’insuffisance rénale aiguë.",
    ),
    (
        "ACETYLSALICYLIC_ACID",
        "APIXABAN",
        "Double traitement anti-thrombotique, risque hémorragique accru.",
    ),
    (
        "ATORVASTATIN",
        "CLARITHROMYCIN",
        "Statine + macrolide : risque augmenté de rhabdomyolyse.",
    ),
    (
        "SIMVASTATIN",
        "CLARITHROMYCIN",
        "Statine + macrolide : risque augmenté de rhabdomyolyse.",
    ),
    (
        "WARFARIN",
        "TRIMETHOPRIM",
        "Warfarine + triméthoprime : risque hémorragique accru.",
    ),
    (
        "LITHIUM",
        "IBUPROFEN",
        "Lithium + AINS : risque de toxicité du lithium.",
    ),
    (
        "MORPHINE",
        "DIAZEPAM",
        "Opioïde + benzodiazépine : risque de dépression respiratoire.",
    ),
    ("WARFARIN", "IBUPROFEN", "Warfarine + AINS : risque hémorragique."),
    (
        "SIMVASTATIN",
        "ITRACONAZOLE",
        "Statine + azolé : myopathie/rhabdomyolyse.",
    ),
    (
        "DIGOXIN",
        "VERAPAMIL",
        "Digoxine + vérapamil : bradycardie/surdosage.",
    ),
    (
        "SILDENAFIL",
        "NITROGLYCERIN",
        "Sildénafil + dérivé nitré : hypotension sévère.",
    ),
    (
        "CARBAMAZEPINE",
        "ERYTHROMYCIN",
        "Carbamazépine + érythromycine : hausse taux carbamazépine.",
    ),
];

/// Which source keeps its description when the built-in table and the thesaurus both list
/// the same pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionPrecedence {
    /// The external thesaurus overrides the built-in table.
    #[default]
    Thesaurus,
    /// The built-in table is kept; the thesaurus only adds new pairs.
    Static,
}

impl FromStr for InteractionPrecedence {
    type Err = BmpError;

    fn from_str(s: &str) -> BmpResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "thesaurus" | "external" => Ok(Self::Thesaurus),
            "static" | "builtin" => Ok(Self::Static),
            other => Err(BmpError::InvalidInput(format!(
                "unknown interaction precedence '{other}' (expected 'thesaurus' or 'static')"
            ))),
        }
    }
}

/// Unordered substance pair → interaction description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionCatalog {
    entries: HashMap<PairKey, String>,
}

impl InteractionCatalog {
    /// Catalog holding only the built-in interactions.
    pub fn builtin() -> Self {
        let entries = BUILTIN_INTERACTIONS
            .iter()
            .map(|(a, b, description)| (PairKey::new(a, b), description.to_string()))
            .collect();
        Self { entries }
    }

    /// Merges the built-in table with `external` according to `precedence`.
    pub fn merged(external: Thesaurus, precedence: InteractionPrecedence) -> Self {
        let mut catalog = Self::builtin();
        for (key, description) in external {
            if key.is_self_pair() {
                continue;
            }
            match precedence {
                InteractionPrecedence::Thesaurus => {
                    catalog.entries.insert(key, description);
                }
                InteractionPrecedence::Static => {
                    catalog.entries.entry(key).or_insert(description);
                }
            }
        }
        catalog
    }

    /// Loads the thesaurus from `resources_dir` and merges it with the built-in table.
    pub fn load(resources_dir: &Path, precedence: InteractionPrecedence) -> Self {
        let external = thesaurus::load(resources_dir);
        let catalog = Self::merged(external, precedence);
        tracing::info!(pairs = catalog.len(), "interaction catalog ready");
        catalog
    }

    /// Description for the pair `(a, b)`, in either order and any case.
    pub fn get(&self, a: &str, b: &str) -> Option<&str> {
        self.entries.get(&PairKey::new(a, b)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the descriptions of every catalogued pair present in `medications`.
    ///
    /// Pairs are visited by position (`i < j`) and each unordered substance pair is looked up
    /// at most once, so repeated medications never produce repeated reports. Results follow
    /// discovery order.
    pub fn detect<S: AsRef<str>>(&self, medications: &[S]) -> Vec<String> {
        let meds: Vec<String> = medications
            .iter()
            .map(|m| m.as_ref().trim().to_uppercase())
            .collect();
        let mut seen: HashSet<PairKey> = HashSet::new();
        let mut problems = Vec::new();

        for (i, a) in meds.iter().enumerate() {
            for b in &meds[i + 1..] {
                let key = PairKey::new(a, b);
                if key.is_self_pair() || !seen.insert(key.clone()) {
                    continue;
                }
                if let Some(description) = self.entries.get(&key) {
                    tracing::debug!(pair = %key, "interaction detected");
                    problems.push(description.clone());
                }
            }
        }

        problems
    }
}
