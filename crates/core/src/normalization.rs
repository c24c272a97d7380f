//! Medication name normalization.
//!
//! Maps brand names, French spellings and codes to the canonical uppercase substance used by
//! every table in the knowledge base. Normalization never fails: a name nobody recognises is
//! returned trimmed and uppercased.

use crate::reference::MedicationReference;
use bmp_types::Substance;

/// Brand names and common misspellings, keyed by the uppercased input.
const ALIASES: &[(&str, &str)] = &[
    ("IBUPROFENE", "IBUPROFEN"),
    ("ADVIL", "IBUPROFEN"),
    ("NUROFEN", "IBUPROFEN"),
    ("ASPIRINE", "ACETYLSALICYLIC_ACID"),
    ("ASPIRIN", "ACETYLSALICYLIC_ACID"),
    ("KARDEGIC", "ACETYLSALICYLIC_ACID"),
    ("ZESTRIL", "LISINOPRIL"),
    ("ELIQUIS", "APIXABAN"),
    ("IEC", "IEC"),
];

/// Looks `key` up in the static alias table.
pub fn static_alias(key: &str) -> Option<&'static str> {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, dci)| *dci)
}

/// Returns the canonical substance for `name`.
///
/// The reference repository is consulted first; its answer, or the trimmed, uppercased input
/// when it has none, then goes through the static alias table.
pub fn normalize(name: &str, reference: &dyn MedicationReference) -> Substance {
    let key = Substance::new(name);
    let found = reference.find_dci(key.as_str()).unwrap_or(key);
    canonical_alias(found)
}

/// Reference answers may themselves be aliases (e.g. `ASPIRIN`).
fn canonical_alias(substance: Substance) -> Substance {
    match static_alias(substance.as_str()) {
        Some(dci) => Substance::new(dci),
        None => substance,
    }
}

/// Normalizes every name, preserving order and duplicates.
pub fn normalize_all<S: AsRef<str>>(
    names: &[S],
    reference: &dyn MedicationReference,
) -> Vec<Substance> {
    names
        .iter()
        .map(|name| normalize(name.as_ref(), reference))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{ChainedReference, CodeMapping, NoReference};

    #[test]
    fn brand_names_map_to_substance() {
        assert_eq!(normalize(" advil ", &NoReference).as_str(), "IBUPROFEN");
        assert_eq!(
            normalize("Kardegic", &NoReference).as_str(),
            "ACETYLSALICYLIC_ACID"
        );
        assert_eq!(normalize("zestril", &NoReference).as_str(), "LISINOPRIL");
    }

    #[test]
    fn unknown_names_are_uppercased() {
        assert_eq!(normalize("  metformin", &NoReference).as_str(), "METFORMIN");
        assert_eq!(normalize("", &NoReference).as_str(), "");
    }

    #[test]
    fn reference_takes_priority_over_aliases() {
        let reference = ChainedReference::new(vec![Box::new(CodeMapping::fallback())]);
        assert_eq!(
            normalize("3400932716455", &reference).as_str(),
            "PARACETAMOL"
        );
        assert_eq!(normalize("nurofen", &reference).as_str(), "IBUPROFEN");
    }

    #[test]
    fn normalization_is_idempotent() {
        let reference = ChainedReference::new(vec![Box::new(CodeMapping::fallback())]);
        for name in ["Advil", "aspirine", "ELIQUIS", "3400932716455", "warfarin", "IEC"] {
            let once = normalize(name, &reference);
            let twice = normalize(once.as_str(), &reference);
            assert_eq!(once, twice, "{name} is not idempotent");
        }
    }

    #[test]
    fn reference_answer_that_is_an_alias_stays_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join(crate::constants::BDPM_SUBSTANCES_FILENAME),
            "CIP7;DCI\n3000001;ASPIRIN\n",
        )
        .expect("write csv");
        let reference = ChainedReference::new(vec![Box::new(CodeMapping::load(dir.path()))]);

        let once = normalize("3000001", &reference);
        assert_eq!(once.as_str(), "ACETYLSALICYLIC_ACID");
        assert_eq!(normalize(once.as_str(), &reference), once);
    }

    #[test]
    fn normalize_all_keeps_order_and_duplicates() {
        let meds = normalize_all(&["advil", "lisinopril", "ADVIL"], &NoReference);
        let names: Vec<&str> = meds.iter().map(Substance::as_str).collect();
        assert_eq!(names, vec!["IBUPROFEN", "LISINOPRIL", "IBUPROFEN"]);
    }
}
