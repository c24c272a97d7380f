//! Static ATC class → substances table.
//!
//! Only the classes referenced by the shipped criteria are listed. Codes are matched
//! case-insensitively at class level (5 characters, e.g. `C10AA`).

use bmp_types::Substance;
use std::collections::BTreeSet;

const ATC_CLASSES: &[(&str, &[&str])] = &[
    // Lipid modifying agents, HMG CoA reductase inhibitors
    ("C10AA", &["ATORVASTATIN", "SIMVASTATIN", "PRAVASTATIN"]),
    // Macrolides
    ("J01FA", &["CLARITHROMYCIN", "ERYTHROMYCIN", "AZITHROMYCIN"]),
    // Propionic acid derivatives (NSAIDs)
    ("M01AE", &["IBUPROFEN", "KETOPROFEN", "NAPROXEN"]),
    // ACE inhibitors, plain
    ("C09AA", &["LISINOPRIL", "RAMIPRIL", "PERINDOPRIL"]),
    // Angiotensin II receptor blockers, plain
    ("C09CA", &["LOSARTAN", "VALSARTAN", "CANDESARTAN"]),
    // Direct factor Xa inhibitors
    ("B01AF", &["APIXABAN", "RIVAROXABAN", "DABIGATRAN"]),
    // Natural opium alkaloids
    ("N02AA", &["MORPHINE", "OXYCODONE", "HYDROMORPHONE"]),
];

/// Returns the substances of an ATC class. Unknown codes yield an empty set.
pub fn substances_from_atc(code: &str) -> BTreeSet<Substance> {
    let code = code.trim().to_uppercase();
    ATC_CLASSES
        .iter()
        .find(|(atc, _)| *atc == code)
        .map(|(_, substances)| substances.iter().map(Substance::new).collect())
        .unwrap_or_default()
}

/// All ATC codes known to the table.
pub fn known_atc_codes() -> impl Iterator<Item = &'static str> {
    ATC_CLASSES.iter().map(|(atc, _)| *atc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_class_case_insensitively() {
        let statins = substances_from_atc("c10aa");
        assert!(statins.contains(&Substance::new("SIMVASTATIN")));
        assert_eq!(statins.len(), 3);
    }

    #[test]
    fn unknown_class_is_empty() {
        assert!(substances_from_atc("Z99ZZ").is_empty());
    }

    #[test]
    fn every_known_code_resolves() {
        for code in known_atc_codes() {
            assert!(!substances_from_atc(code).is_empty(), "{code} is empty");
        }
    }
}
