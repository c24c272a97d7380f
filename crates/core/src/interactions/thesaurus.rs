//! External interaction thesaurus (ANSM).
//!
//! Two on-disk forms are understood, tried in order:
//! 1. `*interaction*.csv` files with `A;B;gravité` rows; every matching file is merged, in
//!    file-name order
//! 2. `*interaction*.txt` files holding text extracted from the published PDF, one
//!    `SUBSTANCE A / SUBSTANCE B` heading per line
//!
//! The first form that yields at least one pair wins. Nothing found means an empty thesaurus.

use super::PairKey;
use crate::constants::INTERACTION_FILE_MARKER;
use crate::helpers::{csv_rows, files_matching, read_lossy};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

pub type Thesaurus = HashMap<PairKey, String>;

type ThesaurusLoader = fn(&Path) -> Option<Thesaurus>;

static PAIR_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?P<a>[A-ZÀÂÉÈÊÎÔÙÛÇ\- ]{3,}?)\s*/\s*(?P<b>[A-ZÀÂÉÈÊÎÔÙÛÇ\- ]{3,})",
    )
    .expect("valid regex")
});

const UNCLASSIFIED: &str = "gravité non classée";

/// Loads the thesaurus found in `resources_dir`.
pub fn load(resources_dir: &Path) -> Thesaurus {
    let attempts: [(&str, ThesaurusLoader); 2] = [("csv", from_csv), ("text", from_text)];

    for (label, attempt) in attempts {
        if let Some(pairs) = attempt(resources_dir) {
            tracing::info!(source = label, pairs = pairs.len(), "loaded interaction thesaurus");
            return pairs;
        }
    }

    tracing::warn!(
        "no interaction thesaurus found in {}, using built-in interactions only",
        resources_dir.display()
    );
    Thesaurus::new()
}

fn from_csv(dir: &Path) -> Option<Thesaurus> {
    merge_files(dir, "csv", parse_csv)
}

fn from_text(dir: &Path) -> Option<Thesaurus> {
    merge_files(dir, "txt", parse_extracted_text)
}

fn merge_files(dir: &Path, extension: &str, parse: fn(&str) -> Thesaurus) -> Option<Thesaurus> {
    let mut merged = Thesaurus::new();
    for path in files_matching(dir, INTERACTION_FILE_MARKER, extension) {
        match read_lossy(&path) {
            Ok(text) => merged.extend(parse(&text)),
            Err(e) => tracing::warn!("skipping thesaurus file {}: {}", path.display(), e),
        }
    }
    (!merged.is_empty()).then_some(merged)
}

/// Parses `A;B;gravité` rows.
///
/// Rows with fewer than three columns, or with an empty substance name, are skipped.
pub fn parse_csv(text: &str) -> Thesaurus {
    let mut pairs = Thesaurus::new();
    for row in csv_rows(text, b';').records().flatten() {
        if row.len() < 3 {
            continue;
        }
        let (a, b) = (row[0].trim(), row[1].trim());
        if a.is_empty() || b.is_empty() {
            continue;
        }
        let severity = match row[2].trim() {
            "" => UNCLASSIFIED,
            s => s,
        };
        pairs.insert(PairKey::new(a, b), format!("Interaction ANSM ({severity})"));
    }
    pairs
}

/// Picks `A / B` headings out of text extracted from the thesaurus PDF.
///
/// Only the start of the line is anchored; trailing text after the second name (`:`,
/// page references) is ignored.
pub fn parse_extracted_text(text: &str) -> Thesaurus {
    text.lines()
        .filter_map(|line| PAIR_HEADING.captures(line))
        .map(|caps| PairKey::new(caps["a"].trim(), caps["b"].trim()))
        .map(|key| (key, format!("Interaction ANSM ({UNCLASSIFIED})")))
        .collect()
}
