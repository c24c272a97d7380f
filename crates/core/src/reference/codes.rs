//! CIP / CIS code mapping.
//!
//! Maps pharmacy codes (CIP7, CIP13, CIS) to their substance so that a medication list
//! submitted as codes normalizes like one submitted as names. Sources are tried in order,
//! and the first one that yields a non-empty mapping wins:
//! 1. `bdpm.sqlite` built from the full BDPM extracts
//! 2. `bdpm_substances.csv`, a lightweight extract (`CIP7;CIP13;DCI` headers)
//! 3. a small static table

use super::MedicationReference;
use crate::constants::{BDPM_SQLITE_FILENAME, BDPM_SUBSTANCES_FILENAME};
use crate::helpers::read_lossy;
use crate::BmpResult;
use bmp_types::Substance;
use rusqlite::{Connection, OpenFlags};
use std::collections::HashMap;
use std::path::Path;

type CodeLoader = fn(&Path) -> Option<HashMap<String, Substance>>;

const FALLBACK_CODES: &[(&str, &str)] = &[
    // Doliprane 1 g comprimé
    ("3400932716455", "PARACETAMOL"),
    ("PARACETAMOL", "PARACETAMOL"),
];

#[derive(Debug, Clone, Default)]
pub struct CodeMapping {
    codes: HashMap<String, Substance>,
}

impl CodeMapping {
    /// Loads the mapping from `data_dir`, falling back to the static table.
    pub fn load(data_dir: &Path) -> Self {
        let attempts: [(&str, CodeLoader); 2] = [("sqlite", from_sqlite), ("csv", from_csv)];

        for (label, attempt) in attempts {
            if let Some(codes) = attempt(data_dir) {
                tracing::info!(source = label, codes = codes.len(), "loaded code mapping");
                return Self { codes };
            }
        }

        tracing::debug!("no code mapping source found, using static fallback");
        Self::fallback()
    }

    /// The static table used when no source file is available.
    pub fn fallback() -> Self {
        let codes = FALLBACK_CODES
            .iter()
            .map(|(code, dci)| (code.to_string(), Substance::new(dci)))
            .collect();
        Self { codes }
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl MedicationReference for CodeMapping {
    fn find_dci(&self, name: &str) -> Option<Substance> {
        self.codes.get(name.trim().to_uppercase().as_str()).cloned()
    }
}

fn from_sqlite(data_dir: &Path) -> Option<HashMap<String, Substance>> {
    let path = data_dir.join(BDPM_SQLITE_FILENAME);
    if !path.is_file() {
        return None;
    }
    match parse_sqlite(&path) {
        Ok(codes) if !codes.is_empty() => Some(codes),
        Ok(_) => {
            tracing::warn!("BDPM database is empty: {}", path.display());
            None
        }
        Err(e) => {
            tracing::warn!("failed to read BDPM database {}: {}", path.display(), e);
            None
        }
    }
}

fn parse_sqlite(path: &Path) -> BmpResult<HashMap<String, Substance>> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let mut codes = HashMap::new();

    let mut compositions = conn.prepare("SELECT cis, substance FROM compositions")?;
    let rows = compositions.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    for (cis, substance) in rows.flatten() {
        let substance = Substance::new(substance);
        codes.insert(cis.trim().to_uppercase(), substance.clone());
        codes.insert(substance.as_str().to_string(), substance);
    }

    let mut cips = conn.prepare(
        "SELECT c.cip, comp.substance FROM cips c JOIN compositions comp USING(cis)",
    )?;
    let rows = cips.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;
    for (cip, substance) in rows.flatten() {
        codes.insert(cip.trim().to_uppercase(), Substance::new(substance));
    }

    Ok(codes)
}

fn from_csv(data_dir: &Path) -> Option<HashMap<String, Substance>> {
    let path = data_dir.join(BDPM_SUBSTANCES_FILENAME);
    if !path.is_file() {
        return None;
    }
    let text = match read_lossy(&path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("failed to read {}: {}", path.display(), e);
            return None;
        }
    };
    let codes = parse_substances_csv(&text);
    (!codes.is_empty()).then_some(codes)
}

/// Parses a `;`-separated extract with `CIP7`, `CIP13` and `DCI` header columns.
///
/// `CIP7` is preferred over `CIP13` when both are filled. Rows without a code or a DCI are
/// skipped.
pub(crate) fn parse_substances_csv(text: &str) -> HashMap<String, Substance> {
    let mut codes = HashMap::new();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(text.as_bytes());

    let Ok(headers) = reader.headers().cloned() else {
        return codes;
    };
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);
    let (cip7, cip13, dci) = (column("CIP7"), column("CIP13"), column("DCI"));
    let Some(dci) = dci else {
        return codes;
    };

    for row in reader.records().flatten() {
        let field = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };
        let code = field(cip7).or_else(|| field(cip13));
        if let (Some(code), Some(substance)) = (code, field(Some(dci))) {
            codes.insert(code.to_uppercase(), Substance::new(substance));
        }
    }

    codes
}
