//! BDPM specialty repository.
//!
//! Parses the public BDPM "Spécialités" and "Compositions" extracts into two lookups:
//! - libellé spécialité → CIS
//! - CIS → substances, in file order
//!
//! Both files are tab-separated in the official distribution; `;`-separated copies are
//! accepted too. A header row (`CIS` / `CODECIS`) is skipped when present.

use super::MedicationReference;
use crate::helpers::{csv_rows, detect_delimiter, read_lossy};
use crate::{BmpError, BmpResult};
use bmp_types::Substance;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Default, Clone)]
pub struct BdpmRepository {
    libelle_to_cis: HashMap<String, String>,
    cis_to_substances: HashMap<String, Vec<Substance>>,
}

impl BdpmRepository {
    /// Loads both extracts from disk.
    ///
    /// # Errors
    ///
    /// Returns `BmpError::InvalidInput` if either file is missing, or `BmpError::FileRead`
    /// if it cannot be read. Individual malformed rows are skipped.
    pub fn load(spec_path: &Path, compo_path: &Path) -> BmpResult<Self> {
        for path in [spec_path, compo_path] {
            if !path.is_file() {
                return Err(BmpError::InvalidInput(format!(
                    "BDPM extract not found: {}",
                    path.display()
                )));
            }
        }

        let spec_text = read_lossy(spec_path)?;
        let compo_text = read_lossy(compo_path)?;
        Ok(Self::parse(&spec_text, &compo_text))
    }

    /// Builds the repository from the text of both extracts.
    pub fn parse(spec_text: &str, compo_text: &str) -> Self {
        let mut repo = Self::default();
        repo.parse_spec(spec_text);
        repo.parse_compo(compo_text);
        repo
    }

    fn parse_spec(&mut self, text: &str) {
        let mut rows = csv_rows(text, detect_delimiter(text));
        for (index, row) in rows.records().enumerate() {
            let Ok(row) = row else { continue };
            let cis = row.get(0).unwrap_or_default().trim();
            if index == 0 && matches!(cis.to_uppercase().as_str(), "CIS" | "CODECIS") {
                continue;
            }
            let libelle = row.get(1).unwrap_or_default().trim().to_uppercase();
            if !cis.is_empty() && !libelle.is_empty() {
                self.libelle_to_cis.insert(libelle, cis.to_string());
            }
        }
    }

    fn parse_compo(&mut self, text: &str) {
        let mut rows = csv_rows(text, detect_delimiter(text));
        for (index, row) in rows.records().enumerate() {
            let Ok(row) = row else { continue };
            if row.len() < 4 {
                continue;
            }
            let cis = row.get(0).unwrap_or_default().trim();
            if index == 0 && cis.eq_ignore_ascii_case("CIS") {
                continue;
            }
            let substance = row.get(3).unwrap_or_default().trim();
            if !cis.is_empty() && !substance.is_empty() {
                self.cis_to_substances
                    .entry(cis.to_string())
                    .or_default()
                    .push(Substance::new(substance));
            }
        }
    }

    /// Number of known specialty labels.
    pub fn len(&self) -> usize {
        self.libelle_to_cis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libelle_to_cis.is_empty()
    }

    fn substances_for(&self, name: &str) -> &[Substance] {
        self.libelle_to_cis
            .get(name.trim().to_uppercase().as_str())
            .and_then(|cis| self.cis_to_substances.get(cis))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl MedicationReference for BdpmRepository {
    fn find_dci(&self, name: &str) -> Option<Substance> {
        self.substances_for(name).first().cloned()
    }

    fn substances(&self, name: &str) -> Vec<Substance> {
        self.substances_for(name).to_vec()
    }
}
