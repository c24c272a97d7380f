//! Anticholinergic burden.
//!
//! Per-substance weights come from the OMÉDIT CIA/ACB tables (`*CIA-ACB*.csv`,
//! `;`-separated): substance in column 0, CIA score in column 1, ACB score in column 3.
//! A substance's weight is the larger of its two scores, and the largest weight seen
//! across all rows and files.

use crate::constants::BURDEN_FILE_MARKER;
use crate::helpers::{csv_rows, files_matching, read_lossy};
use bmp_types::Substance;
use std::collections::HashMap;
use std::path::Path;

const NAME_COLUMN: usize = 0;
const CIA_COLUMN: usize = 1;
const ACB_COLUMN: usize = 3;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BurdenTable {
    scores: HashMap<Substance, u32>,
}

impl BurdenTable {
    pub fn from_scores(scores: impl IntoIterator<Item = (Substance, u32)>) -> Self {
        let mut table = Self::default();
        for (substance, score) in scores {
            table.record(substance, score);
        }
        table
    }

    /// Loads and merges every burden table in `resources_dir`.
    ///
    /// Unreadable files are skipped with a warning; a directory without tables yields an
    /// empty table, so every burden is zero.
    pub fn load(resources_dir: &Path) -> Self {
        let mut table = Self::default();
        let files = files_matching(resources_dir, BURDEN_FILE_MARKER, "csv");

        for path in &files {
            match read_lossy(path) {
                Ok(text) => table.merge_csv(&text),
                Err(e) => tracing::warn!("skipping burden table {}: {}", path.display(), e),
            }
        }

        if table.is_empty() {
            tracing::warn!(
                "no anticholinergic scores found in {}",
                resources_dir.display()
            );
        } else {
            tracing::info!(
                files = files.len(),
                substances = table.len(),
                "loaded anticholinergic burden table"
            );
        }
        table
    }

    /// Parses one table.
    pub fn parse_csv(text: &str) -> Self {
        let mut table = Self::default();
        table.merge_csv(text);
        table
    }

    fn merge_csv(&mut self, text: &str) {
        for row in csv_rows(text, b';').records().flatten() {
            let name = row.get(NAME_COLUMN).unwrap_or_default().trim();
            if name.is_empty() || name.starts_with('#') {
                continue;
            }
            let sub_score = |column: usize| {
                row.get(column)
                    .and_then(|v| v.trim().parse::<u32>().ok())
                    .unwrap_or(0)
            };
            let score = sub_score(CIA_COLUMN).max(sub_score(ACB_COLUMN));
            self.record(Substance::new(name), score);
        }
    }

    fn record(&mut self, substance: Substance, score: u32) {
        if score == 0 {
            return;
        }
        let entry = self.scores.entry(substance).or_insert(0);
        *entry = (*entry).max(score);
    }

    /// Weight of one substance (0 when unlisted).
    pub fn score(&self, name: &str) -> u32 {
        self.scores
            .get(name.trim().to_uppercase().as_str())
            .copied()
            .unwrap_or(0)
    }

    /// Total burden of a medication list. Repeated entries count every time.
    ///
    /// Saturates at `u32::MAX`; weights come from external tables and are not bounded.
    pub fn compute<S: AsRef<str>>(&self, meds: &[S]) -> u32 {
        meds.iter()
            .map(|m| self.score(m.as_ref()))
            .fold(0u32, u32::saturating_add)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
