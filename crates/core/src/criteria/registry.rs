//! Criterion registry and evaluator.

use super::{load_criteria, Criterion, Matcher};
use crate::constants::DEFAULT_AGE_MAX;
use bmp_types::{Demographics, Phase, Substance};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;

const ANTICHOLINERGICS: &[&str] = &["DIPHENHYDRAMINE", "DEXCHLORPHENIRAMINE", "OXYBUTYNIN"];
const ACE_INHIBITORS: &[&str] = &["LISINOPRIL", "RAMIPRIL", "PERINDOPRIL"];
const POTASSIUM_SUPPLEMENTS: &[&str] = &["POTASSIUM", "KCL"];

/// Descriptions of the criteria that fired, split by phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaFindings {
    pub stops: Vec<String>,
    pub starts: Vec<String>,
}

/// Ordered list of criteria: built-in ones first, then loaded ones in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriterionRegistry {
    criteria: Vec<Criterion>,
}

impl Default for CriterionRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CriterionRegistry {
    /// Registry holding the built-in criteria only.
    pub fn builtin() -> Self {
        let group = |names: &[&str]| names.iter().map(Substance::new).collect::<BTreeSet<_>>();

        let criteria = vec![
            Criterion::new(
                "A1",
                "Anticholinergic chez >65 ans",
                Phase::Stopp,
                Matcher::AnyOf(group(ANTICHOLINERGICS)),
            )
            .with_age_bounds(65, DEFAULT_AGE_MAX),
            Criterion::new(
                "B2",
                "IEC + supplément de potassium",
                Phase::Stopp,
                Matcher::AllOf(vec![group(ACE_INHIBITORS), group(POTASSIUM_SUPPLEMENTS)]),
            ),
        ];
        Self { criteria }
    }

    /// Built-in criteria followed by `extra`.
    pub fn with_criteria(extra: impl IntoIterator<Item = Criterion>) -> Self {
        let mut registry = Self::builtin();
        registry.criteria.extend(extra);
        registry
    }

    /// Built-in criteria followed by those found in the YAML file at `path`.
    pub fn load(path: &Path) -> Self {
        let registry = Self::with_criteria(load_criteria(path));
        tracing::info!(criteria = registry.len(), "criterion registry ready");
        registry
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Evaluates every criterion in order. Descriptions are not deduplicated across
    /// criteria.
    pub fn evaluate<S: AsRef<str>>(&self, demo: &Demographics, meds: &[S]) -> CriteriaFindings {
        let meds: HashSet<Substance> = meds.iter().map(Substance::new).collect();
        let mut findings = CriteriaFindings::default();

        for criterion in &self.criteria {
            if !criterion.applies_to_set(demo, &meds) {
                continue;
            }
            tracing::debug!(id = criterion.id(), phase = %criterion.phase(), "criterion fired");
            let description = criterion.description().to_string();
            match criterion.phase() {
                Phase::Stopp => findings.stops.push(description),
                Phase::Start => findings.starts.push(description),
            }
        }

        findings
    }
}
