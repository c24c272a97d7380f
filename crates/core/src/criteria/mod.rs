//! STOPP/START prescribing criteria.
//!
//! Every criterion, whether built in or loaded from YAML, is plain data: an id, a
//! description, a phase, age bounds and a [`Matcher`] over the medication set. One
//! evaluator ([`Criterion::applies`]) interprets them all.

pub mod loader;
pub mod registry;

pub use loader::{load_criteria, parse_criteria};
pub use registry::{CriteriaFindings, CriterionRegistry};

use crate::constants::{DEFAULT_AGE_MAX, DEFAULT_AGE_MIN};
use bmp_types::{Demographics, Phase, Substance};
use std::collections::{BTreeSet, HashSet};

/// Medication-set condition of a criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// At least one listed substance is present.
    AnyOf(BTreeSet<Substance>),
    /// Every group has at least one substance present.
    AllOf(Vec<BTreeSet<Substance>>),
}

impl Matcher {
    pub fn any_of<I, S>(substances: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::AnyOf(substances.into_iter().map(Substance::new).collect())
    }

    fn matches(&self, meds: &HashSet<Substance>) -> bool {
        let hit = |group: &BTreeSet<Substance>| group.iter().any(|s| meds.contains(s));
        match self {
            Self::AnyOf(group) => hit(group),
            Self::AllOf(groups) => !groups.is_empty() && groups.iter().all(hit),
        }
    }

    /// Whether the matcher can never fire.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::AnyOf(group) => group.is_empty(),
            Self::AllOf(groups) => groups.is_empty() || groups.iter().any(BTreeSet::is_empty),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criterion {
    id: String,
    description: String,
    phase: Phase,
    age_min: u32,
    age_max: u32,
    matcher: Matcher,
}

impl Criterion {
    /// New criterion applying to every age.
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        phase: Phase,
        matcher: Matcher,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            phase,
            age_min: DEFAULT_AGE_MIN,
            age_max: DEFAULT_AGE_MAX,
            matcher,
        }
    }

    /// Restricts the criterion to `age_min..=age_max`.
    pub fn with_age_bounds(mut self, age_min: u32, age_max: u32) -> Self {
        self.age_min = age_min;
        self.age_max = age_max;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn age_bounds(&self) -> (u32, u32) {
        (self.age_min, self.age_max)
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Whether the criterion fires for this patient. Medication names compare
    /// case-insensitively.
    pub fn applies<S: AsRef<str>>(&self, demo: &Demographics, meds: &[S]) -> bool {
        let meds: HashSet<Substance> = meds.iter().map(Substance::new).collect();
        self.applies_to_set(demo, &meds)
    }

    pub(crate) fn applies_to_set(&self, demo: &Demographics, meds: &HashSet<Substance>) -> bool {
        let age = demo.age();
        (self.age_min..=self.age_max).contains(&age) && self.matcher.matches(meds)
    }
}
