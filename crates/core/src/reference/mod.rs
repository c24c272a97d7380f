//! Medication reference data.
//!
//! The normalizer only needs one question answered: "which substance does this name or code
//! stand for?". [`MedicationReference`] is that seam. Concrete sources (BDPM extracts, code
//! mappings) implement it and are chained in priority order.

pub mod atc;
pub mod bdpm;
pub mod codes;

pub use atc::substances_from_atc;
pub use bdpm::BdpmRepository;
pub use codes::CodeMapping;

use crate::config::CoreConfig;
use bmp_types::Substance;

/// Lookup from a medication name, brand or code to its canonical substance.
pub trait MedicationReference: Send + Sync {
    /// Returns the principal substance for `name`, if known.
    fn find_dci(&self, name: &str) -> Option<Substance>;

    /// Returns every substance composing `name` (empty when unknown).
    fn substances(&self, name: &str) -> Vec<Substance> {
        self.find_dci(name).into_iter().collect()
    }
}

/// Reference that knows nothing. Used when no source could be loaded.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoReference;

impl MedicationReference for NoReference {
    fn find_dci(&self, _name: &str) -> Option<Substance> {
        None
    }
}

/// Several references consulted in order; the first answer wins.
#[derive(Default)]
pub struct ChainedReference {
    sources: Vec<Box<dyn MedicationReference>>,
}

impl ChainedReference {
    pub fn new(sources: Vec<Box<dyn MedicationReference>>) -> Self {
        Self { sources }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl MedicationReference for ChainedReference {
    fn find_dci(&self, name: &str) -> Option<Substance> {
        self.sources.iter().find_map(|source| source.find_dci(name))
    }

    fn substances(&self, name: &str) -> Vec<Substance> {
        self.sources
            .iter()
            .map(|source| source.substances(name))
            .find(|subs| !subs.is_empty())
            .unwrap_or_default()
    }
}

/// Builds the reference chain described by `cfg`: BDPM specialties first, then codes.
///
/// A BDPM extract that is missing or unreadable is left out of the chain with a warning;
/// the code mapping always loads because it carries a static fallback.
pub fn load_reference(cfg: &CoreConfig) -> ChainedReference {
    let mut sources: Vec<Box<dyn MedicationReference>> = Vec::new();

    match BdpmRepository::load(cfg.bdpm_spec_path(), cfg.bdpm_compo_path()) {
        Ok(repo) => {
            tracing::info!(specialties = repo.len(), "loaded BDPM specialties");
            sources.push(Box::new(repo));
        }
        Err(e) => {
            tracing::warn!("BDPM reference unavailable, continuing without it: {}", e);
        }
    }

    sources.push(Box::new(CodeMapping::load(cfg.data_dir())));
    ChainedReference::new(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, &'static str);

    impl MedicationReference for Fixed {
        fn find_dci(&self, name: &str) -> Option<Substance> {
            (name.eq_ignore_ascii_case(self.0)).then(|| Substance::new(self.1))
        }
    }

    #[test]
    fn chained_reference_returns_first_answer() {
        let chain = ChainedReference::new(vec![
            Box::new(NoReference),
            Box::new(Fixed("DOLIPRANE", "PARACETAMOL")),
            Box::new(Fixed("DOLIPRANE", "SHOULD_NOT_BE_USED")),
        ]);

        assert_eq!(chain.find_dci("doliprane"), Some(Substance::new("PARACETAMOL")));
        assert_eq!(chain.find_dci("unknown"), None);
        assert_eq!(
            chain.substances("DOLIPRANE"),
            vec![Substance::new("PARACETAMOL")]
        );
    }

    #[test]
    fn empty_chain_knows_nothing() {
        let chain = ChainedReference::default();
        assert!(chain.is_empty());
        assert!(chain.find_dci("ANYTHING").is_none());
        assert!(chain.substances("ANYTHING").is_empty());
    }
}
