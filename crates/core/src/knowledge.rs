//! Lazily loaded knowledge base.
//!
//! Each reference table is read from disk on first use and then shared read-only. A table
//! is initialised at most once even when several threads ask for it at the same time.

use crate::anticholinergic::BurdenTable;
use crate::config::CoreConfig;
use crate::criteria::CriterionRegistry;
use crate::interactions::InteractionCatalog;
use crate::reference::{load_reference, MedicationReference};
use std::sync::OnceLock;

pub struct KnowledgeBase {
    config: CoreConfig,
    reference: OnceLock<Box<dyn MedicationReference>>,
    catalog: OnceLock<InteractionCatalog>,
    registry: OnceLock<CriterionRegistry>,
    burden: OnceLock<BurdenTable>,
}

impl KnowledgeBase {
    /// Knowledge base whose tables load from the locations in `config`.
    pub fn new(config: CoreConfig) -> Self {
        Self {
            config,
            reference: OnceLock::new(),
            catalog: OnceLock::new(),
            registry: OnceLock::new(),
            burden: OnceLock::new(),
        }
    }

    /// Uses `reference` instead of loading the medication reference from disk.
    pub fn with_reference(mut self, reference: Box<dyn MedicationReference>) -> Self {
        self.reference = OnceLock::from(reference);
        self
    }

    pub fn with_catalog(mut self, catalog: InteractionCatalog) -> Self {
        self.catalog = OnceLock::from(catalog);
        self
    }

    pub fn with_registry(mut self, registry: CriterionRegistry) -> Self {
        self.registry = OnceLock::from(registry);
        self
    }

    pub fn with_burden(mut self, burden: BurdenTable) -> Self {
        self.burden = OnceLock::from(burden);
        self
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn reference(&self) -> &dyn MedicationReference {
        self.reference
            .get_or_init(|| Box::new(load_reference(&self.config)))
            .as_ref()
    }

    pub fn catalog(&self) -> &InteractionCatalog {
        self.catalog.get_or_init(|| {
            InteractionCatalog::load(
                self.config.resources_dir(),
                self.config.interaction_precedence(),
            )
        })
    }

    pub fn registry(&self) -> &CriterionRegistry {
        self.registry
            .get_or_init(|| CriterionRegistry::load(self.config.criteria_path()))
    }

    pub fn burden(&self) -> &BurdenTable {
        self.burden
            .get_or_init(|| BurdenTable::load(self.config.resources_dir()))
    }

    /// Loads every table now rather than on the first request.
    pub fn preload(&self) {
        self.reference();
        self.catalog();
        self.registry();
        self.burden();
    }

    /// Drops every loaded table so the next access reads from disk again.
    ///
    /// Tables supplied through the `with_*` builders are dropped too.
    pub fn reset(&mut self) {
        self.reference.take();
        self.catalog.take();
        self.registry.take();
        self.burden.take();
    }
}
