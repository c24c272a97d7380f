//! # BMP Core
//!
//! Clinical rule evaluation for shared medication reviews (bilan de médication partagé).
//!
//! Given patient demographics and a medication list, the core reports:
//! - drug–drug interactions from a built-in table merged with the ANSM thesaurus
//! - STOPP/START criteria, built in or loaded from YAML
//! - a high anticholinergic burden (CIA/ACB scores)
//!
//! and adds a narrative summary from a pluggable [`summary::Summarizer`]. Renal dose
//! adjustment (Cockcroft-Gault) is available alongside.
//!
//! **No serving concerns**: HTTP, authentication and FHIR rendering belong to the callers.

pub mod anticholinergic;
pub mod config;
pub mod constants;
pub mod criteria;
pub mod error;
mod helpers;
pub mod interactions;
pub mod knowledge;
pub mod normalization;
pub mod pipeline;
pub mod reference;
pub mod renal;
pub mod summary;

pub use anticholinergic::BurdenTable;
pub use config::CoreConfig;
pub use criteria::{CriteriaFindings, Criterion, CriterionRegistry, Matcher};
pub use error::{BmpError, BmpResult};
pub use interactions::{InteractionCatalog, InteractionPrecedence, PairKey};
pub use knowledge::KnowledgeBase;
pub use pipeline::{BmpReport, BmpService};
pub use renal::{adjust_for_renal, assess_renal, calculate_clcr, RenalAdjustment, RenalAssessment};
pub use summary::{Summarizer, SummaryError, TemplateSummarizer};
