//! Constants used throughout the BMP core crate.
//!
//! File names, directory names and clinical thresholds live here so that loaders, the
//! pipeline and the tests agree on them.

/// Default directory for reference resources when no explicit directory is configured.
pub const DEFAULT_RESOURCES_DIR: &str = "resources";

/// Sub-directory of the resources directory holding medication reference extracts.
pub const DATA_DIR_NAME: &str = "data";

/// BDPM "Spécialités" extract (CIS → libellé).
pub const BDPM_SPEC_FILENAME: &str = "CIS_bdpm.csv";

/// BDPM "Compositions" extract (CIS → substances).
pub const BDPM_COMPO_FILENAME: &str = "CIS_COMPO_bdpm.csv";

/// SQLite database built from the BDPM extracts.
pub const BDPM_SQLITE_FILENAME: &str = "bdpm.sqlite";

/// Lightweight CIP → DCI extract.
pub const BDPM_SUBSTANCES_FILENAME: &str = "bdpm_substances.csv";

/// Declarative STOPP/START criteria.
pub const CRITERIA_FILENAME: &str = "stopp_start_v3.yaml";

/// Substring identifying anticholinergic burden tables in the resources directory.
pub const BURDEN_FILE_MARKER: &str = "CIA-ACB";

/// Substring identifying interaction thesaurus files in the resources directory.
pub const INTERACTION_FILE_MARKER: &str = "interaction";

/// Burden score from which the pipeline reports a high anticholinergic load.
pub const BURDEN_ALERT_THRESHOLD: u32 = 3;

/// Lower age bound applied when a criterion does not declare one.
pub const DEFAULT_AGE_MIN: u32 = 0;

/// Upper age bound applied when a criterion does not declare one.
pub const DEFAULT_AGE_MAX: u32 = 200;

/// Recommendation added whenever at least one interaction was detected.
pub const INTERACTION_REVIEW_NOTE: &str =
    "Consulter les recommandations cliniques pour les interactions identifiées.";

/// Default timeout for a single narrative summary request.
pub const DEFAULT_SUMMARIZER_TIMEOUT_SECS: u64 = 45;

/// Default model requested from the summarizer endpoint.
pub const DEFAULT_SUMMARIZER_MODEL: &str = "biomistral";
