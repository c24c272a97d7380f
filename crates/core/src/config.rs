//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Environment variables are read by the binaries only; the helpers
//! here take the raw optional values so that request handling and tests never depend on
//! process-wide state.

use crate::constants::{
    BDPM_COMPO_FILENAME, BDPM_SPEC_FILENAME, CRITERIA_FILENAME, DATA_DIR_NAME,
    DEFAULT_RESOURCES_DIR, DEFAULT_SUMMARIZER_MODEL, DEFAULT_SUMMARIZER_TIMEOUT_SECS,
};
use crate::interactions::InteractionPrecedence;
use crate::summary::{OllamaSummarizer, Summarizer, TemplateSummarizer};
use crate::{BmpError, BmpResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    resources_dir: PathBuf,
    data_dir: PathBuf,
    bdpm_spec_path: PathBuf,
    bdpm_compo_path: PathBuf,
    criteria_path: PathBuf,
    interaction_precedence: InteractionPrecedence,
}

impl CoreConfig {
    /// Create a `CoreConfig` rooted at `resources_dir`.
    ///
    /// Everything else defaults to its conventional location below the resources directory:
    /// `data/` for the BDPM extracts and code mappings, and `stopp_start_v3.yaml` for the
    /// criteria.
    ///
    /// # Errors
    ///
    /// Returns `BmpError::InvalidInput` if `resources_dir` is empty.
    pub fn new(resources_dir: PathBuf) -> BmpResult<Self> {
        if resources_dir.as_os_str().is_empty() {
            return Err(BmpError::InvalidInput(
                "resources_dir cannot be empty".into(),
            ));
        }

        let data_dir = resources_dir.join(DATA_DIR_NAME);
        Ok(Self {
            bdpm_spec_path: data_dir.join(BDPM_SPEC_FILENAME),
            bdpm_compo_path: data_dir.join(BDPM_COMPO_FILENAME),
            criteria_path: resources_dir.join(CRITERIA_FILENAME),
            data_dir,
            resources_dir,
            interaction_precedence: InteractionPrecedence::default(),
        })
    }

    /// Moves the data directory. BDPM paths that were still at their default location
    /// follow it.
    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        if self.bdpm_spec_path == self.data_dir.join(BDPM_SPEC_FILENAME) {
            self.bdpm_spec_path = data_dir.join(BDPM_SPEC_FILENAME);
        }
        if self.bdpm_compo_path == self.data_dir.join(BDPM_COMPO_FILENAME) {
            self.bdpm_compo_path = data_dir.join(BDPM_COMPO_FILENAME);
        }
        self.data_dir = data_dir;
        self
    }

    pub fn with_bdpm_spec_path(mut self, path: PathBuf) -> Self {
        self.bdpm_spec_path = path;
        self
    }

    pub fn with_bdpm_compo_path(mut self, path: PathBuf) -> Self {
        self.bdpm_compo_path = path;
        self
    }

    pub fn with_criteria_path(mut self, path: PathBuf) -> Self {
        self.criteria_path = path;
        self
    }

    pub fn with_interaction_precedence(mut self, precedence: InteractionPrecedence) -> Self {
        self.interaction_precedence = precedence;
        self
    }

    pub fn resources_dir(&self) -> &Path {
        &self.resources_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn bdpm_spec_path(&self) -> &Path {
        &self.bdpm_spec_path
    }

    pub fn bdpm_compo_path(&self) -> &Path {
        &self.bdpm_compo_path
    }

    pub fn criteria_path(&self) -> &Path {
        &self.criteria_path
    }

    pub fn interaction_precedence(&self) -> InteractionPrecedence {
        self.interaction_precedence
    }
}

/// Raw optional settings as found in the environment at startup.
///
/// Blank values count as unset.
#[derive(Clone, Debug, Default)]
pub struct ConfigValues {
    pub resources_dir: Option<String>,
    pub data_dir: Option<String>,
    pub bdpm_spec_path: Option<String>,
    pub bdpm_compo_path: Option<String>,
    pub criteria_path: Option<String>,
    pub interaction_precedence: Option<String>,
}

impl ConfigValues {
    /// Resolves the values into a validated [`CoreConfig`].
    ///
    /// # Errors
    ///
    /// Returns `BmpError::InvalidInput` if the resources directory override does not exist
    /// or the interaction precedence is not recognised.
    pub fn resolve(self) -> BmpResult<CoreConfig> {
        let resources_dir = resolve_resources_dir(path_from_env_value(self.resources_dir))?;
        let precedence = interaction_precedence_from_env_value(self.interaction_precedence)?;

        let mut cfg = CoreConfig::new(resources_dir)?.with_interaction_precedence(precedence);
        if let Some(dir) = path_from_env_value(self.data_dir) {
            cfg = cfg.with_data_dir(dir);
        }
        if let Some(path) = path_from_env_value(self.bdpm_spec_path) {
            cfg = cfg.with_bdpm_spec_path(path);
        }
        if let Some(path) = path_from_env_value(self.bdpm_compo_path) {
            cfg = cfg.with_bdpm_compo_path(path);
        }
        if let Some(path) = path_from_env_value(self.criteria_path) {
            cfg = cfg.with_criteria_path(path);
        }
        Ok(cfg)
    }
}

/// Resolve the resources directory without reading environment variables.
///
/// If `override_dir` is provided, it must be a directory. Otherwise this looks for
/// `resources/` relative to the current working directory and then walks up from
/// `CARGO_MANIFEST_DIR`. When nothing is found the relative default is returned and the
/// loaders fall back to their built-in tables.
pub fn resolve_resources_dir(override_dir: Option<PathBuf>) -> BmpResult<PathBuf> {
    if let Some(dir) = override_dir {
        if dir.is_dir() {
            return Ok(dir);
        }
        return Err(BmpError::InvalidInput(format!(
            "BMP_RESOURCES_DIR override is not a directory: {}",
            dir.display()
        )));
    }

    let cwd_relative = PathBuf::from(DEFAULT_RESOURCES_DIR);
    if cwd_relative.is_dir() {
        return Ok(cwd_relative);
    }

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    for ancestor in manifest_dir.ancestors() {
        let candidate = ancestor.join(DEFAULT_RESOURCES_DIR);
        if candidate.is_dir() {
            return Ok(candidate);
        }
    }

    tracing::warn!("no {DEFAULT_RESOURCES_DIR}/ directory found, using built-in tables only");
    Ok(cwd_relative)
}

/// Turn an optional env value into a path, treating blank values as unset.
pub fn path_from_env_value(value: Option<String>) -> Option<PathBuf> {
    non_blank(value).map(PathBuf::from)
}

/// Parse the interaction precedence from an optional string value.
///
/// If `value` is `None` or empty/whitespace, the thesaurus takes precedence.
pub fn interaction_precedence_from_env_value(
    value: Option<String>,
) -> BmpResult<InteractionPrecedence> {
    let parsed = non_blank(value)
        .map(|v| v.parse::<InteractionPrecedence>())
        .transpose()?;

    Ok(parsed.unwrap_or_default())
}

/// Build the narrative summarizer from optional env values.
///
/// Without a URL the deterministic template summarizer is used.
pub fn summarizer_from_env_values(
    url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<String>,
) -> BmpResult<Arc<dyn Summarizer>> {
    let Some(url) = non_blank(url) else {
        tracing::info!("no summarizer URL configured, using template summaries");
        return Ok(Arc::new(TemplateSummarizer));
    };

    let model = non_blank(model).unwrap_or_else(|| DEFAULT_SUMMARIZER_MODEL.to_string());
    let timeout_secs = match non_blank(timeout_secs) {
        Some(v) => v.parse::<u64>().map_err(|_| {
            BmpError::InvalidInput(format!("invalid summarizer timeout '{v}' (expected seconds)"))
        })?,
        None => DEFAULT_SUMMARIZER_TIMEOUT_SECS,
    };

    let summarizer = OllamaSummarizer::new(&url, &model, timeout_secs)
        .map_err(|e| BmpError::InvalidInput(e.to_string()))?;
    tracing::info!(
        url = %summarizer.base_url(),
        model = %model,
        timeout_secs,
        "using Ollama summarizer"
    );
    Ok(Arc::new(summarizer))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_derives_default_locations() {
        let cfg = CoreConfig::new(PathBuf::from("/srv/bmp")).expect("config");
        assert_eq!(cfg.data_dir(), Path::new("/srv/bmp/data"));
        assert_eq!(cfg.bdpm_spec_path(), Path::new("/srv/bmp/data/CIS_bdpm.csv"));
        assert_eq!(cfg.bdpm_compo_path(), Path::new("/srv/bmp/data/CIS_COMPO_bdpm.csv"));
        assert_eq!(cfg.criteria_path(), Path::new("/srv/bmp/stopp_start_v3.yaml"));
        assert_eq!(cfg.interaction_precedence(), InteractionPrecedence::Thesaurus);
    }

    #[test]
    fn new_rejects_empty_resources_dir() {
        let err = CoreConfig::new(PathBuf::new()).expect_err("empty path");
        assert!(matches!(err, BmpError::InvalidInput(_)));
    }

    #[test]
    fn moving_data_dir_keeps_explicit_bdpm_paths() {
        let cfg = CoreConfig::new(PathBuf::from("/srv/bmp"))
            .expect("config")
            .with_bdpm_compo_path(PathBuf::from("/opt/compo.csv"))
            .with_data_dir(PathBuf::from("/var/bdpm"));
        assert_eq!(cfg.bdpm_spec_path(), Path::new("/var/bdpm/CIS_bdpm.csv"));
        assert_eq!(cfg.bdpm_compo_path(), Path::new("/opt/compo.csv"));
    }

    #[test]
    fn resources_override_must_exist() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert_eq!(
            resolve_resources_dir(Some(dir.path().to_path_buf())).expect("existing dir"),
            dir.path()
        );
        let err = resolve_resources_dir(Some(dir.path().join("absent"))).expect_err("missing");
        assert!(matches!(err, BmpError::InvalidInput(msg) if msg.contains("absent")));
    }

    #[test]
    fn precedence_defaults_to_thesaurus() {
        assert_eq!(
            interaction_precedence_from_env_value(None).expect("default"),
            InteractionPrecedence::Thesaurus
        );
        assert_eq!(
            interaction_precedence_from_env_value(Some("  ".into())).expect("blank"),
            InteractionPrecedence::Thesaurus
        );
        assert_eq!(
            interaction_precedence_from_env_value(Some("static".into())).expect("static"),
            InteractionPrecedence::Static
        );
        assert!(interaction_precedence_from_env_value(Some("latest".into())).is_err());
    }

    #[test]
    fn summarizer_settings_are_validated() {
        assert!(summarizer_from_env_values(None, None, None).is_ok());
        assert!(
            summarizer_from_env_values(Some("http://localhost:11434".into()), None, None).is_ok()
        );
        let err = summarizer_from_env_values(
            Some("http://localhost:11434".into()),
            None,
            Some("soon".into()),
        )
        .err()
        .expect("bad timeout");
        assert!(matches!(err, BmpError::InvalidInput(msg) if msg.contains("soon")));
    }

    #[test]
    fn values_resolve_with_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = ConfigValues {
            resources_dir: Some(dir.path().display().to_string()),
            data_dir: Some("/var/bdpm".into()),
            criteria_path: Some(" ".into()),
            interaction_precedence: Some("static".into()),
            ..ConfigValues::default()
        }
        .resolve()
        .expect("resolve");

        assert_eq!(cfg.resources_dir(), dir.path());
        assert_eq!(cfg.bdpm_spec_path(), Path::new("/var/bdpm/CIS_bdpm.csv"));
        assert_eq!(cfg.criteria_path(), dir.path().join("stopp_start_v3.yaml"));
        assert_eq!(cfg.interaction_precedence(), InteractionPrecedence::Static);
    }

    #[test]
    fn blank_paths_are_unset() {
        assert_eq!(path_from_env_value(Some(" ".into())), None);
        assert_eq!(
            path_from_env_value(Some("/tmp/x.yaml".into())),
            Some(PathBuf::from("/tmp/x.yaml"))
        );
    }
}
