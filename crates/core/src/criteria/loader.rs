//! YAML criterion source.
//!
//! The file holds a list of records:
//!
//! ```yaml
//! - id: C3
//!   description: "AINS chez l'insuffisant cardiaque"
//!   substances: [IBUPROFEN, KETOPROFEN]   # or `atc: M01AE`
//!   age_min: 65                           # optional, default 0
//!   age_max: 200                          # optional, default 200
//!   enabled: true                         # optional, default true
//!   phase: STOPP                          # optional, STOPP or START
//! ```
//!
//! Records are validated one by one; a record that does not fit the schema is skipped
//! with a warning rather than discarding the whole file.

use super::{Criterion, Matcher};
use crate::constants::{DEFAULT_AGE_MAX, DEFAULT_AGE_MIN};
use crate::reference::substances_from_atc;
use crate::{BmpError, BmpResult};
use bmp_types::Phase;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// Criterion record as written in YAML.
#[derive(Debug, Deserialize)]
struct CriterionRecord {
    id: RecordId,
    description: String,
    #[serde(default)]
    substances: Vec<String>,
    atc: Option<String>,
    #[serde(default, deserialize_with = "lenient_age_bound")]
    age_min: Option<u32>,
    #[serde(default, deserialize_with = "lenient_age_bound")]
    age_max: Option<u32>,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
    phase: Option<String>,
}

/// Ids are usually strings but bare numbers appear in hand-written files.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordId {
    Text(String),
    Number(i64),
}

impl RecordId {
    fn into_string(self) -> String {
        match self {
            RecordId::Text(s) => s,
            RecordId::Number(n) => n.to_string(),
        }
    }
}

fn enabled_by_default() -> bool {
    true
}

impl CriterionRecord {
    fn into_criterion(self) -> Criterion {
        let matcher = match &self.atc {
            Some(code) => Matcher::AnyOf(substances_from_atc(code)),
            None => Matcher::any_of(&self.substances),
        };
        let phase = self
            .phase
            .as_deref()
            .map(Phase::from_wire)
            .unwrap_or_default();

        let criterion = Criterion::new(self.id.into_string(), self.description, phase, matcher)
            .with_age_bounds(
                self.age_min.unwrap_or(DEFAULT_AGE_MIN),
                self.age_max.unwrap_or(DEFAULT_AGE_MAX),
            );

        if criterion.matcher().is_empty() {
            match &self.atc {
                Some(code) => tracing::warn!(
                    "criterion {} references unknown ATC class {code}, it will never fire",
                    criterion.id()
                ),
                None => tracing::warn!(
                    "criterion {} lists no substances, it will never fire",
                    criterion.id()
                ),
            }
        }
        let (age_min, age_max) = criterion.age_bounds();
        if age_min > age_max {
            tracing::warn!(
                "criterion {} has age_min {age_min} above age_max {age_max}, it will never fire",
                criterion.id()
            );
        }
        criterion
    }
}

/// Age bounds are integers, but quoted numbers (`age_min: "65"`) are accepted too.
#[derive(Deserialize)]
#[serde(untagged)]
enum AgeBound {
    Number(u32),
    Text(String),
}

fn lenient_age_bound<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<AgeBound>::deserialize(deserializer)? {
        None => Ok(None),
        Some(AgeBound::Number(n)) => Ok(Some(n)),
        Some(AgeBound::Text(text)) => text.trim().parse().map(Some).map_err(|_| {
            D::Error::custom(format!("expected a whole number of years, got '{text}'"))
        }),
    }
}

/// Best-effort id of a raw record, for log messages about records that fail the schema.
fn record_id_hint(item: &serde_yaml::Value) -> String {
    match item.get("id") {
        Some(serde_yaml::Value::String(id)) => id.clone(),
        Some(serde_yaml::Value::Number(n)) => n.to_string(),
        _ => "<no id>".to_string(),
    }
}

/// Parses criteria from YAML text, dropping disabled records.
///
/// # Errors
///
/// Returns [`BmpError::YamlDeserialization`] if the text is not YAML at all, or
/// [`BmpError::CriteriaSchema`] if the document is not a list. Individual records that do
/// not match the schema are skipped.
pub fn parse_criteria(yaml_text: &str) -> BmpResult<Vec<Criterion>> {
    if yaml_text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let document: serde_yaml::Value =
        serde_yaml::from_str(yaml_text).map_err(BmpError::YamlDeserialization)?;

    let items = match document {
        serde_yaml::Value::Null => return Ok(Vec::new()),
        serde_yaml::Value::Sequence(items) => items,
        other => {
            return Err(BmpError::CriteriaSchema {
                path: "<root>".into(),
                message: format!("expected a list of criteria, got {other:?}"),
            });
        }
    };

    let mut criteria = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let id_hint = record_id_hint(&item);
        let record = match serde_path_to_error::deserialize::<_, CriterionRecord>(item) {
            Ok(record) => record,
            Err(err) => {
                let path = err.path().to_string();
                let path = if path.is_empty() || path == "." {
                    format!("[{index}]")
                } else {
                    format!("[{index}].{path}")
                };
                tracing::warn!(
                    "skipping criterion {id_hint}: schema mismatch at {path}: {}",
                    err.into_inner()
                );
                continue;
            }
        };
        if !record.enabled {
            tracing::debug!("criterion {:?} is disabled", record.id);
            continue;
        }
        criteria.push(record.into_criterion());
    }

    Ok(criteria)
}

/// Loads criteria from `path`.
///
/// A missing, unreadable or malformed file yields no criteria; the built-in ones still
/// apply.
pub fn load_criteria(path: &Path) -> Vec<Criterion> {
    if !path.is_file() {
        tracing::debug!("no criteria file at {}", path.display());
        return Vec::new();
    }

    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("failed to read criteria file {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    match parse_criteria(&text) {
        Ok(criteria) => {
            tracing::info!(
                count = criteria.len(),
                "loaded criteria from {}",
                path.display()
            );
            criteria
        }
        Err(e) => {
            tracing::warn!("ignoring criteria file {}: {}", path.display(), e);
            Vec::new()
        }
    }
}
