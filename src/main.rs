use std::io::{self, BufRead, Write};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bmp_core::config::{summarizer_from_env_values, ConfigValues};
use bmp_core::{BmpReport, BmpService, KnowledgeBase};
use bmp_types::Demographics;

/// One medication review request, one JSON object per input line.
#[derive(Debug, Deserialize)]
struct BmpRequest {
    patient_id: String,
    demographics: Demographics,
    medications: Vec<Medication>,
}

#[derive(Debug, Deserialize)]
struct Medication {
    name: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum BmpResponse {
    Ok {
        patient_id: String,
        #[serde(flatten)]
        report: BmpReport,
    },
    Error {
        detail: String,
    },
}

/// Batch runner for medication reviews
///
/// Reads JSON-lines requests on stdin and writes one JSON response per line on stdout.
/// Logs go to stderr.
///
/// # Environment Variables
/// - `BMP_RESOURCES_DIR`: reference tables and criteria (default: `resources/`)
/// - `BMP_DATA_DIR`: BDPM extracts and code mappings (default: `<resources>/data`)
/// - `BDPM_CSV_PATH`, `BDPM_COMPO_PATH`: explicit BDPM extract paths
/// - `BMP_CRITERIA_PATH`: STOPP/START YAML (default: `<resources>/stopp_start_v3.yaml`)
/// - `BMP_INTERACTION_PRECEDENCE`: `thesaurus` (default) or `static`
/// - `BMP_SUMMARIZER_URL`, `BMP_SUMMARIZER_MODEL`, `BMP_SUMMARIZER_TIMEOUT_SECS`: Ollama
///   summarizer; template summaries are used when no URL is set
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bmp_run=info".parse()?)
                .add_directive("bmp_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let service = build_service()?;
    tracing::info!("++ BMP runner ready, reading requests on stdin");

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(&service, &line);
        serde_json::to_writer(&mut stdout, &response)?;
        writeln!(stdout)?;
        stdout.flush()?;
    }

    Ok(())
}

fn build_service() -> anyhow::Result<BmpService> {
    let cfg = ConfigValues {
        resources_dir: env("BMP_RESOURCES_DIR"),
        data_dir: env("BMP_DATA_DIR"),
        bdpm_spec_path: env("BDPM_CSV_PATH"),
        bdpm_compo_path: env("BDPM_COMPO_PATH"),
        criteria_path: env("BMP_CRITERIA_PATH"),
        interaction_precedence: env("BMP_INTERACTION_PRECEDENCE"),
    }
    .resolve()?;

    let summarizer = summarizer_from_env_values(
        env("BMP_SUMMARIZER_URL"),
        env("BMP_SUMMARIZER_MODEL"),
        env("BMP_SUMMARIZER_TIMEOUT_SECS"),
    )?;

    let knowledge = Arc::new(KnowledgeBase::new(cfg));
    knowledge.preload();
    Ok(BmpService::new(knowledge, summarizer))
}

fn env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Runs one request line. Malformed requests become error responses, never a crash.
fn handle_line(service: &BmpService, line: &str) -> BmpResponse {
    let request: BmpRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("rejecting malformed request: {}", e);
            return BmpResponse::Error {
                detail: format!("invalid request: {e}"),
            };
        }
    };

    let names: Vec<&str> = request.medications.iter().map(|m| m.name.as_str()).collect();
    let report = service.run(&request.demographics, &names);
    BmpResponse::Ok {
        patient_id: request.patient_id,
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bmp_core::{CoreConfig, TemplateSummarizer};

    fn service(dir: &std::path::Path) -> BmpService {
        let cfg = CoreConfig::new(dir.to_path_buf()).expect("config");
        BmpService::new(
            Arc::new(KnowledgeBase::new(cfg)),
            Arc::new(TemplateSummarizer),
        )
    }

    #[test]
    fn valid_request_returns_report() {
        let dir = tempfile::tempdir().expect("tempdir");
        let svc = service(dir.path());
        let line = r#"{"patient_id":"p1","demographics":{"age":70,"sex":"F"},
            "medications":[{"name":"LISINOPRIL","posology":"10 mg/j"},{"name":"IBUPROFEN"}]}"#;

        let json = serde_json::to_value(handle_line(&svc, line)).expect("serialize");
        assert_eq!(json["status"], "ok");
        assert_eq!(json["patient_id"], "p1");
        assert_eq!(json["problems"].as_array().map(Vec::len), Some(1));
        assert_eq!(json["recommendations"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn missing_age_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let svc = service(dir.path());
        let line = r#"{"patient_id":"p2","demographics":{"sex":"M"},"medications":[]}"#;

        let json = serde_json::to_value(handle_line(&svc, line)).expect("serialize");
        assert_eq!(json["status"], "error");
        assert!(json["detail"].as_str().is_some_and(|d| d.contains("age")));
    }

    #[test]
    fn out_of_range_age_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let svc = service(dir.path());
        let line = r#"{"patient_id":"p3","demographics":{"age":130},"medications":[]}"#;

        let json = serde_json::to_value(handle_line(&svc, line)).expect("serialize");
        assert_eq!(json["status"], "error");
    }
}
