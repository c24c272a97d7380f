use super::{build_prompt, Summarizer, SummaryError};
use bmp_types::{Demographics, Substance};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Summarizer backed by the Ollama `/api/generate` endpoint.
pub struct OllamaSummarizer {
    base_url: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaSummarizer {
    /// Creates a client for the server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self, SummaryError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SummaryError::Http(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn generate(&self, prompt: &str) -> Result<String, SummaryError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                SummaryError::Connection(self.base_url.clone())
            } else if e.is_timeout() {
                SummaryError::Http(format!("request timed out after {}s", self.timeout_secs))
            } else {
                SummaryError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SummaryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| SummaryError::ResponseParsing(e.to_string()))?;

        let summary = parsed.response.trim();
        if summary.is_empty() {
            return Err(SummaryError::Empty);
        }
        Ok(summary.to_string())
    }
}

impl Summarizer for OllamaSummarizer {
    fn generate_summary(
        &self,
        demo: &Demographics,
        meds: &[Substance],
        problems: &[String],
    ) -> Result<String, SummaryError> {
        let prompt = build_prompt(demo, meds, problems);
        tracing::debug!(model = %self.model, "requesting narrative summary");
        self.generate(&prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bmp_types::Sex;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;

    /// Serves a single HTTP request with `status` and `body`, returning the base URL.
    fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr");

        std::thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream);
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).expect("read header");
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap_or(0);
                    }
                }
            }
            let mut request_body = vec![0u8; content_length];
            reader.read_exact(&mut request_body).expect("read body");

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).expect("write response");
        });

        format!("http://{addr}/")
    }

    fn review() -> (Demographics, Vec<Substance>, Vec<String>) {
        (
            Demographics::new(80, Sex::M).expect("valid demographics"),
            vec![Substance::new("WARFARIN")],
            vec![],
        )
    }

    #[test]
    fn returns_trimmed_model_text() {
        let url = serve_once("200 OK", r#"{"response":"  - Réévaluer la warfarine  "}"#);
        let summarizer = OllamaSummarizer::new(&url, "biomistral", 5).expect("client");
        assert!(!summarizer.base_url().ends_with('/'));

        let (demo, meds, problems) = review();
        let summary = summarizer
            .generate_summary(&demo, &meds, &problems)
            .expect("summary");
        assert_eq!(summary, "- Réévaluer la warfarine");
    }

    #[test]
    fn non_success_status_is_reported() {
        let url = serve_once("500 Internal Server Error", r#"{"error":"model not found"}"#);
        let summarizer = OllamaSummarizer::new(&url, "missing", 5).expect("client");

        let (demo, meds, problems) = review();
        let err = summarizer
            .generate_summary(&demo, &meds, &problems)
            .expect_err("server error");
        assert!(matches!(
            err,
            SummaryError::Status { status: 500, ref body } if body.contains("model not found")
        ));
    }

    #[test]
    fn blank_or_malformed_responses_are_errors() {
        let (demo, meds, problems) = review();

        let url = serve_once("200 OK", r#"{"response":"   "}"#);
        let summarizer = OllamaSummarizer::new(&url, "biomistral", 5).expect("client");
        let err = summarizer
            .generate_summary(&demo, &meds, &problems)
            .expect_err("blank summary");
        assert!(matches!(err, SummaryError::Empty));

        let url = serve_once("200 OK", r#"{"unexpected":true}"#);
        let summarizer = OllamaSummarizer::new(&url, "biomistral", 5).expect("client");
        let err = summarizer
            .generate_summary(&demo, &meds, &problems)
            .expect_err("malformed body");
        assert!(matches!(err, SummaryError::ResponseParsing(_)));
    }

    #[test]
    fn unreachable_server_is_a_connection_error() {
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("local addr")
        };
        let summarizer =
            OllamaSummarizer::new(&format!("http://{addr}"), "biomistral", 2).expect("client");

        let (demo, meds, problems) = review();
        let err = summarizer
            .generate_summary(&demo, &meds, &problems)
            .expect_err("nothing listening");
        assert!(matches!(err, SummaryError::Connection(_)), "{err}");
    }
}
