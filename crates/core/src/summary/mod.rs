//! Narrative summary of a medication review.
//!
//! The pipeline only needs free text back, so the language model sits behind the
//! [`Summarizer`] capability. [`OllamaSummarizer`] talks to a local Ollama server;
//! [`TemplateSummarizer`] is deterministic and is used whenever the model is unavailable.

pub mod ollama;

pub use ollama::OllamaSummarizer;

use bmp_types::{Demographics, Substance};

#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    #[error("cannot reach summarizer at {0}")]
    Connection(String),
    #[error("summarizer HTTP error: {0}")]
    Http(String),
    #[error("summarizer returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed summarizer response: {0}")]
    ResponseParsing(String),
    #[error("summarizer returned an empty summary")]
    Empty,
}

/// Produces the narrative part of a medication review.
pub trait Summarizer: Send + Sync {
    fn generate_summary(
        &self,
        demo: &Demographics,
        meds: &[Substance],
        problems: &[String],
    ) -> Result<String, SummaryError>;
}

/// Builds the clinical-pharmacist prompt sent to the language model.
pub fn build_prompt(demo: &Demographics, meds: &[Substance], problems: &[String]) -> String {
    let patient = serde_json::to_string(demo).unwrap_or_default();
    let meds = join(meds.iter().map(Substance::as_str));
    let problems = if problems.is_empty() {
        "Aucun".to_string()
    } else {
        join(problems.iter().map(String::as_str))
    };

    format!(
        "Vous êtes un pharmacien clinicien expert.\n\
         Analysez la liste médicamenteuse et fournissez : \n\
         1. Synthèse du traitement. \n\
         2. Problèmes identifiés. \n\
         3. Recommandations priorisées.\n\n\
         Données patient : {patient}\n\
         Médicaments : {meds}\n\
         Problèmes (règles fixes) : {problems}\n\
         Réponds en français, bullet points."
    )
}

fn join<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items.collect::<Vec<_>>().join(", ")
}

/// Summary assembled from the review data alone. Never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateSummarizer;

impl TemplateSummarizer {
    pub fn summarize(
        &self,
        demo: &Demographics,
        meds: &[Substance],
        problems: &[String],
    ) -> String {
        let treatment = if meds.is_empty() {
            "aucun traitement déclaré".to_string()
        } else {
            format!(
                "{} médicament(s) : {}",
                meds.len(),
                join(meds.iter().map(Substance::as_str))
            )
        };
        let findings = match problems.len() {
            0 => "Aucun problème identifié par les règles.".to_string(),
            n => format!("{n} problème(s) identifié(s) à réévaluer."),
        };

        format!(
            "Synthèse : patient de {} ans (sexe {}), {treatment}. {findings}",
            demo.age(),
            demo.sex()
        )
    }
}

impl Summarizer for TemplateSummarizer {
    fn generate_summary(
        &self,
        demo: &Demographics,
        meds: &[Substance],
        problems: &[String],
    ) -> Result<String, SummaryError> {
        Ok(self.summarize(demo, meds, problems))
    }
}
