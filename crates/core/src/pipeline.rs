//! BMP (bilan de médication partagé) pipeline.
//!
//! [`BmpService`] composes the knowledge base and the summarizer into one review:
//! 1. normalize the medication names
//! 2. detect interactions and evaluate criteria; problems are interactions then STOPP hits
//! 3. flag a high anticholinergic burden
//! 4. recommendations are START hits, plus a review note when interactions were found
//! 5. prepend the narrative summary
//!
//! A summarizer failure never fails the review: the template summary is used instead.

use crate::constants::{BURDEN_ALERT_THRESHOLD, INTERACTION_REVIEW_NOTE};
use crate::criteria::CriteriaFindings;
use crate::knowledge::KnowledgeBase;
use crate::normalization;
use crate::summary::{Summarizer, TemplateSummarizer};
use bmp_types::{Demographics, Substance};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Outcome of a medication review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BmpReport {
    pub problems: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Medication review service.
///
/// Cheap to clone; clones share the knowledge base and summarizer.
#[derive(Clone)]
pub struct BmpService {
    knowledge: Arc<KnowledgeBase>,
    summarizer: Arc<dyn Summarizer>,
}

impl BmpService {
    pub fn new(knowledge: Arc<KnowledgeBase>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            knowledge,
            summarizer,
        }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn normalize(&self, name: &str) -> Substance {
        normalization::normalize(name, self.knowledge.reference())
    }

    pub fn normalize_all<S: AsRef<str>>(&self, names: &[S]) -> Vec<Substance> {
        normalization::normalize_all(names, self.knowledge.reference())
    }

    pub fn detect_interactions<S: AsRef<str>>(&self, meds: &[S]) -> Vec<String> {
        self.knowledge.catalog().detect(meds)
    }

    pub fn evaluate_rules<S: AsRef<str>>(
        &self,
        demo: &Demographics,
        meds: &[S],
    ) -> CriteriaFindings {
        self.knowledge.registry().evaluate(demo, meds)
    }

    pub fn compute_burden_score<S: AsRef<str>>(&self, meds: &[S]) -> u32 {
        self.knowledge.burden().compute(meds)
    }

    /// Runs a full review of `names` for the patient `demo`.
    pub fn run<S: AsRef<str>>(&self, demo: &Demographics, names: &[S]) -> BmpReport {
        let meds = self.normalize_all(names);

        let interactions = self.detect_interactions(&meds);
        let CriteriaFindings { stops, starts } = self.evaluate_rules(demo, &meds);
        let found_interactions = !interactions.is_empty();

        let mut problems = interactions;
        problems.extend(stops);

        let burden = self.compute_burden_score(&meds);
        if burden >= BURDEN_ALERT_THRESHOLD {
            problems.push(format!(
                "Charge anticholinergique élevée : score {burden} (CIA/ACB ≥3)"
            ));
        }

        let mut recommendations = starts;
        if found_interactions {
            recommendations.push(INTERACTION_REVIEW_NOTE.to_string());
        }

        let summary = match self.summarizer.generate_summary(demo, &meds, &problems) {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!("summarizer failed, using template summary: {}", e);
                TemplateSummarizer.summarize(demo, &meds, &problems)
            }
        };
        recommendations.insert(0, summary);

        tracing::info!(
            medications = meds.len(),
            problems = problems.len(),
            recommendations = recommendations.len(),
            burden,
            "medication review complete"
        );

        BmpReport {
            problems,
            recommendations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anticholinergic::BurdenTable;
    use crate::config::CoreConfig;
    use crate::criteria::{Criterion, CriterionRegistry, Matcher};
    use crate::interactions::InteractionCatalog;
    use crate::reference::NoReference;
    use crate::summary::SummaryError;
    use bmp_types::{Phase, Sex};

    struct Fixed;

    impl Summarizer for Fixed {
        fn generate_summary(
            &self,
            _demo: &Demographics,
            meds: &[Substance],
            problems: &[String],
        ) -> Result<String, SummaryError> {
            Ok(format!("{} meds, {} problems", meds.len(), problems.len()))
        }
    }

    struct Unreachable;

    impl Summarizer for Unreachable {
        fn generate_summary(
            &self,
            _demo: &Demographics,
            _meds: &[Substance],
            _problems: &[String],
        ) -> Result<String, SummaryError> {
            Err(SummaryError::Connection("http://localhost:11434".into()))
        }
    }

    fn service(summarizer: Arc<dyn Summarizer>) -> BmpService {
        let cfg = CoreConfig::new("unused".into()).expect("config");
        let registry = CriterionRegistry::with_criteria([Criterion::new(
            "S1",
            "Statine en prévention secondaire",
            Phase::Start,
            Matcher::any_of(["CLOPIDOGREL"]),
        )]);
        let knowledge = KnowledgeBase::new(cfg)
            .with_reference(Box::new(NoReference))
            .with_catalog(InteractionCatalog::builtin())
            .with_registry(registry)
            .with_burden(BurdenTable::from_scores([
                (Substance::new("DIPHENHYDRAMINE"), 3),
                (Substance::new("OXYBUTYNIN"), 3),
                (Substance::new("PAROXETINE"), 1),
            ]));
        BmpService::new(Arc::new(knowledge), summarizer)
    }

    fn patient(age: u32) -> Demographics {
        Demographics::new(age, Sex::F).expect("valid demographics")
    }

    #[test]
    fn brands_are_normalized_before_detection() {
        let svc = service(Arc::new(Fixed));
        let report = svc.run(&patient(50), &["Zestril", "Advil"]);

        assert_eq!(report.problems.len(), 1);
        assert!(report.problems[0].contains("IEC"));
        assert_eq!(
            report.recommendations,
            vec!["2 meds, 1 problems".to_string(), INTERACTION_REVIEW_NOTE.to_string()]
        );
    }

    #[test]
    fn full_review_orders_sections() {
        let svc = service(Arc::new(Fixed));
        let report = svc.run(
            &patient(70),
            &["lisinopril", "ibuprofene", "diphenhydramine", "clopidogrel"],
        );

        assert_eq!(
            report.problems,
            vec![
                InteractionCatalog::builtin()
                    .get("LISINOPRIL", "IBUPROFEN")
                    .expect("built-in pair")
                    .to_string(),
                "Anticholinergic chez >65 ans".to_string(),
                "Charge anticholinergique élevée : score 3 (CIA/ACB ≥3)".to_string(),
            ]
        );
        assert_eq!(
            report.recommendations,
            vec![
                "4 meds, 3 problems".to_string(),
                "Statine en prévention secondaire".to_string(),
                INTERACTION_REVIEW_NOTE.to_string(),
            ]
        );
    }

    #[test]
    fn burden_below_threshold_is_not_reported() {
        let svc = service(Arc::new(Fixed));
        assert_eq!(svc.compute_burden_score(&["paroxetine", "PAROXETINE"]), 2);
        let report = svc.run(&patient(40), &["paroxetine", "paroxetine"]);
        assert!(report.problems.is_empty());
        assert_eq!(report.recommendations, vec!["2 meds, 0 problems".to_string()]);
    }

    #[test]
    fn summarizer_failure_falls_back_to_template() {
        let svc = service(Arc::new(Unreachable));
        let demo = patient(70);
        let report = svc.run(&demo, &["oxybutynin"]);

        let meds = vec![Substance::new("OXYBUTYNIN")];
        let expected = TemplateSummarizer.summarize(&demo, &meds, &report.problems);
        assert_eq!(report.recommendations, vec![expected]);
        assert_eq!(report.problems.len(), 2);
    }

    #[test]
    fn review_is_deterministic_and_order_independent() {
        let svc = service(Arc::new(TemplateSummarizer));
        let demo = patient(80);
        let meds = ["WARFARIN", "IBUPROFEN", "MORPHINE", "DIAZEPAM"];
        let first = svc.run(&demo, &meds);
        assert_eq!(first, svc.run(&demo, &meds));

        let mut reversed = meds;
        reversed.reverse();
        let second = svc.run(&demo, &reversed);
        let as_set = |v: &[String]| v.iter().cloned().collect::<std::collections::HashSet<_>>();
        assert_eq!(as_set(&first.problems), as_set(&second.problems));
    }

    #[test]
    fn report_round_trips_through_json() {
        let report = BmpReport {
            problems: vec!["p".into()],
            recommendations: vec!["r".into()],
        };
        let json = serde_json::to_string(&report).expect("serialize");
        assert_eq!(json, r#"{"problems":["p"],"recommendations":["r"]}"#);
    }
}
