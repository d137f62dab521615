use crate::eval::EvalSummary;
use crate::matcher::{Matcher, ReplyKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const DEFAULT_REQUIRED_PASS_RATE: f32 = 0.85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    LoadingCatalog,
    Evaluating,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RunError {
    CatalogLoad { message: String },
    PassRateBelowRequired { pass_rate: f32, required: f32 },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::CatalogLoad { message } => write!(f, "catalog load failed: {message}"),
            RunError::PassRateBelowRequired {
                pass_rate,
                required,
            } => write!(f, "pass rate {pass_rate:.4} below required {required:.4}"),
        }
    }
}

/// What the matcher under test looked like once its catalog was fitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherSnapshot {
    pub entries: usize,
    pub categories: usize,
    pub threshold: f32,
}

/// Replies produced by one cascade stage during a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageTally {
    pub replies: usize,
    pub passed: usize,
    /// Lowest similarity among replies that carry a score.
    pub min_score: Option<f32>,
}

/// Lifecycle record of one evaluation run, from catalog load to verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRun {
    pub run_id: String,
    pub cases_path: String,
    pub required_pass_rate: f32,
    pub status: RunStatus,
    pub requested_at: DateTime<Utc>,
    pub catalog_loaded_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub matcher: Option<MatcherSnapshot>,
    pub summary: Option<RunSummary>,
    pub error: Option<RunError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f32,
    /// Keyed by the stage that actually answered, in cascade order.
    pub by_stage: BTreeMap<ReplyKind, StageTally>,
    pub failed_cases: Vec<String>,
}

impl EvaluationRun {
    pub fn start(run_id: String, cases_path: String, required_pass_rate: f32) -> Self {
        Self {
            run_id,
            cases_path,
            required_pass_rate,
            status: RunStatus::LoadingCatalog,
            requested_at: Utc::now(),
            catalog_loaded_at: None,
            completed_at: None,
            matcher: None,
            summary: None,
            error: None,
        }
    }

    pub fn on_catalog_loaded(&mut self, matcher: &Matcher) {
        if self.status != RunStatus::LoadingCatalog {
            return;
        }
        let catalog = matcher.catalog();
        self.status = RunStatus::Evaluating;
        self.catalog_loaded_at = Some(Utc::now());
        self.matcher = Some(MatcherSnapshot {
            entries: catalog.len(),
            categories: catalog.categories().len(),
            threshold: matcher.threshold(),
        });
    }

    pub fn on_catalog_load_failed(&mut self, message: impl Into<String>) {
        if self.status != RunStatus::LoadingCatalog {
            return;
        }
        self.status = RunStatus::Failed;
        self.error = Some(RunError::CatalogLoad {
            message: message.into(),
        });
        self.completed_at = Some(Utc::now());
    }

    pub fn on_eval_completed(&mut self, summary: &EvalSummary) {
        if self.status != RunStatus::Evaluating {
            return;
        }

        let mut by_stage: BTreeMap<ReplyKind, StageTally> = BTreeMap::new();
        for outcome in &summary.outcomes {
            let tally = by_stage.entry(outcome.actual).or_default();
            tally.replies += 1;
            if outcome.passed {
                tally.passed += 1;
            }
            if let Some(score) = outcome.score {
                tally.min_score = Some(tally.min_score.map_or(score, |m| m.min(score)));
            }
        }
        let failed_cases = summary
            .outcomes
            .iter()
            .filter(|o| !o.passed)
            .map(|o| o.case_id.clone())
            .collect();

        self.summary = Some(RunSummary {
            total: summary.total,
            passed: summary.passed,
            failed: summary.failed,
            pass_rate: summary.pass_rate,
            by_stage,
            failed_cases,
        });
        self.completed_at = Some(Utc::now());

        if summary.pass_rate >= self.required_pass_rate {
            self.status = RunStatus::Completed;
            self.error = None;
        } else {
            self.status = RunStatus::Failed;
            self.error = Some(RunError::PassRateBelowRequired {
                pass_rate: summary.pass_rate,
                required: self.required_pass_rate,
            });
        }
    }

    pub fn meets_required_pass_rate(&self) -> bool {
        self.summary
            .as_ref()
            .is_some_and(|s| s.pass_rate >= self.required_pass_rate)
    }

    /// Distance between the weakest catalog answer and the matcher threshold.
    /// A small margin means a slight rewording of that case would fall back.
    pub fn catalog_margin(&self) -> Option<f32> {
        let threshold = self.matcher.as_ref()?.threshold;
        let min_score = self
            .summary
            .as_ref()?
            .by_stage
            .get(&ReplyKind::Catalog)?
            .min_score?;
        Some(min_score - threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::eval::{evaluate_cases, EvalCase};

    fn matcher() -> Matcher {
        let catalog = Catalog::from_parts(
            vec![
                "What are the admission requirements?".into(),
                "What is the fee structure?".into(),
                "Is hostel accommodation available?".into(),
            ],
            vec!["Apply online.".into(), "50,000.".into(), "Yes.".into()],
            vec!["admission".into(), "fee".into(), "hostel".into()],
            vec!["Admissions".into(), "Fees".into(), "Admissions".into()],
        )
        .expect("catalog");
        Matcher::build(catalog)
    }

    fn case(id: &str, question: &str, expected: ReplyKind) -> EvalCase {
        EvalCase {
            case_id: id.into(),
            question: question.into(),
            history: Vec::new(),
            expected,
            expected_index: None,
            min_similarity: None,
        }
    }

    #[test]
    fn records_matcher_shape_on_load() {
        let matcher = matcher();
        let mut run = EvaluationRun::start("r1".into(), "cases.json".into(), 0.85);
        run.on_catalog_loaded(&matcher);

        assert_eq!(run.status, RunStatus::Evaluating);
        let snapshot = run.matcher.as_ref().expect("snapshot");
        assert_eq!(snapshot.entries, 3);
        assert_eq!(snapshot.categories, 2);
        assert_eq!(snapshot.threshold, crate::config::DEFAULT_THRESHOLD);
    }

    #[test]
    fn tallies_replies_by_answering_stage() {
        let matcher = matcher();
        let cases = vec![
            case("greet", "thanks a lot", ReplyKind::Manual),
            case("fee", "What is the fee structure?", ReplyKind::Catalog),
            case("adm", "admission requirements", ReplyKind::Catalog),
            // answered by the catalog, so it counts there as a failure
            case("wrong", "hostel accommodation", ReplyKind::Fallback),
            case("miss", "parking permits", ReplyKind::Fallback),
        ];
        let summary = evaluate_cases(&matcher, &cases);

        let mut run = EvaluationRun::start("r2".into(), "cases.json".into(), 0.5);
        run.on_catalog_loaded(&matcher);
        run.on_eval_completed(&summary);

        assert_eq!(run.status, RunStatus::Completed);
        let result = run.summary.as_ref().expect("summary");
        let stages: Vec<ReplyKind> = result.by_stage.keys().copied().collect();
        assert_eq!(
            stages,
            vec![ReplyKind::Manual, ReplyKind::Catalog, ReplyKind::Fallback]
        );

        let catalog = &result.by_stage[&ReplyKind::Catalog];
        assert_eq!(catalog.replies, 3);
        assert_eq!(catalog.passed, 2);
        assert_eq!(result.by_stage[&ReplyKind::Manual].min_score, None);
        assert_eq!(result.failed_cases, vec!["wrong".to_string()]);

        let margin = run.catalog_margin().expect("margin");
        assert!(margin >= 0.0);
        assert!((catalog.min_score.expect("score") - margin - matcher.threshold()).abs() < 1e-6);
    }

    #[test]
    fn fails_below_required_pass_rate() {
        let matcher = matcher();
        let summary = evaluate_cases(
            &matcher,
            &[
                case("ok", "fee structure", ReplyKind::Catalog),
                case("bad", "parking permits", ReplyKind::Catalog),
            ],
        );
        let mut run = EvaluationRun::start("r3".into(), "cases.json".into(), 0.85);
        run.on_catalog_loaded(&matcher);
        run.on_eval_completed(&summary);

        assert_eq!(run.status, RunStatus::Failed);
        assert!(!run.meets_required_pass_rate());
        assert_eq!(
            run.error,
            Some(RunError::PassRateBelowRequired {
                pass_rate: 0.5,
                required: 0.85
            })
        );
        assert_eq!(
            run.error.as_ref().map(ToString::to_string).as_deref(),
            Some("pass rate 0.5000 below required 0.8500")
        );
    }

    #[test]
    fn load_failure_is_terminal() {
        let matcher = matcher();
        let summary = evaluate_cases(&matcher, &[case("ok", "fee structure", ReplyKind::Catalog)]);
        let mut run = EvaluationRun::start("r4".into(), "cases.json".into(), 0.5);
        run.on_catalog_load_failed("questions resource not found");
        run.on_catalog_loaded(&matcher);
        run.on_eval_completed(&summary);

        assert_eq!(run.status, RunStatus::Failed);
        assert!(run.matcher.is_none());
        assert!(run.summary.is_none());
        assert!(run.catalog_margin().is_none());
        assert!(matches!(run.error, Some(RunError::CatalogLoad { .. })));
    }
}
