use crate::conversation::Turn;
use crate::matcher::{Matcher, ReplyKind};
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use std::time::Instant;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalCase {
    pub case_id: String,
    pub question: String,
    /// Earlier user questions in the same session, oldest first.
    #[serde(default)]
    pub history: Vec<String>,
    pub expected: ReplyKind,
    pub expected_index: Option<usize>,
    pub min_similarity: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalOutcome {
    pub case_id: String,
    pub passed: bool,
    pub actual: ReplyKind,
    pub actual_index: Option<usize>,
    pub score: Option<f32>,
    pub latency_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f32,
    pub outcomes: Vec<EvalOutcome>,
}

pub struct CaseExpectation;

impl CaseExpectation {
    pub fn matches(
        expected: ReplyKind,
        expected_index: Option<usize>,
        min_similarity: Option<f32>,
        actual: ReplyKind,
        actual_index: Option<usize>,
        score: Option<f32>,
    ) -> bool {
        if expected != actual {
            return false;
        }

        if let Some(expected) = expected_index {
            if actual_index != Some(expected) {
                return false;
            }
        }

        if let Some(min_sim) = min_similarity {
            if score.unwrap_or(0.0) < min_sim {
                return false;
            }
        }

        true
    }
}

pub fn load_eval_cases(path: &Path) -> Result<Vec<EvalCase>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let cases: Vec<EvalCase> = serde_json::from_reader(file).context("parse eval cases json")?;
    Ok(cases)
}

fn evaluate_case(matcher: &Matcher, case: &EvalCase) -> EvalOutcome {
    let history: Vec<Turn> = case.history.iter().map(Turn::user).collect();

    let start = Instant::now();
    let reply = matcher.reply(&case.question, &history);
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

    let actual = reply.source.kind();
    let actual_index = reply.source.index();
    let score = reply.source.score();
    let passed = CaseExpectation::matches(
        case.expected,
        case.expected_index,
        case.min_similarity,
        actual,
        actual_index,
        score,
    );

    EvalOutcome {
        case_id: case.case_id.clone(),
        passed,
        actual,
        actual_index,
        score,
        latency_ms,
    }
}

/// Replays every case against `matcher`. Outcomes keep the order of `cases`.
pub fn evaluate_cases(matcher: &Matcher, cases: &[EvalCase]) -> EvalSummary {
    let outcomes: Vec<EvalOutcome> = cases
        .par_iter()
        .map(|case| evaluate_case(matcher, case))
        .collect();

    let total = outcomes.len();
    let passed = outcomes.iter().filter(|o| o.passed).count();
    let failed = total.saturating_sub(passed);
    let pass_rate = if total == 0 {
        0.0
    } else {
        passed as f32 / total as f32
    };

    EvalSummary {
        total,
        passed,
        failed,
        pass_rate,
        outcomes,
    }
}

pub fn write_report_csv(path: &Path, summary: &EvalSummary) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;
    for outcome in &summary.outcomes {
        writer.serialize(outcome).context("write report row")?;
    }
    writer.flush().context("flush report")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn matcher() -> Matcher {
        let catalog = Catalog::from_parts(
            vec![
                "What are the admission requirements?".into(),
                "Is hostel accommodation available?".into(),
            ],
            vec!["Apply online before June 30.".into(), "Yes.".into()],
            vec!["admission".into(), "hostel".into()],
            vec!["Admissions".into(), "Hostels".into()],
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
    fn summary_counts_passes_in_case_order() {
        let mut dup = case("dup", "Hostel accommodation", ReplyKind::Duplicate);
        dup.history = vec!["hostel accommodation".into()];
        let mut indexed = case("indexed", "hostel accommodation", ReplyKind::Catalog);
        indexed.expected_index = Some(1);
        let mut wrong = case("wrong", "admission requirements", ReplyKind::Catalog);
        wrong.expected_index = Some(1);

        let cases = vec![
            case("greet", "hello there", ReplyKind::Manual),
            dup,
            indexed,
            wrong,
            case("miss", "parking permits", ReplyKind::Fallback),
        ];
        let summary = evaluate_cases(&matcher(), &cases);

        let ids: Vec<&str> = summary.outcomes.iter().map(|o| o.case_id.as_str()).collect();
        assert_eq!(ids, vec!["greet", "dup", "indexed", "wrong", "miss"]);
        assert_eq!(summary.total, 5);
        assert_eq!(summary.passed, 4);
        assert_eq!(summary.failed, 1);
        assert!(!summary.outcomes[3].passed);
        assert_eq!(summary.outcomes[3].actual_index, Some(0));
        assert!((summary.pass_rate - 0.8).abs() < 1e-6);
    }

    #[test]
    fn min_similarity_is_enforced() {
        assert!(!CaseExpectation::matches(
            ReplyKind::Catalog,
            None,
            Some(0.9),
            ReplyKind::Catalog,
            Some(0),
            Some(0.5),
        ));
        assert!(CaseExpectation::matches(
            ReplyKind::Catalog,
            Some(0),
            Some(0.4),
            ReplyKind::Catalog,
            Some(0),
            Some(0.5),
        ));
    }

    #[test]
    fn cases_parse_with_optional_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cases.json");
        std::fs::write(
            &path,
            r#"[
                {"case_id": "c1", "question": "hostel", "expected": "catalog", "expected_index": 1},
                {"case_id": "c2", "question": "hostel", "history": ["hostel"], "expected": "duplicate"}
            ]"#,
        )
        .expect("write");

        let cases = load_eval_cases(&path).expect("cases");
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].expected_index, Some(1));
        assert!(cases[0].history.is_empty());
        assert_eq!(cases[1].expected, ReplyKind::Duplicate);
    }

    #[test]
    fn report_has_one_row_per_case() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("report.csv");
        let summary = evaluate_cases(&matcher(), &[case("c1", "hostel", ReplyKind::Catalog)]);

        write_report_csv(&path, &summary).expect("report");
        let contents = std::fs::read_to_string(&path).expect("read");
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("case_id,passed,actual"));
        assert!(lines[1].starts_with("c1,"));
    }
}
