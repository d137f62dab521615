use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::CatalogConfig;
use crate::error::{DataLoadError, Resource};
use crate::storage::{read_text_sequence, write_text_sequence};

/// Borrowed view of one catalog row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FaqEntry<'a> {
    pub question: &'a str,
    pub answer: &'a str,
    pub intent: &'a str,
    pub category: &'a str,
}

/// Owned catalog row, used when importing rows from other formats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqRecord {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub category: String,
}

/// Immutable FAQ catalog held as four parallel sequences.
///
/// Index `i` addresses the same logical entry in every sequence. There is no
/// way to mutate a catalog once built.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    questions: Vec<String>,
    answers: Vec<String>,
    intents: Vec<String>,
    categories: Vec<String>,
}

impl Catalog {
    /// Reads the four resources named by `config`.
    pub fn load(config: &CatalogConfig) -> Result<Self, DataLoadError> {
        let dir = config.dir.as_path();
        let questions = read_text_sequence(Resource::Questions, &dir.join(&config.questions))?;
        let answers = read_text_sequence(Resource::Answers, &dir.join(&config.answers))?;
        let intents = read_text_sequence(Resource::Intents, &dir.join(&config.intents))?;
        let categories = read_text_sequence(Resource::Categories, &dir.join(&config.categories))?;

        let catalog = Self::from_parts(questions, answers, intents, categories)?;
        info!(
            entries = catalog.len(),
            dir = %dir.display(),
            "faq catalog loaded"
        );
        Ok(catalog)
    }

    pub fn from_parts(
        questions: Vec<String>,
        answers: Vec<String>,
        intents: Vec<String>,
        categories: Vec<String>,
    ) -> Result<Self, DataLoadError> {
        let n = questions.len();
        if answers.len() != n || intents.len() != n || categories.len() != n {
            return Err(DataLoadError::LengthMismatch {
                questions: n,
                answers: answers.len(),
                intents: intents.len(),
                categories: categories.len(),
            });
        }

        Ok(Self {
            questions,
            answers,
            intents,
            categories,
        })
    }

    pub fn from_records(records: Vec<FaqRecord>) -> Self {
        let mut catalog = Self::default();
        for r in records {
            catalog.questions.push(r.question);
            catalog.answers.push(r.answer);
            catalog.intents.push(r.intent);
            catalog.categories.push(r.category);
        }
        catalog
    }

    /// Writes the four resources into `dir` with the file names from `config`.
    pub fn save(&self, config: &CatalogConfig) -> anyhow::Result<()> {
        let dir = config.dir.as_path();
        std::fs::create_dir_all(dir)?;
        write_text_sequence(&dir.join(&config.questions), &self.questions)?;
        write_text_sequence(&dir.join(&config.answers), &self.answers)?;
        write_text_sequence(&dir.join(&config.intents), &self.intents)?;
        write_text_sequence(&dir.join(&config.categories), &self.categories)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// # Panics
    ///
    /// Panics if `i >= self.len()`. Use [`Catalog::try_get`] for untrusted indices.
    pub fn get(&self, i: usize) -> FaqEntry<'_> {
        assert!(
            i < self.len(),
            "catalog index {i} out of range (len {})",
            self.len()
        );
        self.entry(i)
    }

    pub fn try_get(&self, i: usize) -> Option<FaqEntry<'_>> {
        (i < self.len()).then(|| self.entry(i))
    }

    fn entry(&self, i: usize) -> FaqEntry<'_> {
        FaqEntry {
            question: &self.questions[i],
            answer: &self.answers[i],
            intent: &self.intents[i],
            category: &self.categories[i],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = FaqEntry<'_>> + '_ {
        (0..self.len()).map(|i| self.entry(i))
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    pub fn answer(&self, i: usize) -> &str {
        &self.answers[i]
    }

    /// Distinct category labels, iterated in lexicographic order.
    pub fn categories(&self) -> BTreeSet<&str> {
        self.categories.iter().map(String::as_str).collect()
    }

    pub fn category_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for c in &self.categories {
            *counts.entry(c.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Indices of the entries labelled `category`, in catalog order.
    pub fn indices_in_category(&self, category: &str) -> Vec<usize> {
        self.categories
            .iter()
            .enumerate()
            .filter(|(_, c)| c.as_str() == category)
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> Catalog {
        Catalog::from_parts(
            strings(&["What is the fee?", "Is there a hostel?", "When is admission?"]),
            strings(&["Fee is 100.", "Yes.", "In June."]),
            strings(&["fee", "hostel", "admission"]),
            strings(&["Fees", "Hostels", "Admissions"]),
        )
        .expect("catalog")
    }

    #[test]
    fn from_parts_rejects_unequal_lengths() {
        let err = Catalog::from_parts(
            strings(&["q1", "q2"]),
            strings(&["a1"]),
            strings(&["i1", "i2"]),
            strings(&["c1", "c2"]),
        )
        .unwrap_err();

        match err {
            DataLoadError::LengthMismatch {
                questions, answers, ..
            } => {
                assert_eq!(questions, 2);
                assert_eq!(answers, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn get_returns_parallel_fields() {
        let catalog = sample();
        let entry = catalog.get(1);

        assert_eq!(entry.question, "Is there a hostel?");
        assert_eq!(entry.answer, "Yes.");
        assert_eq!(entry.intent, "hostel");
        assert_eq!(entry.category, "Hostels");
        assert!(catalog.try_get(3).is_none());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn get_panics_out_of_range() {
        sample().get(3);
    }

    #[test]
    fn categories_are_distinct_and_sorted() {
        let mut catalog = sample();
        catalog.questions.push("Another fee question".into());
        catalog.answers.push("See office.".into());
        catalog.intents.push("fee".into());
        catalog.categories.push("Fees".into());

        let cats: Vec<&str> = catalog.categories().into_iter().collect();
        assert_eq!(cats, vec!["Admissions", "Fees", "Hostels"]);
        assert_eq!(catalog.category_counts().get("Fees"), Some(&2));
        assert_eq!(catalog.indices_in_category("Fees"), vec![0, 3]);
        assert!(catalog.indices_in_category("Sports").is_empty());
    }

    #[test]
    fn save_then_load_preserves_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = CatalogConfig {
            dir: dir.path().to_path_buf(),
            ..CatalogConfig::default()
        };
        let catalog = sample();
        catalog.save(&config).expect("save");

        let loaded = Catalog::load(&config).expect("load");
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.questions(), catalog.questions());
        assert_eq!(loaded.get(2).category, "Admissions");
    }

    #[test]
    fn load_reports_missing_resource() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Catalog::load(&CatalogConfig {
            dir: dir.path().to_path_buf(),
            ..CatalogConfig::default()
        })
        .unwrap_err();

        assert!(matches!(
            err,
            DataLoadError::Missing {
                resource: Resource::Questions,
                ..
            }
        ));
    }
}
