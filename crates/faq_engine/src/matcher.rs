use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::config::MatcherConfig;
use crate::conversation::{Role, Turn};
use crate::error::ConfigError;
use crate::manual::ManualOverrides;
use crate::normalize::normalize;
use crate::retrieval::{top_k, top_match};
use crate::tfidf::TfidfVectorizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    Manual,
    Duplicate,
    Catalog,
    Fallback,
}

impl ReplyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplyKind::Manual => "manual",
            ReplyKind::Duplicate => "duplicate",
            ReplyKind::Catalog => "catalog",
            ReplyKind::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ReplyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which stage of the cascade produced a reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReplySource {
    Manual { trigger: String },
    Duplicate,
    Catalog { index: usize, score: f32 },
    Fallback { score: f32 },
}

impl ReplySource {
    pub fn kind(&self) -> ReplyKind {
        match self {
            ReplySource::Manual { .. } => ReplyKind::Manual,
            ReplySource::Duplicate => ReplyKind::Duplicate,
            ReplySource::Catalog { .. } => ReplyKind::Catalog,
            ReplySource::Fallback { .. } => ReplyKind::Fallback,
        }
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            ReplySource::Catalog { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn score(&self) -> Option<f32> {
        match self {
            ReplySource::Catalog { score, .. } | ReplySource::Fallback { score } => Some(*score),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

/// Maps user utterances to catalog answers.
///
/// Built once from an immutable [`Catalog`]; every query afterwards is a pure
/// function of the query, the caller's history and this value, so a matcher
/// can be shared between sessions without locking. Reloading means building
/// a new matcher and swapping it in whole.
#[derive(Debug, Clone)]
pub struct Matcher {
    catalog: Catalog,
    vectorizer: TfidfVectorizer,
    question_matrix: Vec<Vec<f32>>,
    overrides: ManualOverrides,
    threshold: f32,
    already_asked: String,
    fallback: String,
}

impl Matcher {
    /// Builds with the default threshold, messages and greeting table.
    pub fn build(catalog: Catalog) -> Self {
        Self::fit(catalog, &MatcherConfig::default(), ManualOverrides::default())
    }

    /// Builds from `config`, rejecting settings under which a reply could be
    /// empty or an all-zero embedding could count as a match.
    pub fn with_config(
        catalog: Catalog,
        config: &MatcherConfig,
        overrides: ManualOverrides,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::fit(catalog, config, overrides))
    }

    fn fit(catalog: Catalog, config: &MatcherConfig, overrides: ManualOverrides) -> Self {
        let vectorizer = TfidfVectorizer::fit(catalog.questions(), config.sublinear_tf);
        let question_matrix: Vec<Vec<f32>> = catalog
            .questions()
            .iter()
            .map(|q| vectorizer.transform(q))
            .collect();

        info!(
            entries = catalog.len(),
            vocabulary = vectorizer.vocabulary_len(),
            overrides = overrides.len(),
            threshold = config.threshold,
            "vector space built"
        );

        Self {
            catalog,
            vectorizer,
            question_matrix,
            overrides,
            threshold: config.threshold,
            already_asked: config.already_asked.clone(),
            fallback: config.fallback.clone(),
        }
    }

    /// Answer text for `query`. Never fails; unmatched input yields the
    /// fallback message.
    pub fn answer(&self, query: &str, history: &[Turn]) -> String {
        self.reply(query, history).text
    }

    pub fn reply(&self, query: &str, history: &[Turn]) -> Reply {
        let q_norm = normalize(query);

        if let Some(rule) = self.overrides.find(&q_norm) {
            debug!(trigger = %rule.trigger, "manual override");
            return Reply {
                text: rule.response.clone(),
                source: ReplySource::Manual {
                    trigger: rule.trigger.clone(),
                },
            };
        }

        let asked_before = history
            .iter()
            .filter(|t| t.role == Role::User)
            .any(|t| normalize(&t.text) == q_norm);
        if asked_before {
            debug!("duplicate question");
            return Reply {
                text: self.already_asked.clone(),
                source: ReplySource::Duplicate,
            };
        }

        match self.best_match(query) {
            Some((index, score)) if score >= self.threshold => {
                debug!(index, score, "catalog match");
                Reply {
                    text: self.catalog.answer(index).to_string(),
                    source: ReplySource::Catalog { index, score },
                }
            }
            best => {
                let score = best.map_or(0.0, |(_, s)| s);
                debug!(score, threshold = self.threshold, "no confident match");
                Reply {
                    text: self.fallback.clone(),
                    source: ReplySource::Fallback { score },
                }
            }
        }
    }

    /// Highest-similarity catalog index and its cosine score, ignoring
    /// overrides, history and threshold. `None` only for an empty catalog.
    pub fn best_match(&self, query: &str) -> Option<(usize, f32)> {
        let embedding = self.vectorizer.transform(query);
        top_match(&embedding, &self.question_matrix)
    }

    pub fn top_k(&self, query: &str, k: usize) -> Vec<(usize, f32)> {
        let embedding = self.vectorizer.transform(query);
        top_k(&embedding, &self.question_matrix, k)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}
