use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::catalog::Catalog;
use crate::error::{ConfigError, StartupError};
use crate::manual::{ManualOverrides, OverrideRule};
use crate::matcher::Matcher;

pub const DEFAULT_THRESHOLD: f32 = 0.35;
pub const DEFAULT_CATALOG_DIR: &str = "data";

pub const ALREADY_ASKED_MESSAGE: &str =
    "⚠️ You already asked this question. Please check the chat history below.";
pub const FALLBACK_MESSAGE: &str = "❌ Sorry, I don't have an answer for that specific question. \
     Please try rephrasing or ask about admissions, programs, scholarships, hostels, or fee structure.";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub matcher: MatcherConfig,
    /// `None` selects the built-in greeting table.
    pub overrides: Option<Vec<OverrideRule>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub dir: PathBuf,
    pub questions: PathBuf,
    pub answers: PathBuf,
    pub intents: PathBuf,
    pub categories: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_CATALOG_DIR),
            questions: PathBuf::from("faq_questions.json"),
            answers: PathBuf::from("faq_answers.json"),
            intents: PathBuf::from("faq_intents.json"),
            categories: PathBuf::from("faq_categories.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Minimum cosine similarity (inclusive) for a catalog answer.
    pub threshold: f32,
    pub sublinear_tf: bool,
    pub already_asked: String,
    pub fallback: String,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            sublinear_tf: true,
            already_asked: ALREADY_ASKED_MESSAGE.to_string(),
            fallback: FALLBACK_MESSAGE.to_string(),
        }
    }
}

impl MatcherConfig {
    /// Every reply the matcher can produce must be non-empty, and an all-zero
    /// embedding must never clear the threshold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = self.threshold;
        if !(t > 0.0 && t <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "matcher.threshold must be in (0, 1], got {t}"
            )));
        }
        if self.fallback.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "matcher.fallback must not be empty".to_string(),
            ));
        }
        if self.already_asked.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "matcher.already_asked must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.matcher.validate()?;
        if let Some(rules) = &self.overrides {
            for (i, rule) in rules.iter().enumerate() {
                if rule.trigger.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!("overrides[{i}]: empty trigger")));
                }
                if rule.response.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "overrides[{i}] ({}): empty response",
                        rule.trigger
                    )));
                }
            }
        }
        Ok(())
    }

    /// Validates, loads the catalog, fits the vector space and installs the
    /// override table.
    pub fn build_matcher(&self) -> Result<Matcher, StartupError> {
        self.validate()?;
        let catalog = Catalog::load(&self.catalog)?;
        let overrides = match &self.overrides {
            Some(rules) => ManualOverrides::new(rules.iter().cloned()),
            None => ManualOverrides::default(),
        };
        Ok(Matcher::with_config(catalog, &self.matcher, overrides)?)
    }
}
