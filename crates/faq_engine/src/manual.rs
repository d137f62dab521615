//! Hand-authored trigger phrases that bypass similarity matching.
//!
//! A trigger fires when it occurs anywhere in the normalized query, so
//! `"hello"` matches `"oh hello there"`. Rules are tried in table order and
//! the first hit wins.

use serde::{Deserialize, Serialize};

use crate::normalize::normalize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRule {
    pub trigger: String,
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualOverrides {
    rules: Vec<OverrideRule>,
}

const BUILTIN: &[(&str, &str)] = &[
    (
        "hello",
        "👋 Hello! Welcome to UET Taxila AI Assistant. How can I help you today?",
    ),
    (
        "hi",
        "👋 Hi there! Feel free to ask anything about UET Taxila.",
    ),
    (
        "how are you",
        "🤖 I'm functioning perfectly and ready to assist you anytime!",
    ),
    (
        "thanks",
        "😊 You're welcome! Feel free to ask more questions.",
    ),
    (
        "thank you",
        "😊 Happy to help! Let me know if you need anything else.",
    ),
];

impl ManualOverrides {
    /// Triggers are normalized so they can be compared against normalized
    /// queries. Blank triggers would match everything and blank responses
    /// would produce an empty reply, so both are dropped.
    pub fn new(rules: impl IntoIterator<Item = OverrideRule>) -> Self {
        let rules = rules
            .into_iter()
            .filter_map(|rule| {
                let trigger = normalize(&rule.trigger);
                if trigger.is_empty() {
                    tracing::warn!(response = %rule.response, "dropping override with blank trigger");
                    return None;
                }
                if rule.response.trim().is_empty() {
                    tracing::warn!(%trigger, "dropping override with blank response");
                    return None;
                }
                Some(OverrideRule {
                    trigger,
                    response: rule.response,
                })
            })
            .collect();
        Self { rules }
    }

    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Returns the first rule whose trigger is a substring of `normalized_query`.
    pub fn find(&self, normalized_query: &str) -> Option<&OverrideRule> {
        self.rules
            .iter()
            .find(|rule| normalized_query.contains(rule.trigger.as_str()))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}

impl Default for ManualOverrides {
    fn default() -> Self {
        Self::new(BUILTIN.iter().map(|(trigger, response)| OverrideRule {
            trigger: trigger.to_string(),
            response: response.to_string(),
        }))
    }
}
