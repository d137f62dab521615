use crate::conversation::{Conversation, Turn};
use crate::matcher::Matcher;

/// Per-user chat state. The matcher never sees this directly, only the
/// turns passed to [`Matcher::answer`].
#[derive(Debug, Clone, Default)]
pub struct Session {
    history: Conversation,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `input` against the history so far, then records both turns.
    /// Blank input is ignored and returns `None`.
    pub fn ask(&mut self, matcher: &Matcher, input: &str) -> Option<String> {
        let question = input.trim();
        if question.is_empty() {
            return None;
        }

        let reply = matcher.answer(question, self.history.turns());
        self.history.push(Turn::user(question));
        self.history.push(Turn::assistant(reply.clone()));
        Some(reply)
    }

    pub fn history(&self) -> &Conversation {
        &self.history
    }

    pub fn reset(&mut self) {
        self.history = Conversation::new();
    }
}
