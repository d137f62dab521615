pub mod catalog;
pub mod config;
pub mod conversation;
pub mod error;
pub mod eval;
pub mod manual;
pub mod matcher;
pub mod normalize;
pub mod retrieval;
pub mod run;
pub mod session;
pub mod storage;
pub mod tfidf;

pub use catalog::{Catalog, FaqEntry, FaqRecord};
pub use config::{
    CatalogConfig, Config, MatcherConfig, ALREADY_ASKED_MESSAGE, DEFAULT_CATALOG_DIR,
    DEFAULT_THRESHOLD, FALLBACK_MESSAGE,
};
pub use conversation::{Conversation, Role, Turn};
pub use error::{ConfigError, DataLoadError, Resource, StartupError};
pub use eval::{
    evaluate_cases, load_eval_cases, write_report_csv, CaseExpectation, EvalCase, EvalOutcome,
    EvalSummary,
};
pub use manual::{ManualOverrides, OverrideRule};
pub use matcher::{Matcher, Reply, ReplyKind, ReplySource};
pub use retrieval::{cosine_similarity, top_k, top_match};
pub use run::{
    EvaluationRun, MatcherSnapshot, RunError, RunStatus, RunSummary, StageTally,
    DEFAULT_REQUIRED_PASS_RATE,
};
pub use session::Session;
pub use storage::{read_csv_catalog, read_text_sequence, write_text_sequence};
pub use tfidf::TfidfVectorizer;
