use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// One of the four parallel catalog resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Questions,
    Answers,
    Intents,
    Categories,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Questions => "questions",
            Resource::Answers => "answers",
            Resource::Intents => "intents",
            Resource::Categories => "categories",
        };
        f.write_str(name)
    }
}

/// Fatal startup failure: without a catalog there is nothing to answer with.
#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("{resource} resource not found at {}", path.display())]
    Missing { resource: Resource, path: PathBuf },

    #[error("cannot read {resource} resource {}: {source}", path.display())]
    Unreadable {
        resource: Resource,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{resource} resource {} is not a JSON array of strings: {source}", path.display())]
    Malformed {
        resource: Resource,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot import csv catalog {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(
        "catalog resources disagree in length: questions={questions} answers={answers} \
         intents={intents} categories={categories}"
    )]
    LengthMismatch {
        questions: usize,
        answers: usize,
        intents: usize,
        categories: usize,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid TOML in config: {0}")]
    Malformed(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Anything that stops a matcher from being built at startup.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    DataLoad(#[from] DataLoadError),
}
