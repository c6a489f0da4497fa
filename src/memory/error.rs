use crate::config::ConfigError;
use crate::entity::Punctuation;
use crate::language::TermError;
use thiserror::Error;

/// Hard failures only. Reasoning outcomes (duplicates, thresholds, evidential
/// overlap, unexecutable goals) are ordinary return values.
#[derive(Error, Debug)]
pub enum MemoryError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Required term could not be built: {0}")]
    Term(#[from] TermError),
    #[error("{0:?} task carries no truth value")]
    MissingTruth(Punctuation),
    #[error("Collaborator broke its contract: {0}")]
    CollaboratorContract(String),
}
