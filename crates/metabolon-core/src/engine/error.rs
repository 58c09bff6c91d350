use super::config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("An enzyme with id '{0}' already exists")]
    DuplicateEnzyme(String),

    #[error("A molecule named '{0}' already exists")]
    DuplicateMolecule(String),

    #[error("Enzyme not found: '{0}'")]
    EnzymeNotFound(String),

    #[error("Enzyme '{enzyme_id}' was rejected: {reason}. Suggestion: {suggestion}")]
    InvalidEnzyme {
        enzyme_id: String,
        reason: String,
        suggestion: String,
    },

    #[error("Pathway generation failed: {0}")]
    Generation(String),
}
