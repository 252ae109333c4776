use thiserror::Error;

use crate::types::Strategy;

/// Why a handler could not be registered. The handler is skipped; others are not affected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("{strategy} trigger key must not be empty")]
    EmptyKey { strategy: Strategy },

    /// First registration wins; later ones under the same key are dropped.
    #[error("{strategy} trigger {key:?} is already registered")]
    Duplicate { strategy: Strategy, key: String },

    #[error("command /{command} needs a description")]
    MissingDescription { command: String },

    #[error("invalid command name {command:?}: use 1-32 characters of a-z, 0-9 and _")]
    InvalidCommand { command: String },

    #[error("description of /{command} is longer than {max} characters")]
    DescriptionTooLong { command: String, max: usize },
}

pub type Result<T> = std::result::Result<T, RegistrationError>;
