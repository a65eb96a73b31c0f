use crate::model::ParameterGroup;
use thiserror::Error;

/// Failure to turn a sparse cache description into an address format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// One or more parameter groups carry no usable value
    #[error("insufficient parameters: missing {}", join_groups(.missing))]
    InsufficientInput {
        /// Every group that failed the sufficiency check, in check order
        missing: Vec<ParameterGroup>,
    },

    /// The parameters resolve, but not to a realizable cache
    #[error("inconsistent architecture: {reason}")]
    Inconsistent {
        /// What went wrong during derivation
        reason: String,
    },
}

impl ModelError {
    pub fn inconsistent(reason: impl Into<String>) -> Self {
        Self::Inconsistent {
            reason: reason.into(),
        }
    }
}

fn join_groups(groups: &[ParameterGroup]) -> String {
    groups
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors surfaced by the command line tool.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("invalid size '{input}': expected a positive integer with an optional B/KB/MB/GB/TB suffix")]
    InvalidSize { input: String },

    #[error("invalid address '{input}': expected decimal or 0x-prefixed hex")]
    InvalidAddress { input: String },

    #[error("halfword addressing needs an even word size, got {word_size}")]
    OddHalfword { word_size: u64 },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
