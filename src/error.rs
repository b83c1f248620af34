// src/error.rs

use thiserror::Error;

/// Errors raised by network construction, simulation and analysis.
#[derive(Debug, Error)]
pub enum SimError {
    /// Malformed numeric input (negative std dev, zero days, negative lead time, ...).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A node with this identifier is already part of the network.
    #[error("node {0} already exists")]
    DuplicateNode(String),

    /// The identifier does not name a node in the network.
    #[error("node {0} does not exist")]
    UnknownNode(String),

    /// No directed path connects the two nodes.
    #[error("no path exists between {from} and {to}")]
    NoPath {
        /// Start of the query.
        from: String,
        /// End of the query.
        to: String,
    },

    /// Statistics were requested over too few samples.
    #[error("insufficient samples: need at least {required}, got {actual}")]
    InsufficientSamples {
        /// Minimum number of samples the operation needs.
        required: usize,
        /// Number of samples available.
        actual: usize,
    },

    /// A JSON network or configuration definition could not be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl SimError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        SimError::InvalidParameter(message.into())
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
