use thiserror::Error;

/// Result alias for `sbmprune`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the estimators and the pruning pipeline.
///
/// Degenerate estimates (a zero density parameter, a single community) are
/// not errors: they surface as `None` so that one bad partition never aborts
/// a whole candidate set.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Input was empty.
    #[error("empty input provided")]
    EmptyInput,

    /// Length mismatch between a per-vertex vector and the graph.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Found length.
        found: usize,
    },

    /// A persistence model was selected without one of the inputs it needs.
    #[error("parameter '{name}' is required for {model} persistence")]
    MissingParameter {
        /// Layer topology that required the parameter.
        model: &'static str,
        /// Parameter name.
        name: &'static str,
    },

    /// Layer topology tag is not one of temporal, multilevel, multiplex.
    #[error("model '{0}' is not temporal, multilevel, or multiplex")]
    UnknownModel(String),

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// An iterative routine did not converge within its iteration limit.
    #[error("did not converge after {iterations} iterations")]
    ConvergenceFailure {
        /// Number of iterations attempted.
        iterations: usize,
    },
}
