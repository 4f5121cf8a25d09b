//! Error types.
//!
//! Only configuration problems and misuse of the batch API are errors.
//! Divergence is an ordinary run outcome (`RunStatus::Diverged`) and
//! ill-conditioning is recovered locally, so neither appears here.

use thiserror::Error;

/// A configuration value that cannot describe a physical setup.
///
/// Every variant names the offending field so callers can surface an
/// actionable message without further context.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Value must be strictly positive.
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: String, value: f64 },

    /// Value must be zero or positive.
    #[error("{field} must be non-negative, got {value}")]
    Negative { field: String, value: f64 },

    /// Value is NaN or infinite.
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: String, value: f64 },

    /// Value lies outside its admissible interval.
    #[error("{field} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A list that must contain at least one entry is empty.
    #[error("{field} must not be empty")]
    Empty { field: String },

    /// Lower bound is not below the upper bound.
    #[error("{field}[{index}]: lower bound {lower} must be below upper bound {upper}")]
    InvertedBounds {
        field: String,
        index: usize,
        lower: f64,
        upper: f64,
    },

    /// Gain vector length does not match the controller variant.
    #[error("{field}: {controller} expects {expected} gains, got {got}")]
    GainCount {
        field: String,
        controller: &'static str,
        expected: usize,
        got: usize,
    },

    /// Anything else, with a free-form explanation.
    #[error("{field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    /// Create a non-positive error.
    pub fn non_positive(field: impl Into<String>, value: f64) -> Self {
        Self::NonPositive {
            field: field.into(),
            value,
        }
    }

    /// Create a negative-value error.
    pub fn negative(field: impl Into<String>, value: f64) -> Self {
        Self::Negative {
            field: field.into(),
            value,
        }
    }

    /// Create a non-finite error.
    pub fn non_finite(field: impl Into<String>, value: f64) -> Self {
        Self::NonFinite {
            field: field.into(),
            value,
        }
    }

    /// Create an empty-list error.
    pub fn empty(field: impl Into<String>) -> Self {
        Self::Empty {
            field: field.into(),
        }
    }

    /// Create a free-form error.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Field path this error refers to.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::NonPositive { field, .. }
            | Self::Negative { field, .. }
            | Self::NonFinite { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::Empty { field }
            | Self::InvertedBounds { field, .. }
            | Self::GainCount { field, .. }
            | Self::Invalid { field, .. } => field,
        }
    }
}

/// Root error type for the crate.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Configuration rejected before any simulation ran.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Batch inputs have inconsistent lengths.
    #[error("batch shape mismatch: {controllers} controllers, {initial_states} initial states")]
    BatchShape {
        controllers: usize,
        initial_states: usize,
    },

    /// The batch simulator only runs fixed-step integrators.
    #[error("batch simulation requires a fixed-step integrator, got {0}")]
    AdaptiveInBatch(&'static str),

    /// The cost function ranks a known-bad gain vector at or below a known-good one.
    #[error(
        "cost function misconfigured: known-good gains cost {good}, known-bad gains cost {bad}"
    )]
    CostOrdering { good: f64, bad: f64 },
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Finite check shared by every `validate()` in the crate.
pub(crate) fn require_finite(field: &str, value: f64) -> std::result::Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::non_finite(field, value))
    }
}

/// Strictly positive and finite.
pub(crate) fn require_positive(field: &str, value: f64) -> std::result::Result<(), ConfigError> {
    require_finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::non_positive(field, value))
    }
}

/// Zero or positive and finite.
pub(crate) fn require_non_negative(
    field: &str,
    value: f64,
) -> std::result::Result<(), ConfigError> {
    require_finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::negative(field, value))
    }
}

/// Inside `[min, max]` and finite.
pub(crate) fn require_range(
    field: &str,
    value: f64,
    min: f64,
    max: f64,
) -> std::result::Result<(), ConfigError> {
    require_finite(field, value)?;
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field: field.to_string(),
            value,
            min,
            max,
        })
    }
}
