/// Errors raised by roof geometry and layout inputs.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("{0} is required")]
    MissingDimension(&'static str),

    #[error("{field} must be a finite number, got {value:?}")]
    InvalidDimension { field: &'static str, value: String },

    #[error("{field} must be positive and finite, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("panel gap must be non-negative and finite, got {0}")]
    NegativeGap(f64),

    #[error("invalid grid size {0:?}, expected e.g. \"200x200 pixels\"")]
    InvalidGridSize(String),

    #[error("invalid grid descriptor: {0}")]
    InvalidGrid(String),
}

pub type Result<T> = std::result::Result<T, LayoutError>;

/// Reject zero, negative, NaN and infinite values for a named quantity.
pub(crate) fn ensure_positive(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(LayoutError::NonPositive { field, value })
    }
}
