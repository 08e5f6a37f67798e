// ⚠️ Error Types
// Everything the calculator and the store can report back to the UI

use thiserror::Error;

// ============================================================================
// VALIDATION ERRORS
// ============================================================================

/// Rejected user input. The Display text is shown verbatim in the error dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter valid numerical values for weight and height.")]
    NotNumeric,

    #[error("Weight and height must be greater than 0.")]
    NotPositive,
}

// ============================================================================
// STORAGE ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to create table: {0}")]
    Schema(#[source] rusqlite::Error),

    #[error("failed to write measurement: {0}")]
    Write(#[source] rusqlite::Error),

    #[error("failed to read measurements: {0}")]
    Read(#[source] rusqlite::Error),

    /// The database could not be opened at startup
    #[error("database unavailable: {0}")]
    Unavailable(String),

    /// Raised by the in-memory store when writes are switched off
    #[error("store is read-only")]
    ReadOnly,
}

// ============================================================================
// CALCULATION ERRORS
// ============================================================================

/// Outcome of a failed "Calculate BMI" action
#[derive(Debug, Error)]
pub enum CalculateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Could not save measurement: {0}")]
    Storage(#[from] StoreError),
}

impl CalculateError {
    pub fn is_validation(&self) -> bool {
        matches!(self, CalculateError::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::NotNumeric.to_string(),
            "Please enter valid numerical values for weight and height."
        );
        assert_eq!(
            ValidationError::NotPositive.to_string(),
            "Weight and height must be greater than 0."
        );
    }

    #[test]
    fn test_calculate_error_wraps_validation_transparently() {
        let err: CalculateError = ValidationError::NotPositive.into();

        assert!(err.is_validation());
        assert_eq!(err.to_string(), "Weight and height must be greater than 0.");
    }

    #[test]
    fn test_calculate_error_storage_message() {
        let err: CalculateError = StoreError::ReadOnly.into();

        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "Could not save measurement: store is read-only");
    }
}
