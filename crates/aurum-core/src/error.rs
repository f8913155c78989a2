//! # Error Types
//!
//! Domain-specific error types for aurum-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  aurum-core errors (this file)                                      │
//! │  ├── CoreError         - Business rule violations                   │
//! │  ├── ValidationError   - A single field-named violation             │
//! │  └── ValidationErrors  - ALL violations of one operation, together  │
//! │                                                                     │
//! │  aurum-db errors (separate crate)                                   │
//! │  └── DbError           - Storage failures + transactional engines   │
//! │                                                                     │
//! │  Flow: ValidationErrors → CoreError → DbError → client response     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Aggregate-Then-Raise
//! Preconditions are checked together, not fail-fast: a payment that is
//! both too large and past the due date reports BOTH problems in one
//! `ValidationErrors` so the caller can fix their input in one round trip.

use std::fmt;

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// A single field-named validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Decimal input carries more fractional digits than the system stores.
    #[error("{field} has more than {max_places} decimal places")]
    TooPrecise { field: String, max_places: u32 },

    /// Invalid format (bad decimal string, bad UUID, ...).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// A payment would exceed what is still owed on the debt.
    #[error("{field} exceeds the pending amount ({pending})")]
    ExceedsPending { field: String, pending: String },

    /// A payment dated after the debt's due date.
    #[error("{field} is past the debt due date ({due_date})")]
    PastDueDate { field: String, due_date: String },

    /// The debt has no installments left to apply a payment against.
    #[error("{field}: no pending installments remain")]
    NoPendingInstallments { field: String },

    /// A debt reference that the order kind does not allow
    /// (layaway financing is sale-only).
    #[error("{field}: {reason}")]
    InvalidDebtRef { field: String, reason: String },

    /// Derived pending values may never exceed their totals.
    #[error("{field} must not exceed {limit_field}")]
    ExceedsTotal { field: String, limit_field: String },
}

// =============================================================================
// Aggregated Validation Errors
// =============================================================================

/// Every validation failure of a single operation, reported together.
///
/// ## Usage
/// ```rust
/// use aurum_core::error::{ValidationError, ValidationErrors};
///
/// let mut errors = ValidationErrors::new();
/// if true {
///     errors.push(ValidationError::MustBePositive { field: "amount".into() });
/// }
/// assert!(errors.into_result().is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        ValidationErrors { errors: Vec::new() }
    }

    /// Records one violation. Does not short-circuit.
    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Records the error of a failed check, passing values through.
    pub fn check<T>(&mut self, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.errors.push(e);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// `Ok(())` when nothing was recorded, otherwise the full collection.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed: ")?;
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        ValidationErrors { errors: vec![error] }
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// One or more preconditions/invariants failed (field-named).
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// Not enough stock to cover a sale line.
    #[error("Insufficient stock for {item}: available {available}, requested {requested}")]
    InsufficientStock {
        item: String,
        available: i64,
        requested: i64,
    },

    /// The entity's current status does not allow the requested operation.
    ///
    /// ## When This Occurs
    /// - Applying a payment to a debt that is not in process
    /// - Cancelling an already-finalized debt
    #[error("{entity} is {status}, cannot perform operation")]
    InvalidStatus { entity: String, status: String },
}

impl From<ValidationError> for CoreError {
    fn from(error: ValidationError) -> Self {
        CoreError::Validation(error.into())
    }
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            item: "18k ring 4.5g".to_string(),
            available: 2,
            requested: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for 18k ring 4.5g: available 2, requested 3"
        );
    }

    #[test]
    fn test_aggregate_reports_every_violation() {
        let mut errors = ValidationErrors::new();
        errors.push(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
        errors.push(ValidationError::PastDueDate {
            field: "date".to_string(),
            due_date: "2026-01-31".to_string(),
        });

        let err = errors.into_result().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("amount must be positive"));
        assert!(msg.contains("date is past the debt due date"));
    }

    #[test]
    fn test_empty_aggregate_is_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let err: CoreError = ValidationError::Required {
            field: "due_date".to_string(),
        }
        .into();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
