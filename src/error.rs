//! Custom error types for Tally
//!
//! This module defines the error hierarchy for the ledger core using thiserror.
//! Model-level errors (money, recurrence, validation) convert into [`TallyError`]
//! so services can propagate them with `?`.

use thiserror::Error;

use crate::models::account::AccountValidationError;
use crate::models::budget::BudgetValidationError;
use crate::models::money::MoneyError;
use crate::models::recurrence::RecurrenceError;
use crate::models::transaction::TransactionValidationError;

/// The main error type for Tally operations
#[derive(Error, Debug)]
pub enum TallyError {
    /// Arithmetic between two different commodities
    #[error("Commodity mismatch: expected {expected}, found {found}")]
    CommodityMismatch { expected: String, found: String },

    /// Division by a zero amount
    #[error("Division by zero")]
    DivisionByZero,

    /// Split amounts of a transaction do not sum to zero
    #[error("Unbalanced transaction: {commodity} splits are off by {imbalance}")]
    UnbalancedTransaction { commodity: String, imbalance: String },

    /// A split or budget amount points at an account that cannot be used
    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    /// Duplicate entity name in the same scope
    #[error("{entity_type} already exists: {name}")]
    DuplicateName {
        entity_type: &'static str,
        name: String,
    },

    /// The active book cannot be deleted
    #[error("Cannot delete the active book: {0}")]
    CannotDeleteActiveBook(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// The underlying storage medium is inaccessible or corrupt
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),
}

impl TallyError {
    /// Create a "not found" error for accounts
    pub fn account_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Account",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for transactions
    pub fn transaction_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Transaction",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for budgets
    pub fn budget_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Budget",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for books
    pub fn book_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Book",
            identifier: identifier.into(),
        }
    }

    /// Wrap a poisoned lock as a storage failure
    pub(crate) fn lock_poisoned(e: impl std::fmt::Display) -> Self {
        Self::StorageUnavailable(format!("Failed to acquire lock: {}", e))
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error was raised by validation before any write
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::CommodityMismatch { .. }
                | Self::UnbalancedTransaction { .. }
                | Self::InvalidAccount(_)
                | Self::DuplicateName { .. }
        )
    }
}

impl From<MoneyError> for TallyError {
    fn from(err: MoneyError) -> Self {
        match err {
            MoneyError::CommodityMismatch { expected, found } => {
                Self::CommodityMismatch { expected, found }
            }
            MoneyError::DivisionByZero => Self::DivisionByZero,
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<RecurrenceError> for TallyError {
    fn from(err: RecurrenceError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<AccountValidationError> for TallyError {
    fn from(err: AccountValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<TransactionValidationError> for TallyError {
    fn from(err: TransactionValidationError) -> Self {
        match err {
            TransactionValidationError::Unbalanced(imbalance) => Self::UnbalancedTransaction {
                commodity: imbalance.commodity().code.clone(),
                imbalance: imbalance.to_string(),
            },
            other => Self::Validation(other.to_string()),
        }
    }
}

impl From<BudgetValidationError> for TallyError {
    fn from(err: BudgetValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<serde_json::Error> for TallyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for Tally operations
pub type TallyResult<T> = Result<T, TallyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TallyError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = TallyError::account_not_found("Expenses:Groceries");
        assert_eq!(err.to_string(), "Account not found: Expenses:Groceries");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unbalanced_error() {
        let err = TallyError::UnbalancedTransaction {
            commodity: "USD".into(),
            imbalance: "$1.00".into(),
        };
        assert_eq!(
            err.to_string(),
            "Unbalanced transaction: USD splits are off by $1.00"
        );
        assert!(err.is_validation());
    }

    #[test]
    fn test_from_money_error() {
        let err: TallyError = MoneyError::CommodityMismatch {
            expected: "USD".into(),
            found: "EUR".into(),
        }
        .into();
        assert!(matches!(err, TallyError::CommodityMismatch { .. }));

        let err: TallyError = MoneyError::DivisionByZero.into();
        assert!(matches!(err, TallyError::DivisionByZero));
    }

    #[test]
    fn test_from_transaction_validation_error() {
        use crate::models::{Commodity, Money};

        let err: TallyError =
            TransactionValidationError::Unbalanced(Money::from_minor(100, Commodity::usd())).into();
        assert_eq!(
            err.to_string(),
            "Unbalanced transaction: USD splits are off by $1.00"
        );

        let err: TallyError = TransactionValidationError::TooFewSplits(1).into();
        assert!(matches!(err, TallyError::Validation(_)));
    }
}
