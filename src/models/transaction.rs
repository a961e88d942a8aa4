//! Transaction model
//!
//! A transaction is a dated set of splits. Each split posts a signed amount to
//! one account; across the splits of a transaction the amounts of every
//! commodity sum to zero (the double-entry invariant).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::commodity::Commodity;
use super::ids::{AccountId, SplitId, TransactionId};
use super::money::{Money, MoneyError};

/// One posting of a transaction against one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub id: SplitId,

    /// Owning transaction
    pub transaction_id: TransactionId,

    pub account_id: AccountId,

    /// Signed value in the transaction's balancing commodity
    pub amount: Money,

    /// Amount in the account's commodity, when it differs from `amount`'s
    #[serde(default)]
    pub quantity: Option<Money>,

    #[serde(default)]
    pub memo: String,
}

impl Split {
    /// Create a new split
    pub fn new(transaction_id: TransactionId, account_id: AccountId, amount: Money) -> Self {
        Self {
            id: SplitId::new(),
            transaction_id,
            account_id,
            amount,
            quantity: None,
            memo: String::new(),
        }
    }

    /// The amount this split adds to its account, in the account's commodity
    pub fn posting(&self) -> &Money {
        self.quantity.as_ref().unwrap_or(&self.amount)
    }
}

/// A balanced set of splits on one date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,

    #[serde(default)]
    pub description: String,

    /// Transaction date
    pub date: NaiveDate,

    /// Currency the transaction is entered in
    pub commodity: Commodity,

    /// Splits in entry order; persisted as separate rows
    #[serde(skip)]
    pub splits: Vec<Split>,

    #[serde(default)]
    pub notes: String,

    /// When the transaction was created
    pub created_at: DateTime<Utc>,

    /// When the transaction was last modified
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction with no splits
    pub fn new(description: impl Into<String>, date: NaiveDate, commodity: Commodity) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            description: description.into(),
            date,
            commodity,
            splits: Vec::new(),
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a split posting `amount` to `account_id`
    pub fn add_split(&mut self, account_id: AccountId, amount: Money) -> &mut Split {
        let index = self.splits.len();
        self.splits.push(Split::new(self.id, account_id, amount));
        self.updated_at = Utc::now();
        &mut self.splits[index]
    }

    /// Whether any split touches `account_id`
    pub fn involves(&self, account_id: AccountId) -> bool {
        self.splits.iter().any(|s| s.account_id == account_id)
    }

    /// Per-commodity split sums that are not zero, in first-appearance order
    pub fn imbalances(&self) -> Result<Vec<Money>, MoneyError> {
        let mut totals: Vec<Money> = Vec::new();
        for split in &self.splits {
            match totals
                .iter_mut()
                .find(|t| t.commodity() == split.amount.commodity())
            {
                Some(total) => *total = total.try_add(&split.amount)?,
                None => totals.push(split.amount.clone()),
            }
        }
        totals.retain(|t| !t.is_zero());
        Ok(totals)
    }

    /// Check that the transaction has enough splits to balance
    pub fn validate_split_count(&self) -> Result<(), TransactionValidationError> {
        if self.splits.len() < 2 {
            return Err(TransactionValidationError::TooFewSplits(self.splits.len()));
        }
        Ok(())
    }

    /// Validate structure and the double-entry invariant
    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        self.validate_split_count()?;

        if self.description.len() > 500 {
            return Err(TransactionValidationError::DescriptionTooLong(
                self.description.len(),
            ));
        }

        let imbalances = self
            .imbalances()
            .map_err(|_| TransactionValidationError::Overflow)?;
        if let Some(first) = imbalances.into_iter().next() {
            return Err(TransactionValidationError::Unbalanced(first));
        }

        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({} splits)",
            self.date.format("%Y-%m-%d"),
            self.description,
            self.splits.len()
        )
    }
}

/// Validation errors for transactions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionValidationError {
    #[error("A transaction needs at least two splits, found {0}")]
    TooFewSplits(usize),

    #[error("Transaction description too long ({0} chars, max 500)")]
    DescriptionTooLong(usize),

    #[error("Splits do not balance: {}", .0.commodity())]
    Unbalanced(Money),

    #[error("Split total out of range")]
    Overflow,
}
