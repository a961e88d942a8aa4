//! Budget model
//!
//! A budget projects an amount per period for a set of accounts, on a
//! recurring schedule. Progress is measured against the ledger by the budget
//! service; this module holds the stored shape and the pure calculations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::ids::{AccountId, BudgetAmountId, BudgetId};
use super::money::{Money, MoneyError, Ratio};
use super::recurrence::{Recurrence, RecurrenceError};

/// Projected amount for one account in every period of a budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetAmount {
    pub id: BudgetAmountId,

    /// Owning budget
    pub budget_id: BudgetId,

    pub account_id: AccountId,

    /// Amount projected per period
    pub amount: Money,
}

impl BudgetAmount {
    pub fn new(budget_id: BudgetId, account_id: AccountId, amount: Money) -> Self {
        Self {
            id: BudgetAmountId::new(),
            budget_id,
            account_id,
            amount,
        }
    }
}

/// A recurring budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    /// Unique identifier
    pub id: BudgetId,

    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Schedule the budget's periods follow
    pub recurrence: Recurrence,

    /// Amounts in entry order; persisted as separate rows
    #[serde(skip)]
    pub amounts: Vec<BudgetAmount>,

    /// Explicit period count, overriding the configured fallback
    #[serde(default)]
    pub number_of_periods: Option<u32>,

    /// When the budget was created
    pub created_at: DateTime<Utc>,

    /// When the budget was last modified
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// Create a budget with no amounts
    pub fn new(name: impl Into<String>, recurrence: Recurrence) -> Self {
        let now = Utc::now();
        Self {
            id: BudgetId::new(),
            name: name.into(),
            description: String::new(),
            recurrence,
            amounts: Vec::new(),
            number_of_periods: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a projected amount for `account_id`
    pub fn add_amount(&mut self, account_id: AccountId, amount: Money) {
        self.amounts
            .push(BudgetAmount::new(self.id, account_id, amount));
        self.updated_at = Utc::now();
    }

    /// One amount per distinct account, duplicates summed, in first-appearance order
    pub fn compacted_amounts(&self) -> Result<Vec<BudgetAmount>, MoneyError> {
        let mut compacted: Vec<BudgetAmount> = Vec::new();
        for entry in &self.amounts {
            match compacted
                .iter_mut()
                .find(|c| c.account_id == entry.account_id)
            {
                Some(existing) => existing.amount = existing.amount.try_add(&entry.amount)?,
                None => compacted.push(entry.clone()),
            }
        }
        Ok(compacted)
    }

    /// Projected amount for `account_id`, if the budget covers it
    pub fn amount_for(&self, account_id: AccountId) -> Result<Option<Money>, MoneyError> {
        Ok(self
            .compacted_amounts()?
            .into_iter()
            .find(|a| a.account_id == account_id)
            .map(|a| a.amount))
    }

    /// Total projected per period across all accounts
    pub fn amount_sum(&self) -> Result<Option<Money>, MoneyError> {
        let Some(first) = self.amounts.first() else {
            return Ok(None);
        };
        Money::sum(first.amount.commodity(), self.amounts.iter().map(|a| &a.amount)).map(Some)
    }

    /// Number of distinct accounts covered
    pub fn number_of_accounts(&self) -> usize {
        let mut seen: Vec<AccountId> = Vec::new();
        for entry in &self.amounts {
            if !seen.contains(&entry.account_id) {
                seen.push(entry.account_id);
            }
        }
        seen.len()
    }

    /// Period count: the explicit count if set, else `fallback` passed through
    /// the recurrence's own end rule
    pub fn number_of_periods(&self, fallback: u32) -> u32 {
        self.recurrence
            .number_of_periods(self.number_of_periods.unwrap_or(fallback))
    }

    /// Validate the budget
    pub fn validate(&self) -> Result<(), BudgetValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(BudgetValidationError::EmptyName);
        }

        if name.len() > 100 {
            return Err(BudgetValidationError::NameTooLong(name.len()));
        }

        if self.amounts.is_empty() {
            return Err(BudgetValidationError::NoAmounts);
        }

        if self.number_of_periods == Some(0) {
            return Err(BudgetValidationError::ZeroPeriods);
        }

        self.recurrence.validate()?;

        Ok(())
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.recurrence)
    }
}

/// Validation errors for budgets
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BudgetValidationError {
    #[error("Budget name cannot be empty")]
    EmptyName,

    #[error("Budget name too long ({0} chars, max 100)")]
    NameTooLong(usize),

    #[error("A budget needs at least one amount")]
    NoAmounts,

    #[error("A budget needs at least one period")]
    ZeroPeriods,

    #[error(transparent)]
    Recurrence(#[from] RecurrenceError),
}

/// Spending against a budget for one period
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetProgress {
    pub period: i64,

    /// Amount projected for the period
    pub projected: Money,

    /// Absolute balance of the covered accounts over the period
    pub spent: Money,

    /// `projected - spent`; negative when overspent
    pub left: Money,

    /// `spent / projected`, zero when nothing is projected; not clamped
    pub ratio: Ratio,
}

impl BudgetProgress {
    pub fn is_over_budget(&self) -> bool {
        self.left.is_negative()
    }
}

/// Signed account balance over one budget period, for charting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSpending {
    pub period: i64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub amount: Money,
}
