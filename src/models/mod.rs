//! Core data models for Tally
//!
//! This module contains the data structures of the bookkeeping domain:
//! commodities and money, the account tree, transactions and their splits,
//! recurrences, budgets and books.

pub mod account;
pub mod book;
pub mod budget;
pub mod commodity;
pub mod ids;
pub mod money;
pub mod recurrence;
pub mod transaction;

pub use account::{Account, AccountType, AccountValidationError, ACCOUNT_NAME_SEPARATOR};
pub use book::Book;
pub use budget::{Budget, BudgetAmount, BudgetProgress, BudgetValidationError, PeriodSpending};
pub use commodity::Commodity;
pub use ids::{AccountId, BookId, BudgetAmountId, BudgetId, SplitId, TransactionId};
pub use money::{Money, MoneyError, Ratio};
pub use recurrence::{PeriodBounds, PeriodType, Recurrence, RecurrenceEnd, RecurrenceError};
pub use transaction::{Split, Transaction, TransactionValidationError};
