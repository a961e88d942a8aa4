//! Service layer for Tally
//!
//! Services borrow an open book's [`Storage`](crate::storage::Storage) and add
//! validation, tree walks and derived figures on top of the repositories.

pub mod account;
pub mod budget;
pub mod transaction;

pub use account::{AccountNode, AccountService, CreateAccountInput};
pub use budget::{BudgetAmountInput, BudgetService, CreateBudgetInput, DEFAULT_PERIOD_FALLBACK};
pub use transaction::{PostTransactionInput, SplitInput, TransactionFilter, TransactionService};
