//! Storage initialization
//!
//! Lays out a fresh book directory: an account tree holding only the root
//! account, and empty transaction and budget tables.

use tracing::debug;

use crate::config::paths::BookPaths;
use crate::error::TallyError;
use crate::models::{Account, Commodity};

use super::accounts::AccountRepository;
use super::budgets::BudgetRepository;
use super::transactions::TransactionRepository;

/// Initialize storage for a new book, returning its root account
///
/// Already-initialized storage is left untouched and its root is returned.
pub fn initialize_book_storage(
    paths: &BookPaths,
    commodity: &Commodity,
) -> Result<Account, TallyError> {
    std::fs::create_dir_all(paths.dir()).map_err(|e| {
        TallyError::StorageUnavailable(format!(
            "Failed to create book directory {}: {}",
            paths.dir().display(),
            e
        ))
    })?;

    let accounts = AccountRepository::new(paths.accounts_file());
    accounts.load()?;
    if let Some(root) = accounts.root()? {
        return Ok(root);
    }

    let root = Account::new_root(commodity.clone());
    accounts.upsert_and_save(root.clone())?;

    if !paths.transactions_file().exists() {
        TransactionRepository::new(paths.transactions_file()).save()?;
    }
    if !paths.budgets_file().exists() {
        BudgetRepository::new(paths.budgets_file()).save()?;
    }

    debug!(dir = %paths.dir().display(), root = %root.id, "Initialized book storage");
    Ok(root)
}

/// Check if a book directory needs initialization
pub fn needs_initialization(paths: &BookPaths) -> bool {
    !paths.is_initialized()
}
