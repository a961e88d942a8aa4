//! Storage layer for Tally
//!
//! One [`Storage`] handle per open book. It owns the book's account,
//! transaction and budget repositories (JSON tables with atomic writes) and
//! the book's audit log.

pub mod accounts;
pub mod budgets;
pub mod file_io;
pub mod init;
pub mod transactions;

pub use accounts::AccountRepository;
pub use budgets::BudgetRepository;
pub use file_io::{read_json, write_json_atomic};
pub use init::initialize_book_storage;
pub use transactions::TransactionRepository;

use std::fmt::Display;

use serde::Serialize;
use tracing::debug;

use crate::audit::{AuditEntry, AuditLogger, EntityType};
use crate::config::paths::BookPaths;
use crate::error::{TallyError, TallyResult};
use crate::models::{AccountId, Commodity};

/// Main storage coordinator that provides access to all repositories of a book
pub struct Storage {
    paths: BookPaths,
    root_account_id: AccountId,
    audit: AuditLogger,
    pub accounts: AccountRepository,
    pub transactions: TransactionRepository,
    pub budgets: BudgetRepository,
}

impl Storage {
    /// Open an initialized book directory and load all tables
    pub fn open(paths: BookPaths) -> TallyResult<Self> {
        if !paths.is_initialized() {
            return Err(TallyError::StorageUnavailable(format!(
                "No book storage at {}",
                paths.dir().display()
            )));
        }

        let accounts = AccountRepository::new(paths.accounts_file());
        let transactions = TransactionRepository::new(paths.transactions_file());
        let budgets = BudgetRepository::new(paths.budgets_file());
        accounts.load()?;
        transactions.load()?;
        budgets.load()?;

        let root_account_id = accounts
            .root()?
            .map(|root| root.id)
            .ok_or_else(|| {
                TallyError::StorageUnavailable(format!(
                    "Book at {} has no root account",
                    paths.dir().display()
                ))
            })?;

        debug!(dir = %paths.dir().display(), "Opened book storage");

        Ok(Self {
            audit: AuditLogger::new(paths.audit_log()),
            root_account_id,
            accounts,
            transactions,
            budgets,
            paths,
        })
    }

    /// Initialize a new book directory, then open it
    pub fn initialize(paths: BookPaths, commodity: &Commodity) -> TallyResult<Self> {
        initialize_book_storage(&paths, commodity)?;
        Self::open(paths)
    }

    /// Get the paths of this book
    pub fn paths(&self) -> &BookPaths {
        &self.paths
    }

    /// Root of the book's account tree
    pub fn root_account_id(&self) -> AccountId {
        self.root_account_id
    }

    /// The book's audit log
    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Record a create in the audit log
    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Display,
        entity_name: Option<String>,
        entity: &T,
    ) {
        self.audit.record(&AuditEntry::create(
            entity_type,
            entity_id.to_string(),
            entity_name,
            entity,
        ));
    }

    /// Record an update in the audit log
    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Display,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) {
        self.audit.record(&AuditEntry::update(
            entity_type,
            entity_id.to_string(),
            entity_name,
            before,
            after,
        ));
    }

    /// Record a delete in the audit log
    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Display,
        entity_name: Option<String>,
        entity: &T,
    ) {
        self.audit.record(&AuditEntry::delete(
            entity_type,
            entity_id.to_string(),
            entity_name,
            entity,
        ));
    }
}
