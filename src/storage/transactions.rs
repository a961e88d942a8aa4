//! Transaction repository for JSON storage
//!
//! Transactions and their splits share `transactions.json`, stored as two
//! tables linked by `transaction_id`. Because both tables live in one file, a
//! single atomic rename commits a transaction together with its splits.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;
use tracing::warn;

use crate::error::TallyError;
use crate::models::{AccountId, Split, Transaction, TransactionId};

use super::file_io::{read_json, write_json_atomic};

/// Serializable transaction data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct TransactionData {
    transactions: Vec<Transaction>,
    splits: Vec<Split>,
}

/// In-memory tables with an account index
#[derive(Default)]
struct TransactionTable {
    transactions: HashMap<TransactionId, Transaction>,
    /// Index: account_id -> transaction_ids
    by_account: HashMap<AccountId, Vec<TransactionId>>,
}

impl TransactionTable {
    fn insert(&mut self, txn: Transaction) {
        let mut accounts: Vec<AccountId> = txn.splits.iter().map(|s| s.account_id).collect();
        accounts.sort_by_key(|id| *id.as_uuid());
        accounts.dedup();
        for account_id in accounts {
            self.by_account.entry(account_id).or_default().push(txn.id);
        }
        self.transactions.insert(txn.id, txn);
    }

    fn remove(&mut self, id: TransactionId) -> Option<Transaction> {
        let txn = self.transactions.remove(&id)?;
        for split in &txn.splits {
            if let Some(ids) = self.by_account.get_mut(&split.account_id) {
                ids.retain(|&t| t != id);
            }
        }
        Some(txn)
    }

    fn sorted(&self) -> Vec<&Transaction> {
        let mut transactions: Vec<_> = self.transactions.values().collect();
        transactions.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        transactions
    }

    fn to_file_data(&self) -> TransactionData {
        let sorted = self.sorted();
        let splits = sorted
            .iter()
            .flat_map(|t| t.splits.iter().cloned())
            .collect();
        let transactions = sorted
            .into_iter()
            .map(|t| Transaction {
                splits: Vec::new(),
                ..t.clone()
            })
            .collect();
        TransactionData {
            transactions,
            splits,
        }
    }
}

/// Repository for transaction persistence with indexing
pub struct TransactionRepository {
    path: PathBuf,
    data: RwLock<TransactionTable>,
}

impl TransactionRepository {
    /// Create a new transaction repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(TransactionTable::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, TransactionTable>, TallyError> {
        self.data.read().map_err(TallyError::lock_poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, TransactionTable>, TallyError> {
        self.data.write().map_err(TallyError::lock_poisoned)
    }

    /// Load transactions and splits from disk and build indexes
    pub fn load(&self) -> Result<(), TallyError> {
        let file_data: TransactionData = read_json(&self.path)?;

        let mut transactions: HashMap<TransactionId, Transaction> = file_data
            .transactions
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        for split in file_data.splits {
            match transactions.get_mut(&split.transaction_id) {
                Some(txn) => txn.splits.push(split),
                None => warn!(
                    split = %split.id,
                    transaction = %split.transaction_id,
                    "Dropping split whose transaction does not exist"
                ),
            }
        }

        let mut table = self.write()?;
        *table = TransactionTable::default();
        for txn in transactions.into_values() {
            table.insert(txn);
        }

        Ok(())
    }

    /// Save transactions to disk
    pub fn save(&self) -> Result<(), TallyError> {
        let table = self.read()?;
        write_json_atomic(&self.path, &table.to_file_data())
    }

    /// Get a transaction by ID
    pub fn get(&self, id: TransactionId) -> Result<Option<Transaction>, TallyError> {
        Ok(self.read()?.transactions.get(&id).cloned())
    }

    /// Get all transactions, oldest first
    pub fn get_all(&self) -> Result<Vec<Transaction>, TallyError> {
        Ok(self.read()?.sorted().into_iter().cloned().collect())
    }

    /// Transactions with a split on `account_id`, oldest first
    pub fn get_by_account(&self, account_id: AccountId) -> Result<Vec<Transaction>, TallyError> {
        let table = self.read()?;
        let ids = table
            .by_account
            .get(&account_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        let mut transactions: Vec<_> = ids
            .iter()
            .filter_map(|id| table.transactions.get(id).cloned())
            .collect();
        transactions.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        Ok(transactions)
    }

    /// Splits on any of `accounts` whose transaction is dated in `[start, end)`
    pub fn splits_in_range(
        &self,
        accounts: &HashSet<AccountId>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Split>, TallyError> {
        let table = self.read()?;

        let mut seen: HashSet<TransactionId> = HashSet::new();
        let mut splits = Vec::new();
        for account_id in accounts {
            let Some(ids) = table.by_account.get(account_id) else {
                continue;
            };
            for id in ids {
                if !seen.insert(*id) {
                    continue;
                }
                let Some(txn) = table.transactions.get(id) else {
                    continue;
                };
                if txn.date < start || txn.date >= end {
                    continue;
                }
                splits.extend(
                    txn.splits
                        .iter()
                        .filter(|s| accounts.contains(&s.account_id))
                        .cloned(),
                );
            }
        }

        Ok(splits)
    }

    /// Insert a transaction with its splits and persist
    ///
    /// The write lock is held across the insert and the file replace; if the
    /// file cannot be written the insert is undone.
    pub fn insert_and_save(&self, txn: Transaction) -> Result<(), TallyError> {
        let mut table = self.write()?;
        if table.transactions.contains_key(&txn.id) {
            return Err(TallyError::Validation(format!(
                "Transaction {} already exists",
                txn.id
            )));
        }

        let id = txn.id;
        table.insert(txn);

        if let Err(e) = write_json_atomic(&self.path, &table.to_file_data()) {
            table.remove(id);
            return Err(e);
        }

        Ok(())
    }

    /// Remove a transaction with its splits and persist
    pub fn delete_and_save(&self, id: TransactionId) -> Result<Transaction, TallyError> {
        let mut table = self.write()?;
        let removed = table
            .remove(id)
            .ok_or_else(|| TallyError::transaction_not_found(id.to_string()))?;

        if let Err(e) = write_json_atomic(&self.path, &table.to_file_data()) {
            table.insert(removed);
            return Err(e);
        }

        Ok(removed)
    }

    /// Count transactions
    pub fn count(&self) -> Result<usize, TallyError> {
        Ok(self.read()?.transactions.len())
    }

    /// Count splits across all transactions
    pub fn split_count(&self) -> Result<usize, TallyError> {
        Ok(self
            .read()?
            .transactions
            .values()
            .map(|t| t.splits.len())
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Commodity, Money};
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, TransactionRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("transactions.json");
        let repo = TransactionRepository::new(path);
        repo.load().unwrap();
        (temp_dir, repo)
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn transfer(from: AccountId, to: AccountId, cents: i64, day: u32) -> Transaction {
        let mut txn = Transaction::new("Transfer", date(day), Commodity::usd());
        txn.add_split(to, Money::from_minor(cents, Commodity::usd()));
        txn.add_split(from, Money::from_minor(-cents, Commodity::usd()));
        txn
    }

    #[test]
    fn test_insert_and_reload_keeps_split_order() {
        let (temp_dir, repo) = create_test_repo();
        let (a, b) = (AccountId::new(), AccountId::new());

        let txn = transfer(a, b, 5000, 10);
        let id = txn.id;
        repo.insert_and_save(txn).unwrap();

        let repo2 = TransactionRepository::new(temp_dir.path().join("transactions.json"));
        repo2.load().unwrap();

        let loaded = repo2.get(id).unwrap().unwrap();
        assert_eq!(loaded.splits.len(), 2);
        assert_eq!(loaded.splits[0].account_id, b);
        assert_eq!(loaded.splits[1].account_id, a);
        assert_eq!(repo2.split_count().unwrap(), 2);
    }

    #[test]
    fn test_splits_stored_as_separate_table() {
        let (temp_dir, repo) = create_test_repo();
        repo.insert_and_save(transfer(AccountId::new(), AccountId::new(), 100, 1))
            .unwrap();

        let raw = std::fs::read_to_string(temp_dir.path().join("transactions.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["transactions"].as_array().unwrap().len(), 1);
        assert_eq!(value["splits"].as_array().unwrap().len(), 2);
        assert!(value["transactions"][0].get("splits").is_none());
    }

    #[test]
    fn test_get_by_account() {
        let (_temp_dir, repo) = create_test_repo();
        let (checking, groceries, rent) = (AccountId::new(), AccountId::new(), AccountId::new());

        repo.insert_and_save(transfer(checking, groceries, 5000, 15)).unwrap();
        repo.insert_and_save(transfer(checking, rent, 90000, 1)).unwrap();

        let for_checking = repo.get_by_account(checking).unwrap();
        assert_eq!(for_checking.len(), 2);
        assert_eq!(for_checking[0].date, date(1));
        assert_eq!(repo.get_by_account(groceries).unwrap().len(), 1);
    }

    #[test]
    fn test_splits_in_range_is_half_open() {
        let (_temp_dir, repo) = create_test_repo();
        let (checking, groceries) = (AccountId::new(), AccountId::new());

        repo.insert_and_save(transfer(checking, groceries, 100, 1)).unwrap();
        repo.insert_and_save(transfer(checking, groceries, 200, 15)).unwrap();
        repo.insert_and_save(transfer(checking, groceries, 400, 31)).unwrap();

        let accounts: HashSet<_> = [groceries].into_iter().collect();
        let splits = repo.splits_in_range(&accounts, date(1), date(31)).unwrap();
        let total: i64 = splits.iter().map(|s| s.amount.amount()).sum();
        assert_eq!(total, 300);
    }

    #[test]
    fn test_delete() {
        let (_temp_dir, repo) = create_test_repo();
        let a = AccountId::new();
        let txn = transfer(a, AccountId::new(), 100, 1);
        let id = txn.id;
        repo.insert_and_save(txn).unwrap();

        let removed = repo.delete_and_save(id).unwrap();
        assert_eq!(removed.id, id);
        assert_eq!(repo.count().unwrap(), 0);
        assert!(repo.get_by_account(a).unwrap().is_empty());

        assert!(repo.delete_and_save(id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_failed_save_rolls_back() {
        let (temp_dir, repo) = create_test_repo();
        std::fs::create_dir(temp_dir.path().join("transactions.json.tmp")).unwrap();

        let a = AccountId::new();
        assert!(repo
            .insert_and_save(transfer(a, AccountId::new(), 100, 1))
            .is_err());
        assert_eq!(repo.count().unwrap(), 0);
        assert!(repo.get_by_account(a).unwrap().is_empty());
    }

    #[test]
    fn test_orphan_splits_are_dropped_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("transactions.json");

        let orphan = Split::new(
            TransactionId::new(),
            AccountId::new(),
            Money::from_minor(100, Commodity::usd()),
        );
        let data = serde_json::json!({ "transactions": [], "splits": [orphan] });
        std::fs::write(&path, data.to_string()).unwrap();

        let repo = TransactionRepository::new(path);
        repo.load().unwrap();
        assert_eq!(repo.count().unwrap(), 0);
        assert_eq!(repo.split_count().unwrap(), 0);
    }
}
