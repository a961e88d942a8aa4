//! Account repository for JSON storage
//!
//! Holds a book's account tree as an ID-keyed map, persisted to
//! `accounts.json`. Writes replace the whole file while the write lock is
//! held and undo the in-memory change if the file cannot be written.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::TallyError;
use crate::models::{Account, AccountId};

use super::file_io::{read_json, write_json_atomic};

/// Serializable account data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct AccountData {
    accounts: Vec<Account>,
}

type AccountMap = HashMap<AccountId, Account>;

/// Repository for account persistence
pub struct AccountRepository {
    path: PathBuf,
    data: RwLock<AccountMap>,
}

impl AccountRepository {
    /// Create a new account repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, AccountMap>, TallyError> {
        self.data.read().map_err(TallyError::lock_poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, AccountMap>, TallyError> {
        self.data.write().map_err(TallyError::lock_poisoned)
    }

    /// Load accounts from disk
    pub fn load(&self) -> Result<(), TallyError> {
        let file_data: AccountData = read_json(&self.path)?;

        let mut data = self.write()?;
        data.clear();
        for account in file_data.accounts {
            data.insert(account.id, account);
        }

        Ok(())
    }

    fn persist(&self, data: &AccountMap) -> Result<(), TallyError> {
        let mut accounts: Vec<_> = data.values().cloned().collect();
        accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
        write_json_atomic(&self.path, &AccountData { accounts })
    }

    /// Save accounts to disk
    pub fn save(&self) -> Result<(), TallyError> {
        let data = self.read()?;
        self.persist(&data)
    }

    /// Get an account by ID
    pub fn get(&self, id: AccountId) -> Result<Option<Account>, TallyError> {
        Ok(self.read()?.get(&id).cloned())
    }

    /// Get all accounts, ordered by name
    pub fn get_all(&self) -> Result<Vec<Account>, TallyError> {
        let mut accounts: Vec<_> = self.read()?.values().cloned().collect();
        accounts.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(accounts)
    }

    /// The account without a parent
    pub fn root(&self) -> Result<Option<Account>, TallyError> {
        Ok(self.read()?.values().find(|a| a.is_root()).cloned())
    }

    /// Direct children of `parent_id`, ordered by name
    pub fn children(&self, parent_id: AccountId) -> Result<Vec<Account>, TallyError> {
        let mut children: Vec<_> = self
            .read()?
            .values()
            .filter(|a| a.parent_id == Some(parent_id))
            .cloned()
            .collect();
        children.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(children)
    }

    /// All accounts whose short name matches `name` (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> Result<Vec<Account>, TallyError> {
        let name_lower = name.trim().to_lowercase();
        Ok(self
            .read()?
            .values()
            .filter(|a| a.name.to_lowercase() == name_lower)
            .cloned()
            .collect())
    }

    /// Insert or replace an account and persist, undoing the change on failure
    ///
    /// Sibling names are unique (case-insensitive); the check runs under the
    /// same write lock as the insert.
    pub fn upsert_and_save(&self, account: Account) -> Result<(), TallyError> {
        let mut data = self.write()?;
        if let Some(parent_id) = account.parent_id {
            let name_lower = account.name.trim().to_lowercase();
            let taken = data.values().any(|a| {
                a.parent_id == Some(parent_id)
                    && a.id != account.id
                    && a.name.to_lowercase() == name_lower
            });
            if taken {
                return Err(TallyError::DuplicateName {
                    entity_type: "Account",
                    name: account.name,
                });
            }
        }

        let id = account.id;
        let previous = data.insert(id, account);

        if let Err(e) = self.persist(&data) {
            match previous {
                Some(old) => data.insert(id, old),
                None => data.remove(&id),
            };
            return Err(e);
        }

        Ok(())
    }

    /// Check if an account exists
    pub fn exists(&self, id: AccountId) -> Result<bool, TallyError> {
        Ok(self.read()?.contains_key(&id))
    }

    /// Count accounts
    pub fn count(&self) -> Result<usize, TallyError> {
        Ok(self.read()?.len())
    }
}
