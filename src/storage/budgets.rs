//! Budget repository for JSON storage
//!
//! Budgets and their amounts share `budgets.json` as two tables linked by
//! `budget_id`; recurrences are embedded in the budget rows.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

use crate::error::TallyError;
use crate::models::{AccountId, Budget, BudgetAmount, BudgetId};

use super::file_io::{read_json, write_json_atomic};

/// Serializable budget data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct BudgetData {
    budgets: Vec<Budget>,
    budget_amounts: Vec<BudgetAmount>,
}

type BudgetMap = HashMap<BudgetId, Budget>;

fn to_file_data(data: &BudgetMap) -> BudgetData {
    let mut budgets: Vec<&Budget> = data.values().collect();
    budgets.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    BudgetData {
        budget_amounts: budgets
            .iter()
            .flat_map(|b| b.amounts.iter().cloned())
            .collect(),
        budgets: budgets
            .into_iter()
            .map(|b| Budget {
                amounts: Vec::new(),
                ..b.clone()
            })
            .collect(),
    }
}

/// Repository for budget persistence
pub struct BudgetRepository {
    path: PathBuf,
    data: RwLock<BudgetMap>,
}

impl BudgetRepository {
    /// Create a new budget repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BudgetMap>, TallyError> {
        self.data.read().map_err(TallyError::lock_poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BudgetMap>, TallyError> {
        self.data.write().map_err(TallyError::lock_poisoned)
    }

    /// Load budgets and their amounts from disk
    pub fn load(&self) -> Result<(), TallyError> {
        let file_data: BudgetData = read_json(&self.path)?;

        let mut budgets: BudgetMap = file_data
            .budgets
            .into_iter()
            .map(|b| (b.id, b))
            .collect();

        for amount in file_data.budget_amounts {
            match budgets.get_mut(&amount.budget_id) {
                Some(budget) => budget.amounts.push(amount),
                None => warn!(
                    amount = %amount.id,
                    budget = %amount.budget_id,
                    "Dropping budget amount whose budget does not exist"
                ),
            }
        }

        *self.write()? = budgets;
        Ok(())
    }

    /// Save budgets to disk
    pub fn save(&self) -> Result<(), TallyError> {
        let data = self.read()?;
        write_json_atomic(&self.path, &to_file_data(&data))
    }

    /// Get a budget by ID
    pub fn get(&self, id: BudgetId) -> Result<Option<Budget>, TallyError> {
        Ok(self.read()?.get(&id).cloned())
    }

    /// Get all budgets, ordered by name
    pub fn get_all(&self) -> Result<Vec<Budget>, TallyError> {
        let mut budgets: Vec<_> = self.read()?.values().cloned().collect();
        budgets.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(budgets)
    }

    /// Get a budget by name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> Result<Option<Budget>, TallyError> {
        let name_lower = name.trim().to_lowercase();
        Ok(self
            .read()?
            .values()
            .find(|b| b.name.to_lowercase() == name_lower)
            .cloned())
    }

    /// Budgets that project an amount for `account_id`
    pub fn get_by_account(&self, account_id: AccountId) -> Result<Vec<Budget>, TallyError> {
        Ok(self
            .read()?
            .values()
            .filter(|b| b.amounts.iter().any(|a| a.account_id == account_id))
            .cloned()
            .collect())
    }

    /// Insert a budget with its amounts and persist, undoing on failure
    ///
    /// Budget names are unique (case-insensitive) within the book.
    pub fn insert_and_save(&self, budget: Budget) -> Result<(), TallyError> {
        let mut data = self.write()?;
        let id = budget.id;
        if data.contains_key(&id) {
            return Err(TallyError::Validation(format!("Budget {} already exists", id)));
        }
        let name_lower = budget.name.trim().to_lowercase();
        if data.values().any(|b| b.name.to_lowercase() == name_lower) {
            return Err(TallyError::DuplicateName {
                entity_type: "Budget",
                name: budget.name,
            });
        }
        data.insert(id, budget);

        if let Err(e) = write_json_atomic(&self.path, &to_file_data(&data)) {
            data.remove(&id);
            return Err(e);
        }

        Ok(())
    }

    /// Remove a budget with its amounts and persist, undoing on failure
    pub fn delete_and_save(&self, id: BudgetId) -> Result<Budget, TallyError> {
        let mut data = self.write()?;
        let removed = data
            .remove(&id)
            .ok_or_else(|| TallyError::budget_not_found(id.to_string()))?;

        if let Err(e) = write_json_atomic(&self.path, &to_file_data(&data)) {
            data.insert(id, removed);
            return Err(e);
        }

        Ok(removed)
    }

    /// Count budgets
    pub fn count(&self) -> Result<usize, TallyError> {
        Ok(self.read()?.len())
    }
}
