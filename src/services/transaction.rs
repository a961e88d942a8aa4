//! Transaction service
//!
//! Posting and removal of balanced transactions. Every check runs before the
//! repository is touched, so a rejected post leaves the book unchanged.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::audit::EntityType;
use crate::error::{TallyError, TallyResult};
use crate::models::{Account, AccountId, Commodity, Money, Transaction, TransactionId};
use crate::storage::Storage;

/// Service for transaction management
pub struct TransactionService<'a> {
    storage: &'a Storage,
}

/// Options for filtering transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Only transactions with a split on this account
    pub account_id: Option<AccountId>,
    /// Inclusive start date
    pub start_date: Option<NaiveDate>,
    /// Exclusive end date
    pub end_date: Option<NaiveDate>,
    /// Keep only the most recent `limit` transactions
    pub limit: Option<usize>,
}

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    /// Restrict to `[start, end)`
    pub fn date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn matches(&self, txn: &Transaction) -> bool {
        if let Some(account_id) = self.account_id {
            if !txn.involves(account_id) {
                return false;
            }
        }
        if self.start_date.is_some_and(|start| txn.date < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| txn.date >= end) {
            return false;
        }
        true
    }
}

/// One split of a transaction to post
#[derive(Debug, Clone)]
pub struct SplitInput {
    pub account_id: AccountId,
    /// Signed value in the transaction's currency
    pub amount: Money,
    /// Amount in the account's commodity for cross-currency postings
    pub quantity: Option<Money>,
    pub memo: Option<String>,
}

impl SplitInput {
    pub fn new(account_id: AccountId, amount: Money) -> Self {
        Self {
            account_id,
            amount,
            quantity: None,
            memo: None,
        }
    }

    pub fn quantity(mut self, quantity: Money) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// Input for posting a new transaction
#[derive(Debug, Clone)]
pub struct PostTransactionInput {
    pub description: String,
    pub date: NaiveDate,
    /// Defaults to the commodity of the first split's amount
    pub commodity: Option<Commodity>,
    pub splits: Vec<SplitInput>,
    pub notes: Option<String>,
}

impl PostTransactionInput {
    pub fn new(description: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            description: description.into(),
            date,
            commodity: None,
            splits: Vec::new(),
            notes: None,
        }
    }

    pub fn split(mut self, split: SplitInput) -> Self {
        self.splits.push(split);
        self
    }
}

impl<'a> TransactionService<'a> {
    /// Create a new transaction service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Validate and record a transaction
    ///
    /// Checks run in a fixed order: split count, account usability, posting
    /// commodity, then balance.
    pub fn post(&self, input: PostTransactionInput) -> TallyResult<Transaction> {
        let commodity = input
            .commodity
            .or_else(|| input.splits.first().map(|s| s.amount.commodity().clone()))
            .unwrap_or_default();

        let mut txn = Transaction::new(input.description.trim(), input.date, commodity);
        if let Some(notes) = input.notes {
            txn.notes = notes;
        }
        for split in input.splits {
            let added = txn.add_split(split.account_id, split.amount);
            added.quantity = split.quantity;
            if let Some(memo) = split.memo {
                added.memo = memo;
            }
        }

        txn.validate_split_count()?;

        let mut accounts: HashMap<AccountId, Account> = HashMap::new();
        for split in &txn.splits {
            if accounts.contains_key(&split.account_id) {
                continue;
            }
            let account = self.storage.accounts.get(split.account_id)?.ok_or_else(|| {
                TallyError::InvalidAccount(format!("No account {}", split.account_id))
            })?;
            if account.placeholder {
                return Err(TallyError::InvalidAccount(format!(
                    "{} is a placeholder and cannot hold splits",
                    account.name
                )));
            }
            accounts.insert(account.id, account);
        }

        for split in &txn.splits {
            let Some(account) = accounts.get(&split.account_id) else {
                continue;
            };
            let posted = split.posting().commodity();
            if *posted != account.commodity {
                return Err(TallyError::CommodityMismatch {
                    expected: account.commodity.code.clone(),
                    found: posted.code.clone(),
                });
            }
        }

        txn.validate()?;

        self.storage.transactions.insert_and_save(txn.clone())?;

        info!(
            transaction = %txn.id,
            date = %txn.date,
            splits = txn.splits.len(),
            "Posted transaction"
        );
        self.storage.log_create(
            EntityType::Transaction,
            txn.id,
            Some(txn.description.clone()),
            &txn,
        );

        Ok(txn)
    }

    /// Remove a transaction and its splits
    pub fn delete(&self, id: TransactionId) -> TallyResult<Transaction> {
        let removed = self.storage.transactions.delete_and_save(id)?;

        info!(transaction = %removed.id, "Deleted transaction");
        self.storage.log_delete(
            EntityType::Transaction,
            removed.id,
            Some(removed.description.clone()),
            &removed,
        );

        Ok(removed)
    }

    /// Get a transaction by ID
    pub fn get(&self, id: TransactionId) -> TallyResult<Option<Transaction>> {
        self.storage.transactions.get(id)
    }

    /// Find a transaction by full or short ID
    pub fn find(&self, identifier: &str) -> TallyResult<Option<Transaction>> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Ok(None);
        }
        Ok(self
            .storage
            .transactions
            .get_all()?
            .into_iter()
            .find(|t| t.id.matches(identifier)))
    }

    /// List transactions matching a filter, oldest first
    pub fn list(&self, filter: TransactionFilter) -> TallyResult<Vec<Transaction>> {
        let candidates = match filter.account_id {
            Some(account_id) => self.storage.transactions.get_by_account(account_id)?,
            None => self.storage.transactions.get_all()?,
        };

        let mut transactions: Vec<Transaction> =
            candidates.into_iter().filter(|t| filter.matches(t)).collect();

        if let Some(limit) = filter.limit {
            let skip = transactions.len().saturating_sub(limit);
            transactions.drain(..skip);
        }

        debug!(count = transactions.len(), "Listed transactions");
        Ok(transactions)
    }

    /// Transactions with a split on the account, oldest first
    pub fn for_account(&self, account_id: AccountId) -> TallyResult<Vec<Transaction>> {
        self.list(TransactionFilter::new().account(account_id))
    }

    /// Count transactions
    pub fn count(&self) -> TallyResult<usize> {
        self.storage.transactions.count()
    }
}
