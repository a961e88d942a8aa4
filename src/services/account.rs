//! Account service
//!
//! Business logic for the account tree: creation and reparenting with their
//! naming and shape rules, lookups, full names, and period balances.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::audit::EntityType;
use crate::error::{TallyError, TallyResult};
use crate::models::{
    Account, AccountId, AccountType, Commodity, Money, Transaction, ACCOUNT_NAME_SEPARATOR,
};
use crate::storage::Storage;

/// Service for account management
pub struct AccountService<'a> {
    storage: &'a Storage,
}

/// Input for creating a new account
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    pub name: String,
    pub account_type: AccountType,
    /// Defaults to the parent's commodity
    pub commodity: Option<Commodity>,
    /// Defaults to the book's root account
    pub parent_id: Option<AccountId>,
    pub placeholder: bool,
    pub description: Option<String>,
}

impl CreateAccountInput {
    pub fn new(name: impl Into<String>, account_type: AccountType) -> Self {
        Self {
            name: name.into(),
            account_type,
            commodity: None,
            parent_id: None,
            placeholder: false,
            description: None,
        }
    }

    pub fn parent(mut self, parent_id: AccountId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn commodity(mut self, commodity: Commodity) -> Self {
        self.commodity = Some(commodity);
        self
    }

    pub fn placeholder(mut self) -> Self {
        self.placeholder = true;
        self
    }
}

/// An account with its position in the tree
#[derive(Debug, Clone)]
pub struct AccountNode {
    pub account: Account,
    pub full_name: String,
    /// Distance from the root's children (which are at depth 0)
    pub depth: usize,
}

impl<'a> AccountService<'a> {
    /// Create a new account service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a new account
    pub fn create(&self, input: CreateAccountInput) -> TallyResult<Account> {
        if input.account_type == AccountType::Root {
            return Err(TallyError::Validation(
                "Root accounts are created with the book".into(),
            ));
        }

        let name = input.name.trim();
        let parent_id = input
            .parent_id
            .unwrap_or_else(|| self.storage.root_account_id());
        let parent = self.get_required(parent_id)?;

        let commodity = input.commodity.unwrap_or_else(|| parent.commodity.clone());
        let mut account = Account::new(name, input.account_type, commodity, parent.id);
        account.placeholder = input.placeholder;
        if let Some(description) = input.description {
            account.description = description;
        }
        account.validate()?;

        let full_name = self.child_full_name(parent.id, &account.name)?;
        self.storage.accounts.upsert_and_save(account.clone())?;

        info!(account = %account.id, name = %full_name, "Created account");
        self.storage
            .log_create(EntityType::Account, account.id, Some(full_name), &account);

        Ok(account)
    }

    /// Move an account (with its subtree) under a new parent
    pub fn reparent(&self, id: AccountId, new_parent_id: AccountId) -> TallyResult<Account> {
        let account = self.get_required(id)?;
        if account.is_root() {
            return Err(TallyError::InvalidAccount(
                "The root account cannot be moved".into(),
            ));
        }

        let new_parent = self.get_required(new_parent_id)?;
        if new_parent.id == account.id || self.is_descendant_of(new_parent.id, account.id)? {
            return Err(TallyError::InvalidAccount(format!(
                "Moving {} under {} would create a cycle",
                account.name, new_parent.name
            )));
        }

        if account.parent_id == Some(new_parent.id) {
            return Ok(account);
        }

        let full_name = self.child_full_name(new_parent.id, &account.name)?;
        let before = account.clone();
        let mut moved = account;
        moved.set_parent(new_parent.id);
        self.storage.accounts.upsert_and_save(moved.clone())?;

        info!(account = %moved.id, name = %full_name, "Moved account");
        self.storage.log_update(
            EntityType::Account,
            moved.id,
            Some(full_name),
            &before,
            &moved,
        );

        Ok(moved)
    }

    /// Get an account by ID
    pub fn get(&self, id: AccountId) -> TallyResult<Option<Account>> {
        self.storage.accounts.get(id)
    }

    /// Get an account by ID, failing with `NotFound`
    pub fn get_required(&self, id: AccountId) -> TallyResult<Account> {
        self.storage
            .accounts
            .get(id)?
            .ok_or_else(|| TallyError::account_not_found(id.to_string()))
    }

    /// Get all accounts
    pub fn list(&self) -> TallyResult<Vec<Account>> {
        self.storage.accounts.get_all()
    }

    /// Direct children of an account
    pub fn children(&self, id: AccountId) -> TallyResult<Vec<Account>> {
        self.storage.accounts.children(id)
    }

    /// Every account below `id`, breadth first
    pub fn descendants(&self, id: AccountId) -> TallyResult<Vec<Account>> {
        let by_parent = self.children_index()?;

        let mut result = Vec::new();
        let mut visited: HashSet<AccountId> = HashSet::from([id]);
        let mut queue: VecDeque<AccountId> = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            for child in by_parent.get(&current).into_iter().flatten() {
                if visited.insert(child.id) {
                    queue.push_back(child.id);
                    result.push(child.clone());
                }
            }
        }

        Ok(result)
    }

    fn children_index(&self) -> TallyResult<HashMap<AccountId, Vec<Account>>> {
        let mut by_parent: HashMap<AccountId, Vec<Account>> = HashMap::new();
        for account in self.storage.accounts.get_all()? {
            if let Some(parent_id) = account.parent_id {
                by_parent.entry(parent_id).or_default().push(account);
            }
        }
        Ok(by_parent)
    }

    fn is_descendant_of(&self, id: AccountId, ancestor: AccountId) -> TallyResult<bool> {
        Ok(self.descendants(ancestor)?.iter().any(|a| a.id == id))
    }

    /// Names from below the root down to the account, joined with `:`
    ///
    /// The root account itself has an empty full name.
    pub fn full_name(&self, id: AccountId) -> TallyResult<String> {
        let mut names = Vec::new();
        let mut current = self.get_required(id)?;
        let limit = self.storage.accounts.count()?;

        while let Some(parent_id) = current.parent_id {
            if names.len() > limit {
                return Err(TallyError::StorageUnavailable(format!(
                    "Account tree has a cycle at {}",
                    id
                )));
            }
            names.push(current.name.clone());
            current = self.get_required(parent_id)?;
        }

        names.reverse();
        Ok(names.join(&ACCOUNT_NAME_SEPARATOR.to_string()))
    }

    fn child_full_name(&self, parent_id: AccountId, name: &str) -> TallyResult<String> {
        let prefix = self.full_name(parent_id)?;
        if prefix.is_empty() {
            return Ok(name.to_string());
        }
        Ok(format!("{}{}{}", prefix, ACCOUNT_NAME_SEPARATOR, name))
    }

    /// The tree below the root in depth-first, name order
    pub fn tree(&self) -> TallyResult<Vec<AccountNode>> {
        let mut by_parent = self.children_index()?;
        for children in by_parent.values_mut() {
            children.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        }

        let mut nodes = Vec::new();
        let mut stack: Vec<(Account, usize, String)> = by_parent
            .get(&self.storage.root_account_id())
            .into_iter()
            .flatten()
            .rev()
            .map(|a| (a.clone(), 0, a.name.clone()))
            .collect();

        while let Some((account, depth, full_name)) = stack.pop() {
            for child in by_parent.get(&account.id).into_iter().flatten().rev() {
                let child_name = format!("{}{}{}", full_name, ACCOUNT_NAME_SEPARATOR, child.name);
                stack.push((child.clone(), depth + 1, child_name));
            }
            nodes.push(AccountNode {
                account,
                full_name,
                depth,
            });
        }

        Ok(nodes)
    }

    /// Find an account by full name, unique short name, or ID
    pub fn find(&self, identifier: &str) -> TallyResult<Option<Account>> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Ok(None);
        }

        if identifier.contains(ACCOUNT_NAME_SEPARATOR) {
            let wanted = identifier.to_lowercase();
            return Ok(self
                .tree()?
                .into_iter()
                .find(|node| node.full_name.to_lowercase() == wanted)
                .map(|node| node.account));
        }

        let mut by_name = self.storage.accounts.get_by_name(identifier)?;
        by_name.retain(|a| !a.is_root());
        match by_name.len() {
            1 => return Ok(by_name.pop()),
            0 => {}
            _ => {
                return Err(TallyError::Validation(format!(
                    "'{}' matches {} accounts; use the full name",
                    identifier,
                    by_name.len()
                )))
            }
        }

        Ok(self
            .storage
            .accounts
            .get_all()?
            .into_iter()
            .find(|a| a.id.matches(identifier)))
    }

    /// Balance of an account and its descendants over `[start, end)`
    ///
    /// Sums each split's posting in the account's commodity. Descendants in a
    /// different commodity are skipped, as there is no price source to convert
    /// them.
    pub fn balance(&self, id: AccountId, start: NaiveDate, end: NaiveDate) -> TallyResult<Money> {
        let account = self.get_required(id)?;

        let mut included: HashSet<AccountId> = HashSet::from([account.id]);
        for descendant in self.descendants(account.id)? {
            if descendant.commodity != account.commodity {
                warn!(
                    account = %account.id,
                    descendant = %descendant.id,
                    commodity = %descendant.commodity,
                    "Skipping descendant in a different commodity"
                );
                continue;
            }
            included.insert(descendant.id);
        }

        let splits = self
            .storage
            .transactions
            .splits_in_range(&included, start, end)?;
        let balance = Money::sum(&account.commodity, splits.iter().map(|s| s.posting()))?;

        debug!(
            account = %account.id,
            %start,
            %end,
            splits = splits.len(),
            balance = %balance,
            "Computed account balance"
        );
        Ok(balance)
    }

    /// Transactions with a split on the account, oldest first
    pub fn transactions(&self, id: AccountId) -> TallyResult<Vec<Transaction>> {
        self.get_required(id)?;
        self.storage.transactions.get_by_account(id)
    }
}
