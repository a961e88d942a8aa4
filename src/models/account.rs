//! Account model
//!
//! Accounts form a tree per book. Each account stores only its parent's ID;
//! the tree itself lives in the account repository's ID-keyed map.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::commodity::Commodity;
use super::ids::AccountId;

/// Separator between names in an account's full name ("Expenses:Groceries")
pub const ACCOUNT_NAME_SEPARATOR: char = ':';

/// Classic double-entry account types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Cash,
    Bank,
    Credit,
    Asset,
    Liability,
    Income,
    Expense,
    Payable,
    Receivable,
    Equity,
    Currency,
    Stock,
    Mutual,
    Trading,
    /// Top of every book's account tree; never created by callers
    Root,
}

impl AccountType {
    /// All types, in display order
    pub const ALL: [AccountType; 15] = [
        Self::Cash,
        Self::Bank,
        Self::Credit,
        Self::Asset,
        Self::Liability,
        Self::Income,
        Self::Expense,
        Self::Payable,
        Self::Receivable,
        Self::Equity,
        Self::Currency,
        Self::Stock,
        Self::Mutual,
        Self::Trading,
        Self::Root,
    ];

    /// Returns true if increases to this account are recorded as debits
    pub fn has_debit_normal_balance(&self) -> bool {
        matches!(
            self,
            Self::Cash
                | Self::Bank
                | Self::Asset
                | Self::Expense
                | Self::Receivable
                | Self::Stock
                | Self::Mutual
        )
    }

    /// Parse account type from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Some(Self::Cash),
            "bank" | "checking" | "savings" => Some(Self::Bank),
            "credit" | "credit_card" | "creditcard" => Some(Self::Credit),
            "asset" => Some(Self::Asset),
            "liability" => Some(Self::Liability),
            "income" => Some(Self::Income),
            "expense" | "expenses" => Some(Self::Expense),
            "payable" => Some(Self::Payable),
            "receivable" => Some(Self::Receivable),
            "equity" => Some(Self::Equity),
            "currency" => Some(Self::Currency),
            "stock" => Some(Self::Stock),
            "mutual" | "mutual_fund" => Some(Self::Mutual),
            "trading" => Some(Self::Trading),
            "root" => Some(Self::Root),
            _ => None,
        }
    }
}

impl Default for AccountType {
    fn default() -> Self {
        Self::Asset
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cash => "Cash",
            Self::Bank => "Bank",
            Self::Credit => "Credit Card",
            Self::Asset => "Asset",
            Self::Liability => "Liability",
            Self::Income => "Income",
            Self::Expense => "Expense",
            Self::Payable => "Payable",
            Self::Receivable => "Receivable",
            Self::Equity => "Equity",
            Self::Currency => "Currency",
            Self::Stock => "Stock",
            Self::Mutual => "Mutual Fund",
            Self::Trading => "Trading",
            Self::Root => "Root",
        };
        write!(f, "{}", name)
    }
}

/// A node in a book's account tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier
    pub id: AccountId,

    /// Parent account; `None` only for the root
    pub parent_id: Option<AccountId>,

    /// Short name (e.g., "Groceries")
    pub name: String,

    /// Type of account
    #[serde(rename = "type")]
    pub account_type: AccountType,

    /// Commodity every posting to this account is measured in
    pub commodity: Commodity,

    /// Placeholder accounts only group children and cannot take splits
    #[serde(default)]
    pub placeholder: bool,

    #[serde(default)]
    pub description: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last modified
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account under `parent_id`
    pub fn new(
        name: impl Into<String>,
        account_type: AccountType,
        commodity: Commodity,
        parent_id: AccountId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new(),
            parent_id: Some(parent_id),
            name: name.into(),
            account_type,
            commodity,
            placeholder: false,
            description: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create the root account of a new book
    pub fn new_root(commodity: Commodity) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new(),
            parent_id: None,
            name: "Root Account".to_string(),
            account_type: AccountType::Root,
            commodity,
            placeholder: true,
            description: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Move this account under a new parent
    pub fn set_parent(&mut self, parent_id: AccountId) {
        self.parent_id = Some(parent_id);
        self.updated_at = Utc::now();
    }

    /// Validate the account
    pub fn validate(&self) -> Result<(), AccountValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AccountValidationError::EmptyName);
        }

        if name.len() > 100 {
            return Err(AccountValidationError::NameTooLong(name.len()));
        }

        if name.contains(ACCOUNT_NAME_SEPARATOR) {
            return Err(AccountValidationError::SeparatorInName(name.to_string()));
        }

        // Root type and a missing parent go together
        if (self.account_type == AccountType::Root) != self.parent_id.is_none() {
            return Err(AccountValidationError::MisplacedRoot);
        }

        Ok(())
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.account_type, self.commodity)
    }
}

/// Validation errors for accounts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountValidationError {
    #[error("Account name cannot be empty")]
    EmptyName,

    #[error("Account name too long ({0} chars, max 100)")]
    NameTooLong(usize),

    #[error("Account name cannot contain ':' ({0})")]
    SeparatorInName(String),

    #[error("Only the root account may be of type Root or lack a parent")]
    MisplacedRoot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account() {
        let root = Account::new_root(Commodity::usd());
        let account = Account::new("Groceries", AccountType::Expense, Commodity::usd(), root.id);
        assert_eq!(account.name, "Groceries");
        assert_eq!(account.parent_id, Some(root.id));
        assert!(!account.placeholder);
        assert!(!account.is_root());
        assert!(root.is_root());
        assert!(root.placeholder);
    }

    #[test]
    fn test_validation() {
        let root = Account::new_root(Commodity::usd());
        let mut account = Account::new("Valid Name", AccountType::Bank, Commodity::usd(), root.id);
        assert!(account.validate().is_ok());
        assert!(root.validate().is_ok());

        account.name = "  ".into();
        assert_eq!(account.validate(), Err(AccountValidationError::EmptyName));

        account.name = "a".repeat(101);
        assert!(matches!(
            account.validate(),
            Err(AccountValidationError::NameTooLong(_))
        ));

        account.name = "Expenses:Food".into();
        assert!(matches!(
            account.validate(),
            Err(AccountValidationError::SeparatorInName(_))
        ));

        account.name = "Fine".into();
        account.account_type = AccountType::Root;
        assert_eq!(account.validate(), Err(AccountValidationError::MisplacedRoot));
    }

    #[test]
    fn test_normal_balance() {
        assert!(AccountType::Expense.has_debit_normal_balance());
        assert!(AccountType::Bank.has_debit_normal_balance());
        assert!(AccountType::Mutual.has_debit_normal_balance());
        assert!(!AccountType::Income.has_debit_normal_balance());
        assert!(!AccountType::Liability.has_debit_normal_balance());
        assert!(!AccountType::Equity.has_debit_normal_balance());
    }

    #[test]
    fn test_account_type_parsing() {
        assert_eq!(AccountType::parse("expense"), Some(AccountType::Expense));
        assert_eq!(AccountType::parse("BANK"), Some(AccountType::Bank));
        assert_eq!(AccountType::parse("credit_card"), Some(AccountType::Credit));
        assert_eq!(AccountType::parse("invalid"), None);
        for t in AccountType::ALL {
            assert_eq!(
                AccountType::parse(&format!("{:?}", t)),
                Some(t),
                "{:?}",
                t
            );
        }
    }

    #[test]
    fn test_serialization() {
        let account = Account::new_root(Commodity::eur());
        let json = serde_json::to_string(&account).unwrap();
        assert!(json.contains("\"type\":\"root\""));
        let deserialized: Account = serde_json::from_str(&json).unwrap();
        assert_eq!(account.id, deserialized.id);
        assert_eq!(deserialized.commodity, Commodity::eur());
    }
}
