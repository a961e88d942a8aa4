//! Book model
//!
//! A book is an isolated ledger with its own storage directory. The book
//! catalog records every book and which one is active.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, BookId};

/// Catalog entry for one ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier; also names the storage directory
    pub id: BookId,

    pub display_name: String,

    /// Root of the book's account tree
    pub root_account_id: AccountId,

    /// Root of the book's template account tree, allocated with the book
    #[serde(default = "AccountId::new")]
    pub template_account_id: AccountId,

    /// Exactly one book in the catalog is active
    #[serde(default)]
    pub active: bool,

    /// Where the book was imported from or last synced to
    #[serde(default)]
    pub source_uri: Option<String>,

    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub modified_at: DateTime<Utc>,
}

impl Book {
    /// Create an inactive book entry
    pub fn new(id: BookId, display_name: impl Into<String>, root_account_id: AccountId) -> Self {
        let now = Utc::now();
        Self {
            id,
            display_name: display_name.into(),
            root_account_id,
            template_account_id: AccountId::new(),
            active: false,
            source_uri: None,
            last_sync: None,
            created_at: now,
            modified_at: now,
        }
    }

    /// Flip the active flag, bumping `modified_at` only on change
    pub fn set_active(&mut self, active: bool) {
        if self.active != active {
            self.active = active;
            self.modified_at = Utc::now();
        }
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name)?;
        if self.active {
            write!(f, " (active)")?;
        }
        Ok(())
    }
}
