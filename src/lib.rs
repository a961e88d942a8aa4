//! Tally - multi-book, multi-currency double-entry bookkeeping
//!
//! This library holds the ledger core behind the `tally` command. Books are
//! isolated ledgers; each has an account tree, balanced transactions and
//! recurring budgets, stored as JSON documents under one base directory.
//!
//! # Architecture
//!
//! - `models`: commodities, money, recurrences and the ledger entities
//! - `storage`: per-book JSON repositories with atomic writes
//! - `services`: account, transaction and budget logic over a book's storage
//! - `books`: the book catalog and the active-book registry
//! - `config`: base directory layout and user settings
//! - `audit`: JSONL audit trail of every change
//! - `display` and `cli`: terminal formatting and command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use tally::books::BookRegistry;
//! use tally::config::{paths::TallyPaths, settings::Settings};
//!
//! let paths = TallyPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let registry = BookRegistry::open(paths, settings)?;
//! registry.ensure_default_book()?;
//! let storage = registry.open_active_storage()?;
//! ```

pub mod audit;
pub mod books;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{TallyError, TallyResult};
