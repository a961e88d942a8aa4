//! Book registry
//!
//! A book is an isolated ledger stored under `books/<uuid>/`. The catalog in
//! `books.json` records every book and which one is active.

pub mod catalog;
pub mod registry;

pub use catalog::BookCatalog;
pub use registry::BookRegistry;
