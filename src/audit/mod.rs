//! Audit trail for Tally
//!
//! Every create, update and delete of an account, transaction, budget or book
//! is appended to an audit log as one JSON line, carrying the entity's state
//! before and after the change.
//!
//! Ledger changes are written to the book's own `audit.log`; book catalog
//! changes go to the log in the base directory.

mod entry;
mod logger;

pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
