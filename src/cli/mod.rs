//! CLI command handlers
//!
//! Bridges clap argument parsing with the registry and service layer. Handlers
//! print their results and return [`TallyResult`] so `main` can report errors.

pub mod account;
pub mod book;
pub mod budget;
pub mod transaction;

pub use account::{handle_account_command, AccountCommands};
pub use book::{handle_book_command, BookCommands};
pub use budget::{handle_budget_command, BudgetCommands};
pub use transaction::{handle_transaction_command, TransactionCommands};

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::error::{TallyError, TallyResult};
use crate::models::{Account, AccountId, Commodity, Money};
use crate::services::AccountService;

/// Parse a `YYYY-MM-DD` date
pub(crate) fn parse_date(date_str: &str) -> TallyResult<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|_| {
        TallyError::Validation(format!(
            "Invalid date format: '{}'. Use YYYY-MM-DD",
            date_str
        ))
    })
}

pub(crate) fn parse_date_or_today(date_str: Option<&str>) -> TallyResult<NaiveDate> {
    match date_str {
        Some(date_str) => parse_date(date_str),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

pub(crate) fn parse_money(amount: &str, commodity: &Commodity) -> TallyResult<Money> {
    Money::parse(amount, commodity).map_err(|e| {
        TallyError::Validation(format!(
            "Invalid amount '{}' for {}: {}",
            amount, commodity.code, e
        ))
    })
}

pub(crate) fn parse_commodity(code: &str) -> TallyResult<Commodity> {
    Commodity::from_code(code)
        .ok_or_else(|| TallyError::Validation(format!("Unknown commodity: '{}'", code)))
}

/// Split `ACCOUNT=VALUE` at the last `=`
pub(crate) fn split_assignment(arg: &str) -> TallyResult<(&str, &str)> {
    arg.rsplit_once('=')
        .map(|(account, value)| (account.trim(), value.trim()))
        .filter(|(account, value)| !account.is_empty() && !value.is_empty())
        .ok_or_else(|| {
            TallyError::Validation(format!("Expected ACCOUNT=AMOUNT, got '{}'", arg))
        })
}

pub(crate) fn find_account(service: &AccountService, identifier: &str) -> TallyResult<Account> {
    service
        .find(identifier)?
        .ok_or_else(|| TallyError::account_not_found(identifier))
}

/// Full names of every account below the root
pub(crate) fn account_names(service: &AccountService) -> TallyResult<HashMap<AccountId, String>> {
    Ok(service
        .tree()?
        .into_iter()
        .map(|node| (node.account.id, node.full_name))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_assignment() {
        assert_eq!(
            split_assignment("Expenses:Groceries=50.00").unwrap(),
            ("Expenses:Groceries", "50.00")
        );
        assert_eq!(
            split_assignment(" Travel = 110@100 ").unwrap(),
            ("Travel", "110@100")
        );
        assert!(split_assignment("Groceries").is_err());
        assert!(split_assignment("=5").is_err());
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(
            parse_date("2025-01-15").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
        );
        assert!(parse_date("15/01/2025").unwrap_err().is_validation());
        assert_eq!(parse_commodity("eur").unwrap(), Commodity::eur());
        assert!(parse_commodity("XYZ").is_err());
        assert_eq!(
            parse_money("-12.5", &Commodity::usd()).unwrap().amount(),
            -1250
        );
    }
}
