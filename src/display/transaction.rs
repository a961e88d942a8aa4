//! Transaction display formatting
//!
//! Register and detail views. Account names are resolved by the caller and
//! passed in as a lookup table.

use std::collections::HashMap;

use super::truncate;
use crate::models::{AccountId, Money, Transaction};

fn account_label(names: &HashMap<AccountId, String>, id: AccountId) -> String {
    names
        .get(&id)
        .cloned()
        .unwrap_or_else(|| id.to_string())
}

/// Sum of the positive split amounts, i.e. how much moved
fn transaction_total(txn: &Transaction) -> Option<Money> {
    txn.splits
        .iter()
        .filter(|s| s.amount.is_positive() && s.amount.commodity() == &txn.commodity)
        .try_fold(Money::zero(txn.commodity.clone()), |acc, s| {
            acc.try_add(&s.amount).ok()
        })
}

/// Format a list of transactions as a register, one split per line
pub fn format_transaction_register(
    transactions: &[Transaction],
    names: &HashMap<AccountId, String>,
) -> String {
    if transactions.is_empty() {
        return "No transactions found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<12} {:<10} {:<28} {:>14}\n",
        "ID", "Date", "Description / Account", "Amount"
    ));
    output.push_str(&"-".repeat(67));
    output.push('\n');

    for txn in transactions {
        let total = transaction_total(txn)
            .map(|m| m.to_string())
            .unwrap_or_default();
        output.push_str(&format!(
            "{:<12} {:<10} {:<28} {:>14}\n",
            txn.id.to_string(),
            txn.date.format("%Y-%m-%d"),
            truncate(&txn.description, 28),
            total
        ));
        for split in &txn.splits {
            output.push_str(&format!(
                "{:<12} {:<10}   {:<26} {:>14}\n",
                "",
                "",
                truncate(&account_label(names, split.account_id), 26),
                split.posting().to_string()
            ));
        }
    }

    output
}

/// Format a transaction with all of its splits
pub fn format_transaction_details(
    txn: &Transaction,
    names: &HashMap<AccountId, String>,
) -> String {
    let mut output = String::new();

    output.push_str(&format!("Transaction: {}\n", txn.id));
    output.push_str(&format!("  Date:        {}\n", txn.date.format("%Y-%m-%d")));
    output.push_str(&format!("  Description: {}\n", txn.description));
    output.push_str(&format!("  Currency:    {}\n", txn.commodity.code));
    if !txn.notes.is_empty() {
        output.push_str(&format!("  Notes:       {}\n", txn.notes));
    }

    output.push_str("  Splits:\n");
    for split in &txn.splits {
        let mut line = format!(
            "    {:<30} {:>14}",
            account_label(names, split.account_id),
            split.amount.to_string()
        );
        if let Some(quantity) = &split.quantity {
            line.push_str(&format!(" ({})", quantity));
        }
        if !split.memo.is_empty() {
            line.push_str(&format!("  {}", split.memo));
        }
        output.push_str(&line);
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Commodity;
    use chrono::NaiveDate;

    fn sample() -> (Transaction, HashMap<AccountId, String>) {
        let checking = AccountId::new();
        let groceries = AccountId::new();
        let mut txn = Transaction::new(
            "Farmers market",
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            Commodity::usd(),
        );
        txn.add_split(groceries, Money::from_minor(5000, Commodity::usd()))
            .memo = "veg".into();
        txn.add_split(checking, Money::from_minor(-5000, Commodity::usd()));

        let names = HashMap::from([
            (checking, "Assets:Checking".to_string()),
            (groceries, "Expenses:Groceries".to_string()),
        ]);
        (txn, names)
    }

    #[test]
    fn test_register() {
        let (txn, names) = sample();
        let output = format_transaction_register(&[txn], &names);

        assert!(output.contains("2025-01-15"));
        assert!(output.contains("Expenses:Groceries"));
        assert!(output.contains("-$50.00"));
        assert_eq!(output.lines().count(), 5);
    }

    #[test]
    fn test_details() {
        let (txn, names) = sample();
        let output = format_transaction_details(&txn, &names);

        assert!(output.contains("Description: Farmers market"));
        assert!(output.contains("veg"));
    }

    #[test]
    fn test_empty_register() {
        assert_eq!(
            format_transaction_register(&[], &HashMap::new()),
            "No transactions found.\n"
        );
    }
}
