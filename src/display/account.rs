//! Account display formatting
//!
//! Formats the account tree and single accounts for terminal output.

use crate::models::{Account, Money};
use crate::services::AccountNode;

/// Format the account tree with one balance per node
pub fn format_account_tree(rows: &[(AccountNode, Money)]) -> String {
    if rows.is_empty() {
        return "No accounts found.\n".to_string();
    }

    let label = |node: &AccountNode| {
        let marker = if node.account.placeholder { " [P]" } else { "" };
        format!("{}{}{}", "  ".repeat(node.depth), node.account.name, marker)
    };

    let name_width = rows
        .iter()
        .map(|(node, _)| label(node).chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:<11}  {:>4}  {:>14}\n",
        "Name",
        "Type",
        "Cur",
        "Balance",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:-<11}  {:->4}  {:->14}\n",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for (node, balance) in rows {
        output.push_str(&format!(
            "{:<name_width$}  {:<11}  {:>4}  {:>14}\n",
            label(node),
            node.account.account_type.to_string(),
            node.account.commodity.code,
            balance.to_string(),
            name_width = name_width,
        ));
    }

    output
}

/// Format the details of one account
pub fn format_account_details(
    account: &Account,
    full_name: &str,
    balance: &Money,
    transaction_count: usize,
) -> String {
    let mut output = String::new();

    output.push_str(&format!("Account: {}\n", full_name));
    output.push_str(&format!("  ID:           {}\n", account.id));
    output.push_str(&format!("  Type:         {}\n", account.account_type));
    output.push_str(&format!("  Commodity:    {}\n", account.commodity.code));
    output.push_str(&format!(
        "  Normal side:  {}\n",
        if account.account_type.has_debit_normal_balance() {
            "debit"
        } else {
            "credit"
        }
    ));
    if account.placeholder {
        output.push_str("  Placeholder:  yes\n");
    }
    if !account.description.is_empty() {
        output.push_str(&format!("  Description:  {}\n", account.description));
    }
    output.push_str(&format!("  Balance:      {}\n", balance));
    output.push_str(&format!("  Transactions: {}\n", transaction_count));

    output
}
