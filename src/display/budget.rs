//! Budget display formatting

use super::{format_bar, truncate};
use crate::models::{Budget, BudgetProgress, PeriodSpending, Recurrence};

/// Format budgets as a table
pub fn format_budget_list(budgets: &[Budget]) -> String {
    if budgets.is_empty() {
        return "No budgets found.\n".to_string();
    }

    let name_width = budgets
        .iter()
        .map(|b| b.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:<30}  {:>8}  {:>14}\n",
        "Name",
        "Recurrence",
        "Accounts",
        "Per period",
        name_width = name_width,
    ));
    output.push_str(&format!(
        "{:-<name_width$}  {:-<30}  {:->8}  {:->14}\n",
        "",
        "",
        "",
        "",
        name_width = name_width,
    ));

    for budget in budgets {
        let per_period = match budget.amount_sum() {
            Ok(Some(sum)) => sum.to_string(),
            Ok(None) => String::new(),
            Err(_) => "mixed".to_string(),
        };
        output.push_str(&format!(
            "{:<name_width$}  {:<30}  {:>8}  {:>14}\n",
            budget.name,
            truncate(&budget.recurrence.to_string(), 30),
            budget.number_of_accounts(),
            per_period,
            name_width = name_width,
        ));
    }

    output
}

fn progress_row(label: &str, progress: &BudgetProgress) -> String {
    let flag = if progress.is_over_budget() { " !" } else { "" };
    format!(
        "{:<24} {:>12} {:>12} {:>12}  {} {:>4}%{}\n",
        truncate(label, 24),
        progress.projected.to_string(),
        progress.spent.to_string(),
        progress.left.to_string(),
        format_bar(&progress.ratio, 10),
        progress.ratio.percent(),
        flag
    )
}

/// Format one period of a budget: a row per account and a total
pub fn format_budget_details(
    budget: &Budget,
    period: i64,
    rows: &[(String, BudgetProgress)],
    total: &BudgetProgress,
) -> String {
    let mut output = String::new();

    output.push_str(&format!("Budget: {}\n", budget.name));
    output.push_str(&format!("  ID:         {}\n", budget.id));
    output.push_str(&format!("  Recurrence: {}\n", budget.recurrence));
    output.push_str(&format!(
        "  Period:     {} ({})\n",
        period,
        budget.recurrence.period_label(period)
    ));
    if !budget.description.is_empty() {
        output.push_str(&format!("  {}\n", budget.description));
    }
    output.push('\n');

    output.push_str(&format!(
        "{:<24} {:>12} {:>12} {:>12}\n",
        "Account", "Budgeted", "Spent", "Left"
    ));
    output.push_str(&"-".repeat(63));
    output.push('\n');

    for (name, progress) in rows {
        output.push_str(&progress_row(name, progress));
    }
    output.push_str(&"-".repeat(63));
    output.push('\n');
    output.push_str(&progress_row("Total", total));

    output
}

/// Format per-period spending of one account
pub fn format_spending_history(recurrence: &Recurrence, history: &[PeriodSpending]) -> String {
    if history.is_empty() {
        return "No spending recorded.\n".to_string();
    }

    let mut output = String::new();
    for entry in history {
        output.push_str(&format!(
            "{:>4}  {:<26} {:>14}\n",
            entry.period,
            recurrence.period_label(entry.period),
            entry.amount.to_string()
        ));
    }
    output
}
