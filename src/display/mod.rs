//! Display formatting for terminal output
//!
//! Pure functions turning models and service results into table text. The CLI
//! prints whatever these return.

pub mod account;
pub mod book;
pub mod budget;
pub mod transaction;

pub use account::{format_account_details, format_account_tree};
pub use book::format_book_list;
pub use budget::{format_budget_details, format_budget_list, format_spending_history};
pub use transaction::{format_transaction_details, format_transaction_register};

use crate::models::Ratio;

/// Truncate a string to a maximum number of characters with an ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        ".".repeat(max_len)
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

/// Progress bar for a ratio, clamped to full
pub fn format_bar(ratio: &Ratio, width: usize) -> String {
    let filled = (ratio.clamped().to_f64() * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Groceries", 20), "Groceries");
        assert_eq!(truncate("Expenses:Household:Groceries", 12), "Expenses:...");
        assert_eq!(truncate("Café au lait", 6), "Caf...");
        assert_eq!(truncate("abcdef", 2), "..");
    }

    #[test]
    fn test_format_bar() {
        assert_eq!(format_bar(&Ratio::new(25, 2), 4), "█░░░");
        assert_eq!(format_bar(&Ratio::new(150, 2), 4), "████");
        assert_eq!(format_bar(&Ratio::zero(), 3), "░░░");
    }
}
