//! Budget CLI commands

use clap::Subcommand;

use super::{
    find_account, parse_date, parse_date_or_today, parse_money, split_assignment,
};
use crate::config::settings::Settings;
use crate::display::{format_budget_details, format_budget_list, format_spending_history};
use crate::error::{TallyError, TallyResult};
use crate::models::{Budget, PeriodType, Recurrence, RecurrenceEnd};
use crate::services::{AccountService, BudgetService, CreateBudgetInput};
use crate::storage::Storage;

/// Budget subcommands
#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Create a budget
    Create {
        /// Budget name
        name: String,
        /// Projected amount per period as ACCOUNT=AMOUNT (repeatable)
        #[arg(short, long = "amount", required = true)]
        amounts: Vec<String>,
        /// Period unit (day, week, month, year)
        #[arg(long, default_value = "month")]
        period: String,
        /// Number of units per period
        #[arg(long, default_value = "1")]
        every: u32,
        /// First day of the first period (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        start: Option<String>,
        /// Last day covered (YYYY-MM-DD)
        #[arg(long, conflicts_with = "count")]
        until: Option<String>,
        /// Number of periods before the recurrence stops
        #[arg(long)]
        count: Option<u32>,
        /// Explicit period count for open-ended budgets
        #[arg(long)]
        periods: Option<u32>,
        /// Description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// List budgets
    List,
    /// Show progress for one period
    Show {
        /// Budget name or ID
        budget: String,
        /// Period index (defaults to the period containing today)
        #[arg(short, long, allow_hyphen_values = true)]
        period: Option<i64>,
    },
    /// Show per-period spending of one budgeted account
    History {
        /// Budget name or ID
        budget: String,
        /// Account full name, unique name or ID
        account: String,
    },
    /// Delete a budget (the ledger is untouched)
    Delete {
        /// Budget name or ID
        budget: String,
    },
}

fn find_budget(service: &BudgetService, identifier: &str) -> TallyResult<Budget> {
    service
        .find(identifier)?
        .ok_or_else(|| TallyError::budget_not_found(identifier))
}

/// Handle a budget command
pub fn handle_budget_command(
    storage: &Storage,
    settings: &Settings,
    cmd: BudgetCommands,
) -> TallyResult<()> {
    let accounts = AccountService::new(storage);
    let service = BudgetService::new(storage).with_period_fallback(settings.budget_period_fallback);

    match cmd {
        BudgetCommands::Create {
            name,
            amounts,
            period,
            every,
            start,
            until,
            count,
            periods,
            description,
        } => {
            let period_type = PeriodType::parse(&period).ok_or_else(|| {
                TallyError::Validation(format!("Invalid period unit: '{}'", period))
            })?;
            let anchor = parse_date_or_today(start.as_deref())?;

            let mut recurrence = Recurrence::new(period_type, every, anchor)?;
            if let Some(until) = until {
                recurrence = recurrence.with_end(RecurrenceEnd::Date(parse_date(&until)?))?;
            } else if let Some(count) = count {
                recurrence = recurrence.with_end(RecurrenceEnd::Count(count))?;
            }

            let mut input = CreateBudgetInput::new(name, recurrence);
            input.description = description;
            input.number_of_periods = periods;
            for arg in &amounts {
                let (account, amount) = split_assignment(arg)?;
                let account = find_account(&accounts, account)?;
                input = input.amount(account.id, parse_money(amount, &account.commodity)?);
            }

            let budget = service.create(input)?;
            println!("Created budget: {}", budget);
            println!("  Periods: {}", service.number_of_periods(budget.id)?);
            println!("  ID:      {}", budget.id);
        }

        BudgetCommands::List => {
            print!("{}", format_budget_list(&service.list()?));
        }

        BudgetCommands::Show { budget, period } => {
            let found = find_budget(&service, &budget)?;
            let period = match period {
                Some(period) => period,
                None => service.current_period_index(found.id, parse_date_or_today(None)?)?,
            };

            let mut rows = Vec::new();
            for entry in service.compacted_amounts(found.id)? {
                let progress = service.period_progress(found.id, entry.account_id, period)?;
                rows.push((accounts.full_name(entry.account_id)?, progress));
            }
            let total = service.total_progress(found.id, period)?;

            print!("{}", format_budget_details(&found, period, &rows, &total));
        }

        BudgetCommands::History { budget, account } => {
            let found = find_budget(&service, &budget)?;
            let account = find_account(&accounts, &account)?;
            let history = service.spending_history(found.id, account.id)?;
            print!("{}", format_spending_history(&found.recurrence, &history));
        }

        BudgetCommands::Delete { budget } => {
            let found = find_budget(&service, &budget)?;
            let removed = service.delete(found.id)?;
            println!("Deleted budget: {}", removed.name);
        }
    }

    Ok(())
}
