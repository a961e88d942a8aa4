//! Budget service
//!
//! Budgets project an amount per account for each period of a recurrence.
//! Progress compares those projections with ledger balances over the same
//! period bounds.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::audit::EntityType;
use crate::error::{TallyError, TallyResult};
use crate::models::{
    AccountId, Budget, BudgetAmount, BudgetId, BudgetProgress, Money, PeriodBounds,
    PeriodSpending, Ratio, Recurrence,
};
use crate::services::account::AccountService;
use crate::storage::Storage;

/// Periods assumed for a recurrence with no end and no explicit count
pub const DEFAULT_PERIOD_FALLBACK: u32 = 12;

/// Service for budget management and progress queries
pub struct BudgetService<'a> {
    storage: &'a Storage,
    period_fallback: u32,
}

/// One projected amount of a new budget
#[derive(Debug, Clone)]
pub struct BudgetAmountInput {
    pub account_id: AccountId,
    pub amount: Money,
}

/// Input for creating a budget
#[derive(Debug, Clone)]
pub struct CreateBudgetInput {
    pub name: String,
    pub description: Option<String>,
    pub recurrence: Recurrence,
    pub amounts: Vec<BudgetAmountInput>,
    pub number_of_periods: Option<u32>,
}

impl CreateBudgetInput {
    pub fn new(name: impl Into<String>, recurrence: Recurrence) -> Self {
        Self {
            name: name.into(),
            description: None,
            recurrence,
            amounts: Vec::new(),
            number_of_periods: None,
        }
    }

    pub fn amount(mut self, account_id: AccountId, amount: Money) -> Self {
        self.amounts.push(BudgetAmountInput { account_id, amount });
        self
    }
}

impl<'a> BudgetService<'a> {
    /// Create a new budget service with the default period fallback
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            period_fallback: DEFAULT_PERIOD_FALLBACK,
        }
    }

    /// Use `fallback` periods for open-ended budgets
    pub fn with_period_fallback(mut self, fallback: u32) -> Self {
        self.period_fallback = fallback.max(1);
        self
    }

    /// Create a budget
    pub fn create(&self, input: CreateBudgetInput) -> TallyResult<Budget> {
        let mut budget = Budget::new(input.name.trim(), input.recurrence);
        if let Some(description) = input.description {
            budget.description = description;
        }
        budget.number_of_periods = input.number_of_periods;
        for entry in input.amounts {
            budget.add_amount(entry.account_id, entry.amount);
        }
        budget.validate()?;

        for entry in &budget.amounts {
            let account = self
                .storage
                .accounts
                .get(entry.account_id)?
                .ok_or_else(|| {
                    TallyError::InvalidAccount(format!("No account {}", entry.account_id))
                })?;
            if account.placeholder {
                return Err(TallyError::InvalidAccount(format!(
                    "{} is a placeholder and cannot be budgeted",
                    account.name
                )));
            }
            if *entry.amount.commodity() != account.commodity {
                return Err(TallyError::CommodityMismatch {
                    expected: account.commodity.code.clone(),
                    found: entry.amount.commodity().code.clone(),
                });
            }
        }

        self.storage.budgets.insert_and_save(budget.clone())?;

        info!(budget = %budget.id, name = %budget.name, "Created budget");
        self.storage.log_create(
            EntityType::Budget,
            budget.id,
            Some(budget.name.clone()),
            &budget,
        );

        Ok(budget)
    }

    /// Remove a budget and its amounts; the ledger is untouched
    pub fn delete(&self, id: BudgetId) -> TallyResult<Budget> {
        let removed = self.storage.budgets.delete_and_save(id)?;

        info!(budget = %removed.id, name = %removed.name, "Deleted budget");
        self.storage.log_delete(
            EntityType::Budget,
            removed.id,
            Some(removed.name.clone()),
            &removed,
        );

        Ok(removed)
    }

    /// Get a budget by ID
    pub fn get(&self, id: BudgetId) -> TallyResult<Option<Budget>> {
        self.storage.budgets.get(id)
    }

    fn get_required(&self, id: BudgetId) -> TallyResult<Budget> {
        self.storage
            .budgets
            .get(id)?
            .ok_or_else(|| TallyError::budget_not_found(id.to_string()))
    }

    /// All budgets, ordered by name
    pub fn list(&self) -> TallyResult<Vec<Budget>> {
        self.storage.budgets.get_all()
    }

    /// Find a budget by name or ID
    pub fn find(&self, identifier: &str) -> TallyResult<Option<Budget>> {
        if let Some(budget) = self.storage.budgets.get_by_name(identifier)? {
            return Ok(Some(budget));
        }
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Ok(None);
        }
        Ok(self
            .storage
            .budgets
            .get_all()?
            .into_iter()
            .find(|b| b.id.matches(identifier)))
    }

    /// One amount per account with duplicates summed
    pub fn compacted_amounts(&self, id: BudgetId) -> TallyResult<Vec<BudgetAmount>> {
        Ok(self.get_required(id)?.compacted_amounts()?)
    }

    /// Number of periods the budget spans
    pub fn number_of_periods(&self, id: BudgetId) -> TallyResult<u32> {
        Ok(self.get_required(id)?.number_of_periods(self.period_fallback))
    }

    /// Index of the period containing `today`
    pub fn current_period_index(&self, id: BudgetId, today: NaiveDate) -> TallyResult<i64> {
        Ok(self.get_required(id)?.recurrence.period_index_for(today))
    }

    fn bounds(budget: &Budget, period: i64) -> TallyResult<PeriodBounds> {
        budget.recurrence.period_bounds(period).ok_or_else(|| {
            TallyError::Validation(format!(
                "Period {} of budget {} is outside the calendar",
                period, budget.name
            ))
        })
    }

    fn spent(&self, account_id: AccountId, bounds: &PeriodBounds) -> TallyResult<Money> {
        Ok(AccountService::new(self.storage)
            .balance(account_id, bounds.start, bounds.end)?
            .abs())
    }

    fn progress(period: i64, projected: Money, spent: Money) -> TallyResult<BudgetProgress> {
        let left = projected.try_sub(&spent)?;
        let ratio = if projected.is_zero() {
            Ratio::zero()
        } else {
            spent.divide(&projected)?
        };
        Ok(BudgetProgress {
            period,
            projected,
            spent,
            left,
            ratio,
        })
    }

    /// Spending against one account's projection in one period
    pub fn period_progress(
        &self,
        id: BudgetId,
        account_id: AccountId,
        period: i64,
    ) -> TallyResult<BudgetProgress> {
        let budget = self.get_required(id)?;
        let projected = budget.amount_for(account_id)?.ok_or_else(|| {
            TallyError::account_not_found(format!("{} in budget {}", account_id, budget.name))
        })?;

        let bounds = Self::bounds(&budget, period)?;
        let spent = self.spent(account_id, &bounds)?;

        debug!(
            budget = %budget.id,
            account = %account_id,
            period,
            spent = %spent,
            "Computed budget progress"
        );
        Self::progress(period, projected, spent)
    }

    /// Spending against the whole budget in one period
    pub fn total_progress(&self, id: BudgetId, period: i64) -> TallyResult<BudgetProgress> {
        let budget = self.get_required(id)?;
        let amounts = budget.compacted_amounts()?;
        let bounds = Self::bounds(&budget, period)?;

        let commodity = amounts
            .first()
            .map(|a| a.amount.commodity().clone())
            .ok_or_else(|| TallyError::Validation(format!("Budget {} has no amounts", budget.name)))?;

        let mut projected = Money::zero(commodity.clone());
        let mut spent = Money::zero(commodity);
        for entry in &amounts {
            projected = projected.try_add(&entry.amount)?;
            spent = spent.try_add(&self.spent(entry.account_id, &bounds)?)?;
        }

        Self::progress(period, projected, spent)
    }

    /// Signed balance of a budgeted account for each period that saw activity
    pub fn spending_history(
        &self,
        id: BudgetId,
        account_id: AccountId,
    ) -> TallyResult<Vec<PeriodSpending>> {
        let budget = self.get_required(id)?;
        if budget.amount_for(account_id)?.is_none() {
            return Err(TallyError::account_not_found(format!(
                "{} in budget {}",
                account_id, budget.name
            )));
        }

        let accounts = AccountService::new(self.storage);
        let periods = budget.number_of_periods(self.period_fallback);
        let mut history = Vec::new();
        for period in 0..i64::from(periods) {
            let Some(bounds) = budget.recurrence.period_bounds(period) else {
                break;
            };
            let amount = accounts.balance(account_id, bounds.start, bounds.end)?;
            if amount.is_zero() {
                continue;
            }
            history.push(PeriodSpending {
                period,
                start: bounds.start,
                end: bounds.end,
                amount,
            });
        }

        Ok(history)
    }
}
