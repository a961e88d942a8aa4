//! End-to-end ledger scenarios through the public API

use chrono::NaiveDate;
use tempfile::TempDir;

use tally::books::BookRegistry;
use tally::config::{paths::TallyPaths, settings::Settings};
use tally::models::{AccountId, AccountType, Commodity, Money, PeriodType, Ratio, Recurrence};
use tally::services::{
    AccountService, BudgetService, CreateAccountInput, CreateBudgetInput, PostTransactionInput,
    SplitInput, TransactionService,
};
use tally::storage::Storage;
use tally::TallyError;

fn usd(cents: i64) -> Money {
    Money::from_minor(cents, Commodity::usd())
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn registry(temp_dir: &TempDir) -> BookRegistry {
    let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
    BookRegistry::open(paths, Settings::default()).unwrap()
}

struct Household {
    checking: AccountId,
    expenses: AccountId,
    groceries: AccountId,
}

fn household(storage: &Storage) -> Household {
    let accounts = AccountService::new(storage);
    let assets = accounts
        .create(CreateAccountInput::new("Assets", AccountType::Asset).placeholder())
        .unwrap();
    let checking = accounts
        .create(CreateAccountInput::new("Checking", AccountType::Bank).parent(assets.id))
        .unwrap();
    let expenses = accounts
        .create(CreateAccountInput::new("Expenses", AccountType::Expense))
        .unwrap();
    let groceries = accounts
        .create(CreateAccountInput::new("Groceries", AccountType::Expense).parent(expenses.id))
        .unwrap();
    Household {
        checking: checking.id,
        expenses: expenses.id,
        groceries: groceries.id,
    }
}

fn spend(storage: &Storage, from: AccountId, to: AccountId, cents: i64, on: NaiveDate) {
    TransactionService::new(storage)
        .post(
            PostTransactionInput::new("purchase", on)
                .split(SplitInput::new(to, usd(cents)))
                .split(SplitInput::new(from, usd(-cents))),
        )
        .unwrap();
}

#[test]
fn groceries_budget_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let registry = registry(&temp_dir);
    registry.ensure_default_book().unwrap();
    let storage = registry.open_active_storage().unwrap();
    let h = household(&storage);

    spend(&storage, h.checking, h.groceries, 5000, date(2025, 1, 15));

    let accounts = AccountService::new(&storage);
    assert_eq!(
        accounts
            .balance(h.groceries, date(2025, 1, 1), date(2025, 2, 1))
            .unwrap(),
        usd(5000)
    );
    assert_eq!(
        accounts
            .balance(h.expenses, date(2025, 1, 1), date(2025, 2, 1))
            .unwrap(),
        usd(5000)
    );
    assert_eq!(
        accounts.full_name(h.groceries).unwrap(),
        "Expenses:Groceries"
    );

    let budgets = BudgetService::new(&storage);
    let budget = budgets
        .create(
            CreateBudgetInput::new("Household", Recurrence::monthly(date(2025, 1, 1)))
                .amount(h.groceries, usd(20000)),
        )
        .unwrap();

    let progress = budgets.period_progress(budget.id, h.groceries, 0).unwrap();
    assert_eq!(progress.spent, usd(5000));
    assert_eq!(progress.left, usd(15000));
    assert_eq!(progress.ratio, Ratio::new(25, 2));
    assert_eq!(progress.ratio.percent(), 25);
}

#[test]
fn duplicate_budget_amounts_compact() {
    let temp_dir = TempDir::new().unwrap();
    let registry = registry(&temp_dir);
    registry.ensure_default_book().unwrap();
    let storage = registry.open_active_storage().unwrap();
    let h = household(&storage);

    let budgets = BudgetService::new(&storage);
    let budget = budgets
        .create(
            CreateBudgetInput::new("Food", Recurrence::monthly(date(2025, 1, 1)))
                .amount(h.groceries, usd(10000))
                .amount(h.groceries, usd(5000)),
        )
        .unwrap();

    let compacted = budgets.compacted_amounts(budget.id).unwrap();
    assert_eq!(compacted.len(), 1);
    assert_eq!(compacted[0].amount, usd(15000));
}

#[test]
fn unbalanced_post_persists_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let registry = registry(&temp_dir);
    let book = registry.ensure_default_book().unwrap();
    let storage = registry.open_active_storage().unwrap();
    let h = household(&storage);

    let result = TransactionService::new(&storage).post(
        PostTransactionInput::new("oops", date(2025, 1, 2))
            .split(SplitInput::new(h.groceries, usd(5000)))
            .split(SplitInput::new(h.checking, usd(-4000))),
    );
    assert!(matches!(
        result,
        Err(TallyError::UnbalancedTransaction { .. })
    ));

    let reopened = Storage::open(registry.paths().book(book.id)).unwrap();
    assert_eq!(reopened.transactions.count().unwrap(), 0);
    assert_eq!(reopened.transactions.split_count().unwrap(), 0);
}

#[test]
fn accepted_transactions_sum_to_zero_per_commodity() {
    let temp_dir = TempDir::new().unwrap();
    let registry = registry(&temp_dir);
    registry.ensure_default_book().unwrap();
    let storage = registry.open_active_storage().unwrap();
    let h = household(&storage);

    let travel = AccountService::new(&storage)
        .create(
            CreateAccountInput::new("Travel", AccountType::Expense)
                .parent(h.expenses)
                .commodity(Commodity::eur()),
        )
        .unwrap();

    spend(&storage, h.checking, h.groceries, 1999, date(2025, 1, 3));
    TransactionService::new(&storage)
        .post(
            PostTransactionInput::new("Hotel", date(2025, 1, 4))
                .split(
                    SplitInput::new(travel.id, usd(11000))
                        .quantity(Money::from_minor(10000, Commodity::eur())),
                )
                .split(SplitInput::new(h.checking, usd(-6000)))
                .split(SplitInput::new(h.groceries, usd(-5000))),
        )
        .unwrap();

    for txn in storage.transactions.get_all().unwrap() {
        assert!(txn.imbalances().unwrap().is_empty());
    }

    // The EUR descendant is left out of the USD parent's balance
    let expenses = AccountService::new(&storage)
        .balance(h.expenses, date(2025, 1, 1), date(2025, 2, 1))
        .unwrap();
    assert_eq!(expenses, usd(1999 - 5000));
}

#[test]
fn balance_is_additive_over_adjacent_ranges() {
    let temp_dir = TempDir::new().unwrap();
    let registry = registry(&temp_dir);
    registry.ensure_default_book().unwrap();
    let storage = registry.open_active_storage().unwrap();
    let h = household(&storage);

    for (cents, day) in [(100, 1), (250, 9), (400, 10), (800, 28)] {
        spend(&storage, h.checking, h.groceries, cents, date(2025, 2, day));
    }

    let accounts = AccountService::new(&storage);
    let (a, b, c) = (date(2025, 2, 1), date(2025, 2, 10), date(2025, 3, 1));
    let left = accounts.balance(h.checking, a, b).unwrap();
    let right = accounts.balance(h.checking, b, c).unwrap();
    let whole = accounts.balance(h.checking, a, c).unwrap();

    assert_eq!(left.try_add(&right).unwrap(), whole);
    assert_eq!(whole, usd(-1550));
    assert_eq!(left, usd(-350));
}

#[test]
fn recurrence_periods_are_contiguous() {
    let cases = [
        Recurrence::new(PeriodType::Month, 1, date(2024, 1, 31)).unwrap(),
        Recurrence::new(PeriodType::Week, 2, date(2025, 1, 6)).unwrap(),
        Recurrence::new(PeriodType::Year, 1, date(2024, 2, 29)).unwrap(),
        Recurrence::new(PeriodType::Day, 3, date(2025, 12, 30)).unwrap(),
    ];

    for recurrence in cases {
        for i in -5..20 {
            let current = recurrence.period_bounds(i).unwrap();
            let next = recurrence.period_bounds(i + 1).unwrap();
            assert_eq!(current.end, next.start, "{} at {}", recurrence, i);
            assert!(current.start < current.end);
        }
    }
}

#[test]
fn zero_projection_reports_zero_ratio() {
    let temp_dir = TempDir::new().unwrap();
    let registry = registry(&temp_dir);
    registry.ensure_default_book().unwrap();
    let storage = registry.open_active_storage().unwrap();
    let h = household(&storage);
    spend(&storage, h.checking, h.groceries, 700, date(2025, 1, 3));

    let budgets = BudgetService::new(&storage);
    let budget = budgets
        .create(
            CreateBudgetInput::new("Zero", Recurrence::monthly(date(2025, 1, 1)))
                .amount(h.groceries, usd(0)),
        )
        .unwrap();

    let progress = budgets.period_progress(budget.id, h.groceries, 0).unwrap();
    assert_eq!(progress.ratio, Ratio::zero());
}

#[test]
fn exactly_one_active_book() {
    let temp_dir = TempDir::new().unwrap();
    let registry = registry(&temp_dir);
    let first = registry.ensure_default_book().unwrap();
    let second = registry.create_book("Business").unwrap();
    let third = registry.create_book("Rental").unwrap();

    for target in [second.id, second.id, third.id, first.id] {
        registry.set_active(target).unwrap();
        let active: Vec<_> = registry
            .list_books()
            .unwrap()
            .into_iter()
            .filter(|b| b.active)
            .collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, target);
    }

    // A fresh registry over the same directory sees the same state
    let reopened = self::registry(&temp_dir);
    assert_eq!(reopened.active_book().unwrap().unwrap().id, first.id);
}

#[test]
fn deleting_active_book_changes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let registry = registry(&temp_dir);
    let first = registry.ensure_default_book().unwrap();
    registry.create_book("Business").unwrap();

    let before = registry.list_books().unwrap();
    assert!(matches!(
        registry.delete_book(first.id),
        Err(TallyError::CannotDeleteActiveBook(_))
    ));
    assert_eq!(registry.list_books().unwrap(), before);
    assert!(registry.paths().book(first.id).is_initialized());
}

#[test]
fn books_are_isolated() {
    let temp_dir = TempDir::new().unwrap();
    let registry = registry(&temp_dir);
    registry.ensure_default_book().unwrap();
    let second = registry.create_book("Business").unwrap();

    let personal = registry.open_active_storage().unwrap();
    household(&personal);
    assert_eq!(personal.accounts.count().unwrap(), 5);

    registry.set_active(second.id).unwrap();
    let business = registry.open_active_storage().unwrap();
    assert_eq!(business.accounts.count().unwrap(), 1);
    assert_eq!(business.root_account_id(), second.root_account_id);
}

#[test]
fn concurrent_creates_keep_sibling_names_unique() {
    let temp_dir = TempDir::new().unwrap();
    let registry = registry(&temp_dir);
    registry.ensure_default_book().unwrap();
    let storage = registry.open_active_storage().unwrap();

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let storage = &storage;
                scope.spawn(move || {
                    AccountService::new(storage)
                        .create(CreateAccountInput::new("Savings", AccountType::Bank))
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, TallyError::DuplicateName { .. })));
    assert_eq!(storage.accounts.count().unwrap(), 2);
}
