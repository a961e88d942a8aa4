//! Transaction CLI commands

use clap::Subcommand;

use super::{
    account_names, find_account, parse_commodity, parse_date, parse_date_or_today, parse_money,
    split_assignment,
};
use crate::display::{format_transaction_details, format_transaction_register};
use crate::error::{TallyError, TallyResult};
use crate::models::Transaction;
use crate::services::{
    AccountService, PostTransactionInput, SplitInput, TransactionFilter, TransactionService,
};
use crate::storage::Storage;

/// Transaction subcommands
#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Post a balanced transaction
    Post {
        /// Description
        description: String,
        /// A split as ACCOUNT=AMOUNT, or ACCOUNT=AMOUNT@QUANTITY when the
        /// account holds another commodity (repeat for each split)
        #[arg(short, long = "split", required = true)]
        splits: Vec<String>,
        /// Transaction date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
        /// Transaction currency (defaults to the first split's account)
        #[arg(short, long)]
        currency: Option<String>,
        /// Notes
        #[arg(short, long)]
        notes: Option<String>,
    },
    /// List transactions
    List {
        /// Only transactions touching this account
        #[arg(short, long)]
        account: Option<String>,
        /// First day included (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// First day excluded (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        /// Number of most recent transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Show one transaction with its splits
    Show {
        /// Transaction ID
        id: String,
    },
    /// Delete a transaction and its splits
    Delete {
        /// Transaction ID
        id: String,
    },
}

fn find_transaction(service: &TransactionService, id: &str) -> TallyResult<Transaction> {
    service
        .find(id)?
        .ok_or_else(|| TallyError::transaction_not_found(id))
}

/// Handle a transaction command
pub fn handle_transaction_command(storage: &Storage, cmd: TransactionCommands) -> TallyResult<()> {
    let accounts = AccountService::new(storage);
    let service = TransactionService::new(storage);

    match cmd {
        TransactionCommands::Post {
            description,
            splits,
            date,
            currency,
            notes,
        } => {
            let date = parse_date_or_today(date.as_deref())?;

            let mut resolved = Vec::new();
            for arg in &splits {
                let (account, value) = split_assignment(arg)?;
                resolved.push((find_account(&accounts, account)?, value));
            }

            let commodity = match currency {
                Some(code) => parse_commodity(&code)?,
                None => match resolved.first() {
                    Some((account, _)) => account.commodity.clone(),
                    None => return Err(TallyError::Validation("No splits given".into())),
                },
            };

            let mut input = PostTransactionInput::new(description, date);
            input.commodity = Some(commodity.clone());
            input.notes = notes;
            for (account, value) in resolved {
                let split = match value.split_once('@') {
                    Some((amount, quantity)) => {
                        SplitInput::new(account.id, parse_money(amount.trim(), &commodity)?)
                            .quantity(parse_money(quantity.trim(), &account.commodity)?)
                    }
                    None => SplitInput::new(account.id, parse_money(value, &commodity)?),
                };
                input = input.split(split);
            }

            let txn = service.post(input)?;
            println!("Posted transaction: {}", txn);
            println!("  ID: {}", txn.id);
        }

        TransactionCommands::List {
            account,
            from,
            to,
            limit,
        } => {
            let mut filter = TransactionFilter::new().limit(limit);
            if let Some(account) = account {
                filter = filter.account(find_account(&accounts, &account)?.id);
            }
            filter.start_date = from.as_deref().map(parse_date).transpose()?;
            filter.end_date = to.as_deref().map(parse_date).transpose()?;

            let transactions = service.list(filter)?;
            print!(
                "{}",
                format_transaction_register(&transactions, &account_names(&accounts)?)
            );
        }

        TransactionCommands::Show { id } => {
            let txn = find_transaction(&service, &id)?;
            print!(
                "{}",
                format_transaction_details(&txn, &account_names(&accounts)?)
            );
        }

        TransactionCommands::Delete { id } => {
            let txn = find_transaction(&service, &id)?;
            let removed = service.delete(txn.id)?;
            println!("Deleted transaction: {}", removed);
        }
    }

    Ok(())
}
