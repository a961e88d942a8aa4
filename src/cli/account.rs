//! Account CLI commands

use chrono::NaiveDate;
use clap::Subcommand;

use super::{find_account, parse_commodity, parse_date};
use crate::display::{format_account_details, format_account_tree};
use crate::error::{TallyError, TallyResult};
use crate::models::AccountType;
use crate::services::{AccountService, CreateAccountInput};
use crate::storage::Storage;

/// Account subcommands
#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new account
    Create {
        /// Account name (without the parent path)
        name: String,
        /// Account type (bank, cash, credit, asset, liability, income, expense, equity, ...)
        #[arg(short = 't', long = "type", default_value = "asset")]
        account_type: String,
        /// Parent account full name or ID (defaults to the top level)
        #[arg(short, long)]
        parent: Option<String>,
        /// Commodity code (defaults to the parent's)
        #[arg(short, long)]
        commodity: Option<String>,
        /// Grouping account that cannot hold splits
        #[arg(long)]
        placeholder: bool,
        /// Free-form description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Show the account tree with balances
    List,
    /// Show account details
    Show {
        /// Account full name, unique name or ID
        account: String,
    },
    /// Show the balance of an account and its sub-accounts
    Balance {
        /// Account full name, unique name or ID
        account: String,
        /// First day included (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// First day excluded (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },
    /// Move an account under another parent
    Move {
        /// Account to move
        account: String,
        /// New parent (omit to move to the top level)
        parent: Option<String>,
    },
}

/// Handle an account command
pub fn handle_account_command(storage: &Storage, cmd: AccountCommands) -> TallyResult<()> {
    let service = AccountService::new(storage);

    match cmd {
        AccountCommands::Create {
            name,
            account_type,
            parent,
            commodity,
            placeholder,
            description,
        } => {
            let account_type = AccountType::parse(&account_type).ok_or_else(|| {
                TallyError::Validation(format!("Invalid account type: '{}'", account_type))
            })?;

            let mut input = CreateAccountInput::new(name, account_type);
            if let Some(parent) = parent {
                input = input.parent(find_account(&service, &parent)?.id);
            }
            if let Some(code) = commodity {
                input = input.commodity(parse_commodity(&code)?);
            }
            if placeholder {
                input = input.placeholder();
            }
            input.description = description;

            let account = service.create(input)?;
            println!("Created account: {}", service.full_name(account.id)?);
            println!("  Type:      {}", account.account_type);
            println!("  Commodity: {}", account.commodity.code);
            println!("  ID:        {}", account.id);
        }

        AccountCommands::List => {
            let mut rows = Vec::new();
            for node in service.tree()? {
                let balance = service.balance(node.account.id, NaiveDate::MIN, NaiveDate::MAX)?;
                rows.push((node, balance));
            }
            print!("{}", format_account_tree(&rows));
        }

        AccountCommands::Show { account } => {
            let found = find_account(&service, &account)?;
            let balance = service.balance(found.id, NaiveDate::MIN, NaiveDate::MAX)?;
            let count = service.transactions(found.id)?.len();
            print!(
                "{}",
                format_account_details(&found, &service.full_name(found.id)?, &balance, count)
            );
        }

        AccountCommands::Balance { account, from, to } => {
            let found = find_account(&service, &account)?;
            let start = from.as_deref().map(parse_date).transpose()?.unwrap_or(NaiveDate::MIN);
            let end = to.as_deref().map(parse_date).transpose()?.unwrap_or(NaiveDate::MAX);
            let balance = service.balance(found.id, start, end)?;
            println!("{}: {}", service.full_name(found.id)?, balance);
        }

        AccountCommands::Move { account, parent } => {
            let found = find_account(&service, &account)?;
            let new_parent = match parent {
                Some(parent) => find_account(&service, &parent)?.id,
                None => storage.root_account_id(),
            };
            let moved = service.reparent(found.id, new_parent)?;
            println!("Moved account to: {}", service.full_name(moved.id)?);
        }
    }

    Ok(())
}
