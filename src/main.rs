use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use tally::books::BookRegistry;
use tally::cli::{
    handle_account_command, handle_book_command, handle_budget_command,
    handle_transaction_command, AccountCommands, BookCommands, BudgetCommands,
    TransactionCommands,
};
use tally::config::{paths::TallyPaths, settings::Settings};
use tally::logging;

#[derive(Parser)]
#[command(
    name = "tally",
    version,
    about = "Multi-book, multi-currency double-entry bookkeeping",
    long_about = "Tally keeps one or more isolated ledgers (books). Each book has an \
                  account tree, balanced multi-split transactions and recurring \
                  budgets, stored as JSON under the data directory."
)]
struct Cli {
    /// Base directory holding the settings, catalog and books
    #[arg(long, global = true, env = "TALLY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Book management commands
    #[command(subcommand)]
    Book(BookCommands),

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Transaction management commands
    #[command(subcommand, alias = "txn")]
    Transaction(TransactionCommands),

    /// Budget management commands
    #[command(subcommand)]
    Budget(BudgetCommands),

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = match cli.data_dir {
        Some(dir) => TallyPaths::with_base_dir(dir),
        None => TallyPaths::new()?,
    };
    let settings = Settings::load_or_create(&paths)?;
    logging::init_tracing(&settings.log_filter);

    let registry = BookRegistry::open(paths, settings)?;
    registry.ensure_default_book()?;

    match cli.command {
        Some(Commands::Book(cmd)) => {
            handle_book_command(&registry, cmd)?;
        }
        Some(Commands::Account(cmd)) => {
            let storage = registry.open_active_storage()?;
            handle_account_command(&storage, cmd)?;
        }
        Some(Commands::Transaction(cmd)) => {
            let storage = registry.open_active_storage()?;
            handle_transaction_command(&storage, cmd)?;
        }
        Some(Commands::Budget(cmd)) => {
            let storage = registry.open_active_storage()?;
            handle_budget_command(&storage, registry.settings(), cmd)?;
        }
        Some(Commands::Config) => {
            let paths = registry.paths();
            let settings = registry.settings();
            if !paths.settings_file().exists() {
                settings.save(paths)?;
            }

            println!("Tally Configuration");
            println!("===================");
            println!("Data directory:   {}", paths.base_dir().display());
            println!("Settings file:    {}", paths.settings_file().display());
            println!("Book catalog:     {}", paths.catalog_file().display());
            if let Some(book) = registry.active_book()? {
                println!("Active book:      {} ({})", book.display_name, book.id);
            }
            println!();
            println!("Settings:");
            println!("  Default commodity:      {}", settings.default_commodity.code);
            println!("  Budget period fallback: {}", settings.budget_period_fallback);
            println!("  Date format:            {}", settings.date_format);
            println!("  Log filter:             {}", settings.log_filter);
        }
        None => {
            println!("Tally - double-entry bookkeeping");
            println!();
            println!("Run 'tally --help' for usage information.");
        }
    }

    Ok(())
}
