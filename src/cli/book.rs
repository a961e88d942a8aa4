//! Book CLI commands

use clap::Subcommand;

use crate::books::BookRegistry;
use crate::display::format_book_list;
use crate::error::{TallyError, TallyResult};
use crate::models::Book;

/// Book subcommands
#[derive(Subcommand)]
pub enum BookCommands {
    /// List all books
    List,
    /// Create a new book
    Create {
        /// Display name (defaults to "Book N")
        name: Option<String>,
    },
    /// Make a book the active one
    Use {
        /// Book name or ID
        book: String,
    },
    /// Delete an inactive book and all of its data
    Delete {
        /// Book name or ID
        book: String,
    },
}

fn find_book(registry: &BookRegistry, identifier: &str) -> TallyResult<Book> {
    registry
        .find_book(identifier)?
        .ok_or_else(|| TallyError::book_not_found(identifier))
}

/// Handle a book command
pub fn handle_book_command(registry: &BookRegistry, cmd: BookCommands) -> TallyResult<()> {
    match cmd {
        BookCommands::List => {
            print!("{}", format_book_list(&registry.list_books()?));
        }

        BookCommands::Create { name } => {
            let book = registry.create_book(name.as_deref().unwrap_or(""))?;
            println!("Created book: {}", book.display_name);
            println!("  ID: {}", book.id);
            if book.active {
                println!("  This is now the active book.");
            }
        }

        BookCommands::Use { book } => {
            let found = find_book(registry, &book)?;
            let activated = registry.set_active(found.id)?;
            println!("Active book: {}", activated.display_name);
        }

        BookCommands::Delete { book } => {
            let found = find_book(registry, &book)?;
            let removed = registry.delete_book(found.id)?;
            println!("Deleted book: {}", removed.display_name);
        }
    }

    Ok(())
}
