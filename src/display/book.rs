//! Book display formatting

use crate::models::Book;

/// Format the book catalog, marking the active book
pub fn format_book_list(books: &[Book]) -> String {
    if books.is_empty() {
        return "No books found.\n".to_string();
    }

    let name_width = books
        .iter()
        .map(|b| b.display_name.chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    for book in books {
        output.push_str(&format!(
            "{} {:<name_width$}  {}  created {}\n",
            if book.active { "*" } else { " " },
            book.display_name,
            book.id,
            book.created_at.format("%Y-%m-%d"),
            name_width = name_width,
        ));
    }
    output
}
