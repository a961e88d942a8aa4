//! Book catalog
//!
//! `books.json` lists every book and marks the active one. Every mutation is
//! applied in memory and written with one atomic replace while the write lock
//! is held; a failed write restores the previous list.

use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{TallyError, TallyResult};
use crate::models::{Book, BookId};
use crate::storage::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogData {
    books: Vec<Book>,
}

/// In-memory copy of `books.json`
pub struct BookCatalog {
    path: PathBuf,
    data: RwLock<Vec<Book>>,
}

impl BookCatalog {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(Vec::new()),
        }
    }

    fn read(&self) -> TallyResult<RwLockReadGuard<'_, Vec<Book>>> {
        self.data.read().map_err(TallyError::lock_poisoned)
    }

    fn write(&self) -> TallyResult<RwLockWriteGuard<'_, Vec<Book>>> {
        self.data.write().map_err(TallyError::lock_poisoned)
    }

    fn persist(&self, books: &[Book]) -> TallyResult<()> {
        write_json_atomic(
            &self.path,
            &CatalogData {
                books: books.to_vec(),
            },
        )
    }

    /// Load the catalog, repairing the active flag if needed
    ///
    /// A catalog with books but none active gets its oldest book activated; one
    /// with several active keeps only the first.
    pub fn load(&self) -> TallyResult<()> {
        let CatalogData { mut books } = read_json(&self.path)?;
        books.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        let active: Vec<usize> = books
            .iter()
            .enumerate()
            .filter(|(_, b)| b.active)
            .map(|(i, _)| i)
            .collect();

        let repaired = match active.as_slice() {
            [] if !books.is_empty() => {
                warn!(book = %books[0].id, "No active book in catalog; activating the oldest");
                books[0].set_active(true);
                true
            }
            [_first, rest @ ..] if !rest.is_empty() => {
                warn!(count = active.len(), "Several active books in catalog; keeping the first");
                for &i in rest {
                    books[i].set_active(false);
                }
                true
            }
            _ => false,
        };

        if repaired {
            self.persist(&books)?;
        }

        *self.write()? = books;
        Ok(())
    }

    /// All books, oldest first
    pub fn list(&self) -> TallyResult<Vec<Book>> {
        Ok(self.read()?.clone())
    }

    pub fn get(&self, id: BookId) -> TallyResult<Option<Book>> {
        Ok(self.read()?.iter().find(|b| b.id == id).cloned())
    }

    pub fn active(&self) -> TallyResult<Option<Book>> {
        Ok(self.read()?.iter().find(|b| b.active).cloned())
    }

    pub fn is_empty(&self) -> TallyResult<bool> {
        Ok(self.read()?.is_empty())
    }

    pub fn name_exists(&self, name: &str) -> TallyResult<bool> {
        let name = name.trim().to_lowercase();
        Ok(self
            .read()?
            .iter()
            .any(|b| b.display_name.to_lowercase() == name))
    }

    /// Append a book; the first book in the catalog is made active
    ///
    /// Display names are unique (case-insensitive).
    pub fn insert(&self, mut book: Book) -> TallyResult<Book> {
        let mut books = self.write()?;
        if books.iter().any(|b| b.id == book.id) {
            return Err(TallyError::Validation(format!("Book {} already exists", book.id)));
        }
        let name = book.display_name.trim().to_lowercase();
        if books.iter().any(|b| b.display_name.to_lowercase() == name) {
            return Err(TallyError::DuplicateName {
                entity_type: "Book",
                name: book.display_name,
            });
        }
        book.set_active(books.is_empty());
        books.push(book.clone());

        if let Err(e) = self.persist(&books) {
            books.pop();
            return Err(e);
        }

        Ok(book)
    }

    /// Make `id` the only active book
    ///
    /// Returns the activated book and whether anything changed.
    pub fn activate(&self, id: BookId) -> TallyResult<(Book, bool)> {
        let mut books = self.write()?;
        let target = books
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| TallyError::book_not_found(id.to_string()))?;

        if books[target].active && books.iter().filter(|b| b.active).count() == 1 {
            return Ok((books[target].clone(), false));
        }

        let previous = books.clone();
        for (i, book) in books.iter_mut().enumerate() {
            book.set_active(i == target);
        }

        if let Err(e) = self.persist(&books) {
            *books = previous;
            return Err(e);
        }

        Ok((books[target].clone(), true))
    }

    /// Remove an inactive book
    pub fn remove(&self, id: BookId) -> TallyResult<Book> {
        let mut books = self.write()?;
        let index = books
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| TallyError::book_not_found(id.to_string()))?;

        if books[index].active {
            return Err(TallyError::CannotDeleteActiveBook(
                books[index].display_name.clone(),
            ));
        }

        let removed = books.remove(index);
        if let Err(e) = self.persist(&books) {
            books.insert(index, removed);
            return Err(e);
        }

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountId;
    use tempfile::TempDir;

    fn create_test_catalog() -> (TempDir, BookCatalog) {
        let temp_dir = TempDir::new().unwrap();
        let catalog = BookCatalog::new(temp_dir.path().join("books.json"));
        catalog.load().unwrap();
        (temp_dir, catalog)
    }

    fn book(name: &str) -> Book {
        Book::new(BookId::new(), name, AccountId::new())
    }

    #[test]
    fn test_first_book_is_active() {
        let (_temp_dir, catalog) = create_test_catalog();
        let first = catalog.insert(book("Personal")).unwrap();
        let second = catalog.insert(book("Business")).unwrap();

        assert!(first.active);
        assert!(!second.active);
        assert_eq!(catalog.active().unwrap().unwrap().id, first.id);
        assert!(catalog.name_exists("personal").unwrap());
        assert!(matches!(
            catalog.insert(book("PERSONAL")),
            Err(TallyError::DuplicateName { .. })
        ));
        assert_eq!(catalog.list().unwrap().len(), 2);
    }

    #[test]
    fn test_activate_is_exclusive_and_idempotent() {
        let (temp_dir, catalog) = create_test_catalog();
        let first = catalog.insert(book("Personal")).unwrap();
        let second = catalog.insert(book("Business")).unwrap();

        let (_, changed) = catalog.activate(second.id).unwrap();
        assert!(changed);
        let (_, changed) = catalog.activate(second.id).unwrap();
        assert!(!changed);

        let reloaded = BookCatalog::new(temp_dir.path().join("books.json"));
        reloaded.load().unwrap();
        let active: Vec<_> = reloaded
            .list()
            .unwrap()
            .into_iter()
            .filter(|b| b.active)
            .collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.id);
        assert!(!reloaded.get(first.id).unwrap().unwrap().active);
    }

    #[test]
    fn test_remove_active_is_refused() {
        let (_temp_dir, catalog) = create_test_catalog();
        let first = catalog.insert(book("Personal")).unwrap();
        let second = catalog.insert(book("Business")).unwrap();

        assert!(matches!(
            catalog.remove(first.id),
            Err(TallyError::CannotDeleteActiveBook(_))
        ));
        assert_eq!(catalog.list().unwrap().len(), 2);

        catalog.remove(second.id).unwrap();
        assert!(catalog.remove(second.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_load_repairs_missing_active_flag() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("books.json");
        let books = vec![book("One"), book("Two")];
        write_json_atomic(&path, &CatalogData { books }).unwrap();

        let catalog = BookCatalog::new(path);
        catalog.load().unwrap();
        assert_eq!(catalog.active().unwrap().unwrap().display_name, "One");
    }
}
