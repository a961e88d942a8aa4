//! Book registry
//!
//! Owns the catalog of books and the one open [`Storage`] handle of the
//! process. Switching the active book drops the cached handle; callers holding
//! an older `Arc<Storage>` keep a consistent view of the book they opened.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::audit::{AuditEntry, AuditLogger, EntityType};
use crate::config::paths::TallyPaths;
use crate::config::settings::Settings;
use crate::error::{TallyError, TallyResult};
use crate::models::{Book, BookId};
use crate::storage::{initialize_book_storage, Storage};

use super::catalog::BookCatalog;

type Session = Option<(BookId, Arc<Storage>)>;

/// Registry of all books under one base directory
pub struct BookRegistry {
    paths: TallyPaths,
    settings: Settings,
    catalog: BookCatalog,
    audit: AuditLogger,
    session: Mutex<Session>,
}

impl BookRegistry {
    /// Open the registry, creating the base layout if needed
    pub fn open(paths: TallyPaths, settings: Settings) -> TallyResult<Self> {
        paths.ensure_directories()?;

        let catalog = BookCatalog::new(paths.catalog_file());
        catalog.load()?;

        Ok(Self {
            audit: AuditLogger::new(paths.audit_log()),
            catalog,
            settings,
            paths,
            session: Mutex::new(None),
        })
    }

    pub fn paths(&self) -> &TallyPaths {
        &self.paths
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn session(&self) -> TallyResult<MutexGuard<'_, Session>> {
        self.session.lock().map_err(TallyError::lock_poisoned)
    }

    /// All books, oldest first
    pub fn list_books(&self) -> TallyResult<Vec<Book>> {
        self.catalog.list()
    }

    pub fn get_book(&self, id: BookId) -> TallyResult<Option<Book>> {
        self.catalog.get(id)
    }

    /// Find a book by display name (case-insensitive) or ID
    pub fn find_book(&self, identifier: &str) -> TallyResult<Option<Book>> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Ok(None);
        }
        let wanted = identifier.to_lowercase();
        let books = self.catalog.list()?;
        if let Some(book) = books
            .iter()
            .find(|b| b.display_name.to_lowercase() == wanted)
        {
            return Ok(Some(book.clone()));
        }
        Ok(books.into_iter().find(|b| b.id.matches(identifier)))
    }

    pub fn active_book(&self) -> TallyResult<Option<Book>> {
        self.catalog.active()
    }

    /// First free name of the form "Book N"
    pub fn generate_default_book_name(&self) -> TallyResult<String> {
        let mut n = self.catalog.list()?.len() + 1;
        loop {
            let name = format!("Book {}", n);
            if !self.catalog.name_exists(&name)? {
                return Ok(name);
            }
            n += 1;
        }
    }

    /// Create a book with a fresh storage directory
    ///
    /// The first book becomes active. A blank name gets a generated one.
    pub fn create_book(&self, name: &str) -> TallyResult<Book> {
        let name = match name.trim() {
            "" => self.generate_default_book_name()?,
            trimmed => trimmed.to_string(),
        };

        let id = BookId::new();
        let book_paths = self.paths.book(id);
        let root = initialize_book_storage(&book_paths, &self.settings.default_commodity)?;

        let book = match self.catalog.insert(Book::new(id, &name, root.id)) {
            Ok(book) => book,
            Err(e) => {
                if let Err(cleanup) = std::fs::remove_dir_all(book_paths.dir()) {
                    warn!(
                        book = %id,
                        error = %cleanup,
                        "Failed to remove storage of unregistered book"
                    );
                }
                return Err(e);
            }
        };

        info!(book = %book.id, name = %book.display_name, active = book.active, "Created book");
        self.audit.record(&AuditEntry::create(
            EntityType::Book,
            book.id.to_string(),
            Some(book.display_name.clone()),
            &book,
        ));

        Ok(book)
    }

    /// Create the first book when the catalog is empty
    pub fn ensure_default_book(&self) -> TallyResult<Book> {
        if let Some(active) = self.catalog.active()? {
            return Ok(active);
        }
        self.create_book("")
    }

    /// Make `id` the active book and close the cached storage
    pub fn set_active(&self, id: BookId) -> TallyResult<Book> {
        let before = self
            .catalog
            .get(id)?
            .ok_or_else(|| TallyError::book_not_found(id.to_string()))?;

        let (book, changed) = self.catalog.activate(id)?;
        if !changed {
            return Ok(book);
        }

        *self.session()? = None;

        info!(book = %book.id, name = %book.display_name, "Switched active book");
        self.audit.record(&AuditEntry::update(
            EntityType::Book,
            book.id.to_string(),
            Some(book.display_name.clone()),
            &before,
            &book,
        ));

        Ok(book)
    }

    /// Delete an inactive book and its storage directory
    pub fn delete_book(&self, id: BookId) -> TallyResult<Book> {
        let removed = self.catalog.remove(id)?;

        // The book is unregistered at this point; leftover files are only reported
        let dir = self.paths.book(id).dir().to_path_buf();
        if dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                warn!(
                    book = %removed.id,
                    dir = %dir.display(),
                    error = %e,
                    "Failed to remove storage of deleted book"
                );
            }
        }

        info!(book = %removed.id, name = %removed.display_name, "Deleted book");
        self.audit.record(&AuditEntry::delete(
            EntityType::Book,
            removed.id.to_string(),
            Some(removed.display_name.clone()),
            &removed,
        ));

        Ok(removed)
    }

    /// Storage of the active book, opened once and then shared
    pub fn open_active_storage(&self) -> TallyResult<Arc<Storage>> {
        let active = self
            .catalog
            .active()?
            .ok_or_else(|| TallyError::book_not_found("active book"))?;

        let mut session = self.session()?;
        if let Some((id, storage)) = session.as_ref() {
            if *id == active.id {
                return Ok(Arc::clone(storage));
            }
        }

        let storage = Arc::new(Storage::open(self.paths.book(active.id))?);
        debug!(book = %active.id, "Opened active book");
        *session = Some((active.id, Arc::clone(&storage)));
        Ok(storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_registry() -> (TempDir, BookRegistry) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        let registry = BookRegistry::open(paths, Settings::default()).unwrap();
        (temp_dir, registry)
    }

    #[test]
    fn test_bootstrap_creates_book_one() {
        let (_temp_dir, registry) = create_test_registry();
        assert!(matches!(
            registry.open_active_storage(),
            Err(TallyError::NotFound { .. })
        ));

        let book = registry.ensure_default_book().unwrap();
        assert_eq!(book.display_name, "Book 1");
        assert!(book.active);

        let again = registry.ensure_default_book().unwrap();
        assert_eq!(again.id, book.id);
        assert_eq!(registry.list_books().unwrap().len(), 1);
    }

    #[test]
    fn test_create_book_storage_and_names() {
        let (_temp_dir, registry) = create_test_registry();
        let first = registry.create_book("Personal").unwrap();
        let second = registry.create_book("").unwrap();

        assert_eq!(second.display_name, "Book 2");
        assert!(!second.active);
        assert!(registry.paths().book(second.id).is_initialized());
        assert!(matches!(
            registry.create_book("personal"),
            Err(TallyError::DuplicateName { .. })
        ));

        let storage = registry.open_active_storage().unwrap();
        assert_eq!(storage.root_account_id(), first.root_account_id);
    }

    #[test]
    fn test_set_active_switches_session() {
        let (_temp_dir, registry) = create_test_registry();
        let first = registry.create_book("Personal").unwrap();
        let second = registry.create_book("Business").unwrap();

        let a = registry.open_active_storage().unwrap();
        let b = registry.open_active_storage().unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        registry.set_active(second.id).unwrap();
        registry.set_active(second.id).unwrap();

        let books = registry.list_books().unwrap();
        assert_eq!(books.iter().filter(|b| b.active).count(), 1);
        assert_eq!(registry.active_book().unwrap().unwrap().id, second.id);

        let c = registry.open_active_storage().unwrap();
        assert_eq!(c.root_account_id(), second.root_account_id);
        assert_ne!(c.root_account_id(), first.root_account_id);

        assert!(registry.set_active(BookId::new()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_book() {
        let (_temp_dir, registry) = create_test_registry();
        let first = registry.create_book("Personal").unwrap();
        let second = registry.create_book("Business").unwrap();

        assert!(matches!(
            registry.delete_book(first.id),
            Err(TallyError::CannotDeleteActiveBook(_))
        ));
        assert_eq!(registry.list_books().unwrap().len(), 2);

        registry.delete_book(second.id).unwrap();
        assert!(!registry.paths().book(second.id).dir().exists());
        assert_eq!(registry.list_books().unwrap().len(), 1);
        assert!(registry.delete_book(second.id).unwrap_err().is_not_found());

        let audit = AuditLogger::new(registry.paths().audit_log());
        assert_eq!(audit.read_all().unwrap().len(), 3);
    }

    #[test]
    fn test_open_on_unusable_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("tally");
        std::fs::write(&file, "").unwrap();

        let result = BookRegistry::open(TallyPaths::with_base_dir(file), Settings::default());
        assert!(matches!(result, Err(TallyError::StorageUnavailable(_))));
    }

    #[test]
    fn test_book_changes_survive_unwritable_audit_log() {
        let (temp_dir, registry) = create_test_registry();
        std::fs::create_dir(registry.paths().audit_log()).unwrap();

        let first = registry.create_book("Personal").unwrap();
        let second = registry.create_book("Business").unwrap();
        registry.set_active(second.id).unwrap();
        registry.delete_book(first.id).unwrap();

        let reopened = BookRegistry::open(
            TallyPaths::with_base_dir(temp_dir.path().to_path_buf()),
            Settings::default(),
        )
        .unwrap();
        let books = reopened.list_books().unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, second.id);
        assert!(books[0].active);
    }

    #[test]
    fn test_duplicate_book_leaves_no_storage() {
        let (_temp_dir, registry) = create_test_registry();
        registry.create_book("Personal").unwrap();

        assert!(matches!(
            registry.create_book("personal"),
            Err(TallyError::DuplicateName { .. })
        ));
        let dirs = std::fs::read_dir(registry.paths().books_dir()).unwrap().count();
        assert_eq!(dirs, 1);
    }

    #[test]
    fn test_find_book() {
        let (_temp_dir, registry) = create_test_registry();
        let book = registry.create_book("Personal").unwrap();

        assert_eq!(registry.find_book("personal").unwrap().unwrap().id, book.id);
        assert_eq!(
            registry.find_book(&book.id.to_string()).unwrap().unwrap().id,
            book.id
        );
        assert!(registry.find_book("nope").unwrap().is_none());
    }
}
