use std::sync::Arc;

use folio_cache::{CacheStats, CachedStore};
use folio_store::{Collection, Entity, Registry, Schema, StoreConfig, Table};
use tracing::debug;

use crate::admin::{AdminSession, AdminUser};
use crate::audit::AuditLog;
use crate::book::Book;
use crate::clock;
use crate::error::ModelResult;
use crate::lookup::{BookMetadataCache, SentimentCache};
use crate::moderation::{Penalty, Report};
use crate::review::UserReview;
use crate::saved::SavedBook;
use crate::user::{User, UserCredentials};

/// Books are read far more often than written, so they go through a
/// read-through cache.
pub type BookStore = CachedStore<Table>;

/// Every collection of the book service, opened from one [`Registry`].
#[derive(Debug)]
pub struct Catalog {
    registry: Registry,
    pub users: Collection<User>,
    pub credentials: Collection<UserCredentials>,
    pub admins: Collection<AdminUser>,
    pub sessions: Collection<AdminSession>,
    pub books: Collection<Book, BookStore>,
    pub reviews: Collection<UserReview>,
    pub saved_books: Collection<SavedBook>,
    pub audit_log: Collection<AuditLog>,
    pub reports: Collection<Report>,
    pub penalties: Collection<Penalty>,
    pub sentiments: Collection<SentimentCache>,
    pub book_metadata: Collection<BookMetadataCache>,
}

/// Schemas of every entity type, in a stable order.
pub fn schemas() -> [&'static Schema; 12] {
    [
        User::schema(),
        UserCredentials::schema(),
        AdminUser::schema(),
        AdminSession::schema(),
        Book::schema(),
        UserReview::schema(),
        SavedBook::schema(),
        AuditLog::schema(),
        Report::schema(),
        Penalty::schema(),
        SentimentCache::schema(),
        BookMetadataCache::schema(),
    ]
}

/// The schema of the entity type named `name`, ignoring ASCII case.
pub fn schema_for(name: &str) -> Option<&'static Schema> {
    schemas()
        .into_iter()
        .find(|s| s.name().eq_ignore_ascii_case(name))
}

impl Catalog {
    pub fn open(config: StoreConfig) -> ModelResult<Self> {
        let registry = Registry::new(config);
        let book_table = registry.table(Book::schema())?;
        let books = CachedStore::from_config(book_table, &registry.config().cache);

        Ok(Self {
            users: collection(&registry)?,
            credentials: collection(&registry)?,
            admins: collection(&registry)?,
            sessions: collection(&registry)?,
            books: Collection::new(Arc::new(books))?,
            reviews: collection(&registry)?,
            saved_books: collection(&registry)?,
            audit_log: collection(&registry)?,
            reports: collection(&registry)?,
            penalties: collection(&registry)?,
            sentiments: collection(&registry)?,
            book_metadata: collection(&registry)?,
            registry,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn book_cache_stats(&self) -> ModelResult<CacheStats> {
        Ok(self.books.store().stats()?)
    }

    /// Resolve a metadata query to a stored book.
    ///
    /// A memoized answer whose book has since vanished is dropped. A query
    /// that is itself a book id resolves to that book.
    pub fn resolve_cached_book(&self, query: &str) -> ModelResult<Option<Book>> {
        if query.is_empty() {
            return Ok(None);
        }
        if let Some(book_id) = BookMetadataCache::cached_book_id(&self.book_metadata, query)? {
            if let Some(book) = self.books.get(book_id.as_str())? {
                return Ok(Some(book));
            }
            debug!(query, book_id = %book_id, "dropping stale metadata entry");
            self.book_metadata.delete_key(query)?;
        }
        Ok(self.books.get(query)?)
    }

    /// The administrator behind a live session token, renewing the session.
    ///
    /// Expired sessions, and sessions whose administrator is gone, are
    /// deleted.
    pub fn admin_for_session(&self, token: &str) -> ModelResult<Option<AdminUser>> {
        let now = clock::now_ns();
        let Some(mut session) = AdminSession::lookup(&self.sessions, token, now)? else {
            return Ok(None);
        };
        let Some(admin) = self.admins.get(session.admin_id.as_str())? else {
            self.sessions.delete(&session)?;
            return Ok(None);
        };
        session.renew(now);
        self.sessions.put(&session)?;
        Ok(Some(admin))
    }

    /// Start a session for `admin` and return it.
    pub fn create_admin_session(&self, admin: &AdminUser) -> ModelResult<AdminSession> {
        let token = self.sessions.generate_unique_primary_key()?;
        let session = AdminSession::new(token, admin.id.as_str(), clock::now_ns());
        self.sessions.post(&session)?;
        Ok(session)
    }
}

fn collection<E: Entity>(registry: &Registry) -> ModelResult<Collection<E>> {
    Ok(Collection::new(registry.table(E::schema())?)?)
}
