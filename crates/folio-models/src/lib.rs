//! Domain entities of the Folio book service.
//!
//! Each entity is a plain struct implementing [`Entity`](folio_store::Entity)
//! with an explicit schema; its table is `<data_dir>/<TypeName>.csv`.
//! [`Catalog`] opens every collection from one configuration, with books
//! served through a read-through cache.
//!
//! Operations that span one collection are associated functions taking that
//! collection, e.g. [`SavedBook::save_for_user`]. Operations spanning several
//! live on [`Catalog`].

mod schema;

pub mod admin;
pub mod audit;
pub mod book;
pub mod catalog;
pub mod clock;
pub mod error;
pub mod import;
pub mod lookup;
pub mod moderation;
pub mod review;
pub mod saved;
pub mod user;

pub use admin::{AdminSession, AdminUser, SESSION_DURATION_NS, SESSION_MAX_DURATION_NS};
pub use audit::AuditLog;
pub use book::Book;
pub use catalog::{schema_for, schemas, BookStore, Catalog};
pub use error::{ModelError, ModelResult};
pub use import::{import_book_crossing, ImportSummary};
pub use lookup::{BookMetadataCache, SentimentCache};
pub use moderation::{Penalty, Report};
pub use review::UserReview;
pub use saved::SavedBook;
pub use user::{User, UserCredentials};
