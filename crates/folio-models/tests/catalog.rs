use std::collections::BTreeMap;
use std::fs;

use folio_models::{
    import_book_crossing, schema_for, AdminSession, AdminUser, AuditLog, Book, BookMetadataCache,
    Catalog, ModelError, Penalty, Report, SavedBook, SentimentCache, UserReview,
};
use folio_store::{Entity, StoreConfig};

fn catalog(dir: &tempfile::TempDir) -> Catalog {
    let config = StoreConfig::with_data_dir(dir.path())
        .with_env_vars([("FOLIO_SYNC_WRITES", "false"), ("BOOK_CACHE_MAX_ENTRIES", "16")]);
    Catalog::open(config).unwrap()
}

fn dracula() -> Book {
    Book::new("b1", "Dracula", vec!["Bram Stoker".into()])
}

#[test]
fn books_go_through_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = catalog(&dir);
    assert_eq!(catalog.book_cache_stats().unwrap().max_entries, 16);

    catalog.books.put(&dracula()).unwrap();
    assert_eq!(catalog.books.get("b1").unwrap(), Some(dracula()));
    assert_eq!(catalog.books.get("b1").unwrap(), Some(dracula()));

    let stats = catalog.book_cache_stats().unwrap();
    assert_eq!((stats.hits, stats.misses), (2, 0));

    catalog.books.delete(&dracula()).unwrap();
    assert_eq!(catalog.books.get("b1").unwrap(), None);
}

#[test]
fn title_search_is_fuzzy() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = catalog(&dir);
    catalog
        .books
        .put(&Book::new("f", "Frankenstein; or, The Modern Prometheus", vec!["Mary Shelley".into()]))
        .unwrap();
    catalog.books.put(&dracula()).unwrap();

    let found = Book::search_by_title(&catalog.books, "modern frankenstein").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "f");
}

#[test]
fn saved_books_are_unique_per_user_and_book() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = catalog(&dir);

    let first = SavedBook::save_for_user(&catalog.saved_books, "u1", "b1").unwrap();
    let again = SavedBook::save_for_user(&catalog.saved_books, "u1", "b1").unwrap();
    assert_eq!(first, again);
    SavedBook::save_for_user(&catalog.saved_books, "u1", "b2").unwrap();
    SavedBook::save_for_user(&catalog.saved_books, "u2", "b1").unwrap();

    assert_eq!(SavedBook::saved_for_user(&catalog.saved_books, "u1").unwrap().len(), 2);

    SavedBook::remove_for_user(&catalog.saved_books, "u1", "b1").unwrap();
    SavedBook::remove_for_user(&catalog.saved_books, "u1", "b1").unwrap();
    let left = SavedBook::saved_for_user(&catalog.saved_books, "u1").unwrap();
    assert_eq!(left, vec![SavedBook::new("u1", "b2")]);
}

#[test]
fn reviews_by_book_and_user() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = catalog(&dir);
    for (user, book, rating) in [("u1", "b1", 4.0), ("u2", "b1", 2.5), ("u1", "b2", 5.0)] {
        catalog.reviews.post(&UserReview::new(user, book, rating)).unwrap();
    }
    assert_eq!(UserReview::for_book(&catalog.reviews, "b1").unwrap().len(), 2);
    let mine = UserReview::for_user(&catalog.reviews, "u1").unwrap();
    assert_eq!(mine.iter().map(|r| r.rating).sum::<f64>(), 9.0);
}

#[test]
fn stale_metadata_entries_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = catalog(&dir);
    catalog.books.put(&dracula()).unwrap();

    BookMetadataCache::upsert(&catalog.book_metadata, "stoker vampire", "b1").unwrap();
    BookMetadataCache::upsert(&catalog.book_metadata, "lost novel", "gone").unwrap();

    assert_eq!(catalog.resolve_cached_book("stoker vampire").unwrap(), Some(dracula()));
    assert_eq!(catalog.resolve_cached_book("lost novel").unwrap(), None);
    assert!(!catalog.book_metadata.exists("lost novel").unwrap());

    // A query that is itself a book id.
    assert_eq!(catalog.resolve_cached_book("b1").unwrap(), Some(dracula()));
    assert_eq!(catalog.resolve_cached_book("").unwrap(), None);
}

#[test]
fn sentiment_upsert_replaces() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = catalog(&dir);
    let scores = BTreeMap::from([("positive".to_string(), 0.75), ("negative".to_string(), 0.25)]);

    SentimentCache::upsert(&catalog.sentiments, "b1", "mixed", 0.1, scores.clone(), 3).unwrap();
    SentimentCache::upsert(&catalog.sentiments, "b1", "positive", 0.8, scores.clone(), 4).unwrap();

    let cached = SentimentCache::get_cached(&catalog.sentiments, "b1").unwrap().unwrap();
    assert_eq!(cached.sentiment, "positive");
    assert_eq!(cached.review_count, 4);
    assert_eq!(cached.scores, scores);
    assert_eq!(catalog.sentiments.count().unwrap(), 1);
}

#[test]
fn admin_sessions_resolve_and_expire() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = catalog(&dir);
    let admin = AdminUser {
        id: "a1".into(),
        display_name: "Root".into(),
        email: "root@example.com".into(),
        password: "hash".into(),
    };
    catalog.admins.put(&admin).unwrap();

    let session = catalog.create_admin_session(&admin).unwrap();
    assert_eq!(catalog.admin_for_session(&session.session_id).unwrap(), Some(admin.clone()));
    assert_eq!(catalog.admin_for_session("bogus").unwrap(), None);

    let stale = AdminSession::new("old", "a1", 0);
    catalog.sessions.put(&stale).unwrap();
    assert_eq!(catalog.admin_for_session("old").unwrap(), None);
    assert!(!catalog.sessions.exists("old").unwrap());

    catalog.admins.delete(&admin).unwrap();
    assert_eq!(catalog.admin_for_session(&session.session_id).unwrap(), None);
    assert!(!catalog.sessions.exists(session.session_id.as_str()).unwrap());
}

#[test]
fn minted_ids_for_audit_reports_and_penalties() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = catalog(&dir);

    let entry = AuditLog::record(&catalog.audit_log, "a1", "ban", Some("u9")).unwrap();
    assert_eq!(entry.id.len(), 32);
    assert_eq!(catalog.audit_log.get(entry.id.as_str()).unwrap(), Some(entry));

    let report = Report::file(&catalog.reports, "r1", "u1", "spam", "buy now").unwrap();
    assert!(catalog.reports.exists(report.id.as_str()).unwrap());

    let penalty = Penalty::issue(&catalog.penalties, "u1", "mute", "spam", 3).unwrap();
    assert_eq!(catalog.penalties.get(penalty.id.as_str()).unwrap(), Some(penalty));
    let err = Penalty::issue(&catalog.penalties, "u1", "mute", "spam", 0).unwrap_err();
    assert!(matches!(err, ModelError::Invalid { field: "duration_days", .. }));
}

#[test]
fn imports_book_crossing_files() {
    let dir = tempfile::tempdir().unwrap();
    let source = tempfile::tempdir().unwrap();
    fs::write(
        source.path().join("BX_Books.csv"),
        concat!(
            "\"ISBN\";\"Book-Title\";\"Book-Author\"\n",
            "\"0195153448\";\"Classical Mythology\";\"Mark P. O. Morford\"\n",
            "\"0002005018\";\"Clara Callan\";\"Richard Bruce Wright\"\n",
            "garbage\n",
            "\"0195153448\";\"Duplicate\";\"Someone\"\n",
        ),
    )
    .unwrap();
    fs::write(
        source.path().join("BX-Book-Ratings.csv"),
        concat!(
            "\"User-ID\";\"ISBN\";\"Book-Rating\"\n",
            "\"276725\";\"0195153448\";\"0\"\n",
            "\"276726\";\"0195153448\";\"5\"\n",
        ),
    )
    .unwrap();

    let catalog = catalog(&dir);
    let summary = import_book_crossing(&catalog, source.path()).unwrap();
    assert_eq!(summary.books_read, 3);
    assert_eq!(summary.books_inserted, 2);
    assert_eq!(summary.reviews_inserted, 2);
    assert_eq!(summary.skipped, 1);

    let book = catalog.books.get("0195153448").unwrap().unwrap();
    assert_eq!(book.title, "Classical Mythology");
    assert_eq!(UserReview::for_book(&catalog.reviews, "0195153448").unwrap().len(), 2);

    let again = import_book_crossing(&catalog, source.path()).unwrap();
    assert_eq!((again.books_inserted, again.reviews_inserted), (0, 0));
}

#[test]
fn import_requires_both_files() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = catalog(&dir);
    let err = import_book_crossing(&catalog, dir.path()).unwrap_err();
    assert!(matches!(err, ModelError::Import { .. }));
}

#[test]
fn schemas_are_found_by_name() {
    assert_eq!(schema_for("book").unwrap().name(), "Book");
    assert_eq!(schema_for("UserReview"), Some(UserReview::schema()));
    assert!(schema_for("Nope").is_none());
}
