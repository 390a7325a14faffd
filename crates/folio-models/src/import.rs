//! Bulk import of the Book-Crossing dataset.
//!
//! Both source files are `;`-separated with every field double-quoted and a
//! header line:
//!
//! ```text
//! "ISBN";"Book-Title";"Book-Author"            BX_Books.csv
//! "User-ID";"ISBN";"Book-Rating"               BX-Book-Ratings.csv
//! ```
//!
//! Files are read as bytes and decoded lossily, since the published dataset
//! is not valid UTF-8 throughout.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::book::Book;
use crate::catalog::Catalog;
use crate::error::{ModelError, ModelResult};
use crate::review::UserReview;

pub const BOOKS_FILE: &str = "BX_Books.csv";
pub const RATINGS_FILE: &str = "BX-Book-Ratings.csv";

/// Records buffered per batch insert.
const BATCH_SIZE: usize = 50_000;

/// Outcome of one import run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub books_read: usize,
    pub books_inserted: usize,
    pub reviews_read: usize,
    pub reviews_inserted: usize,
    /// Lines that could not be parsed.
    pub skipped: usize,
}

/// Split one quoted, `;`-separated line into its fields.
fn fields(line: &str) -> Option<Vec<&str>> {
    let inner = line
        .trim_end_matches(|c: char| c == '\n' || c == '\r')
        .strip_prefix('"')?
        .strip_suffix('"')?;
    Some(inner.split("\";\"").collect())
}

/// Parse one line of `BX_Books.csv`. Authors are split on commas.
pub fn parse_book_line(line: &str) -> Option<Book> {
    let fields = fields(line)?;
    let (id, title) = (*fields.first()?, *fields.get(1)?);
    if id.is_empty() {
        return None;
    }
    let authors = fields
        .get(2)
        .map(|a| {
            a.split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    Some(Book::new(id, title, authors))
}

/// Parse one line of `BX-Book-Ratings.csv`.
pub fn parse_rating_line(line: &str) -> Option<UserReview> {
    let fields = fields(line)?;
    let (user_id, book_id, rating) = (*fields.first()?, *fields.get(1)?, *fields.get(2)?);
    if user_id.is_empty() || book_id.is_empty() {
        return None;
    }
    let rating = rating.trim().parse::<f64>().ok()?;
    Some(UserReview::new(user_id, book_id, rating))
}

/// Import both dataset files from `dir`. Keys already stored are kept as is.
pub fn import_book_crossing(catalog: &Catalog, dir: &Path) -> ModelResult<ImportSummary> {
    let books_path = dir.join(BOOKS_FILE);
    let ratings_path = dir.join(RATINGS_FILE);
    for path in [&books_path, &ratings_path] {
        if !path.is_file() {
            return Err(ModelError::Import {
                path: path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
            });
        }
    }

    let mut summary = ImportSummary::default();

    let (read, inserted, skipped) = import_file(&books_path, parse_book_line, |batch| {
        Ok(catalog.books.post_batch(batch)?)
    })?;
    info!(read, inserted, skipped, "imported books");
    summary.books_read = read;
    summary.books_inserted = inserted;
    summary.skipped += skipped;

    let (read, inserted, skipped) = import_file(&ratings_path, parse_rating_line, |batch| {
        Ok(catalog.reviews.post_batch(batch)?)
    })?;
    info!(read, inserted, skipped, "imported reviews");
    summary.reviews_read = read;
    summary.reviews_inserted = inserted;
    summary.skipped += skipped;

    Ok(summary)
}

/// Stream `path` through `parse`, inserting in batches. Returns
/// `(parsed, inserted, skipped)`.
fn import_file<T>(
    path: &Path,
    parse: impl Fn(&str) -> Option<T>,
    mut insert: impl FnMut(&[T]) -> ModelResult<usize>,
) -> ModelResult<(usize, usize, usize)> {
    let io_err = |source| ModelError::Import {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = BufReader::new(File::open(path).map_err(io_err)?);

    let mut buf = Vec::new();
    let mut batch = Vec::with_capacity(BATCH_SIZE);
    let (mut parsed, mut inserted, mut skipped) = (0, 0, 0);
    let mut line_no = 0usize;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).map_err(io_err)? == 0 {
            break;
        }
        line_no += 1;
        if line_no == 1 {
            continue;
        }
        let line = String::from_utf8_lossy(&buf);
        if line.trim().is_empty() {
            continue;
        }
        match parse(&*line) {
            Some(item) => {
                parsed += 1;
                batch.push(item);
            }
            None => {
                skipped += 1;
                warn!(path = %path.display(), line = line_no, "skipping malformed line");
            }
        }
        if batch.len() >= BATCH_SIZE {
            inserted += insert(&batch)?;
            batch.clear();
        }
    }
    if !batch.is_empty() {
        inserted += insert(&batch)?;
    }
    Ok((parsed, inserted, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_lines() {
        let book = parse_book_line("\"0195153448\";\"Classical Mythology\";\"Mark P. O. Morford\"\r\n")
            .unwrap();
        assert_eq!(book.id, "0195153448");
        assert_eq!(book.title, "Classical Mythology");
        assert_eq!(book.authors, vec!["Mark P. O. Morford"]);

        let book = parse_book_line("\"1\";\"Good Omens\";\"Terry Pratchett, Neil Gaiman\"\n").unwrap();
        assert_eq!(book.authors, vec!["Terry Pratchett", "Neil Gaiman"]);

        assert!(parse_book_line("not quoted").is_none());
        assert!(parse_book_line("\"only-id\"").is_none());
    }

    #[test]
    fn rating_lines() {
        let review = parse_rating_line("\"276725\";\"034545104X\";\"0\"\n").unwrap();
        assert_eq!(review.id, "276725034545104X");
        assert_eq!(review.user_id, "276725");
        assert_eq!(review.rating, 0.0);

        assert!(parse_rating_line("\"276725\";\"034545104X\";\"ten\"").is_none());
        assert!(parse_rating_line("\"276725\";\"034545104X\"").is_none());
    }
}
