//! Memoized results of expensive book lookups.

use std::collections::BTreeMap;

use folio_store::{Collection, Entity, FieldType, Record, RecordStore, Schema, TypeError};
use serde::{Deserialize, Serialize};

use crate::clock;
use crate::error::ModelResult;
use crate::schema::{map_value, static_schema};

/// Sentiment analysis of a book's reviews.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SentimentCache {
    pub book_id: String,
    pub sentiment: String,
    pub score: f64,
    /// Score per sentiment label.
    pub scores: BTreeMap<String, f64>,
    pub review_count: i64,
    /// Seconds since the Unix epoch.
    pub cached_at: i64,
}

impl SentimentCache {
    pub fn get_cached<S: RecordStore>(
        cache: &Collection<SentimentCache, S>,
        book_id: &str,
    ) -> ModelResult<Option<SentimentCache>> {
        Ok(cache.get(book_id)?)
    }

    /// Store a fresh analysis, replacing any earlier one for the book.
    pub fn upsert<S: RecordStore>(
        cache: &Collection<SentimentCache, S>,
        book_id: &str,
        sentiment: &str,
        score: f64,
        scores: BTreeMap<String, f64>,
        review_count: i64,
    ) -> ModelResult<SentimentCache> {
        let entry = SentimentCache {
            book_id: book_id.to_string(),
            sentiment: sentiment.to_string(),
            score,
            scores,
            review_count,
            cached_at: clock::now_secs(),
        };
        cache.put(&entry)?;
        Ok(entry)
    }
}

impl Entity for SentimentCache {
    fn schema() -> &'static Schema {
        static_schema!("SentimentCache", pk = "book_id", {
            "book_id": FieldType::Text,
            "sentiment": FieldType::Text,
            "score": FieldType::Float,
            "scores": FieldType::Map,
            "review_count": FieldType::Integer,
            "cached_at": FieldType::Integer,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(vec![
            self.book_id.as_str().into(),
            self.sentiment.as_str().into(),
            self.score.into(),
            map_value(&self.scores),
            self.review_count.into(),
            self.cached_at.into(),
        ])
    }

    fn from_record(record: &Record) -> Result<Self, TypeError> {
        Ok(Self {
            book_id: record.text(0)?,
            sentiment: record.text(1)?,
            score: record.float(2)?,
            scores: record.json(3)?,
            review_count: record.integer(4)?,
            cached_at: record.integer(5)?,
        })
    }
}

/// Which book a free-text metadata query resolved to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookMetadataCache {
    pub query: String,
    pub book_id: String,
    /// Seconds since the Unix epoch.
    pub cached_at: i64,
}

impl BookMetadataCache {
    pub fn cached_book_id<S: RecordStore>(
        cache: &Collection<BookMetadataCache, S>,
        query: &str,
    ) -> ModelResult<Option<String>> {
        Ok(cache.get(query)?.map(|entry| entry.book_id))
    }

    pub fn upsert<S: RecordStore>(
        cache: &Collection<BookMetadataCache, S>,
        query: &str,
        book_id: &str,
    ) -> ModelResult<()> {
        cache.put(&BookMetadataCache {
            query: query.to_string(),
            book_id: book_id.to_string(),
            cached_at: clock::now_secs(),
        })?;
        Ok(())
    }
}

impl Entity for BookMetadataCache {
    fn schema() -> &'static Schema {
        static_schema!("BookMetadataCache", pk = "query", {
            "query": FieldType::Text,
            "book_id": FieldType::Text,
            "cached_at": FieldType::Integer,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(vec![
            self.query.as_str().into(),
            self.book_id.as_str().into(),
            self.cached_at.into(),
        ])
    }

    fn from_record(record: &Record) -> Result<Self, TypeError> {
        Ok(Self {
            query: record.text(0)?,
            book_id: record.text(1)?,
            cached_at: record.integer(2)?,
        })
    }
}
