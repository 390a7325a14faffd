use folio_store::{Collection, Entity, FieldType, Record, RecordStore, Schema, TypeError};
use serde::{Deserialize, Serialize};

use crate::error::ModelResult;
use crate::schema::static_schema;

/// A book on a reader's saved list. At most one per (user, book) pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedBook {
    /// `user_id` followed by `book_id`.
    pub id: String,
    pub user_id: String,
    pub book_id: String,
}

impl SavedBook {
    pub fn new(user_id: impl Into<String>, book_id: impl Into<String>) -> Self {
        let (user_id, book_id) = (user_id.into(), book_id.into());
        Self {
            id: format!("{user_id}{book_id}"),
            user_id,
            book_id,
        }
    }

    /// Save a book for a user, returning the existing entry if already saved.
    pub fn save_for_user<S: RecordStore>(
        saved: &Collection<SavedBook, S>,
        user_id: &str,
        book_id: &str,
    ) -> ModelResult<SavedBook> {
        let entry = SavedBook::new(user_id, book_id);
        if saved.post(&entry)? {
            return Ok(entry);
        }
        Ok(saved.get(entry.id.as_str())?.unwrap_or(entry))
    }

    /// Remove a saved book. Removing one that was never saved is a no-op.
    pub fn remove_for_user<S: RecordStore>(
        saved: &Collection<SavedBook, S>,
        user_id: &str,
        book_id: &str,
    ) -> ModelResult<()> {
        saved.delete_key(format!("{user_id}{book_id}"))?;
        Ok(())
    }

    pub fn saved_for_user<S: RecordStore>(
        saved: &Collection<SavedBook, S>,
        user_id: &str,
    ) -> ModelResult<Vec<SavedBook>> {
        Ok(saved
            .get_where(&[("user_id", user_id.into())])?
            .collect::<Result<_, _>>()?)
    }
}

impl Entity for SavedBook {
    fn schema() -> &'static Schema {
        static_schema!("SavedBook", pk = "id", {
            "id": FieldType::Text,
            "user_id": FieldType::Text,
            "book_id": FieldType::Text,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(vec![
            self.id.as_str().into(),
            self.user_id.as_str().into(),
            self.book_id.as_str().into(),
        ])
    }

    fn from_record(record: &Record) -> Result<Self, TypeError> {
        Ok(Self {
            id: record.text(0)?,
            user_id: record.text(1)?,
            book_id: record.text(2)?,
        })
    }
}
