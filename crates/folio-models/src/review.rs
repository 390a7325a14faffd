use folio_store::{Collection, Entity, FieldType, Record, RecordStore, Schema, TypeError};
use serde::{Deserialize, Serialize};

use crate::error::ModelResult;
use crate::schema::static_schema;

/// A reader's rating of a book.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserReview {
    /// `user_id` followed by `book_id`.
    pub id: String,
    pub user_id: String,
    pub book_id: String,
    pub rating: f64,
}

impl UserReview {
    pub fn new(user_id: impl Into<String>, book_id: impl Into<String>, rating: f64) -> Self {
        let (user_id, book_id) = (user_id.into(), book_id.into());
        Self {
            id: format!("{user_id}{book_id}"),
            user_id,
            book_id,
            rating,
        }
    }

    pub fn for_book<S: RecordStore>(
        reviews: &Collection<UserReview, S>,
        book_id: &str,
    ) -> ModelResult<Vec<UserReview>> {
        Ok(reviews
            .get_where(&[("book_id", book_id.into())])?
            .collect::<Result<_, _>>()?)
    }

    pub fn for_user<S: RecordStore>(
        reviews: &Collection<UserReview, S>,
        user_id: &str,
    ) -> ModelResult<Vec<UserReview>> {
        Ok(reviews
            .get_where(&[("user_id", user_id.into())])?
            .collect::<Result<_, _>>()?)
    }
}

impl Entity for UserReview {
    fn schema() -> &'static Schema {
        static_schema!("UserReview", pk = "id", {
            "id": FieldType::Text,
            "user_id": FieldType::Text,
            "book_id": FieldType::Text,
            "rating": FieldType::Float,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(vec![
            self.id.as_str().into(),
            self.user_id.as_str().into(),
            self.book_id.as_str().into(),
            self.rating.into(),
        ])
    }

    fn from_record(record: &Record) -> Result<Self, TypeError> {
        Ok(Self {
            id: record.text(0)?,
            user_id: record.text(1)?,
            book_id: record.text(2)?,
            rating: record.float(3)?,
        })
    }
}
