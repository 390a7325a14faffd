use std::collections::BTreeMap;

use folio_store::{Collection, Entity, FieldType, Record, RecordStore, Schema, TypeError, Value};
use serde::{Deserialize, Serialize};

use crate::error::ModelResult;
use crate::schema::{map_value, static_schema};

/// A catalogued book.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub categories: Option<Vec<String>>,
    pub description: Option<String>,
    /// Cover image URLs by size, e.g. `thumbnail`.
    pub image_links: Option<BTreeMap<String, String>>,
    pub average_rating: Option<f64>,
}

impl Book {
    /// A book with only the required fields set.
    pub fn new(id: impl Into<String>, title: impl Into<String>, authors: Vec<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            authors,
            categories: None,
            description: None,
            image_links: None,
            average_rating: None,
        }
    }

    /// Books whose title loosely matches `term`, in table order.
    pub fn search_by_title<S: RecordStore>(
        books: &Collection<Book, S>,
        term: &str,
    ) -> ModelResult<Vec<Book>> {
        Ok(books
            .get_where_like(&[("title", term.into())])?
            .collect::<Result<_, _>>()?)
    }
}

impl Entity for Book {
    fn schema() -> &'static Schema {
        static_schema!("Book", pk = "id", {
            "id": FieldType::Text,
            "title": FieldType::Text,
            "authors": FieldType::List,
            "categories": FieldType::List.optional(),
            "description": FieldType::Text.optional(),
            "imageLinks": FieldType::Map.optional(),
            "average_rating": FieldType::Float.optional(),
        })
    }

    fn to_record(&self) -> Record {
        Record::new(vec![
            self.id.as_str().into(),
            self.title.as_str().into(),
            self.authors.clone().into(),
            self.categories.clone().into(),
            self.description.clone().into(),
            self.image_links.as_ref().map_or(Value::Null, map_value),
            self.average_rating.into(),
        ])
    }

    fn from_record(record: &Record) -> Result<Self, TypeError> {
        Ok(Self {
            id: record.text(0)?,
            title: record.text(1)?,
            authors: record.json(2)?,
            categories: record.opt_json(3)?,
            description: record.opt_text(4)?,
            image_links: record.opt_json(5)?,
            average_rating: record.opt_float(6)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_round_trip_with_optional_fields() {
        let mut book = Book::new("b1", "Frankenstein", vec!["Mary Shelley".into()]);
        book.categories = Some(vec!["Fiction".into(), "Horror".into()]);
        book.image_links = Some(BTreeMap::from([(
            "thumbnail".to_string(),
            "http://img/1".to_string(),
        )]));
        book.average_rating = Some(4.5);

        let record = book.to_record();
        Book::schema().validate(&record).unwrap();
        assert_eq!(Book::from_record(&record).unwrap(), book);

        let bare = Book::new("b2", "Dracula", vec![]);
        assert_eq!(Book::from_record(&bare.to_record()).unwrap(), bare);
    }
}
