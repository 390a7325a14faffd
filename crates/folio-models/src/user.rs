use folio_store::{Entity, FieldType, Record, Schema, TypeError};
use serde::{Deserialize, Serialize};

use crate::schema::static_schema;

/// A reader account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl Entity for User {
    fn schema() -> &'static Schema {
        static_schema!("User", pk = "id", {
            "id": FieldType::Text,
            "name": FieldType::Text,
            "email": FieldType::Text,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(vec![
            self.id.as_str().into(),
            self.name.as_str().into(),
            self.email.as_str().into(),
        ])
    }

    fn from_record(record: &Record) -> Result<Self, TypeError> {
        Ok(Self {
            id: record.text(0)?,
            name: record.text(1)?,
            email: record.text(2)?,
        })
    }
}

/// Login credentials of a [`User`], keyed by user id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCredentials {
    pub user_id: String,
    pub email: String,
    pub password: String,
}

impl Entity for UserCredentials {
    fn schema() -> &'static Schema {
        static_schema!("UserCredentials", pk = "user_id", {
            "user_id": FieldType::Text,
            "email": FieldType::Text,
            "password": FieldType::Text,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(vec![
            self.user_id.as_str().into(),
            self.email.as_str().into(),
            self.password.as_str().into(),
        ])
    }

    fn from_record(record: &Record) -> Result<Self, TypeError> {
        Ok(Self {
            user_id: record.text(0)?,
            email: record.text(1)?,
            password: record.text(2)?,
        })
    }
}
