use folio_store::{Collection, Entity, FieldType, Record, RecordStore, Schema, TypeError};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::schema::static_schema;

/// A reader's complaint about a review.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub review_id: String,
    pub user_id: String,
    pub reason: String,
    pub text: String,
}

impl Report {
    /// File a report under a fresh id.
    pub fn file<S: RecordStore>(
        reports: &Collection<Report, S>,
        review_id: &str,
        user_id: &str,
        reason: &str,
        text: &str,
    ) -> ModelResult<Report> {
        let report = Report {
            id: reports.generate_unique_primary_key()?,
            review_id: review_id.to_string(),
            user_id: user_id.to_string(),
            reason: reason.to_string(),
            text: text.to_string(),
        };
        reports.put(&report)?;
        Ok(report)
    }
}

impl Entity for Report {
    fn schema() -> &'static Schema {
        static_schema!("Report", pk = "id", {
            "id": FieldType::Text,
            "review_id": FieldType::Text,
            "user_id": FieldType::Text,
            "reason": FieldType::Text,
            "text": FieldType::Text,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(vec![
            self.id.as_str().into(),
            self.review_id.as_str().into(),
            self.user_id.as_str().into(),
            self.reason.as_str().into(),
            self.text.as_str().into(),
        ])
    }

    fn from_record(record: &Record) -> Result<Self, TypeError> {
        Ok(Self {
            id: record.text(0)?,
            review_id: record.text(1)?,
            user_id: record.text(2)?,
            reason: record.text(3)?,
            text: record.text(4)?,
        })
    }
}

/// A sanction against a user, lasting at least one day.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Penalty {
    pub id: String,
    pub user_id: String,
    pub penalty_type: String,
    pub reason: String,
    pub duration_days: u32,
}

impl Penalty {
    /// Issue a penalty under a fresh id.
    pub fn issue<S: RecordStore>(
        penalties: &Collection<Penalty, S>,
        user_id: &str,
        penalty_type: &str,
        reason: &str,
        duration_days: u32,
    ) -> ModelResult<Penalty> {
        if duration_days < 1 {
            return Err(ModelError::Invalid {
                field: "duration_days",
                reason: "must be at least 1".into(),
            });
        }
        let penalty = Penalty {
            id: penalties.generate_unique_primary_key()?,
            user_id: user_id.to_string(),
            penalty_type: penalty_type.to_string(),
            reason: reason.to_string(),
            duration_days,
        };
        penalties.put(&penalty)?;
        Ok(penalty)
    }
}

impl Entity for Penalty {
    fn schema() -> &'static Schema {
        static_schema!("Penalty", pk = "id", {
            "id": FieldType::Text,
            "user_id": FieldType::Text,
            "penalty_type": FieldType::Text,
            "reason": FieldType::Text,
            "duration_days": FieldType::Integer,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(vec![
            self.id.as_str().into(),
            self.user_id.as_str().into(),
            self.penalty_type.as_str().into(),
            self.reason.as_str().into(),
            self.duration_days.into(),
        ])
    }

    fn from_record(record: &Record) -> Result<Self, TypeError> {
        let days = record.integer(4)?;
        let duration_days = u32::try_from(days)
            .ok()
            .filter(|d| *d >= 1)
            .ok_or_else(|| TypeError::OutOfRange {
                field: "duration_days".into(),
                reason: format!("{days} is not a positive day count"),
            })?;
        Ok(Self {
            id: record.text(0)?,
            user_id: record.text(1)?,
            penalty_type: record.text(2)?,
            reason: record.text(3)?,
            duration_days,
        })
    }
}
