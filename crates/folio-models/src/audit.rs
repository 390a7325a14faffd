use folio_store::{Collection, Entity, FieldType, Record, RecordStore, Schema, TypeError};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clock;
use crate::error::ModelResult;
use crate::schema::static_schema;

/// One administrative action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: String,
    pub admin_id: String,
    pub action: String,
    pub target_id: Option<String>,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
}

impl AuditLog {
    /// Append an entry stamped with the current time under a fresh id.
    pub fn record<S: RecordStore>(
        log: &Collection<AuditLog, S>,
        admin_id: &str,
        action: &str,
        target_id: Option<&str>,
    ) -> ModelResult<AuditLog> {
        let entry = AuditLog {
            id: log.generate_unique_primary_key()?,
            admin_id: admin_id.to_string(),
            action: action.to_string(),
            target_id: target_id.map(str::to_string),
            timestamp: clock::now_secs_f64(),
        };
        log.put(&entry)?;
        info!(admin_id, action, target_id, "audit");
        Ok(entry)
    }
}

impl Entity for AuditLog {
    fn schema() -> &'static Schema {
        static_schema!("AuditLog", pk = "id", {
            "id": FieldType::Text,
            "admin_id": FieldType::Text,
            "action": FieldType::Text,
            "target_id": FieldType::Text.optional(),
            "timestamp": FieldType::Float,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(vec![
            self.id.as_str().into(),
            self.admin_id.as_str().into(),
            self.action.as_str().into(),
            self.target_id.clone().into(),
            self.timestamp.into(),
        ])
    }

    fn from_record(record: &Record) -> Result<Self, TypeError> {
        Ok(Self {
            id: record.text(0)?,
            admin_id: record.text(1)?,
            action: record.text(2)?,
            target_id: record.opt_text(3)?,
            timestamp: record.float(4)?,
        })
    }
}
