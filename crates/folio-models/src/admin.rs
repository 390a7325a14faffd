use folio_store::{Collection, Entity, FieldType, Record, RecordStore, Schema, TypeError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ModelResult;
use crate::schema::static_schema;

const NANOS_PER_DAY: i64 = 24 * 60 * 60 * 1_000_000_000;

/// Each renewal extends a session this far past the renewal time.
pub const SESSION_DURATION_NS: i64 = 7 * NANOS_PER_DAY;

/// No session outlives its creation by more than this, however often it
/// is renewed.
pub const SESSION_MAX_DURATION_NS: i64 = 30 * NANOS_PER_DAY;

/// An administrator account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub password: String,
}

impl Entity for AdminUser {
    fn schema() -> &'static Schema {
        static_schema!("AdminUser", pk = "id", {
            "id": FieldType::Text,
            "display_name": FieldType::Text,
            "email": FieldType::Text,
            "password": FieldType::Text,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(vec![
            self.id.as_str().into(),
            self.display_name.as_str().into(),
            self.email.as_str().into(),
            self.password.as_str().into(),
        ])
    }

    fn from_record(record: &Record) -> Result<Self, TypeError> {
        Ok(Self {
            id: record.text(0)?,
            display_name: record.text(1)?,
            email: record.text(2)?,
            password: record.text(3)?,
        })
    }
}

/// A logged-in administrator, keyed by an opaque session token.
///
/// Timestamps are nanoseconds since the Unix epoch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSession {
    pub session_id: String,
    pub admin_id: String,
    pub original_creation_timestamp: i64,
    pub expiration_timestamp: i64,
}

impl AdminSession {
    /// A session created at `now`.
    pub fn new(session_id: impl Into<String>, admin_id: impl Into<String>, now: i64) -> Self {
        Self {
            session_id: session_id.into(),
            admin_id: admin_id.into(),
            original_creation_timestamp: now,
            expiration_timestamp: now.saturating_add(SESSION_DURATION_NS),
        }
    }

    /// Past its renewal window, or older than the hard maximum.
    pub fn is_expired(&self, now: i64) -> bool {
        self.expiration_timestamp < now
            || now.saturating_sub(self.original_creation_timestamp) > SESSION_MAX_DURATION_NS
    }

    /// Push the expiration a full duration past `now`. Does not persist.
    pub fn renew(&mut self, now: i64) {
        self.expiration_timestamp = now.saturating_add(SESSION_DURATION_NS);
    }

    /// Look up a live session. An expired session is deleted and reported
    /// as absent.
    pub fn lookup<S: RecordStore>(
        sessions: &Collection<AdminSession, S>,
        token: &str,
        now: i64,
    ) -> ModelResult<Option<AdminSession>> {
        let Some(session) = sessions.get(token)? else {
            return Ok(None);
        };
        if session.is_expired(now) {
            debug!(admin_id = %session.admin_id, "discarding expired admin session");
            sessions.delete(&session)?;
            return Ok(None);
        }
        Ok(Some(session))
    }
}

impl Entity for AdminSession {
    fn schema() -> &'static Schema {
        static_schema!("AdminSession", pk = "session_id", {
            "session_id": FieldType::Text,
            "admin_id": FieldType::Text,
            "original_creation_timestamp": FieldType::Integer,
            "expiration_timestamp": FieldType::Integer,
        })
    }

    fn to_record(&self) -> Record {
        Record::new(vec![
            self.session_id.as_str().into(),
            self.admin_id.as_str().into(),
            self.original_creation_timestamp.into(),
            self.expiration_timestamp.into(),
        ])
    }

    fn from_record(record: &Record) -> Result<Self, TypeError> {
        Ok(Self {
            session_id: record.text(0)?,
            admin_id: record.text(1)?,
            original_creation_timestamp: record.integer(2)?,
            expiration_timestamp: record.integer(3)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000_000_000_000;

    #[test]
    fn fresh_session_is_live_for_a_week() {
        let s = AdminSession::new("tok", "admin", T0);
        assert!(!s.is_expired(T0));
        assert!(!s.is_expired(T0 + SESSION_DURATION_NS));
        assert!(s.is_expired(T0 + SESSION_DURATION_NS + 1));
    }

    #[test]
    fn renewal_cannot_exceed_the_hard_maximum() {
        let mut s = AdminSession::new("tok", "admin", T0);
        let mut now = T0;
        for _ in 0..5 {
            now += 6 * NANOS_PER_DAY;
            assert!(!s.is_expired(now));
            s.renew(now);
        }
        // 30 days in and freshly renewed, yet past the maximum.
        assert!(s.is_expired(T0 + SESSION_MAX_DURATION_NS + 1));
    }
}
