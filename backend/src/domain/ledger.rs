//! Location ledger: append-only, session-bound location records.
//!
//! `report_location` performs four store calls in sequence (allocate id,
//! write record, append to session, publish) without a transaction. A
//! concurrent session switch for the same user between the session lookup
//! and the append can attach the record to the previous session.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::ports::StoreGateway;
use crate::domain::{
    Error, IdentityRegistry, LocationId, LocationKey, LocationRecord, LocationReport, SessionId,
    SessionManager, Username, keys,
};

/// Writes and reads location records.
#[derive(Clone)]
pub struct LocationLedger {
    store: Arc<dyn StoreGateway>,
    identity: IdentityRegistry,
    sessions: SessionManager,
}

impl LocationLedger {
    /// Create a ledger.
    pub fn new(
        store: Arc<dyn StoreGateway>,
        identity: IdentityRegistry,
        sessions: SessionManager,
    ) -> Self {
        Self {
            store,
            identity,
            sessions,
        }
    }

    /// Append a report to the user's current session and notify watchers.
    pub async fn report_location(
        &self,
        username: &Username,
        report: LocationReport,
    ) -> Result<LocationRecord, Error> {
        let user_id = self.identity.resolve(username).await?;
        let Some(session_id) = self.sessions.current_session(user_id).await? else {
            warn!(username = %username, "location rejected: no active session");
            return Err(Error::no_active_session(username));
        };

        let id = LocationId::new(self.store.incr(keys::NEXT_LOCATION_ID).await?);
        let record = LocationRecord {
            id,
            session_id,
            longitude: report.longitude,
            latitude: report.latitude,
            timestamp: report.timestamp,
        };
        let key = keys::location(id);
        self.store
            .hset(
                &key,
                &[
                    (keys::FIELD_LONGITUDE.to_owned(), record.longitude.to_string()),
                    (keys::FIELD_LATITUDE.to_owned(), record.latitude.to_string()),
                    (keys::FIELD_TIMESTAMP.to_owned(), record.timestamp.to_string()),
                    (keys::FIELD_SESSION.to_owned(), session_id.to_string()),
                ],
            )
            .await?;
        self.store
            .rpush(&keys::session(session_id), &id.to_string())
            .await?;
        let receivers = self.store.publish(&keys::channel(username), &key).await?;

        debug!(
            username = %username,
            location_id = %id,
            session_id = %session_id,
            receivers,
            "location recorded"
        );
        Ok(record)
    }

    /// Records of a session in append order; unknown sessions are empty.
    pub async fn session_data(&self, session_id: SessionId) -> Result<Vec<LocationRecord>, Error> {
        let ids = self.store.lrange(&keys::session(session_id)).await?;
        let mut records = Vec::with_capacity(ids.len());
        for raw in ids {
            let id: LocationId = keys::parse_stored(&raw, "location id")?;
            records.push(self.get_location(LocationKey::for_id(id)).await?);
        }
        Ok(records)
    }

    /// Point lookup by store key.
    pub async fn get_location(&self, key: LocationKey) -> Result<LocationRecord, Error> {
        let fields = [
            keys::FIELD_LONGITUDE,
            keys::FIELD_LATITUDE,
            keys::FIELD_TIMESTAMP,
            keys::FIELD_SESSION,
        ]
        .map(str::to_owned);
        let values = self.store.hmget(&key.to_string(), &fields).await?;

        let [longitude, latitude, timestamp, session] = <[Option<String>; 4]>::try_from(values)
            .map_err(|_| Error::internal(format!("unexpected field count for {key}")))?;
        if longitude.is_none() && latitude.is_none() && timestamp.is_none() {
            return Err(Error::not_found(format!("{key} not found")));
        }

        let required = |value: Option<String>, what: &str| {
            value.ok_or_else(|| Error::internal(format!("{key} is missing {what}")))
        };
        Ok(LocationRecord {
            id: key.id(),
            session_id: keys::parse_stored(&required(session, "session")?, "session id")?,
            longitude: keys::parse_stored(&required(longitude, "longitude")?, "longitude")?,
            latitude: keys::parse_stored(&required(latitude, "latitude")?, "latitude")?,
            timestamp: keys::parse_stored(&required(timestamp, "timestamp")?, "timestamp")?,
        })
    }
}
