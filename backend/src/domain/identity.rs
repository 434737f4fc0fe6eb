//! Identity and trackability registry.
//!
//! Owns the `users` username→id hash, the per-user `user:{id}` hash and the
//! `trackables` list.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::ports::StoreGateway;
use crate::domain::{Error, UserId, Username, keys};

/// Registers users and answers identity lookups.
#[derive(Clone)]
pub struct IdentityRegistry {
    store: Arc<dyn StoreGateway>,
}

impl IdentityRegistry {
    /// Create a registry over the given store.
    pub fn new(store: Arc<dyn StoreGateway>) -> Self {
        Self { store }
    }

    /// Register a username, allocating the next user id.
    ///
    /// Fails with `AlreadyRegistered` when the username exists. The
    /// existence check and the id allocation are separate store calls, so
    /// two concurrent registrations of one name can both pass the check.
    pub async fn register(&self, username: &Username, trackable: bool) -> Result<UserId, Error> {
        if self.store.hexists(keys::USERS, username.as_ref()).await? {
            warn!(username = %username, "registration rejected: username taken");
            return Err(Error::already_registered(username));
        }

        let id = UserId::new(self.store.incr(keys::NEXT_USER_ID).await?);
        self.store
            .hset(keys::USERS, &[(username.to_string(), id.to_string())])
            .await?;
        self.store
            .hset(
                &keys::user(id),
                &[
                    (keys::FIELD_USERNAME.to_owned(), username.to_string()),
                    (keys::FIELD_TRACKABLE.to_owned(), keys::flag(trackable)),
                ],
            )
            .await?;
        if trackable {
            self.store.rpush(keys::TRACKABLES, &id.to_string()).await?;
        }

        info!(user_id = %id, username = %username, trackable, "registered user");
        Ok(id)
    }

    /// Usernames of trackable users in registration order.
    pub async fn list_trackables(&self) -> Result<Vec<Username>, Error> {
        let ids = self.store.lrange(keys::TRACKABLES).await?;
        let mut usernames = Vec::with_capacity(ids.len());
        for raw in ids {
            let id: UserId = keys::parse_stored(&raw, "trackable user id")?;
            let username = self
                .store
                .hget(&keys::user(id), keys::FIELD_USERNAME)
                .await?
                .ok_or_else(|| Error::internal(format!("trackable user {id} has no username")))?;
            usernames.push(
                Username::new(username)
                    .map_err(|err| Error::internal(format!("stored username invalid: {err}")))?,
            );
        }
        Ok(usernames)
    }

    /// Look up a user id, returning `None` for unknown usernames.
    pub async fn lookup(&self, username: &Username) -> Result<Option<UserId>, Error> {
        self.store
            .hget(keys::USERS, username.as_ref())
            .await?
            .map(|raw| keys::parse_stored(&raw, "user id"))
            .transpose()
    }

    /// Resolve a user id, failing with `UnknownUser` when absent.
    pub async fn resolve(&self, username: &Username) -> Result<UserId, Error> {
        self.lookup(username)
            .await?
            .ok_or_else(|| Error::unknown_user(username))
    }

    /// Whether the user accepts watchers.
    pub async fn is_trackable(&self, id: UserId) -> Result<bool, Error> {
        let raw = self
            .store
            .hget(&keys::user(id), keys::FIELD_TRACKABLE)
            .await?;
        Ok(keys::parse_flag(raw.as_deref()))
    }
}
