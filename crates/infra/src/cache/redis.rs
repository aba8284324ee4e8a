//! Redis-backed snapshot cache (`SET key value EX ttl` / `GET` / `DEL`).

use std::sync::Arc;
use std::time::Duration;

use ::redis::aio::MultiplexedConnection;
use async_trait::async_trait;
use tracing::{error, instrument};

use puppetmaster_auth::{
    decode_snapshot, encode_snapshot, snapshot_key, ClaimBundle, ClaimStore, ClaimStoreError,
};
use puppetmaster_core::UserId;

#[derive(Clone)]
pub struct RedisClaimStore {
    client: Arc<::redis::Client>,
}

impl RedisClaimStore {
    pub fn new(redis_url: impl AsRef<str>) -> Result<Self, ClaimStoreError> {
        let client = ::redis::Client::open(redis_url.as_ref())
            .map_err(|e| backend_error("open", e))?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection, ClaimStoreError> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| backend_error("connect", e))
    }
}

fn backend_error(operation: &'static str, err: ::redis::RedisError) -> ClaimStoreError {
    error!(operation, error = %err, "redis error");
    ClaimStoreError::Backend(err.to_string())
}

#[async_trait]
impl ClaimStore for RedisClaimStore {
    #[instrument(skip(self, snapshot), fields(user_id = %snapshot.user_id), err)]
    async fn put(&self, snapshot: &ClaimBundle, ttl: Duration) -> Result<(), ClaimStoreError> {
        let payload = encode_snapshot(snapshot)?;
        let mut conn = self.connection().await?;

        // Redis rejects EX 0.
        let seconds = ttl.as_secs().max(1);
        ::redis::cmd("SET")
            .arg(snapshot_key(snapshot.user_id))
            .arg(payload)
            .arg("EX")
            .arg(seconds)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| backend_error("set", e))
    }

    // No `err`: a miss is routine.
    #[instrument(skip(self))]
    async fn get(&self, user_id: UserId) -> Result<ClaimBundle, ClaimStoreError> {
        let mut conn = self.connection().await?;
        let payload: Option<Vec<u8>> = ::redis::cmd("GET")
            .arg(snapshot_key(user_id))
            .query_async(&mut conn)
            .await
            .map_err(|e| backend_error("get", e))?;

        match payload {
            Some(bytes) => decode_snapshot(&bytes),
            None => Err(ClaimStoreError::Miss),
        }
    }

    #[instrument(skip(self), err)]
    async fn invalidate(&self, user_id: UserId) -> Result<(), ClaimStoreError> {
        let mut conn = self.connection().await?;
        ::redis::cmd("DEL")
            .arg(snapshot_key(user_id))
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| backend_error("del", e))
    }
}
