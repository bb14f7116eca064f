//! Redis service for login sessions

use rand::RngCore;
use redis::{AsyncCommands, Client};
use sha2::{Digest, Sha256};

use crate::error::{AppError, AppResult};

/// Random bytes in a session token
const TOKEN_BYTES: usize = 32;

#[derive(Clone)]
pub struct RedisService {
    client: Client,
}

impl RedisService {
    /// Create a new Redis service and check the server answers
    pub async fn new(url: &str) -> AppResult<Self> {
        let service = Self::from_url(url)?;

        let mut conn = service.connection().await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(service)
    }

    /// Create the client without connecting
    pub fn from_url(url: &str) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;
        Ok(Self { client })
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get Redis connection: {}", e)))
    }

    /// Open a session for a user, returning the opaque token
    pub async fn create_session(&self, user_id: i32, ttl_seconds: u64) -> AppResult<String> {
        let token = new_session_token();
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(session_key(&token), user_id, ttl_seconds)
            .await?;
        Ok(token)
    }

    /// User id behind a session token, if the session is still alive
    pub async fn get_session(&self, token: &str) -> AppResult<Option<i32>> {
        let mut conn = self.connection().await?;
        let user_id: Option<i32> = conn.get(session_key(token)).await?;
        Ok(user_id)
    }

    pub async fn delete_session(&self, token: &str) -> AppResult<()> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(session_key(token)).await?;
        Ok(())
    }
}

fn new_session_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Redis key for a token; only its SHA-256 digest is stored
fn session_key(token: &str) -> String {
    format!("session:{}", hex::encode(Sha256::digest(token.as_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_random_hex() {
        let a = new_session_token();
        let b = new_session_token();
        assert_eq!(a.len(), TOKEN_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_session_key_hides_token() {
        let key = session_key("abc");
        assert!(key.starts_with("session:"));
        assert!(!key.contains("abc"));
        assert_eq!(key, session_key("abc"));
        assert_ne!(key, session_key("abd"));
    }

    #[test]
    fn test_from_url_rejects_garbage() {
        assert!(RedisService::from_url("not a url").is_err());
        assert!(RedisService::from_url("redis://127.0.0.1:6379").is_ok());
    }
}
