use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::Coordinate;
use crate::services::location::{LocationError, LocationProvider};

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// Multi-tier cache manager
///
/// L1 is an in-process `moka` cache. L2 is Redis, shared across instances,
/// and optional: without it the manager is a plain L1 cache.
pub struct CacheManager {
    redis: Option<Arc<tokio::sync::Mutex<ConnectionManager>>>,
    l1_cache: moka::future::Cache<String, Vec<u8>>,
    ttl_secs: u64,
}

impl CacheManager {
    /// Create an L1-only cache
    pub fn in_memory(l1_size: u64, ttl_secs: u64) -> Self {
        Self {
            redis: None,
            l1_cache: build_l1(l1_size, ttl_secs),
            ttl_secs,
        }
    }

    /// Create a cache backed by Redis as L2
    pub async fn connect(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = ConnectionManager::new(client).await?;

        Ok(Self {
            redis: Some(Arc::new(tokio::sync::Mutex::new(redis))),
            l1_cache: build_l1(l1_size, ttl_secs),
            ttl_secs,
        })
    }

    pub fn has_l2(&self) -> bool {
        self.redis.is_some()
    }

    /// Get a value from cache (L1 first, then L2)
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        if let Some(bytes) = self.l1_cache.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(serde_json::from_slice(&bytes)?);
        }

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let value: Option<String> = redis::cmd("GET")
                .arg(key)
                .query_async(&mut *conn)
                .await?;
            drop(conn);

            if let Some(json) = value {
                tracing::trace!("L2 cache hit: {}", key);
                let parsed = serde_json::from_str(&json)?;
                self.l1_cache.insert(key.to_string(), json.into_bytes()).await;
                return Ok(parsed);
            }
        }

        tracing::trace!("Cache miss: {}", key);
        Err(CacheError::CacheMiss(key.to_string()))
    }

    /// Set a value in every configured tier
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let json = serde_json::to_string(value)?;

        self.l1_cache
            .insert(key.to_string(), json.as_bytes().to_vec())
            .await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            redis::cmd("SETEX")
                .arg(key)
                .arg(self.ttl_secs)
                .arg(json)
                .query_async::<()>(&mut *conn)
                .await?;
        }

        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    /// Delete a value from every tier
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.l1_cache.invalidate(key).await;
        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            redis::cmd("DEL")
                .arg(key)
                .query_async::<()>(&mut *conn)
                .await?;
        }
        Ok(())
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            l1_size: self.l1_cache.entry_count(),
            l2_enabled: self.has_l2(),
        }
    }
}

fn build_l1(l1_size: u64, ttl_secs: u64) -> moka::future::Cache<String, Vec<u8>> {
    moka::future::CacheBuilder::new(l1_size)
        .time_to_live(Duration::from_secs(ttl_secs))
        .build()
}

/// Cache statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub l1_size: u64,
    pub l2_enabled: bool,
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for a forward geocoding lookup
    pub fn geocode(address: &str) -> String {
        format!("geocode:{}", address.trim().to_lowercase())
    }

    /// Build a cache key for a reverse geocoding lookup
    ///
    /// Rounded to 5 decimal places (about a metre).
    pub fn reverse(coordinate: &Coordinate) -> String {
        format!(
            "reverse:{:.5}:{:.5}",
            coordinate.latitude(),
            coordinate.longitude()
        )
    }
}

/// Location provider that caches geocoding answers of another provider
///
/// Only successful lookups are cached. Cache failures are logged and the
/// inner provider is used directly.
pub struct CachingLocationProvider {
    inner: Arc<dyn LocationProvider>,
    cache: Arc<CacheManager>,
}

impl CachingLocationProvider {
    pub fn new(inner: Arc<dyn LocationProvider>, cache: Arc<CacheManager>) -> Self {
        Self { inner, cache }
    }

    async fn remember<T: Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = self.cache.set(key, value).await {
            tracing::warn!("Failed to cache {}: {}", key, e);
        }
    }

    async fn recall<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        match self.cache.get(key).await {
            Ok(value) => Some(value),
            Err(CacheError::CacheMiss(_)) => None,
            Err(e) => {
                tracing::warn!("Cache lookup failed for {}: {}", key, e);
                None
            }
        }
    }
}

#[async_trait]
impl LocationProvider for CachingLocationProvider {
    async fn current_location(&self) -> Result<Coordinate, LocationError> {
        self.inner.current_location().await
    }

    async fn geocode(&self, address: &str) -> Result<Coordinate, LocationError> {
        let key = CacheKey::geocode(address);
        if let Some(coordinate) = self.recall::<Coordinate>(&key).await {
            return Ok(coordinate);
        }

        let coordinate = self.inner.geocode(address).await?;
        self.remember(&key, &coordinate).await;
        Ok(coordinate)
    }

    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<String, LocationError> {
        let key = CacheKey::reverse(&coordinate);
        if let Some(name) = self.recall::<String>(&key).await {
            return Ok(name);
        }

        let name = self.inner.reverse_geocode(coordinate).await?;
        self.remember(&key, &name).await;
        Ok(name)
    }

    fn provider_name(&self) -> &'static str {
        self.inner.provider_name()
    }
}
