use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

// ============================================================================
// Cooldown Store - atomic check-and-set with TTL
// ============================================================================
//
// Answers "has this signal fired recently?" and marks it as fired in the same
// step. Two callers racing on one key observe exactly one `true`.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CooldownError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

#[async_trait]
pub trait CooldownStore: Send + Sync {
    /// Mark `key` as fired for `window` unless a live mark exists.
    /// Returns `true` when the caller should send.
    async fn try_acquire(&self, key: &str, window: Duration) -> Result<bool, CooldownError>;

    /// Drop the mark so the next signal for `key` goes through
    async fn release(&self, key: &str) -> Result<(), CooldownError>;
}

/// Entry count below which expired marks are never swept
const PRUNE_THRESHOLD: usize = 1024;

/// Single-process store. Expired entries are treated as absent and overwritten
/// on the next check. Once the map outgrows its sweep mark, an insert first
/// drops every expired entry, keeping memory bounded by the live key count.
#[derive(Default)]
pub struct InMemoryCooldownStore {
    inner: Mutex<Marks>,
}

#[derive(Default)]
struct Marks {
    entries: HashMap<String, Instant>,
    next_prune: usize,
}

impl Marks {
    fn prune_if_due(&mut self, now: Instant) {
        if self.entries.len() < self.next_prune.max(PRUNE_THRESHOLD) {
            return;
        }
        let before = self.entries.len();
        self.entries.retain(|_, expiry| *expiry > now);
        // Live keys alone can keep the map large; sweep again only after it doubles
        self.next_prune = (self.entries.len() * 2).max(PRUNE_THRESHOLD);
        tracing::debug!(
            removed = before - self.entries.len(),
            remaining = self.entries.len(),
            "Pruned expired cooldown marks"
        );
    }
}

impl InMemoryCooldownStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }
}

#[async_trait]
impl CooldownStore for InMemoryCooldownStore {
    async fn try_acquire(&self, key: &str, window: Duration) -> Result<bool, CooldownError> {
        let mut marks = self.inner.lock().await;
        let now = Instant::now();

        match marks.entries.get(key) {
            Some(expiry) if *expiry > now => Ok(false),
            Some(_) => {
                marks.entries.insert(key.to_string(), now + window);
                Ok(true)
            }
            None => {
                marks.prune_if_due(now);
                marks.entries.insert(key.to_string(), now + window);
                Ok(true)
            }
        }
    }

    async fn release(&self, key: &str) -> Result<(), CooldownError> {
        self.inner.lock().await.entries.remove(key);
        Ok(())
    }
}

/// Shared store for multi-instance deployments, backed by `SET NX PX`
pub struct RedisCooldownStore {
    connection: MultiplexedConnection,
    prefix: String,
}

impl RedisCooldownStore {
    pub async fn connect(url: &str, prefix: impl Into<String>) -> anyhow::Result<Self> {
        let client = redis::Client::open(url)?;
        let connection = client.get_multiplexed_async_connection().await?;
        tracing::info!("Connected cooldown store to Redis");
        Ok(Self {
            connection,
            prefix: prefix.into(),
        })
    }
}

fn namespaced(prefix: &str, key: &str) -> String {
    format!("{prefix}:{key}")
}

/// Redis rejects `PX 0`, so sub-millisecond windows round up to one
fn px_millis(window: Duration) -> u64 {
    u64::try_from(window.as_millis()).unwrap_or(u64::MAX).max(1)
}

fn acquire_command(key: &str, window: Duration) -> redis::Cmd {
    let mut cmd = redis::cmd("SET");
    cmd.arg(key).arg(1).arg("NX").arg("PX").arg(px_millis(window));
    cmd
}

#[async_trait]
impl CooldownStore for RedisCooldownStore {
    async fn try_acquire(&self, key: &str, window: Duration) -> Result<bool, CooldownError> {
        let mut connection = self.connection.clone();
        let reply: Option<String> = acquire_command(&namespaced(&self.prefix, key), window)
            .query_async(&mut connection)
            .await?;

        Ok(reply.is_some())
    }

    async fn release(&self, key: &str) -> Result<(), CooldownError> {
        let mut connection = self.connection.clone();
        let _: i64 = redis::cmd("DEL")
            .arg(namespaced(&self.prefix, key))
            .query_async(&mut connection)
            .await?;
        Ok(())
    }
}

// ============================================================================
// Alert Cooldown Tracker
// ============================================================================

#[derive(Clone)]
pub struct AlertCooldownTracker {
    store: Arc<dyn CooldownStore>,
}

impl AlertCooldownTracker {
    pub fn new(store: Arc<dyn CooldownStore>) -> Self {
        Self { store }
    }

    /// Atomic check-and-set. `true` means send now, `false` means suppress.
    /// A store failure lets the signal through.
    pub async fn should_send_and_mark(&self, key: &str, window: Duration) -> bool {
        match self.store.try_acquire(key, window).await {
            Ok(acquired) => {
                if !acquired {
                    tracing::debug!(key = %key, "Signal inside cooldown window, suppressing");
                }
                acquired
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cooldown store unavailable, not suppressing");
                true
            }
        }
    }

    pub async fn reset(&self, key: &str) {
        if let Err(e) = self.store.release(key).await {
            tracing::warn!(key = %key, error = %e, "Failed to release cooldown key");
        }
    }
}
