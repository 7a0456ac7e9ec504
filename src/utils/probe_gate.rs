use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

// ============================================================================
// Probe Gate - cached health probe for a primary transport
// ============================================================================
//
// Decides whether the primary transport should be tried for the next send.
//
// States:
// - Unknown: No probe yet or cached outcome expired, next call probes
// - Healthy: Last probe succeeded within the TTL, skip probing
// - Unhealthy: Last probe failed within the TTL, skip straight to fallback
//
// A zero TTL probes before every call. An observed send failure invalidates
// the cached outcome so the next call probes again.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeState {
    Unknown,
    Healthy,
    Unhealthy,
}

#[derive(Clone, Debug)]
pub struct ProbeGateConfig {
    /// How long a probe outcome is reused
    pub ttl: Duration,
}

impl Default for ProbeGateConfig {
    fn default() -> Self {
        Self { ttl: Duration::ZERO }
    }
}

struct ProbeCache {
    healthy: bool,
    checked_at: Instant,
}

#[derive(Clone)]
pub struct ProbeGate {
    cache: Arc<Mutex<Option<ProbeCache>>>,
    config: ProbeGateConfig,
}

impl ProbeGate {
    pub fn new(config: ProbeGateConfig) -> Self {
        Self {
            cache: Arc::new(Mutex::new(None)),
            config,
        }
    }

    /// Return the cached outcome if still fresh, otherwise run `probe` and cache its result
    pub async fn check<F, E>(&self, probe: F) -> bool
    where
        F: Future<Output = Result<(), E>>,
        E: std::fmt::Display,
    {
        {
            let cache = self.cache.lock().await;
            if let Some(entry) = cache.as_ref() {
                if !self.config.ttl.is_zero() && entry.checked_at.elapsed() < self.config.ttl {
                    return entry.healthy;
                }
            }
        }

        let healthy = match probe.await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Primary transport probe failed");
                false
            }
        };

        let mut cache = self.cache.lock().await;
        *cache = Some(ProbeCache {
            healthy,
            checked_at: Instant::now(),
        });
        healthy
    }

    /// Forget the cached outcome after an observed failure
    pub async fn invalidate(&self) {
        let mut cache = self.cache.lock().await;
        if cache.take().is_some() {
            tracing::debug!("Probe cache invalidated");
        }
    }

    pub async fn state(&self) -> ProbeState {
        let cache = self.cache.lock().await;
        match cache.as_ref() {
            Some(entry) if !self.config.ttl.is_zero() && entry.checked_at.elapsed() < self.config.ttl => {
                if entry.healthy {
                    ProbeState::Healthy
                } else {
                    ProbeState::Unhealthy
                }
            }
            _ => ProbeState::Unknown,
        }
    }
}
