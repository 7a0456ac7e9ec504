// Private module declaration
mod server;

use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
};

// Re-export for public API
pub use server::configure;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Order creation and state transitions
// - Notification outcomes per channel and event
// - Email relay fallbacks
// - Low-stock alert suppression
// - Dispatch latency and duplicate suppression
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Outcome label for a single channel attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOutcome {
    Delivered,
    Failed,
    Skipped,
}

impl ChannelOutcome {
    fn as_str(self) -> &'static str {
        match self {
            ChannelOutcome::Delivered => "delivered",
            ChannelOutcome::Failed => "failed",
            ChannelOutcome::Skipped => "skipped",
        }
    }
}

/// Central metrics registry for the entire application
pub struct Metrics {
    registry: Registry,

    // Order Metrics
    pub orders_created: IntCounter,
    pub order_transitions: IntCounterVec,

    // Notification Metrics
    pub notifications: IntCounterVec,
    pub dispatch_duration: HistogramVec,
    pub dispatch_duplicates: IntCounter,
    pub email_fallbacks: IntCounterVec,

    // Alert Metrics
    pub alerts: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // Order Metrics
        let orders_created = IntCounter::new("orders_created_total", "Total orders created")?;
        registry.register(Box::new(orders_created.clone()))?;

        let order_transitions = IntCounterVec::new(
            Opts::new("order_transitions_total", "Accepted order state transitions"),
            &["to"],
        )?;
        registry.register(Box::new(order_transitions.clone()))?;

        // Notification Metrics
        let notifications = IntCounterVec::new(
            Opts::new("notifications_total", "Notification attempts by channel and outcome"),
            &["channel", "event", "outcome"],
        )?;
        registry.register(Box::new(notifications.clone()))?;

        let dispatch_duration = HistogramVec::new(
            HistogramOpts::new("dispatch_duration_seconds", "Time spent dispatching one order event")
                .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 15.0, 30.0]),
            &["event"],
        )?;
        registry.register(Box::new(dispatch_duration.clone()))?;

        let dispatch_duplicates = IntCounter::new(
            "dispatch_duplicates_total",
            "Order events dropped because the same event was dispatched recently",
        )?;
        registry.register(Box::new(dispatch_duplicates.clone()))?;

        let email_fallbacks = IntCounterVec::new(
            Opts::new("email_fallbacks_total", "Sends rerouted from the SMTP relay to the HTTP API"),
            &["reason"],
        )?;
        registry.register(Box::new(email_fallbacks.clone()))?;

        // Alert Metrics
        let alerts = IntCounterVec::new(
            Opts::new("alerts_total", "Low-stock alerts by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(alerts.clone()))?;

        Ok(Self {
            registry,
            orders_created,
            order_transitions,
            notifications,
            dispatch_duration,
            dispatch_duplicates,
            email_fallbacks,
            alerts,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_order_created(&self) {
        self.orders_created.inc();
    }

    pub fn record_transition(&self, to: &str) {
        self.order_transitions.with_label_values(&[to]).inc();
    }

    pub fn record_notification(&self, channel: &str, event: &str, outcome: ChannelOutcome) {
        self.notifications
            .with_label_values(&[channel, event, outcome.as_str()])
            .inc();
    }

    pub fn record_dispatch_duration(&self, event: &str, duration_secs: f64) {
        self.dispatch_duration.with_label_values(&[event]).observe(duration_secs);
    }

    pub fn record_dispatch_duplicate(&self) {
        self.dispatch_duplicates.inc();
    }

    pub fn record_email_fallback(&self, reason: &str) {
        self.email_fallbacks.with_label_values(&[reason]).inc();
    }

    pub fn record_alert(&self, outcome: &str) {
        self.alerts.with_label_values(&[outcome]).inc();
    }
}
