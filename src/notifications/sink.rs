use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::order::OrderEvent;
use super::dispatcher::NotificationDispatcher;

/// Where OrderService hands lifecycle events once a mutation has committed.
/// Submitting never fails; delivery outcomes are observability data only.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn submit(&self, event: OrderEvent);
}

/// Dispatches within the caller's request
pub struct InlineSink {
    dispatcher: Arc<NotificationDispatcher>,
}

impl InlineSink {
    pub fn new(dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl NotificationSink for InlineSink {
    async fn submit(&self, event: OrderEvent) {
        self.dispatcher.dispatch(&event).await;
    }
}
