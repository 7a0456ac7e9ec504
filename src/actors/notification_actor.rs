use actix::prelude::*;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::alerts::AlertCooldownTracker;
use crate::domain::order::OrderEvent;
use crate::metrics::Metrics;
use crate::notifications::{DispatchResult, NotificationDispatcher, NotificationSink};

// ============================================================================
// Notification Actor - dispatches order events off the request path
// ============================================================================
//
// OrderService submits events with `do_send` once persistence succeeded and
// returns immediately. Events are dispatched one at a time in mailbox order.
// The same (order, event) pair is dispatched at most once per dedupe window. Delivery is best-effort: nothing is persisted, a crash
// loses queued events.
//
// ============================================================================

#[derive(Message)]
#[rtype(result = "Option<DispatchResult>")]
pub struct DispatchOrderEvent(pub OrderEvent);

pub struct NotificationActor {
    dispatcher: Arc<NotificationDispatcher>,
    dedupe: AlertCooldownTracker,
    dedupe_window: Duration,
    metrics: Arc<Metrics>,
}

impl NotificationActor {
    pub fn new(
        dispatcher: Arc<NotificationDispatcher>,
        dedupe: AlertCooldownTracker,
        dedupe_window: Duration,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            dispatcher,
            dedupe,
            dedupe_window,
            metrics,
        }
    }
}

impl Actor for NotificationActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("NotificationActor started");
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Handler<DispatchOrderEvent> for NotificationActor {
    type Result = AtomicResponse<Self, Option<DispatchResult>>;

    // Atomic: the next event is picked up only after this one finished dispatching
    fn handle(&mut self, msg: DispatchOrderEvent, _: &mut Self::Context) -> Self::Result {
        let dispatcher = self.dispatcher.clone();
        let dedupe = self.dedupe.clone();
        let window = self.dedupe_window;
        let metrics = self.metrics.clone();
        let event = msg.0;

        let dispatch = async move {
            let key = event.dedupe_key();
            if !dedupe.should_send_and_mark(&key, window).await {
                tracing::info!(
                    order_id = event.view.order_id,
                    event = event.tag.as_str(),
                    "Duplicate order event dropped"
                );
                metrics.record_dispatch_duplicate();
                return None;
            }

            Some(dispatcher.dispatch(&event).await)
        };

        AtomicResponse::new(Box::pin(dispatch.into_actor(self)))
    }
}

#[async_trait]
impl NotificationSink for Addr<NotificationActor> {
    async fn submit(&self, event: OrderEvent) {
        tracing::debug!(
            order_id = event.view.order_id,
            event = event.tag.as_str(),
            "Queueing order notification"
        );
        self.do_send(DispatchOrderEvent(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::InMemoryCooldownStore;
    use crate::domain::order::OrderEventTag;
    use crate::test_support::{sample_view, templates, RecordingEmailTransport, RecordingMessaging};

    fn start_actor(
        email: Arc<RecordingEmailTransport>,
        messaging: Arc<RecordingMessaging>,
        metrics: Arc<Metrics>,
    ) -> Addr<NotificationActor> {
        let dispatcher = Arc::new(NotificationDispatcher::new(email, messaging, templates(), metrics.clone()));
        NotificationActor::new(
            dispatcher,
            AlertCooldownTracker::new(Arc::new(InMemoryCooldownStore::new())),
            Duration::from_secs(600),
            metrics,
        )
        .start()
    }

    #[actix::test]
    async fn test_event_is_dispatched() {
        let email = Arc::new(RecordingEmailTransport::succeeding());
        let messaging = Arc::new(RecordingMessaging::succeeding());
        let addr = start_actor(email.clone(), messaging.clone(), Arc::new(Metrics::new().unwrap()));

        let result = addr
            .send(DispatchOrderEvent(OrderEvent::new(OrderEventTag::Shipped, sample_view())))
            .await
            .unwrap();

        assert_eq!(result, Some(DispatchResult { email_delivered: true, messaging_delivered: true }));
        assert_eq!(email.sent().await.len(), 1);
        assert_eq!(messaging.sent().await.len(), 1);
    }

    #[actix::test]
    async fn test_duplicate_event_is_dropped() {
        let email = Arc::new(RecordingEmailTransport::succeeding());
        let messaging = Arc::new(RecordingMessaging::succeeding());
        let metrics = Arc::new(Metrics::new().unwrap());
        let addr = start_actor(email.clone(), messaging, metrics.clone());

        let event = OrderEvent::new(OrderEventTag::PaymentConfirmed, sample_view());
        let first = addr.send(DispatchOrderEvent(event.clone())).await.unwrap();
        let second = addr.send(DispatchOrderEvent(event)).await.unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(email.sent().await.len(), 1);
        assert_eq!(metrics.dispatch_duplicates.get(), 1);
    }

    #[actix::test]
    async fn test_events_are_dispatched_in_submission_order() {
        let email = Arc::new(RecordingEmailTransport::slow_first(Duration::from_millis(200)));
        let messaging = Arc::new(RecordingMessaging::succeeding());
        let addr = start_actor(email.clone(), messaging, Arc::new(Metrics::new().unwrap()));

        let sink: &dyn NotificationSink = &addr;
        sink.submit(OrderEvent::new(OrderEventTag::Created, sample_view())).await;
        sink.submit(OrderEvent::new(OrderEventTag::PaymentConfirmed, sample_view())).await;

        // Resolves only after everything queued ahead of it was handled
        addr.send(DispatchOrderEvent(OrderEvent::new(OrderEventTag::Shipped, sample_view())))
            .await
            .unwrap();

        let subjects: Vec<String> = email.sent().await.into_iter().map(|m| m.subject).collect();
        assert_eq!(
            subjects,
            vec![
                "We received your order #42".to_string(),
                "Payment confirmed for order #42".to_string(),
                "Order #42 is on its way".to_string(),
            ]
        );
    }

    #[actix::test]
    async fn test_different_events_of_same_order_both_dispatch() {
        let email = Arc::new(RecordingEmailTransport::succeeding());
        let messaging = Arc::new(RecordingMessaging::succeeding());
        let addr = start_actor(email.clone(), messaging, Arc::new(Metrics::new().unwrap()));

        addr.send(DispatchOrderEvent(OrderEvent::new(OrderEventTag::Created, sample_view())))
            .await
            .unwrap();
        addr.send(DispatchOrderEvent(OrderEvent::new(OrderEventTag::PaymentConfirmed, sample_view())))
            .await
            .unwrap();

        assert_eq!(email.sent().await.len(), 2);
    }
}
