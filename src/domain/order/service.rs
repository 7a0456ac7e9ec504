use chrono::Utc;
use std::sync::Arc;

use crate::domain::collaborators::{CustomerDirectory, DeliveryReferenceData, ProductCatalog};
use crate::metrics::Metrics;
use crate::notifications::NotificationSink;
use crate::store::OrderStore;
use super::aggregate::{NewOrder, Order, OrderDraft};
use super::errors::OrderError;
use super::events::{LineView, OrderEvent, OrderEventTag, OrderTransition, OrderView};
use super::value_objects::{CustomerId, OrderId, OrderState};

// ============================================================================
// Order Service - Lifecycle orchestration
// ============================================================================
//
// Flow for every mutation:
// 1. Validate / load
// 2. Persist (the only step whose failure reaches the caller)
// 3. Assemble the enriched view from collaborators
// 4. Hand the event to the notification sink
//
// Steps 3 and 4 are best-effort and run after the commit.
//
// ============================================================================

pub struct OrderService {
    store: Arc<dyn OrderStore>,
    customers: Arc<dyn CustomerDirectory>,
    catalog: Arc<dyn ProductCatalog>,
    delivery: Arc<dyn DeliveryReferenceData>,
    notifier: Arc<dyn NotificationSink>,
    metrics: Arc<Metrics>,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn OrderStore>,
        customers: Arc<dyn CustomerDirectory>,
        catalog: Arc<dyn ProductCatalog>,
        delivery: Arc<dyn DeliveryReferenceData>,
        notifier: Arc<dyn NotificationSink>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            store,
            customers,
            catalog,
            delivery,
            notifier,
            metrics,
        }
    }

    pub async fn create_order(&self, request: NewOrder) -> Result<Order, OrderError> {
        let draft = OrderDraft::from_request(&request)?;

        if self.customers.lookup(draft.customer_id).await?.is_none() {
            return Err(OrderError::CustomerNotFound(draft.customer_id));
        }

        let order = self.store.create(&draft).await?;
        self.metrics.record_order_created();
        tracing::info!(
            order_id = order.id,
            customer_id = order.customer_id,
            total = %order.total,
            lines = order.lines.len(),
            "📦 Order persisted"
        );

        self.announce(&order, OrderEventTag::Created).await;
        Ok(order)
    }

    pub async fn transition_state(
        &self,
        order_id: OrderId,
        requested: OrderState,
    ) -> Result<Order, OrderError> {
        self.apply_event(order_id, OrderTransition::Advance(requested)).await
    }

    pub async fn confirm_payment(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.apply_event(order_id, OrderTransition::ConfirmPayment).await
    }

    /// Single write path for every change to an existing order's progress
    pub async fn apply_event(
        &self,
        order_id: OrderId,
        transition: OrderTransition,
    ) -> Result<Order, OrderError> {
        let current = self.load(order_id).await?;

        let (next, tag) = match current.apply(transition, Utc::now()) {
            Ok(Some(change)) => change,
            Ok(None) => {
                tracing::debug!(order_id = order_id, state = %current.state, ?transition, "No-op transition");
                return Ok(current);
            }
            Err(e) => {
                tracing::warn!(order_id = order_id, error = %e, "Transition rejected");
                return Err(e);
            }
        };

        if !self.store.update_progress(&current, &next).await? {
            tracing::warn!(order_id = order_id, "Order changed underneath transition");
            return Err(OrderError::ConcurrentModification(order_id));
        }

        self.metrics.record_transition(next.state.as_str());
        tracing::info!(
            order_id = order_id,
            from = %current.state,
            to = %next.state,
            payment_confirmed = next.payment_confirmed,
            "🔄 Order progressed"
        );

        self.announce(&next, tag).await;
        Ok(next)
    }

    pub async fn get_order(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.load(order_id).await
    }

    pub async fn list_orders(
        &self,
        customer_id: CustomerId,
        state: Option<OrderState>,
    ) -> Result<Vec<Order>, OrderError> {
        Ok(self.store.list_for_customer(customer_id, state).await?)
    }

    pub async fn delete_order(&self, order_id: OrderId) -> Result<(), OrderError> {
        if !self.store.delete(order_id).await? {
            return Err(OrderError::OrderNotFound(order_id));
        }
        tracing::info!(order_id = order_id, "🗑️ Order deleted");
        Ok(())
    }

    async fn load(&self, order_id: OrderId) -> Result<Order, OrderError> {
        self.store
            .find(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))
    }

    async fn announce(&self, order: &Order, tag: OrderEventTag) {
        match self.build_view(order).await {
            Some(view) => self.notifier.submit(OrderEvent::new(tag, view)).await,
            None => tracing::warn!(
                order_id = order.id,
                event = tag.as_str(),
                "Customer contact unavailable, notification skipped"
            ),
        }
    }

    /// Enrich an order for rendering. `None` only when the customer cannot be resolved.
    pub async fn build_view(&self, order: &Order) -> Option<OrderView> {
        let contact = match self.customers.lookup(order.customer_id).await {
            Ok(Some(contact)) => contact,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(order_id = order.id, error = %e, "Customer lookup failed");
                return None;
            }
        };

        let mut lines = Vec::with_capacity(order.lines.len());
        for line in &order.lines {
            let product_name = match self.catalog.lookup(line.product_id).await {
                Ok(Some(name)) => name,
                Ok(None) => format!("Product #{}", line.product_id),
                Err(e) => {
                    tracing::debug!(product_id = line.product_id, error = %e, "Catalog lookup failed");
                    format!("Product #{}", line.product_id)
                }
            };
            lines.push(LineView {
                product_name,
                quantity: line.quantity,
                unit_price: line.unit_price,
                subtotal: line.subtotal,
            });
        }

        let delivery = self.delivery.describe(order.delivery).await.unwrap_or_else(|e| {
            tracing::debug!(order_id = order.id, error = %e, "Delivery lookup failed");
            None
        });

        Some(OrderView {
            order_id: order.id,
            order_number: OrderView::order_number_for(order.id),
            customer_name: contact.name,
            customer_email: contact.email,
            customer_phone: contact.phone,
            state: order.state,
            total: order.total,
            lines,
            delivery,
            created_at: order.created_at,
        })
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
