//! In-memory fakes shared by unit tests across modules

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::domain::collaborators::{
    CustomerContact, CustomerDirectory, DeliveryReferenceData, ProductCatalog,
};
use crate::domain::order::{
    CustomerId, DeliveryDescription, DeliveryRefs, LineView, Order, OrderDraft, OrderEventTag,
    OrderId, OrderLine, OrderState, OrderView, ProductId,
};
use crate::notifications::{
    EmailMessage, EmailReceipt, EmailRoute, EmailTransport, MessagingTransport, RelayTransport,
    TemplateCatalog, TransportError,
};
use crate::store::{OrderStore, StoreError};

// ============================================================================
// Order store
// ============================================================================

#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: Mutex<BTreeMap<OrderId, Order>>,
    fail_next_update: AtomicBool,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an order with the two standard lines (2 x #7 @ 10.00, 1 x #8 @ 5.00)
    pub async fn seed(&self, id: OrderId, customer_id: CustomerId, state: OrderState) -> Order {
        let lines = vec![
            OrderLine {
                product_id: 7,
                quantity: 2,
                unit_price: Decimal::new(1000, 2),
                subtotal: Decimal::new(2000, 2),
            },
            OrderLine {
                product_id: 8,
                quantity: 1,
                unit_price: Decimal::new(500, 2),
                subtotal: Decimal::new(500, 2),
            },
        ];
        let order = Order {
            id,
            customer_id,
            payment_method_id: 1,
            delivery: DeliveryRefs {
                zone_id: 1,
                method_id: 1,
                schedule_id: 1,
            },
            total: Decimal::new(2500, 2),
            state,
            payment_confirmed: state.is_paid_stage(),
            payment_confirmed_at: state.is_paid_stage().then(Utc::now),
            created_at: Utc::now(),
            lines,
        };
        self.orders.lock().await.insert(id, order.clone());
        order
    }

    pub async fn len(&self) -> usize {
        self.orders.lock().await.len()
    }

    /// Make the next `update_progress` behave as if another writer won
    pub async fn fail_next_update(&self) {
        self.fail_next_update.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, draft: &OrderDraft) -> Result<Order, StoreError> {
        let mut orders = self.orders.lock().await;
        let id = orders.keys().next_back().copied().unwrap_or(0) + 1;
        let order = Order {
            id,
            customer_id: draft.customer_id,
            payment_method_id: draft.payment_method_id,
            delivery: draft.delivery,
            total: draft.total,
            state: OrderState::Pending,
            payment_confirmed: false,
            payment_confirmed_at: None,
            created_at: Utc::now(),
            lines: draft.lines.clone(),
        };
        orders.insert(id, order.clone());
        Ok(order)
    }

    async fn find(&self, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.lock().await.get(&order_id).cloned())
    }

    async fn list_for_customer(
        &self,
        customer_id: CustomerId,
        state: Option<OrderState>,
    ) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .orders
            .lock()
            .await
            .values()
            .filter(|o| o.customer_id == customer_id)
            .filter(|o| state.is_none_or(|s| o.state == s))
            .cloned()
            .collect())
    }

    async fn update_progress(&self, previous: &Order, next: &Order) -> Result<bool, StoreError> {
        if self.fail_next_update.swap(false, Ordering::SeqCst) {
            return Ok(false);
        }

        let mut orders = self.orders.lock().await;
        match orders.get_mut(&previous.id) {
            Some(stored)
                if stored.state == previous.state
                    && stored.payment_confirmed == previous.payment_confirmed =>
            {
                stored.state = next.state;
                stored.payment_confirmed = next.payment_confirmed;
                stored.payment_confirmed_at = next.payment_confirmed_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, order_id: OrderId) -> Result<bool, StoreError> {
        Ok(self.orders.lock().await.remove(&order_id).is_some())
    }
}

// ============================================================================
// Collaborators
// ============================================================================

pub struct FakeReferenceData {
    customers: HashMap<CustomerId, CustomerContact>,
    products: HashMap<ProductId, String>,
    delivery: Option<DeliveryDescription>,
}

impl FakeReferenceData {
    /// Customers 1 (Ana) and 2 (Bea), products 7 (PandaPlush) and 8 (Gift wrap)
    pub fn with_defaults() -> Self {
        Self {
            customers: HashMap::from([
                (
                    1,
                    CustomerContact {
                        name: "Ana".to_string(),
                        email: "ana@example.com".to_string(),
                        phone: Some("+5215512345678".to_string()),
                    },
                ),
                (
                    2,
                    CustomerContact {
                        name: "Bea".to_string(),
                        email: "bea@example.com".to_string(),
                        phone: None,
                    },
                ),
            ]),
            products: HashMap::from([
                (7, "PandaPlush".to_string()),
                (8, "Gift wrap".to_string()),
            ]),
            delivery: Some(sample_delivery()),
        }
    }
}

#[async_trait]
impl CustomerDirectory for FakeReferenceData {
    async fn lookup(&self, customer_id: CustomerId) -> Result<Option<CustomerContact>, StoreError> {
        Ok(self.customers.get(&customer_id).cloned())
    }
}

#[async_trait]
impl ProductCatalog for FakeReferenceData {
    async fn lookup(&self, product_id: ProductId) -> Result<Option<String>, StoreError> {
        Ok(self.products.get(&product_id).cloned())
    }
}

#[async_trait]
impl DeliveryReferenceData for FakeReferenceData {
    async fn describe(&self, _refs: DeliveryRefs) -> Result<Option<DeliveryDescription>, StoreError> {
        Ok(self.delivery.clone())
    }
}

// ============================================================================
// Transports
// ============================================================================

pub struct RecordingEmailTransport {
    sent: Mutex<Vec<EmailMessage>>,
    fail: bool,
    first_delay: Option<Duration>,
    calls: AtomicUsize,
}

impl RecordingEmailTransport {
    fn build(fail: bool, first_delay: Option<Duration>) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail,
            first_delay,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn succeeding() -> Self {
        Self::build(false, None)
    }

    pub fn failing() -> Self {
        Self::build(true, None)
    }

    /// Succeeds, but the first send takes `delay` to complete
    pub fn slow_first(delay: Duration) -> Self {
        Self::build(false, Some(delay))
    }

    /// Messages accepted so far
    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl EmailTransport for RecordingEmailTransport {
    async fn send(&self, message: &EmailMessage) -> Result<EmailReceipt, TransportError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            if let Some(delay) = self.first_delay {
                tokio::time::sleep(delay).await;
            }
        }
        if self.fail {
            return Err(TransportError::Rejected {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        self.sent.lock().await.push(message.clone());
        Ok(EmailReceipt {
            route: EmailRoute::HttpApi,
            message_id: Some("http-1".to_string()),
        })
    }
}

pub struct RecordingRelay {
    reachable: bool,
    sends_fail: bool,
    probes: AtomicUsize,
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingRelay {
    fn build(reachable: bool, sends_fail: bool) -> Self {
        Self {
            reachable,
            sends_fail,
            probes: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn healthy() -> Self {
        Self::build(true, false)
    }

    pub fn unreachable() -> Self {
        Self::build(false, false)
    }

    /// Probes pass but every send is refused
    pub fn failing_sends() -> Self {
        Self::build(true, true)
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl EmailTransport for RecordingRelay {
    async fn send(&self, message: &EmailMessage) -> Result<EmailReceipt, TransportError> {
        if !self.reachable || self.sends_fail {
            return Err(TransportError::Unavailable("relay refused message".to_string()));
        }
        self.sent.lock().await.push(message.clone());
        Ok(EmailReceipt {
            route: EmailRoute::Relay,
            message_id: None,
        })
    }
}

#[async_trait]
impl RelayTransport for RecordingRelay {
    async fn verify(&self) -> Result<(), TransportError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.reachable {
            Ok(())
        } else {
            Err(TransportError::Timeout("SMTP greeting"))
        }
    }
}

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub phone: String,
    pub template_id: String,
    pub variables: BTreeMap<String, String>,
}

pub struct RecordingMessaging {
    sent: Mutex<Vec<SentMessage>>,
    fail: bool,
}

impl RecordingMessaging {
    pub fn succeeding() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl MessagingTransport for RecordingMessaging {
    async fn send_template(
        &self,
        phone_e164: &str,
        template_id: &str,
        variables: &BTreeMap<String, String>,
    ) -> Result<String, TransportError> {
        if self.fail {
            return Err(TransportError::Rejected {
                status: 400,
                body: "template not approved".to_string(),
            });
        }
        let mut sent = self.sent.lock().await;
        sent.push(SentMessage {
            phone: phone_e164.to_string(),
            template_id: template_id.to_string(),
            variables: variables.clone(),
        });
        Ok(format!("SM{}", sent.len()))
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn templates() -> TemplateCatalog {
    TemplateCatalog::new(HashMap::from([
        (OrderEventTag::Created, "HX-created".to_string()),
        (OrderEventTag::PaymentConfirmed, "HX-payment".to_string()),
        (OrderEventTag::ReadyForPickup, "HX-pickup".to_string()),
        (OrderEventTag::Shipped, "HX-shipped".to_string()),
        (OrderEventTag::Delivered, "HX-delivered".to_string()),
    ]))
}

fn sample_delivery() -> DeliveryDescription {
    DeliveryDescription {
        zone: "Centro".to_string(),
        method: "Courier".to_string(),
        schedule: "Mon-Fri 9:00-18:00".to_string(),
        zone_price: Some(Decimal::new(4900, 2)),
    }
}

/// Order #42 for Ana: 2 x PandaPlush @ 10.00 and 1 x Gift wrap @ 5.00
pub fn sample_view() -> OrderView {
    OrderView {
        order_id: 42,
        order_number: OrderView::order_number_for(42),
        customer_name: "Ana".to_string(),
        customer_email: "ana@example.com".to_string(),
        customer_phone: Some("+5215512345678".to_string()),
        state: OrderState::Pending,
        total: Decimal::new(2500, 2),
        lines: vec![
            LineView {
                product_name: "PandaPlush".to_string(),
                quantity: 2,
                unit_price: Decimal::new(1000, 2),
                subtotal: Decimal::new(2000, 2),
            },
            LineView {
                product_name: "Gift wrap".to_string(),
                quantity: 1,
                unit_price: Decimal::new(500, 2),
                subtotal: Decimal::new(500, 2),
            },
        ],
        delivery: Some(sample_delivery()),
        created_at: Utc::now(),
    }
}

pub fn sample_email() -> EmailMessage {
    EmailMessage {
        to: "ana@example.com".to_string(),
        subject: "Order #42".to_string(),
        html: "<p>Hi Ana</p>".to_string(),
        text: "Hi Ana".to_string(),
        attachments: Vec::new(),
    }
}
