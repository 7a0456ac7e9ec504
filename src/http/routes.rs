use actix_web::error::InternalError;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::alerts::{AlertError, LowStockSignal};
use crate::domain::order::{NewOrder, Order, OrderError, OrderId, OrderState};
use super::AppState;

// ============================================================================
// Request / Response bodies
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderCreated {
    order_id: OrderId,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StateChange {
    state: String,
}

#[derive(Debug, Serialize)]
struct OrderEnvelope {
    order: Order,
}

#[derive(Debug, Serialize)]
struct Deleted {
    deleted: bool,
}

/// Mount order and alert routes. Expects `web::Data<AppState>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let body = serde_json::json!({ "error": err.to_string() });
        InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
    }))
    .service(
        web::scope("/orders")
            .route("", web::post().to(create_order))
            .route("", web::get().to(list_orders))
            .route("/{id}", web::get().to(get_order))
            .route("/{id}", web::delete().to(delete_order))
            .route("/{id}/state", web::put().to(transition_state))
            .route("/{id}/confirm-payment", web::put().to(confirm_payment)),
    )
    .route("/alerts/low-stock", web::post().to(low_stock));
}

// ============================================================================
// Handlers
// ============================================================================

async fn create_order(
    state: web::Data<AppState>,
    body: web::Json<NewOrder>,
) -> Result<HttpResponse, OrderError> {
    let order = state.orders.create_order(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(OrderCreated { order_id: order.id }))
}

async fn list_orders(
    state: web::Data<AppState>,
    request: HttpRequest,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, OrderError> {
    let customer_id = state.auth.identify(&request)?;
    let filter = query
        .state
        .as_deref()
        .map(str::parse::<OrderState>)
        .transpose()?;

    let orders = state.orders.list_orders(customer_id, filter).await?;
    Ok(HttpResponse::Ok().json(orders))
}

async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<OrderId>,
) -> Result<HttpResponse, OrderError> {
    let order = state.orders.get_order(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(order))
}

async fn transition_state(
    state: web::Data<AppState>,
    path: web::Path<OrderId>,
    body: web::Json<StateChange>,
) -> Result<HttpResponse, OrderError> {
    let requested: OrderState = body.state.parse()?;
    let order = state.orders.transition_state(path.into_inner(), requested).await?;
    Ok(HttpResponse::Ok().json(order))
}

async fn confirm_payment(
    state: web::Data<AppState>,
    path: web::Path<OrderId>,
) -> Result<HttpResponse, OrderError> {
    let order = state.orders.confirm_payment(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(OrderEnvelope { order }))
}

async fn delete_order(
    state: web::Data<AppState>,
    path: web::Path<OrderId>,
) -> Result<HttpResponse, OrderError> {
    state.orders.delete_order(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(Deleted { deleted: true }))
}

async fn low_stock(
    state: web::Data<AppState>,
    body: web::Json<LowStockSignal>,
) -> Result<HttpResponse, AlertError> {
    let outcome = state.alerts.signal(&body).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

// ============================================================================
// Unit Tests
// ============================================================================
