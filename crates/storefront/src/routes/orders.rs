//! Order route handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pattupavadai_core::{Email, OrderId};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::{Order, OrderItem};
use crate::services::images::ImagePromotion;
use crate::services::orders::PlaceOrder;
use crate::state::AppState;

use super::ApiJson;

/// Order request body.
#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    pub user_email: String,
    pub items: Vec<OrderItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub order_date: String,
}

/// Response to a placed order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub message: &'static str,
    pub order_id: OrderId,
    #[serde(rename = "image_promotions")]
    pub image_promotions: Vec<ImagePromotion>,
}

/// `?offset=&limit=` paging parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

/// Place an order.
pub async fn create_order(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<OrderRequest>,
) -> Result<(StatusCode, ApiJson<OrderCreated>)> {
    let user_email = Email::parse(body.user_email.trim())
        .map_err(|_| AppError::NotFound("User not found".to_string()))?;
    if body.total_amount.is_sign_negative() {
        return Err(AppError::BadRequest(
            "total_amount cannot be negative".to_string(),
        ));
    }

    let placed = state
        .order_service()
        .place_order(PlaceOrder {
            user_email,
            items: body.items,
            total_amount: body.total_amount,
            order_date: body.order_date,
        })
        .await?;

    let order_id = placed.id.to_string();
    add_breadcrumb("order", "Order placed", Some(&[("order_id", order_id.as_str())]));

    Ok((
        StatusCode::CREATED,
        ApiJson(OrderCreated {
            message: "Order created successfully",
            order_id: placed.id,
            image_promotions: placed.image_promotions,
        }),
    ))
}

/// One account's orders, newest first.
pub async fn list_user_orders(
    State(state): State<AppState>,
    Path(user_email): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<ApiJson<Vec<Order>>> {
    let email = Email::parse(&user_email)
        .map_err(|_| AppError::BadRequest("Invalid email address".to_string()))?;

    let orders = state
        .order_service()
        .list_for_user(&email, page.offset, page.limit)
        .await?;
    Ok(ApiJson(orders))
}

/// Every order, newest first.
pub async fn list_all_orders(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<ApiJson<Vec<Order>>> {
    let orders = state
        .order_service()
        .list_all(page.offset, page.limit)
        .await?;
    Ok(ApiJson(orders))
}
