//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pattupavadai_core::{Email, OrderId};

/// One line of an order.
///
/// Items have no identity beyond their index in the parent order. Unset
/// attributes serialize as `null` so clients always see the full shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub product_name: String,
    pub fabric_type: Option<String>,
    pub top_style: Option<String>,
    pub bottom_style: Option<String>,
    pub dress_type: Option<String>,
    pub sleeve_type: Option<String>,
    pub neck_design: Option<String>,
    pub border_design: Option<String>,
    pub top_color: Option<String>,
    pub bottom_color: Option<String>,
    pub accent: Option<String>,
    /// Deprecated; kept for older clients.
    pub fabric_id: Option<String>,
    /// Deprecated; kept for older clients.
    pub fabric_name: Option<String>,
    /// Preview image to claim when the order is placed.
    pub image_name: Option<String>,
}

/// An order ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_email: Email,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    /// Caller-supplied date string, returned unmodified.
    pub order_date: String,
    /// Parsed form of `order_date`; drives sort order.
    pub placed_at: DateTime<Utc>,
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    pub user_email: Email,
    pub items: Vec<OrderItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub order_date: String,
    #[serde(skip)]
    pub placed_at: DateTime<Utc>,
}

impl Order {
    /// Attach a store-assigned ID to a new order.
    #[must_use]
    pub fn from_new(id: OrderId, order: NewOrder) -> Self {
        Self {
            id,
            user_email: order.user_email,
            items: order.items,
            total_amount: order.total_amount,
            order_date: order.order_date,
            placed_at: order.placed_at,
        }
    }
}
