//! Order placement and listing.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::instrument;

use pattupavadai_core::{Email, OrderId};

use crate::db::{AccountStore, OrderStore, Page, RepositoryError};
use crate::models::{NewOrder, Order, OrderItem};
use crate::services::images::{ImagePromotion, ImageStore};

/// Default and maximum page size for one account's orders.
pub const USER_ORDERS_LIMIT: u32 = 100;

/// Default and maximum page size for the all-orders listing.
pub const ALL_ORDERS_LIMIT: u32 = 1000;

/// Errors that can occur while placing or listing orders.
#[derive(Debug, Error)]
pub enum OrderError {
    /// No account exists for the order's email.
    #[error("user not found")]
    UserNotFound,

    /// `order_date` is neither RFC 3339 nor `YYYY-MM-DD`.
    #[error("invalid order date: {0}")]
    InvalidOrderDate(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// An order as submitted by a client.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub user_email: Email,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub order_date: String,
}

/// Result of placing an order.
#[derive(Debug, Clone)]
pub struct PlacedOrder {
    pub id: OrderId,
    /// One record per item that referenced a preview image, in item order.
    pub image_promotions: Vec<ImagePromotion>,
}

/// Order service.
pub struct OrderService<'a> {
    accounts: &'a dyn AccountStore,
    orders: &'a dyn OrderStore,
    images: &'a ImageStore,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(
        accounts: &'a dyn AccountStore,
        orders: &'a dyn OrderStore,
        images: &'a ImageStore,
    ) -> Self {
        Self {
            accounts,
            orders,
            images,
        }
    }

    /// Persist an order, then claim any preview images its items reference.
    ///
    /// The account existence check is not transactional with the insert;
    /// accounts are never deleted, so the window is harmless. Image
    /// promotion problems are reported, never raised.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::UserNotFound` if no account has `user_email`.
    /// Returns `OrderError::InvalidOrderDate` if `order_date` cannot be parsed.
    #[instrument(skip(self, order), fields(user_email = %order.user_email, items = order.items.len()))]
    pub async fn place_order(&self, order: PlaceOrder) -> Result<PlacedOrder, OrderError> {
        if self.accounts.find_by_email(&order.user_email).await?.is_none() {
            return Err(OrderError::UserNotFound);
        }

        let placed_at = parse_order_date(&order.order_date)?;
        let new_order = NewOrder {
            user_email: order.user_email,
            items: order.items,
            total_amount: order.total_amount,
            order_date: order.order_date,
            placed_at,
        };

        let id = self.orders.insert(&new_order).await?;
        tracing::info!(order_id = %id, "order placed");

        let mut image_promotions = Vec::new();
        for (index, item) in new_order.items.iter().enumerate() {
            if let Some(image_name) = item.image_name.as_deref() {
                image_promotions.push(self.images.promote(id, index, image_name).await);
            }
        }

        Ok(PlacedOrder {
            id,
            image_promotions,
        })
    }

    /// One account's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the store fails.
    pub async fn list_for_user(
        &self,
        email: &Email,
        offset: Option<u64>,
        limit: Option<u64>,
    ) -> Result<Vec<Order>, OrderError> {
        let page = Page::new(offset, limit, USER_ORDERS_LIMIT);
        Ok(self.orders.list_for_user(email, page).await?)
    }

    /// Every order, newest first.
    ///
    /// Callers are responsible for restricting this to administrators.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the store fails.
    pub async fn list_all(
        &self,
        offset: Option<u64>,
        limit: Option<u64>,
    ) -> Result<Vec<Order>, OrderError> {
        let page = Page::new(offset, limit, ALL_ORDERS_LIMIT);
        Ok(self.orders.list_all(page).await?)
    }
}

/// Parse a client order date: RFC 3339, or `YYYY-MM-DD` as midnight UTC.
///
/// # Errors
///
/// Returns `OrderError::InvalidOrderDate` for anything else.
pub fn parse_order_date(raw: &str) -> Result<DateTime<Utc>, OrderError> {
    let trimmed = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| OrderError::InvalidOrderDate(raw.to_string()))
}
