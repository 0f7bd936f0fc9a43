//! `PostgreSQL` order store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use pattupavadai_core::{Email, OrderId};

use super::{OrderStore, Page, RepositoryError};
use crate::models::{NewOrder, Order, OrderItem};

/// Row shape of the `orders` table.
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_email: String,
    items: Json<Vec<OrderItem>>,
    total_amount: Decimal,
    order_date: String,
    placed_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let user_email = Email::parse(&row.user_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            user_email,
            items: row.items.0,
            total_amount: row.total_amount,
            order_date: row.order_date,
            placed_at: row.placed_at,
        })
    }
}

/// Order store backed by the `orders` table.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Create a new order store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert(&self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        let id = OrderId::generate();

        sqlx::query(
            r"
            INSERT INTO orders (id, user_email, items, total_amount, order_date, placed_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(id)
        .bind(&order.user_email)
        .bind(Json(&order.items))
        .bind(order.total_amount)
        .bind(&order.order_date)
        .bind(order.placed_at)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn list_for_user(
        &self,
        email: &Email,
        page: Page,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_email, items, total_amount, order_date, placed_at
            FROM orders
            WHERE user_email = $1
            ORDER BY placed_at DESC, id DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(email)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn list_all(&self, page: Page) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_email, items, total_amount, order_date, placed_at
            FROM orders
            ORDER BY placed_at DESC, id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }
}
