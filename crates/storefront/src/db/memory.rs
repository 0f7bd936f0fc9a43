//! In-memory stores for tests and local development.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use pattupavadai_core::{Email, OrderId};

use super::{AccountStore, OrderStore, Page, RepositoryError};
use crate::models::{Account, NewOrder, Order, SessionToken};

fn poisoned() -> RepositoryError {
    RepositoryError::DataCorruption("in-memory store lock poisoned".to_owned())
}

/// Account store held in a `HashMap`.
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<Email, Account>>,
}

impl MemoryAccountStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.read().map_or(0, |accounts| accounts.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError> {
        let accounts = self.accounts.read().map_err(|_| poisoned())?;
        Ok(accounts.get(email).cloned())
    }

    async fn insert(&self, account: &Account) -> Result<(), RepositoryError> {
        let mut accounts = self.accounts.write().map_err(|_| poisoned())?;
        if accounts.contains_key(&account.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        accounts.insert(account.email.clone(), account.clone());
        Ok(())
    }

    async fn update_token(
        &self,
        email: &Email,
        token: &SessionToken,
    ) -> Result<(), RepositoryError> {
        let mut accounts = self.accounts.write().map_err(|_| poisoned())?;
        let account = accounts.get_mut(email).ok_or(RepositoryError::NotFound)?;
        account.token = token.clone();
        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// Order store held in a `Vec`.
#[derive(Default)]
pub struct MemoryOrderStore {
    orders: RwLock<Vec<Order>>,
}

impl MemoryOrderStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.read().map_or(0, |orders| orders.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn newest_first(
        &self,
        filter: impl Fn(&Order) -> bool,
        page: Page,
    ) -> Result<Vec<Order>, RepositoryError> {
        let orders = self.orders.read().map_err(|_| poisoned())?;
        let mut matching: Vec<&Order> = orders.iter().filter(|o| filter(o)).collect();
        matching.sort_by(|a, b| b.placed_at.cmp(&a.placed_at).then(b.id.cmp(&a.id)));

        let (offset, limit) = page.bounds();
        Ok(matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl OrderStore for MemoryOrderStore {
    async fn insert(&self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        let id = OrderId::generate();
        let mut orders = self.orders.write().map_err(|_| poisoned())?;
        orders.push(Order::from_new(id, order.clone()));
        Ok(id)
    }

    async fn list_for_user(
        &self,
        email: &Email,
        page: Page,
    ) -> Result<Vec<Order>, RepositoryError> {
        self.newest_first(|o| &o.user_email == email, page)
    }

    async fn list_all(&self, page: Page) -> Result<Vec<Order>, RepositoryError> {
        self.newest_first(|_| true, page)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use pattupavadai_core::{AccountRole, AuthProvider};
    use rust_decimal::Decimal;

    use crate::models::PasswordCredential;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    fn account(address: &str) -> Account {
        Account {
            email: email(address),
            name: "Priya".to_string(),
            shipping_address: "Madurai".to_string(),
            contact_details: "+91".to_string(),
            password: PasswordCredential::None,
            token: SessionToken::new("t0".to_string()),
            picture: None,
            auth_provider: AuthProvider::Local,
            role: AccountRole::Customer,
            created_at: Utc::now(),
        }
    }

    fn order(address: &str, day: i64) -> NewOrder {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        NewOrder {
            user_email: email(address),
            items: vec![],
            total_amount: Decimal::new(100, 0),
            order_date: format!("day {day}"),
            placed_at: base + Duration::days(day),
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_email() {
        let store = MemoryAccountStore::new();
        store.insert(&account("priya@example.com")).await.unwrap();
        let result = store.insert(&account("priya@example.com")).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_update_token() {
        let store = MemoryAccountStore::new();
        store.insert(&account("priya@example.com")).await.unwrap();
        store
            .update_token(&email("priya@example.com"), &SessionToken::new("t1".into()))
            .await
            .unwrap();
        let found = store
            .find_by_email(&email("priya@example.com"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.token.as_str(), "t1");

        let missing = store
            .update_token(&email("ghost@example.com"), &SessionToken::new("t".into()))
            .await;
        assert!(matches!(missing, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_orders_newest_first_and_filtered() {
        let store = MemoryOrderStore::new();
        for day in [3, 1, 2] {
            store.insert(&order("priya@example.com", day)).await.unwrap();
        }
        store.insert(&order("meena@example.com", 9)).await.unwrap();

        let mine = store
            .list_for_user(&email("priya@example.com"), Page::new(None, None, 100))
            .await
            .unwrap();
        let dates: Vec<_> = mine.iter().map(|o| o.order_date.as_str()).collect();
        assert_eq!(dates, vec!["day 3", "day 2", "day 1"]);

        let all = store.list_all(Page::new(None, None, 1000)).await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].order_date, "day 9");
    }

    #[tokio::test]
    async fn test_orders_paging() {
        let store = MemoryOrderStore::new();
        for day in 0..5 {
            store.insert(&order("priya@example.com", day)).await.unwrap();
        }

        let page = store
            .list_all(Page::new(Some(1), Some(2), 1000))
            .await
            .unwrap();
        let dates: Vec<_> = page.iter().map(|o| o.order_date.as_str()).collect();
        assert_eq!(dates, vec!["day 3", "day 2"]);
    }
}
