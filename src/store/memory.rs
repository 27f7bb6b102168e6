use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::OrderStore;
use crate::error::AppError;
use crate::models::order::{Order, OrderStatus};

pub struct InMemoryOrderStore {
    orders: DashMap<i64, Order>,
    next_id: AtomicI64,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self {
            orders: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, distance: i64, status: OrderStatus) -> Result<Order, AppError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let order = Order {
            id,
            distance,
            status,
        };

        self.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn conditional_take(&self, id: i64, new_status: OrderStatus) -> Result<(), AppError> {
        // The shard write lock is held until `order` drops.
        let mut order = self.orders.get_mut(&id).ok_or(AppError::NotFound(id))?;

        if order.status.is_terminal() {
            return Err(AppError::AlreadyTaken(id));
        }

        order.status = new_status;
        Ok(())
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<Order>, AppError> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by_key(|order| order.id);

        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        Ok(orders.into_iter().skip(offset).take(limit).collect())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
