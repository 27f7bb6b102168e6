pub mod memory;
pub mod mysql;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::order::{Order, OrderStatus};

pub use memory::InMemoryOrderStore;
pub use mysql::MySqlOrderStore;

/// Persistence for order rows.
///
/// `conditional_take` is the only concurrency-sensitive operation: the
/// check-and-set must happen atomically per id, so two concurrent takes of
/// the same order can never both succeed.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Creates a row and returns it with its assigned id.
    async fn insert(&self, distance: i64, status: OrderStatus) -> Result<Order, AppError>;

    /// Sets `new_status` unless the order is missing (`NotFound`) or already
    /// terminal (`AlreadyTaken`).
    async fn conditional_take(&self, id: i64, new_status: OrderStatus) -> Result<(), AppError>;

    /// Ascending by id, skipping `offset` rows, at most `limit` rows.
    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<Order>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;

    fn backend(&self) -> &'static str;
}
