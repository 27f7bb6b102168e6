//! MySQL-backed order store

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::Row;

use super::OrderStore;
use crate::error::AppError;
use crate::models::order::{Order, OrderStatus};

const CREATE_ORDERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS orders
(
    id BIGINT AUTO_INCREMENT PRIMARY KEY,
    distance BIGINT NOT NULL,
    status VARCHAR(25) NOT NULL
)"#;

pub struct MySqlOrderStore {
    pool: MySqlPool,
}

impl MySqlOrderStore {
    /// Create a new connection pool
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, sqlx::Error> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;

        tracing::info!(max_connections, "mysql connection pool established");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Create the `orders` table if it does not exist yet
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::query(CREATE_ORDERS_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

fn order_from_row(row: &MySqlRow) -> Result<Order, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<OrderStatus>()
        .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

    Ok(Order {
        id: row.try_get("id")?,
        distance: row.try_get("distance")?,
        status,
    })
}

#[async_trait]
impl OrderStore for MySqlOrderStore {
    async fn insert(&self, distance: i64, status: OrderStatus) -> Result<Order, AppError> {
        let result = sqlx::query("INSERT INTO orders (distance, status) VALUES (?, ?)")
            .bind(distance)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        let id = i64::try_from(result.last_insert_id())
            .map_err(|err| AppError::Internal(format!("order id out of range: {err}")))?;

        Ok(Order {
            id,
            distance,
            status,
        })
    }

    async fn conditional_take(&self, id: i64, new_status: OrderStatus) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE orders SET status = ? WHERE id = ? AND status <> ?")
            .bind(new_status.as_str())
            .bind(id)
            .bind(OrderStatus::Taken.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        // Nothing changed: the row is missing, already terminal, or already
        // holds `new_status`. Rows are never deleted, so this read is stable.
        let current: Option<String> = sqlx::query_scalar("SELECT status FROM orders WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match current.as_deref().map(str::parse::<OrderStatus>) {
            None => Err(AppError::NotFound(id)),
            Some(Ok(status)) if status.is_terminal() => Err(AppError::AlreadyTaken(id)),
            Some(Ok(_)) => Ok(()),
            Some(Err(err)) => Err(sqlx::Error::Decode(Box::new(err)).into()),
        }
    }

    async fn list(&self, offset: u64, limit: u64) -> Result<Vec<Order>, AppError> {
        let rows = sqlx::query(
            r#"SELECT id, distance, status
               FROM orders ORDER BY id ASC LIMIT ? OFFSET ?"#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let orders = rows
            .iter()
            .map(order_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(orders)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "mysql"
    }
}
