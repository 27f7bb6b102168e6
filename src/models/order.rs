use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Unassigned,
    Taken,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Unassigned => "UNASSIGNED",
            OrderStatus::Taken => "TAKEN",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Taken)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown order status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "UNASSIGNED" => Ok(OrderStatus::Unassigned),
            "TAKEN" => Ok(OrderStatus::Taken),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: i64,
    pub distance: i64,
    pub status: OrderStatus,
}

/// Raw body of `POST /orders`; shape is checked by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderRequest {
    pub origin: Vec<String>,
    pub destination: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TakeOrderRequest {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TakeOrderResponse {
    pub status: &'static str,
}

impl TakeOrderResponse {
    pub fn success() -> Self {
        Self { status: "SUCCESS" }
    }
}
