use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::error::AppError;
use crate::geo::DistanceResolver;
use crate::models::coordinate::{GeoPoint, Route};
use crate::models::order::{Order, OrderStatus, PlaceOrderRequest, TakeOrderResponse};
use crate::observability::metrics::Metrics;
use crate::store::OrderStore;

/// Order use cases. Holds no state of its own between calls.
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    resolver: Arc<dyn DistanceResolver>,
    metrics: Metrics,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn OrderStore>,
        resolver: Arc<dyn DistanceResolver>,
        metrics: Metrics,
    ) -> Self {
        Self {
            store,
            resolver,
            metrics,
        }
    }

    pub fn store(&self) -> &dyn OrderStore {
        self.store.as_ref()
    }

    pub fn resolver_name(&self) -> &'static str {
        self.resolver.name()
    }

    pub async fn place_order(&self, request: PlaceOrderRequest) -> Result<Order, AppError> {
        let route = validate_route(&request)?;

        let start = Instant::now();
        let resolved = self
            .resolver
            .resolve(&route.origin, &route.destination)
            .await;
        let outcome = if resolved.is_ok() { "success" } else { "error" };
        self.metrics
            .distance_resolution_seconds
            .with_label_values(&[outcome])
            .observe(start.elapsed().as_secs_f64());

        let distance = resolved?;
        let order = self.store.insert(distance, OrderStatus::Unassigned).await?;

        self.metrics.orders_placed_total.inc();
        info!(order_id = order.id, distance = order.distance, "order placed");

        Ok(order)
    }

    pub async fn take_order(
        &self,
        id: i64,
        requested_status: &str,
    ) -> Result<TakeOrderResponse, AppError> {
        let status = requested_status
            .parse::<OrderStatus>()
            .map_err(|err| AppError::Validation(format!("invalid request payload: {err}")))?;

        if status != OrderStatus::Taken {
            return Err(AppError::Validation(format!(
                "invalid request payload: status can only be set to {}",
                OrderStatus::Taken
            )));
        }

        let result = self.store.conditional_take(id, status).await;
        let outcome = match &result {
            Ok(()) => "success",
            Err(AppError::NotFound(_)) => "not_found",
            Err(AppError::AlreadyTaken(_)) => "already_taken",
            Err(_) => "error",
        };
        self.metrics
            .order_takes_total
            .with_label_values(&[outcome])
            .inc();

        match result {
            Ok(()) => {
                info!(order_id = id, "order taken");
                Ok(TakeOrderResponse::success())
            }
            Err(err) => {
                warn!(order_id = id, error = %err, "take order rejected");
                Err(err)
            }
        }
    }

    /// `page` is the 1-based position of the first returned order.
    pub async fn list_orders(&self, page: i64, limit: i64) -> Result<Vec<Order>, AppError> {
        if page < 1 {
            return Err(AppError::Validation("page should start with 1".to_string()));
        }
        if limit < 0 {
            return Err(AppError::Validation(
                "limit should be a non-negative integer".to_string(),
            ));
        }

        // Both are non-negative after the checks above.
        self.store.list((page - 1) as u64, limit as u64).await
    }
}

fn validate_route(request: &PlaceOrderRequest) -> Result<Route, AppError> {
    let origin = GeoPoint::from_pair("origin", &request.origin)?;
    let destination = GeoPoint::from_pair("destination", &request.destination)?;
    Ok(Route {
        origin,
        destination,
    })
}
