use std::sync::Arc;

use crate::geo::DistanceResolver;
use crate::observability::metrics::Metrics;
use crate::service::OrderService;
use crate::store::OrderStore;

pub struct AppState {
    pub orders: OrderService,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(store: Arc<dyn OrderStore>, resolver: Arc<dyn DistanceResolver>) -> Self {
        let metrics = Metrics::new();

        Self {
            orders: OrderService::new(store, resolver, metrics.clone()),
            metrics,
        }
    }
}
