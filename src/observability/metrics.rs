use prometheus::{Encoder, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub orders_placed_total: IntCounter,
    pub order_takes_total: IntCounterVec,
    pub distance_resolution_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let orders_placed_total =
            IntCounter::new("orders_placed_total", "Total orders placed successfully")
                .expect("valid orders_placed_total metric");

        let order_takes_total = IntCounterVec::new(
            Opts::new("order_takes_total", "Take-order attempts by outcome"),
            &["outcome"],
        )
        .expect("valid order_takes_total metric");

        let distance_resolution_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "distance_resolution_seconds",
                "Latency of distance resolution in seconds",
            ),
            &["outcome"],
        )
        .expect("valid distance_resolution_seconds metric");

        registry
            .register(Box::new(orders_placed_total.clone()))
            .expect("register orders_placed_total");
        registry
            .register(Box::new(order_takes_total.clone()))
            .expect("register order_takes_total");
        registry
            .register(Box::new(distance_resolution_seconds.clone()))
            .expect("register distance_resolution_seconds");

        Self {
            registry,
            orders_placed_total,
            order_takes_total,
            distance_resolution_seconds,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
