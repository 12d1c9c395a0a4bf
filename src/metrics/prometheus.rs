//! Prometheus metrics definitions and HTTP server

use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus::{
    Encoder, Gauge, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use tokio::net::TcpListener;
use tracing::{error, info};

const NAMESPACE: &str = "ram_controller";

/// Metrics owned by one controller process
pub struct Metrics {
    registry: Registry,

    /// Total number of reconciliations
    pub reconciliations: IntCounterVec,

    /// Total number of reconciliation errors
    pub reconciliation_errors: IntCounterVec,

    /// Reconciliation duration histogram
    pub reconcile_duration: HistogramVec,

    /// RAM API calls by operation type, operation and outcome
    pub api_calls: IntCounterVec,

    /// Controller health (1 = healthy, 0 = unhealthy)
    pub health: Gauge,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let reconciliations = IntCounterVec::new(
            Opts::new("reconciliations_total", "Total number of reconciliations")
                .namespace(NAMESPACE),
            &["kind"],
        )?;
        let reconciliation_errors = IntCounterVec::new(
            Opts::new(
                "reconciliation_errors_total",
                "Total number of reconciliation errors",
            )
            .namespace(NAMESPACE),
            &["kind"],
        )?;
        let reconcile_duration = HistogramVec::new(
            HistogramOpts::new(
                "reconcile_duration_seconds",
                "Duration of reconciliations in seconds",
            )
            .namespace(NAMESPACE)
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
            &["kind"],
        )?;
        let api_calls = IntCounterVec::new(
            Opts::new("aws_api_calls_total", "Number of calls made to the RAM API")
                .namespace(NAMESPACE),
            &["op_type", "op_id", "outcome"],
        )?;
        let health = Gauge::with_opts(
            Opts::new("health", "Controller health status (1 = healthy, 0 = unhealthy)")
                .namespace(NAMESPACE),
        )?;

        registry.register(Box::new(reconciliations.clone()))?;
        registry.register(Box::new(reconciliation_errors.clone()))?;
        registry.register(Box::new(reconcile_duration.clone()))?;
        registry.register(Box::new(api_calls.clone()))?;
        registry.register(Box::new(health.clone()))?;

        Ok(Self {
            registry,
            reconciliations,
            reconciliation_errors,
            reconcile_duration,
            api_calls,
            health,
        })
    }

    /// Record the outcome of one RAM API call
    pub fn record_api_call<T, E>(&self, op_type: &str, op_id: &str, result: &Result<T, E>) {
        let outcome = if result.is_ok() { "success" } else { "failure" };
        self.api_calls
            .with_label_values(&[op_type, op_id, outcome])
            .inc();
    }

    /// Number of recorded calls for one operation and outcome
    pub fn api_call_count(&self, op_type: &str, op_id: &str, outcome: &str) -> u64 {
        self.api_calls
            .with_label_values(&[op_type, op_id, outcome])
            .get()
    }

    /// Render every metric in the Prometheus text format
    pub fn encode(&self) -> prometheus::Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }
}

/// Start the metrics HTTP server
pub async fn serve(port: u16, metrics: Arc<Metrics>) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    metrics.health.set(1.0);

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| handle_request(req, metrics.clone()));
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                error!("Error serving connection: {}", e);
            }
        });
    }
}

/// Handle HTTP requests
async fn handle_request(
    req: Request<hyper::body::Incoming>,
    metrics: Arc<Metrics>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let response = match req.uri().path() {
        "/metrics" => metrics_response(&metrics),
        "/healthz" | "/health" => text_response(StatusCode::OK, "ok"),
        "/readyz" | "/ready" => text_response(StatusCode::OK, "ok"),
        _ => text_response(StatusCode::NOT_FOUND, "Not Found"),
    };

    Ok(response)
}

fn metrics_response(metrics: &Metrics) -> Response<Full<Bytes>> {
    match metrics.encode() {
        Ok(buffer) => {
            let mut response = Response::new(Full::new(Bytes::from(buffer)));
            response.headers_mut().insert(
                hyper::header::CONTENT_TYPE,
                hyper::header::HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            response
        }
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            text_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics")
        }
    }
}

fn text_response(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
}
