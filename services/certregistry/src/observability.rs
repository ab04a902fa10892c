//! Observability wiring for the registry service.
//!
//! # Purpose
//! Initializes tracing, W3C trace-context propagation for inbound requests,
//! and the Prometheus endpoint for the registry's lookup and lifecycle
//! counters.
//!
//! # Notes
//! - OTLP export is enabled only when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
//! - Every step is idempotent so tests can initialize repeatedly.
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use opentelemetry::propagation::Extractor;
use opentelemetry::trace::TracerProvider;
use opentelemetry::{Context, KeyValue, global};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::net::SocketAddr;
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

static SUBSCRIBER: OnceLock<()> = OnceLock::new();
static PROPAGATOR: OnceLock<()> = OnceLock::new();
static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Resource attributes read from the environment; the first variable that is
/// set wins.
const RESOURCE_ENV: [(&str, &[&str]); 2] = [
    (
        "service.instance.id",
        &["CERTREG_SERVICE_INSTANCE_ID", "HOSTNAME"],
    ),
    ("deployment.environment", &["DEPLOYMENT_ENVIRONMENT"]),
];

pub fn init_observability(service_name: &str) -> PrometheusHandle {
    install_propagator();
    SUBSCRIBER.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let registry = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer());
        let otel_layer = build_tracer_provider(service_name).map(|provider| {
            tracing_opentelemetry::layer().with_tracer(provider.tracer(service_name.to_string()))
        });
        // Option<Layer> is itself a layer; None leaves the fmt-only stack.
        let _ = registry.with(otel_layer).try_init();
    });
    install_metrics_recorder()
}

fn install_propagator() {
    PROPAGATOR.get_or_init(|| global::set_text_map_propagator(TraceContextPropagator::new()));
}

fn build_tracer_provider(service_name: &str) -> Option<SdkTracerProvider> {
    std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok()?;
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()
        .ok()?;
    let resource = Resource::builder_empty()
        .with_attributes(resource_attributes(service_name))
        .build();
    Some(
        SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_resource(resource)
            .build(),
    )
}

fn resource_attributes(service_name: &str) -> Vec<KeyValue> {
    let from_env = RESOURCE_ENV.iter().filter_map(|(attribute, vars)| {
        vars.iter()
            .find_map(|var| std::env::var(var).ok())
            .map(|value| KeyValue::new(*attribute, value))
    });
    std::iter::once(KeyValue::new("service.name", service_name.to_string()))
        .chain(from_env)
        .collect()
}

/// Parent context for a request span from its `traceparent`/`tracestate`
/// headers.
pub fn trace_context_from_headers(headers: &axum::http::HeaderMap) -> Context {
    install_propagator();
    global::get_text_map_propagator(|prop| prop.extract(&HeaderMapExtractor(headers)))
}

struct HeaderMapExtractor<'a>(&'a axum::http::HeaderMap);

impl Extractor for HeaderMapExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|name| name.as_str()).collect()
    }
}

fn install_metrics_recorder() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                describe_registry_metrics();
                handle
            }
            Err(err) => {
                // Another recorder owns the global slot; keep a detached handle
                // so /metrics still answers.
                tracing::warn!(error = %err, "metrics recorder already installed");
                PrometheusBuilder::new().build_recorder().handle()
            }
        })
        .clone()
}

fn describe_registry_metrics() {
    metrics::describe_counter!(
        "certreg_public_lookups_total",
        "Anonymous searches and slug views by outcome"
    );
    metrics::describe_counter!(
        "certreg_certificate_changes_total",
        "Certificate writes by operation"
    );
    metrics::describe_counter!(
        "certreg_status_changes_total",
        "Status transitions by target status"
    );
    metrics::describe_counter!(
        "certreg_identity_conflicts_total",
        "Certificate number or slug collisions retried on create"
    );
    metrics::describe_gauge!(
        "certreg_certificates_total",
        "Certificates currently stored"
    );
}

pub fn metrics_router(handle: PrometheusHandle) -> axum::Router {
    axum::Router::new().route(
        "/metrics",
        axum::routing::get(move || async move { handle.render() }),
    )
}

pub async fn serve_metrics(handle: PrometheusHandle, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "metrics listening");
    axum::serve(listener, metrics_router(handle).into_make_service()).await
}
