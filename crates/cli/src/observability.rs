//! Tracing subscriber and optional OpenTelemetry export.
//!
//! Every `tracing` span and event emitted by the workspace crates flows
//! through the subscriber installed here. `RUST_LOG` selects the level
//! (`info` when unset). When an OTLP endpoint is configured, spans are also
//! batched to the collector over gRPC and flushed by [`Telemetry::shutdown`].

use anyhow::Context;
use opentelemetry::{global, trace::TracerProvider as _, KeyValue};
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::{runtime, trace::TracerProvider, Resource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, TelemetryConfig};

const DEFAULT_FILTER: &str = "info";

/// Handle to the installed telemetry pipeline.
#[derive(Debug)]
pub struct Telemetry {
    provider: Option<TracerProvider>,
}

/// Installs the global subscriber. Call once, inside the Tokio runtime.
pub fn init(config: &TelemetryConfig) -> anyhow::Result<Telemetry> {
    let provider = config
        .otlp_endpoint
        .as_deref()
        .map(|endpoint| tracer_provider(config, endpoint))
        .transpose()?;

    let otel_layer = provider.as_ref().map(|provider| {
        global::set_tracer_provider(provider.clone());
        tracing_opentelemetry::layer().with_tracer(provider.tracer(config.service_name.clone()))
    });
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let (json, pretty) = match config.log_format {
        LogFormat::Json => (Some(tracing_subscriber::fmt::layer().json()), None),
        LogFormat::Pretty => (None, Some(tracing_subscriber::fmt::layer().pretty())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .with(otel_layer)
        .try_init()
        .context("failed to install the tracing subscriber")?;

    tracing::info!(
        service_name = %config.service_name,
        log_format = ?config.log_format,
        otlp_endpoint = ?config.otlp_endpoint,
        "Telemetry initialized"
    );
    Ok(Telemetry { provider })
}

fn tracer_provider(config: &TelemetryConfig, endpoint: &str) -> anyhow::Result<TracerProvider> {
    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .with_context(|| format!("failed to create the OTLP exporter for {endpoint}"))?;
    let resource = Resource::new(vec![
        KeyValue::new("service.name", config.service_name.clone()),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
    ]);
    Ok(TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(resource)
        .build())
}

impl Telemetry {
    /// Returns `true` when spans are exported to a collector.
    pub fn exports_spans(&self) -> bool {
        self.provider.is_some()
    }

    /// Flushes pending spans and stops the exporter.
    pub fn shutdown(self) {
        if let Some(provider) = self.provider {
            if let Err(err) = provider.shutdown() {
                tracing::warn!(error = %err, "Tracer shutdown failed");
            }
        }
    }
}
