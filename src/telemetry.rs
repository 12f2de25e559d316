use crate::config::{LogFormat, TelemetryConfig};
use opentelemetry::{KeyValue, global};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    metrics::{PeriodicReader, SdkMeterProvider},
    propagation::TraceContextPropagator,
    trace::SdkTracerProvider,
};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

const SERVICE: &str = "pharmacy-server";

/// Keeps the OpenTelemetry providers alive until shutdown.
#[derive(Debug, Default)]
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
    meter_provider: Option<SdkMeterProvider>,
}

impl TelemetryGuard {
    /// Flushes remaining spans and metrics.
    pub fn shutdown(self) {
        if let Some(provider) = self.tracer_provider
            && let Err(e) = provider.shutdown()
        {
            tracing::warn!(error = %e, "Failed to shut down tracer provider");
        }
        if let Some(provider) = self.meter_provider
            && let Err(e) = provider.shutdown()
        {
            tracing::warn!(error = %e, "Failed to shut down meter provider");
        }
    }
}

/// Installs the tracing subscriber and, when an OTLP endpoint is configured,
/// the OpenTelemetry trace and metric pipelines.
///
/// # Errors
/// Returns an error if a filter directive or an OTLP exporter cannot be built.
pub fn init_telemetry(config: &TelemetryConfig) -> anyhow::Result<TelemetryGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into())
        .add_directive("sqlx=warn".parse()?)
        .add_directive("hyper=warn".parse()?);

    let registry = Registry::default().with(filter);
    let mut guard = TelemetryGuard::default();

    let otel_layer = if let Some(endpoint) = &config.otlp_endpoint {
        let resource = Resource::builder()
            .with_attributes(vec![
                KeyValue::new(SERVICE_NAME, SERVICE),
                KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
            ])
            .build();

        global::set_text_map_propagator(TraceContextPropagator::new());

        let tracer_provider = SdkTracerProvider::builder()
            .with_resource(resource.clone())
            .with_batch_exporter(
                opentelemetry_otlp::SpanExporter::builder().with_tonic().with_endpoint(endpoint.clone()).build()?,
            )
            .build();

        let tracer = opentelemetry::trace::TracerProvider::tracer(&tracer_provider, SERVICE);
        global::set_tracer_provider(tracer_provider.clone());

        let exporter =
            opentelemetry_otlp::MetricExporter::builder().with_tonic().with_endpoint(endpoint.clone()).build()?;
        let reader = PeriodicReader::builder(exporter).build();
        let meter_provider = SdkMeterProvider::builder().with_resource(resource).with_reader(reader).build();
        global::set_meter_provider(meter_provider.clone());

        guard.tracer_provider = Some(tracer_provider);
        guard.meter_provider = Some(meter_provider);

        Some(OpenTelemetryLayer::new(tracer))
    } else {
        None
    };

    let registry = registry.with(otel_layer);

    match config.log_format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }

    Ok(guard)
}
