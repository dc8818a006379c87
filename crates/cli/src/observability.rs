//! Subscriber set-up and OTLP trace export.
//!
//! The subscriber is installed once at start-up with an empty slot for the
//! OpenTelemetry layer. [`OtelInstaller`] fills that slot when the agent
//! service reports a telemetry sink; until then only the console layer runs.

use anyhow::Context;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::{Tracer, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};
use session::{ExporterInstaller, TelemetryError, TelemetrySink};
use tracing::{debug, info, warn};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

/// `service.name` resource attribute attached to every exported span.
pub const SERVICE_NAME: &str = "browser-agent-demo";

/// Set to `json` for one JSON object per log line.
pub const LOG_FORMAT_VAR: &str = "LOG_FORMAT";

type OtelLayer = OpenTelemetryLayer<Registry, Tracer>;
type OtelHandle = reload::Handle<Option<OtelLayer>, Registry>;

/// Installs the global subscriber and returns the installer for trace export.
///
/// Console output goes to stderr so it never interleaves with the demo's
/// stdout report. Verbosity follows `RUST_LOG`, defaulting to `info`.
pub fn init() -> anyhow::Result<OtelInstaller> {
    let (otel, handle) = reload::Layer::new(None::<OtelLayer>);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_FORMAT_VAR).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(otel)
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr).with_target(false)))
        .try_init()
        .context("failed to install the tracing subscriber")?;

    Ok(OtelInstaller::new(handle))
}

/// Builds an OTLP/gRPC exporter and swaps it into the running subscriber.
pub struct OtelInstaller {
    handle: OtelHandle,
}

impl OtelInstaller {
    fn new(handle: OtelHandle) -> Self {
        Self { handle }
    }
}

impl ExporterInstaller for OtelInstaller {
    type Exporter = OtelExporter;

    fn install(
        &self,
        sink: &TelemetrySink,
        record_content: bool,
    ) -> Result<Self::Exporter, TelemetryError> {
        let exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(sink.endpoint())
            .build()
            .map_err(|e| TelemetryError::Exporter {
                message: "could not build the OTLP span exporter".into(),
                source: Some(Box::new(e)),
            })?;

        let provider = TracerProvider::builder()
            .with_batch_exporter(exporter, runtime::Tokio)
            .with_resource(Resource::new(vec![KeyValue::new(
                "service.name",
                SERVICE_NAME,
            )]))
            .build();

        let layer = OpenTelemetryLayer::new(provider.tracer(SERVICE_NAME));
        if let Err(e) = self.handle.reload(Some(layer)) {
            // The provider is dropped unused; shut it down before reporting.
            let _ = provider.shutdown();
            return Err(TelemetryError::Exporter {
                message: "could not attach the OpenTelemetry layer".into(),
                source: Some(Box::new(e)),
            });
        }

        info!(
            otlp.endpoint = sink.endpoint(),
            record_content, "OpenTelemetry layer attached"
        );
        Ok(OtelExporter {
            provider,
            handle: self.handle.clone(),
        })
    }
}

/// Active trace export. Dropping it detaches the layer and flushes pending spans.
///
/// Shutdown blocks on the batch processor, so the value must be dropped on a
/// multi-threaded runtime.
pub struct OtelExporter {
    provider: TracerProvider,
    handle: OtelHandle,
}

impl Drop for OtelExporter {
    fn drop(&mut self) {
        if let Err(e) = self.handle.reload(None::<OtelLayer>) {
            debug!(error = %e, "subscriber already gone; nothing to detach");
        }
        match self.provider.shutdown() {
            Ok(()) => debug!("trace export flushed and shut down"),
            Err(e) => warn!(error = %e, "trace export did not shut down cleanly"),
        }
    }
}
