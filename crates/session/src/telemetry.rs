//! Best-effort tracing bootstrap.
//!
//! The agent service may have a telemetry sink attached. When it does, the
//! sink's connection string is parsed and handed to an [`ExporterInstaller`]
//! supplied by the composition root. Every failure on this path is logged and
//! swallowed: running without an exporter is a normal steady state, and the
//! `tracing` facade keeps span creation valid either way.

use std::error::Error as StdError;
use std::io::Write;

use agents::{AgentsError, AgentsService};
use thiserror::Error;
use tracing::{info, warn};

const PREVIEW_LEN: usize = 50;

/// Failures while resolving or installing the trace exporter.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The service could not report its telemetry sink.
    #[error("Could not read the telemetry connection string")]
    Lookup(#[source] AgentsError),

    /// The sink connection string has no usable endpoint.
    #[error("Malformed telemetry connection string: {reason}")]
    MalformedConnectionString { reason: String },

    /// The exporter or the instrumentation layer could not be installed.
    #[error("Could not install the trace exporter: {message}")]
    Exporter {
        message: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}

impl TelemetryError {
    /// Short, stable name of the error variant, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Lookup(_) => "Lookup",
            Self::MalformedConnectionString { .. } => "MalformedConnectionString",
            Self::Exporter { .. } => "Exporter",
        }
    }
}

// ---------------------------------------------------------------------------
// Sink connection string
// ---------------------------------------------------------------------------

/// A parsed telemetry sink connection string.
///
/// The string is a `;`-separated list of `key=value` pairs. Keys are matched
/// case-insensitively; the collector address is taken from `Endpoint`, or from
/// `IngestionEndpoint` when `Endpoint` is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetrySink {
    endpoint: String,
    raw: String,
}

impl TelemetrySink {
    pub fn parse(connection_string: &str) -> Result<Self, TelemetryError> {
        let mut endpoint = None;
        let mut ingestion = None;

        for pair in connection_string.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(TelemetryError::MalformedConnectionString {
                    reason: format!("segment '{pair}' is not a key=value pair"),
                });
            };
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "endpoint" => endpoint = Some(value.to_string()),
                "ingestionendpoint" => ingestion = Some(value.to_string()),
                _ => {}
            }
        }

        let endpoint = endpoint
            .or(ingestion)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| TelemetryError::MalformedConnectionString {
                reason: "no Endpoint or IngestionEndpoint key".into(),
            })?;

        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(TelemetryError::MalformedConnectionString {
                reason: format!("endpoint '{endpoint}' is not an http(s) URL"),
            });
        }

        Ok(Self {
            endpoint,
            raw: connection_string.to_string(),
        })
    }

    /// Collector endpoint spans are exported to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The first characters of the connection string, safe to print.
    pub fn preview(&self) -> String {
        let head: String = self.raw.chars().take(PREVIEW_LEN).collect();
        if head.len() < self.raw.len() {
            format!("{head}...")
        } else {
            head
        }
    }
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

/// Installs a trace exporter for a telemetry sink.
///
/// Implemented by the composition root, which owns the subscriber. The
/// returned exporter is the tracing capability: holding it keeps export
/// active, dropping it flushes and shuts export down.
pub trait ExporterInstaller {
    type Exporter;

    fn install(
        &self,
        sink: &TelemetrySink,
        record_content: bool,
    ) -> Result<Self::Exporter, TelemetryError>;
}

/// Attempts to enable trace export, returning the active exporter on success.
///
/// Never fails because of telemetry: lookup, parse and install errors all
/// yield `Ok(None)`. Only console write failures are returned.
pub async fn bootstrap_tracing<S, I, W>(
    service: &S,
    installer: &I,
    record_content: bool,
    out: &mut W,
) -> std::io::Result<Option<I::Exporter>>
where
    S: AgentsService + ?Sized,
    I: ExporterInstaller + ?Sized,
    W: Write,
{
    writeln!(out, "Setting up tracing...")?;

    match try_install(service, installer, record_content).await {
        Ok(Some((exporter, sink))) => {
            info!(otlp.endpoint = sink.endpoint(), "trace export enabled");
            writeln!(out, "   Found telemetry sink connection")?;
            writeln!(out, "   Connection string: {}", sink.preview())?;
            writeln!(out, "Tracing enabled. Spans are exported to {}", sink.endpoint())?;
            writeln!(out, "   Note: traces may take 1-2 minutes to appear in the backend")?;
            Ok(Some(exporter))
        }
        Ok(None) => {
            info!("no telemetry sink attached; trace export disabled");
            writeln!(out, "No telemetry sink connected. Tracing disabled.")?;
            writeln!(out)?;
            writeln!(out, "   To enable tracing:")?;
            writeln!(out, "   1. Open the project in the agent service portal")?;
            writeln!(out, "   2. Go to 'Tracing'")?;
            writeln!(out, "   3. Connect an existing telemetry resource or create a new one")?;
            writeln!(out, "   4. Wait for the connection to complete")?;
            writeln!(out, "   5. Re-run this program")?;
            Ok(None)
        }
        Err(err) => {
            let details = error_chain(&err);
            warn!(error.kind = err.kind(), error.details = %details, "could not enable tracing");
            writeln!(out, "Could not enable tracing: {err}")?;
            writeln!(out, "   Error type: {}", err.kind())?;
            writeln!(out, "   Details: {details}")?;
            writeln!(out, "   Continuing without tracing...")?;
            Ok(None)
        }
    }
}

async fn try_install<S, I>(
    service: &S,
    installer: &I,
    record_content: bool,
) -> Result<Option<(I::Exporter, TelemetrySink)>, TelemetryError>
where
    S: AgentsService + ?Sized,
    I: ExporterInstaller + ?Sized,
{
    let Some(connection_string) = service
        .telemetry_connection_string()
        .await
        .map_err(TelemetryError::Lookup)?
        .filter(|s| !s.trim().is_empty())
    else {
        return Ok(None);
    };

    let sink = TelemetrySink::parse(&connection_string)?;
    let exporter = installer.install(&sink, record_content)?;
    Ok(Some((exporter, sink)))
}

/// Renders an error and every error in its `source()` chain on one line.
pub(crate) fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": caused by: ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
