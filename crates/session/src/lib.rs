//! Browser agent demo orchestration.
//!
//! This crate sequences calls against the [`agents::AgentsService`] port:
//! configuration check, tracing bootstrap, agent session, run await and
//! result reporting. It owns no transport; the HTTP adapter and the trace
//! exporter are injected by the `cli` composition root.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Modules here sequence domain calls and render the
//! console report. They contain no wire-format knowledge.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`config`] | Environment access and settings validation |
//! | [`telemetry`] | Sink connection-string parsing and best-effort exporter bootstrap |
//! | [`session`] | Agent, thread, message and run creation |
//! | [`runs`] | Polling a run to a terminal status with deadline and cancellation |
//! | [`report`] | Rendering run steps and the final response |
//! | [`demo`] | The end-to-end flow |

pub mod config;
pub mod demo;
pub mod errors;
pub mod report;
pub mod runs;
pub mod session;
pub mod telemetry;

pub use config::{load_settings, ConfigError, Environment, ProcessEnvironment, RunOptions, Settings};
pub use demo::{run_demo, DemoOutcome};
pub use errors::DemoError;
pub use report::{report_results, write_final_response, write_steps};
pub use runs::create_and_await_run;
pub use session::{AgentSession, SessionRecord};
pub use telemetry::{bootstrap_tracing, ExporterInstaller, TelemetryError, TelemetrySink};
