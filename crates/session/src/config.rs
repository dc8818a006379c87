//! Environment-driven configuration.
//!
//! Settings are read through the [`Environment`] trait so the loader can be
//! exercised against an in-memory map. The loader is the only place that
//! writes to the environment: it defaults the content-recording flag when the
//! flag is absent, which downstream instrumentation reads back.

use std::collections::HashMap;
use std::time::Duration;

use agents::{ConnectionName, ModelDeployment};
use thiserror::Error;

/// Project endpoint of the agent service.
pub const PROJECT_ENDPOINT: &str = "PROJECT_ENDPOINT";
/// Registration name of the browser-automation connection.
pub const BROWSER_CONNECTION_NAME: &str = "BROWSER_CONNECTION_NAME";
/// Model deployment the agent runs on.
pub const MODEL_DEPLOYMENT_NAME: &str = "MODEL_DEPLOYMENT_NAME";
/// Whether message content is attached to exported spans.
pub const CONTENT_RECORDING_ENABLED: &str = "TRACING_CONTENT_RECORDING_ENABLED";
/// Delay between run status polls, in milliseconds.
pub const RUN_POLL_INTERVAL_MS: &str = "RUN_POLL_INTERVAL_MS";
/// Upper bound on the run await, in seconds. Unset or `0` waits indefinitely.
pub const RUN_TIMEOUT_SECS: &str = "RUN_TIMEOUT_SECS";

/// Settings that must be present before any service call is made, in the
/// order they are reported.
pub const REQUIRED_SETTINGS: [&str; 3] =
    [PROJECT_ENDPOINT, BROWSER_CONNECTION_NAME, MODEL_DEPLOYMENT_NAME];

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
const MIN_POLL_INTERVAL_MS: u64 = 100;

// ---------------------------------------------------------------------------
// Environment access
// ---------------------------------------------------------------------------

/// Read/write access to named string settings.
pub trait Environment {
    /// Returns the value of `name`, or `None` when it is unset.
    fn var(&self, name: &str) -> Option<String>;

    /// Sets `name` to `value`.
    fn set_var(&mut self, name: &str, value: &str);
}

/// The real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn set_var(&mut self, name: &str, value: &str) {
        // Only written while loading settings, before the service client exists.
        std::env::set_var(name, value);
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }

    fn set_var(&mut self, name: &str, value: &str) {
        self.insert(name.to_string(), value.to_string());
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Controls how long and how often the run await polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Delay between consecutive status polls.
    pub poll_interval: Duration,
    /// Deadline for the whole await. `None` waits until the service reports a
    /// terminal status.
    pub timeout: Option<Duration>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }
}

/// Validated configuration for one demo invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Base URL of the agent service project.
    pub endpoint: String,
    pub connection_name: ConnectionName,
    pub model: ModelDeployment,
    /// Attach message content to spans.
    pub record_content: bool,
    /// `true` when the content-recording flag was absent and has been set by
    /// the loader.
    pub content_recording_defaulted: bool,
    pub run: RunOptions,
}

/// Configuration problems detected before any service call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// One or more required settings are unset or blank.
    #[error("Missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    /// An optional setting is present but cannot be interpreted.
    #[error("Invalid value '{value}' for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Reads and validates the demo configuration from `env`.
///
/// Required settings are checked first; when any is missing the environment
/// is left untouched. Otherwise an absent [`CONTENT_RECORDING_ENABLED`] flag
/// is set to `"true"`.
pub fn load_settings<E>(env: &mut E) -> Result<Settings, ConfigError>
where
    E: Environment + ?Sized,
{
    let required = |name: &str| {
        env.var(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let endpoint = required(PROJECT_ENDPOINT);
    let connection_name = required(BROWSER_CONNECTION_NAME).and_then(ConnectionName::new);
    let model = required(MODEL_DEPLOYMENT_NAME).and_then(ModelDeployment::new);

    let (endpoint, connection_name, model) = match (endpoint, connection_name, model) {
        (Some(e), Some(c), Some(m)) => (e, c, m),
        (e, c, m) => {
            let present = [e.is_some(), c.is_some(), m.is_some()];
            let missing = REQUIRED_SETTINGS
                .iter()
                .zip(present)
                .filter(|(_, present)| !present)
                .map(|(name, _)| *name)
                .collect();
            return Err(ConfigError::Missing(missing));
        }
    };

    let run = load_run_options(env)?;

    let (record_content, content_recording_defaulted) = match env.var(CONTENT_RECORDING_ENABLED)
    {
        Some(flag) if !flag.trim().is_empty() => (parse_flag(&flag), false),
        _ => {
            env.set_var(CONTENT_RECORDING_ENABLED, "true");
            (true, true)
        }
    };

    Ok(Settings {
        endpoint,
        connection_name,
        model,
        record_content,
        content_recording_defaulted,
        run,
    })
}

fn load_run_options<E>(env: &E) -> Result<RunOptions, ConfigError>
where
    E: Environment + ?Sized,
{
    let mut options = RunOptions::default();

    if let Some(raw) = env.var(RUN_POLL_INTERVAL_MS) {
        let millis = parse_u64(RUN_POLL_INTERVAL_MS, &raw)?;
        if millis < MIN_POLL_INTERVAL_MS {
            return Err(ConfigError::Invalid {
                name: RUN_POLL_INTERVAL_MS,
                value: raw,
                reason: format!("must be at least {MIN_POLL_INTERVAL_MS}"),
            });
        }
        options.poll_interval = Duration::from_millis(millis);
    }

    if let Some(raw) = env.var(RUN_TIMEOUT_SECS) {
        let secs = parse_u64(RUN_TIMEOUT_SECS, &raw)?;
        options.timeout = (secs > 0).then(|| Duration::from_secs(secs));
    }

    Ok(options)
}

fn parse_u64(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
        name,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Interprets a boolean-like flag. Anything other than a recognised "on"
/// spelling is `false`.
fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}
