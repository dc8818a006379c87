mod common;

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use agents::{AgentsError, RunStatus};
use common::{complete_env, RecordingInstaller, ScriptedService, Telemetry};
use serde_json::json;
use session::config::{CONTENT_RECORDING_ENABLED, REQUIRED_SETTINGS};
use session::{run_demo, DemoError, DemoOutcome};
use tokio_util::sync::CancellationToken;

fn browser_steps() -> serde_json::Value {
    json!([
        {
            "id": "step_1",
            "status": "completed",
            "step_details": { "type": "message_creation", "message_creation": { "message_id": "msg_9" } }
        },
        {
            "id": "step_2",
            "status": "completed",
            "step_details": {
                "type": "tool_calls",
                "tool_calls": [{
                    "id": "call_1",
                    "type": "browser_automation",
                    "browser_automation": {
                        "input": "Find the MSFT YTD change",
                        "output": "MSFT YTD: +12.3%",
                        "steps": [
                            { "last_step_result": "", "current_state": "Blank page", "next_step": "Open finance.yahoo.com" },
                            { "last_step_result": "Page loaded", "current_state": "Quote page", "next_step": "Click YTD" }
                        ]
                    }
                }]
            }
        }
    ])
}

fn agent_message() -> serde_json::Value {
    json!({
        "id": "msg_9",
        "thread_id": common::THREAD,
        "role": "assistant",
        "content": [{
            "type": "text",
            "text": {
                "value": "Microsoft is up 12.3% year to date.",
                "annotations": [
                    { "type": "url_citation", "text": "[1]", "url_citation": { "title": "MSFT quote", "url": "https://finance.example.com/quote/MSFT" } },
                    { "type": "url_citation", "text": "[2]", "url_citation": { "title": "MSFT chart", "url": "https://finance.example.com/chart/MSFT" } }
                ]
            }
        }]
    })
}

fn output(buf: Vec<u8>) -> String {
    String::from_utf8(buf).unwrap()
}

#[tokio::test]
async fn missing_settings_make_no_remote_calls() {
    for name in REQUIRED_SETTINGS {
        let mut env = complete_env();
        env.remove(name);
        let connects = Cell::new(0);
        let mut out = Vec::new();

        let outcome = run_demo(
            &mut env,
            |_| {
                connects.set(connects.get() + 1);
                Ok(ScriptedService::new())
            },
            &RecordingInstaller::default(),
            &CancellationToken::new(),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(outcome, DemoOutcome::MissingConfiguration(vec![name]));
        assert_eq!(connects.get(), 0, "client must not be created when {name} is missing");
        assert!(!env.contains_key(CONTENT_RECORDING_ENABLED));
        let text = output(out);
        assert!(text.contains(&format!("   - {name}")), "{text}");
    }
}

#[tokio::test]
async fn failed_run_prints_last_error_and_skips_report() {
    let released = Arc::new(AtomicBool::new(false));
    let mut env = complete_env();
    let mut out = Vec::new();

    let outcome = run_demo(
        &mut env,
        |_| {
            Ok(ScriptedService::new()
                .with_polls(&[RunStatus::InProgress], RunStatus::Failed)
                .with_last_error("server_error", "Browser session could not be started")
                .tracking_release(released.clone()))
        },
        &RecordingInstaller::default(),
        &CancellationToken::new(),
        &mut out,
    )
    .await
    .unwrap();

    let DemoOutcome::RunFailed { run } = &outcome else {
        panic!("expected a failed run, got {outcome:?}");
    };
    assert_eq!(run.status, RunStatus::Failed);
    let text = output(out);
    assert!(
        text.contains("Run failed: server_error: Browser session could not be started"),
        "{text}"
    );
    assert!(!text.contains("Browser Automation Steps"));
    assert!(!text.contains("Agent's Final Response"));
    assert!(released.load(Ordering::SeqCst), "client must be released");
}

#[tokio::test]
async fn completed_run_reports_steps_then_citations() {
    let mut env = complete_env();
    let mut out = Vec::new();

    let outcome = run_demo(
        &mut env,
        |settings| {
            assert_eq!(settings.connection_name.as_str(), "playwright-connection");
            Ok(ScriptedService::new()
                .with_polls(&[RunStatus::InProgress], RunStatus::Completed)
                .with_steps(browser_steps())
                .with_final_message(agent_message()))
        },
        &RecordingInstaller::default(),
        &CancellationToken::new(),
        &mut out,
    )
    .await
    .unwrap();

    let DemoOutcome::Completed {
        agent_id,
        thread_id,
        tracing_active,
        ..
    } = &outcome
    else {
        panic!("expected completion, got {outcome:?}");
    };
    assert_eq!(agent_id.as_str(), common::AGENT);
    assert_eq!(thread_id.as_str(), common::THREAD);
    assert!(!*tracing_active);
    assert_eq!(env.get(CONTENT_RECORDING_ENABLED).map(String::as_str), Some("true"));

    let text = output(out);
    let step_1 = text.find("Step 1 - Status: completed").unwrap();
    let step_2 = text.find("Step 2 - Status: completed").unwrap();
    let tool_call = text.find("Browser Automation Tool Call").unwrap();
    let header = text.find("Agent's Final Response").unwrap();
    let first = text
        .find("   - MSFT quote: https://finance.example.com/quote/MSFT")
        .unwrap();
    let second = text
        .find("   - MSFT chart: https://finance.example.com/chart/MSFT")
        .unwrap();

    assert!(step_1 < step_2 && step_2 < tool_call, "{text}");
    assert!(tool_call < header && header < first && first < second, "{text}");
    assert_eq!(text.matches("Browser Automation Tool Call").count(), 1);
    assert_eq!(text.matches("Last result:").count(), 2);
    assert!(text.contains("Microsoft is up 12.3% year to date."));
    assert!(text.contains("Run took 30s"));
}

#[tokio::test]
async fn no_agent_message_prints_header_only() {
    let mut env = complete_env();
    let mut out = Vec::new();

    let outcome = run_demo(
        &mut env,
        |_| Ok(ScriptedService::new().with_steps(json!([]))),
        &RecordingInstaller::default(),
        &CancellationToken::new(),
        &mut out,
    )
    .await
    .unwrap();

    assert!(matches!(outcome, DemoOutcome::Completed { .. }));
    let text = output(out);
    let tail = text.split("Agent's Final Response:").nth(1).unwrap();
    assert!(!tail.contains("Citations:"));
    let before_footer = tail.split("Agent preserved for future use!").next().unwrap();
    assert!(
        before_footer.trim_matches(|c| c == '=' || c == '\n').is_empty(),
        "{before_footer:?}"
    );
}

#[tokio::test]
async fn unknown_connection_propagates_and_releases_client() {
    let released = Arc::new(AtomicBool::new(false));
    let mut env = complete_env();
    let mut out = Vec::new();

    let result = run_demo(
        &mut env,
        |_| Ok(ScriptedService::new().without_connection().tracking_release(released.clone())),
        &RecordingInstaller::default(),
        &CancellationToken::new(),
        &mut out,
    )
    .await;

    assert!(matches!(
        result,
        Err(DemoError::Service(AgentsError::NotFound { .. }))
    ));
    assert!(released.load(Ordering::SeqCst), "client must be released on error");
    let text = output(out);
    assert!(text.contains("Error: connection 'playwright-connection' not found"), "{text}");
    assert!(text.contains("Troubleshooting:"));
}

#[tokio::test]
async fn client_construction_failure_prints_troubleshooting() {
    let mut env = complete_env();
    let mut out = Vec::new();

    let result = run_demo(
        &mut env,
        |_| -> Result<ScriptedService, AgentsError> {
            Err(AgentsError::InvalidEndpoint {
                endpoint: "agents.example.com".into(),
                reason: "expected an http:// or https:// URL".into(),
            })
        },
        &RecordingInstaller::default(),
        &CancellationToken::new(),
        &mut out,
    )
    .await;

    assert!(matches!(result, Err(DemoError::Service(_))));
    assert!(output(out).contains("Troubleshooting:"));
}

#[tokio::test]
async fn active_tracing_is_reported_and_content_flag_forwarded() {
    let mut env = complete_env();
    env.insert(CONTENT_RECORDING_ENABLED.into(), "false".into());
    let installer = RecordingInstaller::default();
    let mut out = Vec::new();

    let outcome = run_demo(
        &mut env,
        |_| {
            Ok(ScriptedService::new().with_telemetry(Telemetry::ConnectionString(
                "InstrumentationKey=k;Endpoint=http://collector:4317".into(),
            )))
        },
        &installer,
        &CancellationToken::new(),
        &mut out,
    )
    .await
    .unwrap();

    assert!(matches!(
        outcome,
        DemoOutcome::Completed {
            tracing_active: true,
            ..
        }
    ));
    assert_eq!(
        *installer.installed.lock().unwrap(),
        vec![("http://collector:4317".to_string(), false)]
    );
    let text = output(out);
    assert!(text.contains("Tracing enabled"));
    assert!(!text.contains("Enabled trace content recording"));
}
