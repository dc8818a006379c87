//! Console report of a finished run.
//!
//! Rendering is split from fetching: [`write_steps`] and
//! [`write_final_response`] are pure functions over already-fetched records;
//! [`report_results`] fetches and renders both.

use std::io::{self, Write};

use agents::{AgentsService, MessageRole, Run, RunStep, StepDetails, ThreadId, ThreadMessage, ToolCall};
use tracing::{debug, field, info_span, Instrument};

use crate::DemoError;

const RULE_WIDTH: usize = 80;

fn rule<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))
}

/// Fetches the run's steps and the agent's final message and prints both.
///
/// With `record_content` the response text is attached to the
/// `get_final_response` span.
pub async fn report_results<S, W>(
    service: &S,
    thread_id: &ThreadId,
    run: &Run,
    record_content: bool,
    out: &mut W,
) -> Result<(), DemoError>
where
    S: AgentsService + ?Sized,
    W: Write,
{
    let steps = service
        .list_run_steps(thread_id, &run.id)
        .instrument(info_span!("list_run_steps", run.id = %run.id))
        .await?;
    debug!(run.id = %run.id, steps = steps.len(), "run steps fetched");
    write_steps(&steps, out)?;

    let response_span = info_span!(
        "get_final_response",
        thread.id = %thread_id,
        gen_ai.response.content = field::Empty,
    );
    let response = service
        .last_message_by_role(thread_id, MessageRole::Agent)
        .instrument(response_span.clone())
        .await?;
    if let Some(message) = response.as_ref().filter(|_| record_content) {
        let text: Vec<&str> = message.text_messages().map(|t| t.value.as_str()).collect();
        response_span.record("gen_ai.response.content", text.join("\n").as_str());
    }
    write_final_response(response.as_ref(), out)?;

    Ok(())
}

/// Prints every step in order with its 1-based position. Browser-automation
/// tool calls are printed in full; every other kind is skipped.
pub fn write_steps<W: Write>(steps: &[RunStep], out: &mut W) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Browser Automation Steps:")?;
    rule(out)?;

    for (position, step) in steps.iter().enumerate() {
        writeln!(out)?;
        writeln!(out, "Step {} - Status: {}", position + 1, step.status)?;

        let tool_calls = match &step.step_details {
            StepDetails::ToolCalls { tool_calls } => tool_calls,
            StepDetails::MessageCreation { .. } | StepDetails::Other => continue,
        };

        for call in tool_calls {
            let browser = match call {
                ToolCall::BrowserAutomation {
                    browser_automation, ..
                } => browser_automation,
                ToolCall::Other => continue,
            };

            writeln!(out)?;
            writeln!(out, "  Browser Automation Tool Call:")?;
            writeln!(out, "     Input: {}", browser.input)?;
            writeln!(out, "     Output: {}", browser.output)?;

            if !browser.steps.is_empty() {
                writeln!(out)?;
                writeln!(out, "     Browser Steps:")?;
                for (i, browser_step) in browser.steps.iter().enumerate() {
                    writeln!(out, "       {}. Last result: {}", i + 1, browser_step.last_step_result)?;
                    writeln!(out, "          Current state: {}", browser_step.current_state)?;
                    writeln!(out, "          Next step: {}", browser_step.next_step)?;
                }
            }
        }
    }

    Ok(())
}

/// Prints the final-response block: header, then every text segment, then
/// every URL citation. With no message only the header is printed.
pub fn write_final_response<W: Write>(
    message: Option<&ThreadMessage>,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out)?;
    rule(out)?;
    writeln!(out, "Agent's Final Response:")?;
    rule(out)?;

    let Some(message) = message else {
        return Ok(());
    };

    for text in message.text_messages() {
        writeln!(out)?;
        writeln!(out, "{}", text.value)?;
    }

    let mut citations = message.url_citations().peekable();
    if citations.peek().is_some() {
        writeln!(out)?;
        writeln!(out, "Citations:")?;
        for citation in citations {
            let title = citation.title.as_deref().unwrap_or("(untitled)");
            writeln!(out, "   - {}: {}", title, citation.url)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render<F: FnOnce(&mut Vec<u8>) -> io::Result<()>>(f: F) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn steps(value: serde_json::Value) -> Vec<RunStep> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn browser_call_input_output_and_state_print_in_order() {
        let steps = steps(json!([{
            "id": "step_1",
            "status": "completed",
            "step_details": {
                "type": "tool_calls",
                "tool_calls": [{
                    "id": "call_1",
                    "type": "browser_automation",
                    "browser_automation": {
                        "input": "I1",
                        "output": "O1",
                        "steps": [{ "last_step_result": "", "current_state": "S1", "next_step": "click" }]
                    }
                }]
            }
        }]));

        let output = render(|out| write_steps(&steps, out));

        let input = output.find("I1").unwrap();
        let result = output.find("O1").unwrap();
        let state = output.find("S1").unwrap();
        assert!(input < result && result < state, "{output}");
        assert_eq!(output.matches("Last result:").count(), 1);
        assert!(output.contains("Next step: click"));
    }

    #[test]
    fn non_browser_details_are_skipped() {
        let steps = steps(json!([
            {
                "id": "step_1",
                "status": "completed",
                "step_details": { "type": "message_creation", "message_creation": { "message_id": "msg_1" } }
            },
            {
                "id": "step_2",
                "status": "failed",
                "step_details": {
                    "type": "tool_calls",
                    "tool_calls": [{ "id": "call_1", "type": "function", "function": { "name": "f" } }]
                }
            }
        ]));

        let output = render(|out| write_steps(&steps, out));

        assert!(output.contains("Step 1 - Status: completed"));
        assert!(output.contains("Step 2 - Status: failed"));
        assert!(!output.contains("Browser Automation Tool Call"));
    }

    #[test]
    fn browser_call_without_steps_prints_no_step_block() {
        let steps = steps(json!([{
            "id": "step_1",
            "status": "completed",
            "step_details": {
                "type": "tool_calls",
                "tool_calls": [{ "id": "call_1", "type": "browser_automation", "browser_automation": { "input": "go", "output": "done" } }]
            }
        }]));

        let output = render(|out| write_steps(&steps, out));

        assert!(output.contains("Output: done"));
        assert!(!output.contains("Browser Steps:"));
    }

    #[test]
    fn missing_final_message_prints_header_only() {
        let output = render(|out| write_final_response(None, out));

        assert!(output.contains("Agent's Final Response:"));
        assert!(!output.contains("Citations:"));
        let after_header = output.split("Agent's Final Response:").nth(1).unwrap();
        assert!(after_header.trim_matches(|c| c == '=' || c == '\n').is_empty());
    }

    #[test]
    fn final_message_without_citations_prints_text_only() {
        let message: ThreadMessage = serde_json::from_value(json!({
            "id": "msg_1",
            "role": "assistant",
            "content": [{ "type": "text", "text": { "value": "MSFT is up 12.3% YTD" } }]
        }))
        .unwrap();

        let output = render(|out| write_final_response(Some(&message), out));

        assert!(output.contains("MSFT is up 12.3% YTD"));
        assert!(!output.contains("Citations:"));
    }
}
