//! Command implementations.

use std::io::{Read, Write};
use std::path::Path;

use quickread::{
    resolve_model_id, segment, ActionType, DispatchEvent, MediaType, QuickRead, Settings,
    TaskOptions, TaskOutcome, TaskReport, TaskRequest,
};
use serde_json::json;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::CliError;

/// Task fields that may override the settings.
#[derive(Debug, Clone, Default)]
pub struct TaskArgs {
    pub action: Option<ActionType>,
    pub media: Option<MediaType>,
    pub model: Option<String>,
    pub lang: Option<String>,
}

/// Where the input came from. Text given on the command line counts as a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Arguments,
    File,
    Stdin,
}

/// Input from positional text, else `file`, else stdin.
pub fn read_input(text: &[String], file: Option<&Path>) -> Result<(String, InputSource), CliError> {
    if !text.is_empty() {
        return Ok((text.join(" "), InputSource::Arguments));
    }
    if let Some(path) = file {
        return Ok((std::fs::read_to_string(path)?, InputSource::File));
    }
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    Ok((input, InputSource::Stdin))
}

/// Request for `input`; unset fields come from `settings`. The action defaults to the text
/// action for a selection and to the no-text action otherwise.
pub fn build_request(
    settings: &Settings,
    args: &TaskArgs,
    input: String,
    source: InputSource,
) -> TaskRequest {
    let action = args
        .action
        .unwrap_or_else(|| settings.action_for(source == InputSource::Arguments));
    TaskRequest::new(
        action,
        args.media.unwrap_or(MediaType::Text),
        args.model.clone().unwrap_or_else(|| settings.language_model.clone()),
        args.lang.clone().unwrap_or_else(|| settings.language_code.clone()),
        input,
    )
}

/// Runs one task. Text is printed as it arrives (streamed deltas or whole chunks); with
/// `json` only the final report is printed. A non-success outcome prints its message to
/// `err` and returns [`CliError::TaskFailed`].
pub async fn run_command<O: Write, E: Write>(
    qr: &QuickRead,
    request: TaskRequest,
    options: TaskOptions,
    cancel: CancellationToken,
    json: bool,
    out: &mut O,
    err: &mut E,
) -> Result<TaskReport, CliError> {
    if request.input.trim().is_empty() {
        return Err(CliError::InvalidArg("input is empty".to_string()));
    }
    let mut events = qr.run_task(request, options, cancel);
    let mut streamed_chunk = None;
    let mut report = None;
    while let Some(event) = events.next().await {
        match event {
            DispatchEvent::Started { .. } => {}
            DispatchEvent::Partial { chunk_index, text } if !json => {
                streamed_chunk = Some(chunk_index);
                write!(out, "{}", text)?;
                out.flush()?;
            }
            DispatchEvent::Partial { .. } => {}
            DispatchEvent::ChunkDone {
                chunk_index, text, ..
            } if !json => {
                if streamed_chunk == Some(chunk_index) {
                    write!(out, "\n\n")?;
                } else {
                    write!(out, "{}\n\n", text)?;
                }
                out.flush()?;
            }
            DispatchEvent::ChunkDone { .. } => {}
            DispatchEvent::Finished(r) => report = Some(r),
        }
    }
    let report = report.ok_or(CliError::TaskFailed("no report"))?;

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    }
    match &report.outcome {
        TaskOutcome::Completed => Ok(report),
        TaskOutcome::Cancelled => {
            writeln!(err, "cancelled")?;
            Err(CliError::TaskFailed(report.outcome.kind()))
        }
        _ => {
            if !json {
                writeln!(err, "{}", report.content())?;
            }
            Err(CliError::TaskFailed(report.outcome.kind()))
        }
    }
}

/// Prints the chunks of `text` for `max_chars` as JSON.
pub fn chunk_command<O: Write>(text: &str, max_chars: usize, out: &mut O) -> Result<(), CliError> {
    let chunks = segment(text, max_chars);
    let value = json!({
        "maxChars": max_chars,
        "count": chunks.len(),
        "chunks": chunks,
    });
    writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
    Ok(())
}

/// Prints the character limit of `model` for `action`, or all limits as JSON.
pub async fn limits_command<O: Write>(
    qr: &QuickRead,
    model: &str,
    action: Option<ActionType>,
    out: &mut O,
) -> Result<(), CliError> {
    let settings = qr.settings().await;
    let model_id = resolve_model_id(model, &settings.user_model_id);
    match action {
        Some(action) => {
            let limit = qr
                .resolver()
                .resolve(&model_id, action, &settings.api_key)
                .await;
            writeln!(out, "{}", limit)?;
        }
        None => {
            let limits = qr.resolver().limits_for(&model_id, &settings.api_key).await;
            let value = json!({ "modelId": model_id, "limits": limits });
            writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
        }
    }
    Ok(())
}

/// Runs each non-empty line of `input` as its own task in one session, then prints the
/// session's result history as JSON. Repeated lines are answered from the cache.
pub async fn history_command<O: Write>(
    qr: &QuickRead,
    args: &TaskArgs,
    input: &str,
    options: TaskOptions,
    cancel: CancellationToken,
    out: &mut O,
) -> Result<(), CliError> {
    let settings = qr.settings().await;
    for line in input.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if cancel.is_cancelled() {
            break;
        }
        let request = build_request(&settings, args, line.to_string(), InputSource::File);
        qr.run_task_to_end(request, options, cancel.clone()).await;
    }
    let history = qr.session().history_snapshot();
    let entries: Vec<_> = history
        .entries()
        .into_iter()
        .map(|(slot, record)| {
            json!({
                "slot": slot,
                "latest": history.index() == Some(slot),
                "outcome": record.outcome,
                "createdAt": record.created_at,
                "responseContent": record.response_content,
            })
        })
        .collect();
    writeln!(out, "{}", serde_json::to_string_pretty(&entries)?)?;
    Ok(())
}
