use movietable_client::{MovieRecord, TableCreation};
use serde_json::{Value, json};

use crate::executor::CommandResult;

/// Output mode for rendering command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable output.
    Pretty,
    /// Machine-parseable JSON (one JSON object per result on stdout).
    Json,
}

/// Render a command result to stdout in the given mode.
pub fn render(result: &CommandResult, mode: OutputMode) {
    for line in render_lines(result, mode) {
        println!("{line}");
    }
}

/// Render an error in the given mode (always to stderr).
pub fn render_error(err: &dyn std::fmt::Display, mode: OutputMode) {
    match mode {
        OutputMode::Pretty => eprintln!("Error: {err}"),
        OutputMode::Json => eprintln!("{}", json!({"error": err.to_string()})),
    }
}

/// The lines `render` prints for a result.
pub fn render_lines(result: &CommandResult, mode: OutputMode) -> Vec<String> {
    match mode {
        OutputMode::Pretty => pretty_lines(result),
        OutputMode::Json => vec![json_value(result).to_string()],
    }
}

fn pretty_lines(result: &CommandResult) -> Vec<String> {
    match result {
        CommandResult::Ok(msg) => vec![msg.clone()],
        CommandResult::Table(TableCreation::Created) => vec!["Table created.".to_string()],
        CommandResult::Table(TableCreation::AlreadyExists) => {
            vec!["Table already exists.".to_string()]
        }
        CommandResult::Loaded(summary) => vec![format!("Loaded {} movie(s).", summary.loaded)],
        CommandResult::Updated { key, attributes } => {
            let mut lines = vec![format!("Updated {key}:")];
            lines.push(pretty_json(&Value::Object(attributes.clone())));
            lines
        }
        CommandResult::Record(record) => vec![pretty_record(record)],
        CommandResult::Page(page) => {
            let mut lines = vec![format!(
                "Page {}: {} movie(s)",
                page.number,
                page.records.len()
            )];
            lines.extend(page.records.iter().map(compact_record));
            if let Some(key) = &page.last_evaluated_key {
                lines.push(format!("(more results after {key})"));
            }
            lines
        }
        CommandResult::ScanDone { pages, records } => {
            vec![format!("Scanned {pages} page(s), {records} movie(s).")]
        }
        CommandResult::Movies { year, records } => {
            if records.is_empty() {
                vec![format!("No movies in {year}.")]
            } else {
                records.iter().map(MovieRecord::summary_line).collect()
            }
        }
    }
}

fn json_value(result: &CommandResult) -> Value {
    match result {
        CommandResult::Ok(msg) => json!({"ok": true, "message": msg}),
        CommandResult::Table(creation) => json!({
            "ok": true,
            "created": *creation == TableCreation::Created,
        }),
        CommandResult::Loaded(summary) => json!({"ok": true, "loaded": summary.loaded}),
        CommandResult::Updated { key, attributes } => json!({
            "key": key,
            "attributes": attributes,
        }),
        CommandResult::Record(record) => json!({"found": true, "item": record}),
        CommandResult::Page(page) => json!({
            "page": page.number,
            "items": page.records,
            "count": page.records.len(),
            "last_evaluated_key": page.last_evaluated_key,
        }),
        CommandResult::ScanDone { pages, records } => json!({
            "done": true,
            "pages": pages,
            "count": records,
        }),
        CommandResult::Movies { year, records } => json!({
            "year": year,
            "items": records,
            "count": records.len(),
        }),
    }
}

fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unprintable: {e}>"))
}

fn pretty_record(record: &MovieRecord) -> String {
    pretty_json(&Value::Object(record.attributes().clone()))
}

fn compact_record(record: &MovieRecord) -> String {
    format!("  {}", Value::Object(record.attributes().clone()))
}
