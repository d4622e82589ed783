//! JSON and CSV exporters for runs and the session log.
//!
//! Exports operate on data the player already holds; nothing is
//! recomputed. Writing to disk is a separate step so front ends can show
//! the text, copy it, or save it.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use secuprison_env::RunId;

use crate::catalog::ChecklistType;
use crate::error::SimError;
use crate::generator::{Event, Run};
use crate::log::RunLog;
use crate::timestamp;

/// Exported view of an event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord<'a> {
    pub layer: &'a str,
    pub vulnerability: &'a str,
    pub analogy: &'a str,
    pub checklist_type: ChecklistType,
    pub timestamp: String,
}

impl<'a> From<&'a Event> for EventRecord<'a> {
    fn from(event: &'a Event) -> Self {
        Self {
            layer: &event.layer,
            vulnerability: &event.vulnerability,
            analogy: &event.analogy,
            checklist_type: event.checklist_type,
            timestamp: timestamp::to_iso(&event.timestamp),
        }
    }
}

/// One CSV row: an event tagged with its run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct CsvRecord<'a> {
    run_id: RunId,
    layer: &'a str,
    vulnerability: &'a str,
    analogy: &'a str,
    checklist_type: ChecklistType,
    timestamp: String,
}

impl<'a> CsvRecord<'a> {
    fn new(run: &Run, event: &'a Event) -> Self {
        let record = EventRecord::from(event);
        Self {
            run_id: run.id,
            layer: record.layer,
            vulnerability: record.vulnerability,
            analogy: record.analogy,
            checklist_type: record.checklist_type,
            timestamp: record.timestamp,
        }
    }
}

/// Raw log entry, as shown by the "view raw logs" panel.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LogRecord<'a> {
    run_id: RunId,
    events: &'a [Event],
}

/// Pretty-printed JSON array of the run's events.
pub fn export_run_json(run: Option<&Run>) -> Result<String, SimError> {
    let run = run.ok_or(SimError::NoRunAvailable)?;
    let records: Vec<EventRecord<'_>> = run.events.iter().map(EventRecord::from).collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

/// Flattens every logged run into CSV.
///
/// The header is the field names of the first record; every value is
/// JSON-quoted.
pub fn export_log_csv(log: &RunLog) -> Result<String, SimError> {
    let mut rows: Vec<Map<String, Value>> = Vec::new();
    for run in log.iter() {
        for event in &run.events {
            rows.push(to_object(&CsvRecord::new(run, event))?);
        }
    }

    let Some(first) = rows.first() else {
        return Err(SimError::EmptyLog);
    };
    let keys: Vec<String> = first.keys().cloned().collect();

    let empty = Value::String(String::new());
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(keys.join(","));
    for row in &rows {
        let values = keys
            .iter()
            .map(|k| serde_json::to_string(row.get(k).unwrap_or(&empty)))
            .collect::<Result<Vec<_>, _>>()?;
        lines.push(values.join(","));
    }

    Ok(lines.join("\n"))
}

/// Pretty-printed JSON of the whole log with full events.
pub fn export_log_json(log: &RunLog) -> Result<String, SimError> {
    if log.is_empty() {
        return Err(SimError::EmptyLog);
    }
    let records: Vec<LogRecord<'_>> = log
        .iter()
        .map(|run| LogRecord {
            run_id: run.id,
            events: &run.events,
        })
        .collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

/// Writes an export to a file.
pub fn write_export(path: impl AsRef<Path>, contents: &str) -> Result<(), SimError> {
    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())?;
    Ok(())
}

fn to_object<T: Serialize>(value: &T) -> Result<Map<String, Value>, SimError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(SimError::Serialization(serde::ser::Error::custom(format!(
            "expected a JSON object, got {other}"
        )))),
    }
}
