use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::entities::{ColumnKind, EntityKind};
use crate::error::Result;
use crate::files::unique_id;
use crate::models::{FieldValue, Record};
use crate::remote::{list_all_documents, DocumentStore};
use crate::tokenizer::parse_full_csv;

const MAX_HEADER_ERRORS: usize = 5;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn parse_number(raw: &str) -> f64 {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite()).unwrap_or(0.0)
}

fn map_cell(kind: ColumnKind, raw: &str) -> FieldValue {
    let raw = raw.trim();
    match kind {
        ColumnKind::Integer => FieldValue::Number(parse_number(raw)),
        ColumnKind::Datetime if raw.is_empty() => FieldValue::Date(None),
        ColumnKind::Datetime => FieldValue::Date(Some(raw.to_string())),
        ColumnKind::Text | ColumnKind::Url => FieldValue::Text(raw.to_string()),
    }
}

/// Build the JSON body sent to the document store for one record.
///
/// Integers are truncated, url and datetime columns become `null` when empty because the
/// store rejects empty strings for those attribute types.
pub fn record_to_payload(entity: EntityKind, record: &Record) -> Map<String, Value> {
    let mut payload = Map::new();
    for column in entity.columns() {
        let value = match (column.kind, record.get(column.name)) {
            (ColumnKind::Integer, Some(FieldValue::Number(n))) => Value::from(n.trunc() as i64),
            (ColumnKind::Integer, _) => Value::from(0),
            (ColumnKind::Datetime, Some(FieldValue::Date(Some(d)))) => Value::from(d.clone()),
            (ColumnKind::Url, Some(FieldValue::Text(s))) if !s.is_empty() => Value::from(s.clone()),
            (ColumnKind::Url | ColumnKind::Datetime, _) => Value::Null,
            (ColumnKind::Text, Some(v)) => Value::from(v.to_cell()),
            (ColumnKind::Text, None) => Value::from(""),
        };
        payload.insert(column.name.to_string(), value);
    }
    payload
}

// ---------------------------------------------------------------------------
// parse_csv
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ParseResult {
    pub records: Vec<Record>,
    pub errors: Vec<String>,
}

impl ParseResult {
    fn fatal(error: String) -> Self {
        Self { records: Vec::new(), errors: vec![error] }
    }
}

/// Validate CSV text against an entity's header and map its rows into records.
///
/// Header problems reject the whole file. Row problems skip only the offending row and
/// are reported alongside the records that did parse.
pub fn parse_csv(entity: EntityKind, text: &str) -> ParseResult {
    let rows = match parse_full_csv(text) {
        Ok(rows) => rows,
        Err(e) => return ParseResult::fatal(e.to_string()),
    };
    if rows.len() < 2 {
        return ParseResult::fatal(
            "CSV must contain a header row and at least one data row".to_string(),
        );
    }

    let columns = entity.columns();
    let header = &rows[0];
    if header.len() != columns.len() {
        return ParseResult::fatal(format!(
            "Header has {} columns, expected {}",
            header.len(),
            columns.len()
        ));
    }

    let mismatches: Vec<String> = columns
        .iter()
        .zip(header)
        .enumerate()
        .filter(|(_, (col, cell))| col.name != cell.trim())
        .map(|(i, (col, cell))| {
            format!("Column {}: expected \"{}\", found \"{}\"", i + 1, col.name, cell.trim())
        })
        .collect();
    if !mismatches.is_empty() {
        let omitted = mismatches.len().saturating_sub(MAX_HEADER_ERRORS);
        let mut errors: Vec<String> = mismatches.into_iter().take(MAX_HEADER_ERRORS).collect();
        if omitted > 0 {
            errors.push(format!("... {omitted} more column mismatches omitted"));
        }
        return ParseResult { records: Vec::new(), errors };
    }

    let key_column = entity.key_column();
    let mut result = ParseResult::default();
    for (i, row) in rows.iter().enumerate().skip(1) {
        let row_number = i + 1;
        if row.len() != columns.len() {
            result.errors.push(format!(
                "Row {row_number}: expected {} cells, found {}",
                columns.len(),
                row.len()
            ));
            continue;
        }
        let mut record = Record::new();
        for (column, cell) in columns.iter().zip(row) {
            record.set(column.name, map_cell(column.kind, cell));
        }
        if record.text(key_column).is_empty() {
            result.errors.push(format!("Row {row_number}: {key_column} is required"));
            continue;
        }
        result.records.push(record);
    }
    result
}

// ---------------------------------------------------------------------------
// execute_import
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct RowFailure {
    /// 0-based position in the batch.
    pub index: usize,
    pub key: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportOutcome {
    pub total: usize,
    /// 1-based index of the last processed record.
    pub current_index: usize,
    pub created: usize,
    pub updated: usize,
    pub success_count: usize,
    pub failures: Vec<RowFailure>,
}

impl ImportOutcome {
    pub fn fail_count(&self) -> usize {
        self.failures.len()
    }

    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 100;
        }
        (self.current_index * 100 / self.total) as u32
    }
}

enum Applied {
    Created(String),
    Updated,
}

fn apply_record(
    store: &impl DocumentStore,
    collection_id: &str,
    entity: EntityKind,
    record: &Record,
    existing: &HashMap<String, String>,
) -> Result<Applied> {
    let payload = record_to_payload(entity, record);
    let key = record.text(entity.key_column());
    match existing.get(key) {
        Some(id) => {
            debug!(%key, %id, "updating document");
            store.update_document(collection_id, id, &payload)?;
            Ok(Applied::Updated)
        }
        None => {
            let id = unique_id();
            debug!(%key, %id, "creating document");
            let doc = store.create_document(collection_id, &id, &payload)?;
            Ok(Applied::Created(doc.id))
        }
    }
}

/// Create or update every record in `batch`, one at a time, matching on the entity's key.
///
/// A failing record is counted and skipped; nothing is retried or rolled back.
/// `on_progress` sees the outcome after each record.
pub fn execute_import<F>(
    store: &impl DocumentStore,
    collection_id: &str,
    entity: EntityKind,
    batch: &[Record],
    mut on_progress: F,
) -> Result<ImportOutcome>
where
    F: FnMut(&ImportOutcome),
{
    let key_column = entity.key_column();
    let mut existing: HashMap<String, String> = HashMap::new();
    for doc in list_all_documents(store, collection_id)? {
        if let Some(key) = doc.str_field(key_column) {
            existing.entry(key.to_string()).or_insert(doc.id.clone());
        }
    }
    info!(collection = collection_id, rows = batch.len(), known = existing.len(), "starting import");

    let mut outcome = ImportOutcome { total: batch.len(), ..Default::default() };
    for (index, record) in batch.iter().enumerate() {
        let key = record.text(key_column).to_string();
        match apply_record(store, collection_id, entity, record, &existing) {
            Ok(Applied::Created(id)) => {
                existing.entry(key).or_insert(id);
                outcome.created += 1;
                outcome.success_count += 1;
            }
            Ok(Applied::Updated) => {
                outcome.updated += 1;
                outcome.success_count += 1;
            }
            Err(e) => {
                warn!(%key, error = %e, "import row failed");
                outcome.failures.push(RowFailure { index, key, error: e.to_string() });
            }
        }
        outcome.current_index = index + 1;
        on_progress(&outcome);
    }

    info!(
        succeeded = outcome.success_count,
        failed = outcome.fail_count(),
        "import finished"
    );
    Ok(outcome)
}
