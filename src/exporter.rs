use serde_json::Value;

use crate::entities::{ColumnKind, EntityKind};
use crate::error::{FengError, Result};
use crate::models::{Document, FieldValue, Record};
use crate::tokenizer::BOM;

fn field_from_json(kind: ColumnKind, value: Option<&Value>) -> FieldValue {
    match kind {
        ColumnKind::Integer => FieldValue::Number(value.and_then(Value::as_f64).unwrap_or(0.0)),
        ColumnKind::Datetime => FieldValue::Date(
            value
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        ),
        ColumnKind::Text | ColumnKind::Url => FieldValue::Text(match value {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }),
    }
}

/// Convert remote documents into records, one per document, in order.
pub fn records_from_documents(entity: EntityKind, documents: &[Document]) -> Vec<Record> {
    documents
        .iter()
        .map(|doc| {
            let mut record = Record::new();
            for column in entity.columns() {
                record.set(column.name, field_from_json(column.kind, doc.data.get(column.name)));
            }
            record
        })
        .collect()
}

fn cell(kind: ColumnKind, value: Option<&FieldValue>) -> String {
    match (kind, value) {
        (_, Some(v)) => v.to_cell(),
        (ColumnKind::Integer, None) => "0".to_string(),
        (_, None) => String::new(),
    }
}

/// Serialize records as BOM-prefixed CSV with the entity's header row.
pub fn export_to_csv(entity: EntityKind, records: &[Record]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer.write_record(entity.column_names())?;
    for record in records {
        writer.write_record(
            entity.columns().iter().map(|c| cell(c.kind, record.get(c.name))),
        )?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| FengError::Other(format!("failed to flush CSV: {}", e.error())))?;
    let body = String::from_utf8(bytes)
        .map_err(|e| FengError::Other(format!("CSV output is not UTF-8: {e}")))?;
    Ok(format!("{BOM}{body}"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::importer::parse_csv;

    fn doc(id: &str, data: Value) -> Document {
        Document { id: id.to_string(), data: data.as_object().cloned().unwrap_or_default() }
    }

    #[test]
    fn test_header_and_bom() {
        let csv = export_to_csv(EntityKind::Bank, &[]).unwrap();
        assert_eq!(
            csv,
            "\u{feff}name,deposit,site,address,withdrawals,transfer,activity,card,account\n"
        );
    }

    #[test]
    fn test_quotes_only_when_needed() {
        let mut record = Record::new();
        record.set("name", FieldValue::Text("Bank A".into()));
        record.set("deposit", FieldValue::Number(1000.0));
        record.set("address", FieldValue::Text("Room A, Room B".into()));
        record.set("card", FieldValue::Text("say \"hi\"".into()));
        record.set("account", FieldValue::Text("line1\nline2".into()));
        let csv = export_to_csv(EntityKind::Bank, &[record]).unwrap();
        let body = csv.lines().skip(1).collect::<Vec<_>>().join("\n");
        assert_eq!(body, "Bank A,1000,,\"Room A, Room B\",0,0,,\"say \"\"hi\"\"\",\"line1\nline2\"");
    }

    #[test]
    fn test_records_from_documents_applies_defaults() {
        let docs = vec![doc("1", json!({
            "name": "Netflix",
            "price": 390,
            "nextdate": null,
            "site": "https://netflix.com",
        }))];
        let records = records_from_documents(EntityKind::Subscription, &docs);
        let r = &records[0];
        assert_eq!(r.get("price"), Some(&FieldValue::Number(390.0)));
        assert_eq!(r.get("nextdate"), Some(&FieldValue::Date(None)));
        assert_eq!(r.get("note"), Some(&FieldValue::Text(String::new())));
        assert_eq!(r.get("site"), Some(&FieldValue::Text("https://netflix.com".into())));
    }

    #[test]
    fn test_export_then_parse_returns_same_records() {
        let docs = vec![
            doc("1", json!({
                "name": "Milk",
                "amount": 2,
                "todate": "2025-03-01T00:00:00.000+00:00",
                "photo": "https://x/files/f1/view",
                "price": 65,
                "shop": "Corner, Store",
                "photohash": "abc",
            })),
            doc("2", json!({ "name": "Eggs \"free range\"" })),
        ];
        let records = records_from_documents(EntityKind::Food, &docs);
        let csv = export_to_csv(EntityKind::Food, &records).unwrap();
        let parsed = parse_csv(EntityKind::Food, &csv);
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        assert_eq!(parsed.records, records);
    }

    #[test]
    fn test_carriage_return_in_cell_comes_back_as_newline() {
        let docs = vec![
            doc("1", json!({ "name": "Netflix", "note": "a\r\nb" })),
            doc("2", json!({ "name": "Hulu", "note": "c\rd" })),
        ];
        let records = records_from_documents(EntityKind::Subscription, &docs);
        let csv = export_to_csv(EntityKind::Subscription, &records).unwrap();
        let parsed = parse_csv(EntityKind::Subscription, &csv);
        assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].text("note"), "a\nb");
        assert_eq!(parsed.records[1].text("note"), "c\nd");
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(EntityKind::CommonDocument.export_filename(), "appwrite-CommonDocument.csv");
    }
}
