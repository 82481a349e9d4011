use comfy_table::{Cell, Table};

use crate::cli::{connect, ConnectionArgs};
use crate::entities::EntityKind;
use crate::error::Result;
use crate::exporter::records_from_documents;
use crate::fmt::truncate;
use crate::remote::{find_collection_id, list_all_documents};

const CELL_WIDTH: usize = 30;

pub fn run(connection: &ConnectionArgs, entity: EntityKind, limit: Option<usize>) -> Result<()> {
    let (_, client) = connect(connection)?;
    let collection_id = find_collection_id(&client, entity.collection())?;
    let documents = list_all_documents(&client, &collection_id)?;
    let shown = limit.unwrap_or(documents.len()).min(documents.len());
    let records = records_from_documents(entity, &documents[..shown]);

    let mut header = vec!["ID"];
    header.extend(entity.column_names());
    let mut table = Table::new();
    table.set_header(header);
    for (doc, record) in documents.iter().zip(&records) {
        let mut row = vec![Cell::new(&doc.id)];
        for column in entity.columns() {
            let value = record.get(column.name).map(|v| v.to_cell()).unwrap_or_default();
            row.push(Cell::new(truncate(&value, CELL_WIDTH)));
        }
        table.add_row(row);
    }

    println!("{} ({} of {})\n{table}", entity.display_name(), shown, documents.len());
    Ok(())
}
