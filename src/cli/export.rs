use std::path::PathBuf;

use crate::cli::{connect, ConnectionArgs};
use crate::entities::EntityKind;
use crate::error::Result;
use crate::exporter::{export_to_csv, records_from_documents};
use crate::remote::{find_collection_id, list_all_documents};

pub fn run(connection: &ConnectionArgs, entity: EntityKind, output: Option<String>) -> Result<()> {
    let (_, client) = connect(connection)?;
    let collection_id = find_collection_id(&client, entity.collection())?;
    let documents = list_all_documents(&client, &collection_id)?;
    let records = records_from_documents(entity, &documents);
    let csv = export_to_csv(entity, &records)?;

    let path = output.map(PathBuf::from).unwrap_or_else(|| PathBuf::from(entity.export_filename()));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, csv)?;
    println!("Exported {} {} record(s) to {}", records.len(), entity.display_name(), path.display());
    Ok(())
}
