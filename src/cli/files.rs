use std::path::Path;

use colored::Colorize;

use crate::cli::{connect, ConnectionArgs};
use crate::entities::EntityKind;
use crate::error::Result;
use crate::files::{attach_file, delete_document_with_files};
use crate::fmt::format_bytes;
use crate::remote::find_collection_id;

pub fn delete(connection: &ConnectionArgs, entity: EntityKind, id: &str) -> Result<()> {
    let (config, client) = connect(connection)?;
    let collection_id = find_collection_id(&client, entity.collection())?;
    if config.bucket_id.is_none() && !entity.file_columns().is_empty() {
        println!("{}", "No bucket configured; referenced files will be left in storage.".yellow());
    }
    let result = delete_document_with_files(
        &client,
        entity,
        &collection_id,
        id,
        config.bucket_id.as_deref(),
    )?;
    println!("Deleted {} {id} ({} file(s) removed)", entity.display_name(), result.files_removed);
    Ok(())
}

pub fn attach(connection: &ConnectionArgs, entity: EntityKind, id: &str, column: &str, file: &str) -> Result<()> {
    let path = Path::new(file);
    let bytes = std::fs::read(path)?;
    let size = bytes.len() as u64;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string());

    let (config, client) = connect(connection)?;
    let collection_id = find_collection_id(&client, entity.collection())?;
    let result = attach_file(&client, &config, entity, &collection_id, id, column, &filename, bytes)?;

    println!("Uploaded {filename} ({})", format_bytes(size));
    println!("{} {}: {column} = {}", entity.display_name(), result.document.id, result.url);
    if result.replaced {
        println!("Previous file removed from storage.");
    }
    Ok(())
}
