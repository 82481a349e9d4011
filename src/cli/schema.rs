use std::time::Duration;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::appwrite::AppwriteClient;
use crate::cli::{confirm, connect, ConnectionArgs};
use crate::entities::EntityKind;
use crate::error::{FengError, Result};
use crate::remote::{find_latest_collection, DocumentStore};
use crate::schema::{analyze_schema, auto_update_schema, available_attributes, SchemaDiff};

fn diff_for(client: &AppwriteClient, entity: EntityKind) -> Result<(String, SchemaDiff)> {
    let latest = find_latest_collection(client, entity.collection())?
        .ok_or_else(|| FengError::CollectionNotFound(entity.collection().to_string()))?;
    let collection = client.get_collection(&latest.id)?;
    let actual = available_attributes(&collection.attributes);
    Ok((collection.id, analyze_schema(&entity.expected_attributes(), &actual)))
}

fn print_diff(entity: EntityKind, collection_id: &str, diff: &SchemaDiff) {
    println!("{} (collection {collection_id})", entity.display_name());
    if !diff.has_changes() && diff.issues().is_empty() {
        println!("{}", "Schema is up to date.".green());
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Attribute", "Change", "Detail"]);
    for add in &diff.to_add {
        let detail = match add.size {
            Some(size) => format!("{}[{size}]", add.kind),
            None => add.kind.to_string(),
        };
        table.add_row(vec![Cell::new(&add.key), Cell::new("add".green()), Cell::new(detail)]);
    }
    for update in &diff.to_update {
        table.add_row(vec![
            Cell::new(&update.key),
            Cell::new("widen".green()),
            Cell::new(format!("{} {} → {}", update.kind, update.old_size, update.new_size)),
        ]);
    }
    for issue in diff.issues() {
        table.add_row(vec![
            Cell::new(&issue.key),
            Cell::new(issue.code.red()),
            Cell::new(issue.message),
        ]);
    }
    println!("{table}");

    if !diff.can_auto_update() {
        println!(
            "{}",
            "Conflicts or extra attributes must be resolved by hand before updating.".yellow()
        );
    }
}

pub fn analyze(connection: &ConnectionArgs, entity: EntityKind) -> Result<()> {
    let (_, client) = connect(connection)?;
    let (collection_id, diff) = diff_for(&client, entity)?;
    print_diff(entity, &collection_id, &diff);
    Ok(())
}

pub fn update(connection: &ConnectionArgs, entity: EntityKind, yes: bool, throttle_ms: u64) -> Result<()> {
    let (_, client) = connect(connection)?;
    let (collection_id, diff) = diff_for(&client, entity)?;
    print_diff(entity, &collection_id, &diff);
    // A blocked diff falls through so the updater reports it as SchemaBlocked.
    if diff.can_auto_update() {
        if !diff.has_changes() {
            return Ok(());
        }
        if !yes && !confirm("Apply these changes?")? {
            println!("Schema update cancelled.");
            return Ok(());
        }
    }

    let results = auto_update_schema(&client, &collection_id, &diff, Duration::from_millis(throttle_ms))?;
    let mut table = Table::new();
    table.set_header(vec!["Attribute", "Action", "Result"]);
    for result in &results {
        let status = match &result.outcome {
            Ok(()) => "ok".green().to_string(),
            Err(e) => e.to_string().red().to_string(),
        };
        table.add_row(vec![Cell::new(&result.key), Cell::new(result.action), Cell::new(status)]);
    }
    println!("{table}");
    let failed = results.iter().filter(|r| !r.succeeded()).count();
    println!("{} succeeded, {} failed", results.len() - failed, failed);
    Ok(())
}
