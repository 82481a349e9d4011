use std::io::Write;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::check::{print_errors, read_and_parse};
use crate::cli::{confirm, connect, ConnectionArgs};
use crate::entities::EntityKind;
use crate::error::{FengError, Result};
use crate::fmt::progress_line;
use crate::importer::execute_import;
use crate::remote::find_collection_id;

pub fn run(connection: &ConnectionArgs, entity: EntityKind, file: &str, yes: bool) -> Result<()> {
    let batch = read_and_parse(entity, file)?;
    if !batch.errors.is_empty() {
        println!("{} problem(s) in {file}:", batch.errors.len());
        print_errors(&batch);
    }
    if batch.records.is_empty() {
        return Err(FengError::Other(format!("no valid records to import from {file}")));
    }

    let (_, client) = connect(connection)?;
    let collection_id = find_collection_id(&client, entity.collection())?;

    if !yes {
        let prompt = format!(
            "Import {} {} record(s) into collection {collection_id}?",
            batch.records.len(),
            entity.display_name()
        );
        if !confirm(&prompt)? {
            println!("Import cancelled.");
            return Ok(());
        }
    }

    let outcome = execute_import(&client, &collection_id, entity, &batch.records, |progress| {
        eprint!("\r{}", progress_line(progress.current_index, progress.total, progress.percent()));
        let _ = std::io::stderr().flush();
    })?;
    eprintln!();

    println!(
        "{} succeeded ({} created, {} updated), {} failed",
        outcome.success_count.to_string().green(),
        outcome.created,
        outcome.updated,
        if outcome.fail_count() > 0 {
            outcome.fail_count().to_string().red()
        } else {
            outcome.fail_count().to_string().normal()
        }
    );

    if !outcome.failures.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Record", entity.key_column(), "Error"]);
        for failure in &outcome.failures {
            table.add_row(vec![
                Cell::new(failure.index + 1),
                Cell::new(&failure.key),
                Cell::new(&failure.error),
            ]);
        }
        println!("{table}");
    }
    Ok(())
}
