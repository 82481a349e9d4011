use comfy_table::{Cell, Table};

use crate::entities::ALL_ENTITIES;
use crate::error::Result;

pub fn run() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Entity", "Collection", "Key", "Columns", "File columns"]);
    for entity in ALL_ENTITIES {
        let columns: Vec<String> = entity
            .expected_attributes()
            .iter()
            .map(|a| {
                let size = a.size.map(|n| format!("[{n}]")).unwrap_or_default();
                let required = if a.required { " (required)" } else { "" };
                format!("{} {}{size}{required}", a.key, a.kind)
            })
            .collect();
        let files: Vec<&str> = entity.file_columns().iter().map(|f| f.column).collect();
        table.add_row(vec![
            Cell::new(entity.display_name()),
            Cell::new(entity.collection()),
            Cell::new(entity.key_column()),
            Cell::new(columns.join("\n")),
            Cell::new(files.join(", ")),
        ]);
    }
    println!("Entities\n{table}");
    Ok(())
}
