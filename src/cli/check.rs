use colored::Colorize;

use crate::entities::EntityKind;
use crate::error::{FengError, Result};
use crate::importer::{parse_csv, ParseResult};

pub(crate) fn read_and_parse(entity: EntityKind, file: &str) -> Result<ParseResult> {
    let text = std::fs::read_to_string(file)?;
    Ok(parse_csv(entity, &text))
}

pub(crate) fn print_errors(result: &ParseResult) {
    for error in &result.errors {
        println!("  {} {error}", "✗".red());
    }
}

pub fn run(entity: EntityKind, file: &str) -> Result<()> {
    let result = read_and_parse(entity, file)?;
    let valid = result.records.len();
    println!(
        "{}: {} valid record{}",
        entity.display_name(),
        valid.to_string().green(),
        if valid == 1 { "" } else { "s" }
    );
    if result.errors.is_empty() {
        return Ok(());
    }
    print_errors(&result);
    Err(FengError::Other(format!("{} problem(s) found in {file}", result.errors.len())))
}
