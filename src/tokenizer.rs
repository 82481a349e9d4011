use crate::error::{FengError, Result};

pub const BOM: char = '\u{feff}';

/// Strip a leading BOM and fold CRLF / lone CR line endings into LF.
pub fn normalize(text: &str) -> String {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn flush_row(rows: &mut Vec<Vec<String>>, row: &mut Vec<String>, field: &mut String) {
    row.push(std::mem::take(field));
    let row = std::mem::take(row);
    if row.iter().any(|cell| !cell.trim().is_empty()) {
        rows.push(row);
    }
}

/// Split CSV text into a grid of raw cells.
///
/// Outside quotes a `"` starts a quoted section wherever it appears in a field. Inside one,
/// `""` is a literal quote and any other `"` ends it; commas and newlines are kept. Rows
/// whose cells are all blank are dropped. Cells are not trimmed; that is left to the row
/// mapper.
pub fn parse_full_csv(text: &str) -> Result<Vec<Vec<String>>> {
    let text = normalize(text);
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut opened_at = 0;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\n' {
            line += 1;
        }
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => {
                in_quotes = true;
                opened_at = line;
            }
            ',' => row.push(std::mem::take(&mut field)),
            '\n' => flush_row(&mut rows, &mut row, &mut field),
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(FengError::UnterminatedQuote { line: opened_at });
    }
    flush_row(&mut rows, &mut row, &mut field);
    Ok(rows)
}
