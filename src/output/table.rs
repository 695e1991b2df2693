//! Human-readable output formatting
//!
//! Maps render as indented `key: value` lines. A list whose items are all
//! flat maps renders as a column-aligned table; any other list renders one
//! item per `-` line.

use crate::engine::value::{Document, Value};

const INDENT: &str = "  ";

pub fn format_table(document: &Document) -> String {
    let mut out = String::new();
    write_map(&mut out, document, 0);
    out.trim_end().to_string()
}

fn write_map(out: &mut String, map: &Document, depth: usize) {
    for (key, value) in map {
        if *value == Value::Null {
            continue;
        }
        let pad = INDENT.repeat(depth);
        match value {
            Value::Map(child) => {
                out.push_str(&format!("{}{}:\n", pad, key));
                write_map(out, child, depth + 1);
            }
            Value::List(items) if !items.is_empty() => {
                out.push_str(&format!("{}{}:\n", pad, key));
                write_list(out, items, depth + 1);
            }
            Value::List(_) => out.push_str(&format!("{}{}: -\n", pad, key)),
            scalar => out.push_str(&format!("{}{}: {}\n", pad, key, scalar)),
        }
    }
}

fn write_list(out: &mut String, items: &[Value], depth: usize) {
    let rows: Option<Vec<&Document>> = items
        .iter()
        .map(|item| item.as_map().filter(|map| map.values().all(is_cell)))
        .collect();

    match rows {
        Some(rows) => write_rows(out, &rows, depth),
        None => {
            let pad = INDENT.repeat(depth);
            for item in items {
                match item {
                    Value::Map(map) => {
                        out.push_str(&format!("{}-\n", pad));
                        write_map(out, map, depth + 1);
                    }
                    other => out.push_str(&format!("{}- {}\n", pad, other)),
                }
            }
        }
    }
}

/// Scalars and lists of scalars fit in a table cell.
fn is_cell(value: &Value) -> bool {
    match value {
        Value::List(items) => items.iter().all(Value::is_scalar),
        other => other.is_scalar(),
    }
}

fn write_rows(out: &mut String, rows: &[&Document], depth: usize) {
    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| row.get(*column).map(Value::to_string).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(column.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let pad = INDENT.repeat(depth);
    let render = |values: Vec<&str>| -> String {
        let line: Vec<String> = values
            .iter()
            .zip(&widths)
            .map(|(value, width)| format!("{:<width$}", value, width = width))
            .collect();
        format!("{}{}\n", pad, line.join("  ").trim_end())
    };

    let header: Vec<String> = columns.iter().map(|c| c.to_uppercase()).collect();
    out.push_str(&render(header.iter().map(String::as_str).collect()));
    for row in &cells {
        out.push_str(&render(row.iter().map(String::as_str).collect()));
    }
}
