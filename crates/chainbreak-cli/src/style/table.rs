//! Table formatting using comfy-table.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use super::colors::SemanticStyle;

/// Creates a styled table for a record listing (one row per record).
pub fn records_table(columns: &[String], rows: &[Vec<String>]) -> Table {
    let mut table = Table::new();

    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = columns
        .iter()
        .map(|col| {
            if super::no_color() {
                Cell::new(col)
            } else {
                Cell::new(col)
                    .add_attribute(Attribute::Bold)
                    .fg(Color::Cyan)
            }
        })
        .collect();
    table.set_header(header_cells);

    for row in rows {
        table.add_row(row);
    }

    table
}

/// Prints a record listing as a formatted table, with a row-count footer.
pub fn print_records_table(title: &str, columns: &[String], rows: &[Vec<String>]) {
    if rows.is_empty() {
        println!("{}", format!("{title}: none found").muted());
        return;
    }

    println!("{}", title.header());
    let table = records_table(columns, rows);
    println!("{table}");

    let count = rows.len();
    let row_word = if count == 1 { "record" } else { "records" };
    println!("{}", format!("({count} {row_word})").muted());
}

