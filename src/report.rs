// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Stock position and movement history reports.
//!
//! A [`StockReport`] is a snapshot taken from an [`Inventory`]; rendering never
//! touches the inventory again. Text output is restricted to the Latin-1 repertoire:
//! characters outside it are dropped rather than failing the whole report.
//! [`StockReport::write_text`] writes it encoded as Latin-1 bytes, one byte per
//! character.
//!
//! # Example
//!
//! ```
//! use field_stock_rs::{Category, Inventory, NewEquipment, StockReport};
//!
//! let inventory = Inventory::new();
//! inventory
//!     .register_equipment(NewEquipment::new("Fiber Splicer", Category::Fiber, 3))
//!     .unwrap();
//!
//! let report = StockReport::capture(&inventory, "Stock", 20);
//! let text = report.render_text(50);
//! assert!(text.contains("Fiber Splicer"));
//! assert!(text.contains("LOW"));
//! ```

use crate::inventory::Inventory;
use crate::movement::MovementKind;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{self, Write};

const PRODUCT_WIDTH: usize = 35;
const CATEGORY_WIDTH: usize = 16;
const TECHNICIAN_WIDTH: usize = 20;
const ITEM_WIDTH: usize = 30;
const NOTE_WIDTH: usize = 20;

/// One equipment line of the stock section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockRow {
    pub name: String,
    pub category: String,
    pub quantity: u32,
    pub low_stock: bool,
}

impl StockRow {
    pub fn status(&self) -> &'static str {
        if self.low_stock { "LOW" } else { "Normal" }
    }
}

/// One movement line of the history section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRow {
    pub created_at: DateTime<Utc>,
    pub technician: String,
    pub kind: MovementKind,
    pub equipment: String,
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockReport {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    /// All equipment, ordered by name.
    pub stock: Vec<StockRow>,
    /// Newest movements first.
    pub history: Vec<HistoryRow>,
    pub history_limit: usize,
}

#[derive(Serialize)]
struct StockCsvRecord<'a> {
    product: &'a str,
    category: &'a str,
    quantity: u32,
    status: &'a str,
}

impl StockReport {
    /// Snapshots the catalog and the `recent` newest movements.
    pub fn capture(inventory: &Inventory, title: impl Into<String>, recent: usize) -> Self {
        let equipment = inventory.equipment_list();
        let stock = equipment
            .iter()
            .map(|item| StockRow {
                name: item.name.clone(),
                category: item.category.label().to_string(),
                quantity: item.quantity,
                low_stock: item.is_low_stock(),
            })
            .collect();

        let history = inventory
            .recent_movements(recent)
            .into_iter()
            .map(|movement| HistoryRow {
                created_at: movement.created_at,
                technician: inventory.display_name(movement.technician),
                kind: movement.kind,
                equipment: equipment
                    .iter()
                    .find(|item| item.id == movement.equipment)
                    .map(|item| item.name.clone())
                    .unwrap_or_else(|| format!("#{}", movement.equipment)),
                note: movement.note,
            })
            .collect();

        Self {
            title: title.into(),
            generated_at: Utc::now(),
            stock,
            history,
            history_limit: recent,
        }
    }

    /// Body lines before pagination.
    fn body(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.stock.len() + self.history.len() + 8);

        lines.push("1. Current stock position".to_string());
        lines.push(format!(
            "{:<PRODUCT_WIDTH$} {:<CATEGORY_WIDTH$} {:>6} {:<8}",
            "Product", "Category", "Qty", "Status"
        ));
        for row in &self.stock {
            lines.push(format!(
                "{:<PRODUCT_WIDTH$} {:<CATEGORY_WIDTH$} {:>6} {:<8}",
                cell(&row.name, PRODUCT_WIDTH),
                cell(&row.category, CATEGORY_WIDTH),
                row.quantity,
                row.status()
            ));
        }
        lines.push(String::new());

        lines.push(format!("2. Recent history (last {})", self.history_limit));
        lines.push(format!(
            "{:<11} {:<TECHNICIAN_WIDTH$} {:<9} {:<ITEM_WIDTH$} {:<NOTE_WIDTH$}",
            "Date/Time", "Technician", "Action", "Item", "Note"
        ));
        for row in &self.history {
            lines.push(format!(
                "{:<11} {:<TECHNICIAN_WIDTH$} {:<9} {:<ITEM_WIDTH$} {:<NOTE_WIDTH$}",
                row.created_at.format("%d/%m %H:%M"),
                cell(&row.technician, TECHNICIAN_WIDTH),
                row.kind.code(),
                cell(&row.equipment, ITEM_WIDTH),
                cell(row.note.as_deref().unwrap_or("-"), NOTE_WIDTH)
            ));
        }

        lines
            .into_iter()
            .map(|line| line.trim_end().to_string())
            .collect()
    }

    /// Renders the paginated text document.
    ///
    /// Each page carries the title as header and `Page N` as footer; pages are
    /// separated by a form feed.
    pub fn render_text(&self, lines_per_page: usize) -> String {
        let body = self.body();
        let title = to_latin1(&self.title);
        let per_page = lines_per_page.max(1);

        let pages: Vec<String> = body
            .chunks(per_page)
            .enumerate()
            .map(|(index, chunk)| {
                let mut page = String::new();
                page.push_str(&title);
                page.push_str("\n\n");
                for line in chunk {
                    page.push_str(line);
                    page.push('\n');
                }
                page.push('\n');
                page.push_str(&format!("Page {}\n", index + 1));
                page
            })
            .collect();

        pages.join("\u{c}")
    }

    /// Writes the rendered text encoded as Latin-1.
    pub fn write_text<W: Write>(&self, lines_per_page: usize, mut writer: W) -> io::Result<()> {
        writer.write_all(&encode_latin1(&self.render_text(lines_per_page)))?;
        writer.flush()
    }

    /// Writes the stock section as CSV.
    pub fn write_stock_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::Writer::from_writer(writer);
        for row in &self.stock {
            wtr.serialize(StockCsvRecord {
                product: &row.name,
                category: &row.category,
                quantity: row.quantity,
                status: row.status(),
            })?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Folds text into Latin-1, dropping anything it cannot represent.
///
/// Control characters are dropped as well so they cannot break the layout.
pub fn to_latin1(text: &str) -> String {
    text.chars()
        .filter(|c| u32::from(*c) <= 0xFF && !c.is_control())
        .collect()
}

/// Encodes text as Latin-1 bytes, dropping characters it cannot represent.
pub fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .filter_map(|c| u8::try_from(c).ok())
        .collect()
}

/// Cuts text to at most `width` characters.
pub fn truncate(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

fn cell(text: &str, width: usize) -> String {
    truncate(&to_latin1(text), width)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(stock: Vec<StockRow>, history: Vec<HistoryRow>) -> StockReport {
        StockReport {
            title: "Stock".to_string(),
            generated_at: Utc::now(),
            stock,
            history,
            history_limit: 20,
        }
    }

    fn row(name: &str, quantity: u32, low_stock: bool) -> StockRow {
        StockRow {
            name: name.to_string(),
            category: "Ferramentas".to_string(),
            quantity,
            low_stock,
        }
    }

    #[test]
    fn latin1_keeps_accents_and_drops_the_rest() {
        assert_eq!(to_latin1("Fibra Óptica"), "Fibra Óptica");
        assert_eq!(to_latin1("João 🚀 ok"), "João  ok");
        assert_eq!(to_latin1("a\tb\u{7}c"), "abc");
        assert_eq!(to_latin1("光纤"), "");
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("ação", 2), "aç");
        assert_eq!(truncate("abc", 10), "abc");
    }

    #[test]
    fn long_names_are_cut_to_column_width() {
        let long = "X".repeat(50);
        let text = report(vec![row(&long, 1, false)], vec![]).render_text(50);
        assert!(text.contains(&"X".repeat(35)));
        assert!(!text.contains(&"X".repeat(36)));
    }

    #[test]
    fn missing_note_shows_dash() {
        let history = vec![HistoryRow {
            created_at: Utc::now(),
            technician: "joao".to_string(),
            kind: MovementKind::Withdraw,
            equipment: "ONU".to_string(),
            note: None,
        }];
        let text = report(vec![], history).render_text(50);
        let line = text.lines().find(|l| l.contains("joao")).unwrap();
        assert!(line.contains("WITHDRAW"));
        assert!(line.ends_with('-'));
    }

    #[test]
    fn pages_have_header_and_footer() {
        let stock: Vec<StockRow> = (0..30).map(|i| row(&format!("Item {i:02}"), i, false)).collect();
        let text = report(stock, vec![]).render_text(10);
        let pages: Vec<&str> = text.split('\u{c}').collect();
        // 2 stock headings + 30 rows + blank + 2 history headings = 35 body lines
        assert_eq!(pages.len(), 4);
        for (index, page) in pages.iter().enumerate() {
            assert!(page.starts_with("Stock\n"));
            assert!(page.trim_end().ends_with(&format!("Page {}", index + 1)));
        }
    }

    #[test]
    fn zero_lines_per_page_still_renders() {
        let text = report(vec![row("ONU", 1, true)], vec![]).render_text(0);
        assert!(text.contains("ONU"));
        assert!(text.contains("LOW"));
    }

    #[test]
    fn stock_csv_has_header_and_status() {
        let mut output = Vec::new();
        report(vec![row("ONU", 3, true), row("Crimper", 9, false)], vec![])
            .write_stock_csv(&mut output)
            .unwrap();
        let csv = String::from_utf8(output).unwrap();
        assert!(csv.starts_with("product,category,quantity,status\n"));
        assert!(csv.contains("ONU,Ferramentas,3,LOW\n"));
        assert!(csv.contains("Crimper,Ferramentas,9,Normal\n"));
    }
}
