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

use clap::{Parser, ValueEnum};
use csv::{ReaderBuilder, Trim};
use field_stock_rs::config::Settings;
use field_stock_rs::{
    BatchId, BatchLine, Category, Inventory, MovementKind, MovementRequest, NewBatch,
    NewEquipment, StockReport, UserId, logging,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{info, warn};

/// Field Stock - Replay stock movements and print the stock report
///
/// Loads the equipment catalog, applies the movements file in order and writes the
/// stock report to stdout.
#[derive(Parser, Debug)]
#[command(name = "field-stock")]
#[command(about = "Tracks equipment held by the company and by field technicians", long_about = None)]
struct Args {
    /// CSV file with the equipment catalog
    ///
    /// Expected format: name,category,quantity,minimum
    #[arg(long, value_name = "FILE")]
    catalog: PathBuf,

    /// CSV file with movements to apply
    ///
    /// Expected format: type,technician,equipment,quantity,note,batch
    #[arg(value_name = "FILE")]
    movements: PathBuf,

    /// TOML settings file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Username recorded as the author of every movement
    #[arg(long, default_value = "operator")]
    actor: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Paginated text report
    Text,
    /// Stock position as CSV
    Csv,
}

fn main() {
    let args = Args::parse();

    let settings = match Settings::load_or_default(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            process::exit(1);
        }
    };
    logging::init(&settings.logging);

    let inventory = Inventory::new();
    let actor = inventory.register_user(&args.actor);

    let catalog = open(&args.catalog);
    if let Err(e) = load_catalog(&inventory, catalog, settings.equipment.default_minimum) {
        eprintln!("Error reading catalog: {}", e);
        process::exit(1);
    }

    let movements = open(&args.movements);
    if let Err(e) = process_movements(&inventory, movements, actor) {
        eprintln!("Error processing movements: {}", e);
        process::exit(1);
    }

    let report = StockReport::capture(
        &inventory,
        settings.report.title.clone(),
        settings.report.recent_movements,
    );
    let result: Result<(), Box<dyn std::error::Error>> = match args.format {
        OutputFormat::Text => write_text(&report, settings.report.lines_per_page, std::io::stdout()),
        OutputFormat::Csv => report.write_stock_csv(std::io::stdout()).map_err(Into::into),
    };
    if let Err(e) = result {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

fn open(path: &Path) -> BufReader<File> {
    match File::open(path) {
        Ok(f) => BufReader::new(f),
        Err(e) => {
            eprintln!("Error opening file '{}': {}", path.display(), e);
            process::exit(1);
        }
    }
}

fn write_text<W: Write>(
    report: &StockReport,
    lines_per_page: usize,
    mut writer: W,
) -> Result<(), Box<dyn std::error::Error>> {
    report.write_text(lines_per_page, &mut writer)?;
    Ok(())
}

fn reader<R: Read>(source: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .trim(Trim::All) // Handle whitespace in fields like " withdraw "
        .flexible(true) // Allow trailing optional columns to be missing
        .has_headers(true)
        .from_reader(source)
}

/// Raw catalog record.
///
/// Fields: `name, category, quantity, minimum`
#[derive(Debug, Deserialize)]
struct CatalogRecord {
    name: String,
    category: String,
    #[serde(default)]
    quantity: u32,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    minimum: Option<u32>,
}

/// Registers every valid catalog row. Malformed rows are skipped with a warning.
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
pub fn load_catalog<R: Read>(
    inventory: &Inventory,
    source: R,
    default_minimum: u32,
) -> Result<usize, csv::Error> {
    let mut rdr = reader(source);
    let mut loaded = 0;

    for (index, result) in rdr.deserialize::<CatalogRecord>().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(row = index + 1, error = %e, "skipping malformed catalog row");
                continue;
            }
        };
        let category: Category = match record.category.parse() {
            Ok(category) => category,
            Err(e) => {
                warn!(row = index + 1, error = %e, "skipping catalog row");
                continue;
            }
        };
        let new = NewEquipment::new(record.name, category, record.quantity)
            .with_minimum(record.minimum.unwrap_or(default_minimum));
        match inventory.register_equipment(new) {
            Ok(_) => loaded += 1,
            Err(e) => warn!(row = index + 1, error = %e, "skipping catalog row"),
        }
    }

    info!(equipment = loaded, "catalog loaded");
    Ok(loaded)
}

/// Raw movement record.
///
/// Fields: `type, technician, equipment, quantity, note, batch`
#[derive(Debug, Deserialize)]
struct MovementRecord {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    technician: String,
    #[serde(default)]
    equipment: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    quantity: Option<u32>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    batch: Option<String>,
}

/// One line of the movements file after interpretation.
#[derive(Debug)]
enum Operation {
    Move {
        technician: String,
        equipment: String,
        kind: MovementKind,
        quantity: u32,
        note: Option<String>,
        batch: Option<String>,
    },
    Commit {
        batch: String,
    },
}

impl MovementRecord {
    /// Returns `None` for unknown types or missing required fields.
    fn into_operation(self) -> Option<Operation> {
        let note = self.note.filter(|n| !n.is_empty());
        let batch = self.batch.filter(|b| !b.is_empty());

        if self.kind.eq_ignore_ascii_case("commit") {
            return batch.map(|batch| Operation::Commit { batch });
        }

        let kind: MovementKind = self.kind.parse().ok()?;
        if self.technician.is_empty() || self.equipment.is_empty() {
            return None;
        }
        Some(Operation::Move {
            technician: self.technician,
            equipment: self.equipment,
            kind,
            quantity: self.quantity?,
            note,
            batch,
        })
    }
}

/// Applies every row of a movements file.
///
/// Rows without a batch label are recorded immediately. Rows with a label are staged
/// into that batch, which is opened with the technician, kind and note of its first
/// row; a `commit` row commits it. Rejected rows are logged and skipped.
///
/// # Example
///
/// ```csv
/// type,technician,equipment,quantity,note,batch
/// withdraw,joao,Fiber Splicer,3,,
/// withdraw,maria,ONU,2,OS 1234,b1
/// withdraw,maria,Drop Cable,5,,b1
/// commit,,,,,b1
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
pub fn process_movements<R: Read>(
    inventory: &Inventory,
    source: R,
    actor: UserId,
) -> Result<(), csv::Error> {
    let mut rdr = reader(source);
    let mut staged: HashMap<String, BatchId> = HashMap::new();

    for (index, result) in rdr.deserialize::<MovementRecord>().enumerate() {
        let row = index + 1;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(row, error = %e, "skipping malformed row");
                continue;
            }
        };
        let Some(operation) = record.into_operation() else {
            warn!(row, "skipping invalid movement record");
            continue;
        };

        match operation {
            Operation::Commit { batch } => {
                let Some(id) = staged.get(&batch).copied() else {
                    warn!(row, batch = %batch, "commit for unknown batch");
                    continue;
                };
                match inventory.commit_batch(id, actor) {
                    Ok(outcome) => info!(row, batch = %batch, "{}", outcome),
                    Err(e) => warn!(row, batch = %batch, error = %e, "batch not committed"),
                }
            }
            Operation::Move {
                technician,
                equipment,
                kind,
                quantity,
                note,
                batch,
            } => {
                let Some(equipment) = inventory.find_equipment(&equipment) else {
                    warn!(row, equipment = %equipment, "unknown equipment");
                    continue;
                };
                let technician = inventory.register_user(&technician);

                let Some(label) = batch else {
                    let request = MovementRequest {
                        technician,
                        equipment,
                        kind,
                        quantity,
                        note,
                    };
                    if let Err(e) = inventory.record_movement(request, actor) {
                        warn!(row, error = %e, "skipping movement");
                    }
                    continue;
                };

                let line = BatchLine {
                    equipment,
                    quantity,
                };
                let staged_line = match staged.get(&label).copied() {
                    Some(id) => inventory.add_batch_line_for(id, technician, kind, line),
                    None => inventory
                        .open_batch(NewBatch {
                            technician,
                            kind,
                            note,
                            lines: vec![line],
                        })
                        .map(|id| {
                            staged.insert(label.clone(), id);
                        }),
                };
                if let Err(e) = staged_line {
                    warn!(row, batch = %label, error = %e, "skipping batch line");
                }
            }
        }
    }

    for (label, id) in &staged {
        if inventory.batch(*id).is_some_and(|batch| !batch.committed) {
            warn!(batch = %label, "batch left uncommitted");
        }
    }

    Ok(())
}
