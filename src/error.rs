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

//! Error types for inventory operations and configuration loading.

use crate::base::{BatchId, EquipmentId, UserId};
use crate::movement::MovementKind;
use std::path::PathBuf;
use thiserror::Error;

/// Inventory operation errors.
///
/// Every variant is a rejected business operation: the inventory is left exactly
/// as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// Quantity is zero
    #[error("invalid quantity (must be positive)")]
    InvalidQuantity,

    /// Withdrawal would take more than the company holds
    #[error(
        "insufficient company stock of {equipment}: only {available} on hand, {requested} requested"
    )]
    InsufficientCompanyStock {
        equipment: String,
        available: u32,
        requested: u32,
    },

    /// Return or write-off would take more than the technician holds
    #[error("technician {technician} holds only {available} of {equipment}, {requested} requested")]
    InsufficientTechnicianBalance {
        technician: UserId,
        equipment: String,
        available: u32,
        requested: u32,
    },

    /// A counter would exceed `u32::MAX`
    #[error("quantity overflow for {equipment}")]
    QuantityOverflow { equipment: String },

    /// Referenced equipment does not exist
    #[error("equipment {0} not found")]
    EquipmentNotFound(EquipmentId),

    /// Equipment names are unique in the catalog
    #[error("equipment named '{0}' already exists")]
    DuplicateEquipment(String),

    /// Referenced batch does not exist
    #[error("batch {0} not found")]
    BatchNotFound(BatchId),

    /// Lines cannot be added to a committed batch
    #[error("batch {0} is already committed and cannot be changed")]
    BatchLocked(BatchId),

    /// Batch has nothing to commit
    #[error("batch {0} has no lines")]
    EmptyBatch(BatchId),

    /// A staged line belongs to another technician or movement kind
    #[error("batch {batch} is a {expected_kind} for technician {expected_technician}, not a {kind} for {technician}")]
    BatchMismatch {
        batch: BatchId,
        expected_technician: UserId,
        expected_kind: MovementKind,
        technician: UserId,
        kind: MovementKind,
    },

    /// One line of the batch failed simulation; nothing was applied
    #[error("batch {batch} rejected at line {line} ({equipment}): {source}")]
    BatchRejected {
        batch: BatchId,
        line: usize,
        equipment: String,
        source: Box<InventoryError>,
    },
}

/// Error returned when parsing an unknown movement kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown movement kind '{0}'")]
pub struct UnknownMovementKind(pub String);

/// Error returned when parsing an unknown equipment category.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown equipment category '{0}'")]
pub struct UnknownCategory(pub String);

/// Errors raised while loading settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
