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

//! # Field Stock
//!
//! This library tracks equipment stock for a field-service company: units held
//! centrally by the company and units held by each technician, and the movements
//! (withdrawals, returns, write-offs) between them.
//!
//! ## Core Components
//!
//! - [`Inventory`]: Catalog, stock rows, movement history and batches
//! - [`Balances`]: The balance-transfer rule for one (technician, equipment) pair
//! - [`Batch`]: A group of movements committed all-or-nothing
//! - [`StockReport`]: Stock position and recent history for printing
//! - [`InventoryError`]: Reasons an operation is rejected
//!
//! ## Example
//!
//! ```
//! use field_stock_rs::{Category, Inventory, MovementKind, MovementRequest, NewEquipment};
//!
//! let inventory = Inventory::new();
//! let technician = inventory.register_user("joao");
//! let operator = inventory.register_user("secretaria");
//! let splicer = inventory
//!     .register_equipment(NewEquipment::new("Fiber Splicer", Category::Fiber, 10))
//!     .unwrap();
//!
//! // Withdraw 3 units to the technician
//! let withdraw = MovementRequest {
//!     technician,
//!     equipment: splicer,
//!     kind: MovementKind::Withdraw,
//!     quantity: 3,
//!     note: None,
//! };
//! inventory.record_movement(withdraw, operator).unwrap();
//!
//! assert_eq!(inventory.equipment(splicer).unwrap().quantity, 7);
//! assert_eq!(inventory.wallet_balance(technician, splicer).unwrap(), 3);
//! ```
//!
//! ## Thread Safety
//!
//! Each equipment type has its own lock, so movements of different equipment run in
//! parallel. Batch commits lock every equipment they touch in a fixed order, which
//! makes them atomic with respect to concurrent movements and other batches.

mod balance;
mod base;
pub mod batch;
pub mod config;
mod equipment;
pub mod error;
mod inventory;
pub mod logging;
mod movement;
mod movement_log;
pub mod report;
mod stock;

pub use balance::{BalanceViolation, Balances};
pub use base::{BatchId, EquipmentId, MovementId, UserId};
pub use batch::{Batch, BatchLine, BatchStatus, CommitOutcome, NewBatch};
pub use config::Settings;
pub use equipment::{Category, Equipment, NewEquipment};
pub use error::{ConfigError, InventoryError, UnknownCategory, UnknownMovementKind};
pub use inventory::Inventory;
pub use movement::{Movement, MovementFilter, MovementKind, MovementRequest};
pub use report::StockReport;
pub use stock::{EquipmentStock, Wallet};
