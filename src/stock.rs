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

//! Per-equipment stock rows.
//!
//! One [`EquipmentStock`] holds everything a movement of that equipment touches:
//! the company's on-hand quantity and every technician wallet for it. A single
//! mutex guards the lot, so a movement changes its two counters atomically.
//!
//! # Example
//!
//! ```
//! use field_stock_rs::{Category, EquipmentId, EquipmentStock, NewEquipment};
//!
//! let stock = EquipmentStock::new(
//!     EquipmentId(1),
//!     NewEquipment::new("Fiber Splicer", Category::Fiber, 10),
//! );
//! assert_eq!(stock.snapshot().quantity, 10);
//! assert_eq!(stock.wallet(field_stock_rs::UserId(1)), None);
//! ```

use crate::balance::{BalanceViolation, Balances};
use crate::base::{EquipmentId, UserId};
use crate::equipment::{Equipment, NewEquipment};
use crate::error::InventoryError;
use crate::movement::MovementKind;
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Company stock plus technician wallets for one equipment type.
#[derive(Debug, Clone)]
pub(crate) struct StockData {
    pub(crate) equipment: Equipment,
    /// Wallets indexed by technician, created lazily at zero.
    wallets: HashMap<UserId, u32>,
}

impl StockData {
    fn new(equipment: Equipment) -> Self {
        Self {
            equipment,
            wallets: HashMap::new(),
        }
    }

    pub(crate) fn id(&self) -> EquipmentId {
        self.equipment.id
    }

    pub(crate) fn name(&self) -> &str {
        &self.equipment.name
    }

    fn balances(&self, technician: UserId) -> Balances {
        Balances::new(
            self.equipment.quantity,
            self.wallets.get(&technician).copied().unwrap_or(0),
        )
    }

    /// Fetches or creates the technician's wallet.
    fn open_wallet(&mut self, technician: UserId) -> &mut u32 {
        self.wallets.entry(technician).or_insert(0)
    }

    /// Checks a movement against the current counters without changing them.
    pub(crate) fn validate(
        &self,
        technician: UserId,
        kind: MovementKind,
        quantity: u32,
    ) -> Result<(), InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::InvalidQuantity);
        }
        self.balances(technician)
            .check(kind, quantity)
            .map_err(|violation| self.rejection(technician, violation))
    }

    /// Validates and applies a movement. The wallet exists afterwards even when the
    /// movement is rejected.
    pub(crate) fn apply(
        &mut self,
        technician: UserId,
        kind: MovementKind,
        quantity: u32,
    ) -> Result<(), InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::InvalidQuantity);
        }
        self.open_wallet(technician);

        let mut balances = self.balances(technician);
        balances
            .apply(kind, quantity)
            .map_err(|violation| self.rejection(technician, violation))?;

        self.equipment.quantity = balances.company;
        *self.open_wallet(technician) = balances.wallet;
        Ok(())
    }

    fn receive(&mut self, quantity: u32) -> Result<(), InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::InvalidQuantity);
        }
        self.equipment.quantity = self.equipment.quantity.checked_add(quantity).ok_or_else(|| {
            InventoryError::QuantityOverflow {
                equipment: self.equipment.name.clone(),
            }
        })?;
        Ok(())
    }

    fn rejection(&self, technician: UserId, violation: BalanceViolation) -> InventoryError {
        let equipment = self.equipment.name.clone();
        match violation {
            BalanceViolation::CompanyStock {
                available,
                requested,
            } => InventoryError::InsufficientCompanyStock {
                equipment,
                available,
                requested,
            },
            BalanceViolation::TechnicianBalance {
                available,
                requested,
            } => InventoryError::InsufficientTechnicianBalance {
                technician,
                equipment,
                available,
                requested,
            },
            BalanceViolation::Overflow => InventoryError::QuantityOverflow { equipment },
        }
    }
}

/// One technician's holding of one equipment type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub technician: UserId,
    pub equipment: EquipmentId,
    pub equipment_name: String,
    pub quantity: u32,
}

impl Wallet {
    /// The technician still owes units of this equipment.
    pub fn is_pending(&self) -> bool {
        self.quantity > 0
    }
}

/// Lock-guarded stock row for one equipment type.
#[derive(Debug)]
pub struct EquipmentStock {
    inner: Mutex<StockData>,
}

impl EquipmentStock {
    pub fn new(id: EquipmentId, new: NewEquipment) -> Self {
        Self {
            inner: Mutex::new(StockData::new(Equipment::from_new(id, new))),
        }
    }

    pub fn id(&self) -> EquipmentId {
        self.inner.lock().id()
    }

    /// Catalog record with the current company quantity.
    pub fn snapshot(&self) -> Equipment {
        self.inner.lock().equipment.clone()
    }

    /// Quantity held by a technician, or `None` if no wallet was ever opened.
    pub fn wallet(&self, technician: UserId) -> Option<u32> {
        self.inner.lock().wallets.get(&technician).copied()
    }

    /// All wallets for this equipment, ordered by technician.
    pub fn wallets(&self) -> Vec<Wallet> {
        let data = self.inner.lock();
        let mut wallets: Vec<Wallet> = data
            .wallets
            .iter()
            .map(|(technician, quantity)| Wallet {
                technician: *technician,
                equipment: data.equipment.id,
                equipment_name: data.equipment.name.clone(),
                quantity: *quantity,
            })
            .collect();
        wallets.sort_by_key(|wallet| wallet.technician);
        wallets
    }

    /// Adds units to company stock (a delivery from a supplier).
    pub fn receive(&self, quantity: u32) -> Result<(), InventoryError> {
        self.inner.lock().receive(quantity)
    }

    pub fn set_minimum(&self, minimum: u32) {
        self.inner.lock().equipment.minimum = minimum;
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, StockData> {
        self.inner.lock()
    }
}
