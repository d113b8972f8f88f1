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

//! Inventory service.
//!
//! The [`Inventory`] owns the equipment catalog, the per-equipment stock rows, the
//! movement history, the batches and a roster of user names. Every operation that
//! records something takes the acting user explicitly.
//!
//! # Movements
//!
//! - **Withdraw**: company stock -> technician wallet (fails if the company is short).
//! - **Return**: technician wallet -> company stock (fails if the technician is short).
//! - **Write-off**: removes units from the technician wallet (fails if short).
//!
//! # Batches
//!
//! A batch groups lines for one technician and one movement kind. Committing it
//! simulates every line, cumulatively, against the current balances and applies all
//! of them only when none fails.
//!
//! # Thread Safety
//!
//! Stock rows live in a [`DashMap`] behind `Arc`s and each row has its own mutex.
//! A batch commit locks the batch, then every row it touches in ascending
//! [`EquipmentId`] order, and holds them across simulation and commit. Row handles
//! are always cloned out of the map before any row is locked.

use crate::base::{BatchId, EquipmentId, MovementId, UserId};
use crate::batch::{Batch, BatchLine, CommitOutcome, NewBatch};
use crate::equipment::{Equipment, NewEquipment};
use crate::error::InventoryError;
use crate::movement::{Movement, MovementFilter, MovementKind, MovementRequest};
use crate::movement_log::MovementLog;
use crate::stock::{EquipmentStock, StockData, Wallet};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, info, warn};

/// Equipment stock ledger shared by operators and technicians.
///
/// # Invariants
///
/// - Company and wallet quantities never go negative.
/// - At most one wallet exists per (technician, equipment) pair.
/// - A movement's balance effects are applied exactly once, before it is logged.
/// - A batch is applied entirely or not at all, and at most once.
pub struct Inventory {
    users: DashMap<UserId, String>,
    user_ids: DashMap<String, UserId>,
    next_user: AtomicU32,
    /// Stock rows indexed by equipment id.
    equipment: DashMap<EquipmentId, Arc<EquipmentStock>>,
    /// Equipment names are unique.
    equipment_ids: DashMap<String, EquipmentId>,
    next_equipment: AtomicU32,
    movements: MovementLog,
    batches: DashMap<BatchId, Arc<Mutex<Batch>>>,
    next_batch: AtomicU32,
}

impl Inventory {
    /// Creates an empty inventory.
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            user_ids: DashMap::new(),
            next_user: AtomicU32::new(1),
            equipment: DashMap::new(),
            equipment_ids: DashMap::new(),
            next_equipment: AtomicU32::new(1),
            movements: MovementLog::new(),
            batches: DashMap::new(),
            next_batch: AtomicU32::new(1),
        }
    }

    // === Users ===

    /// Returns the id for `username`, registering it on first use.
    pub fn register_user(&self, username: &str) -> UserId {
        let username = username.trim().to_string();
        match self.user_ids.entry(username.clone()) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let id = UserId(self.next_user.fetch_add(1, Ordering::SeqCst));
                self.users.insert(id, username);
                entry.insert(id);
                id
            }
        }
    }

    pub fn username(&self, id: UserId) -> Option<String> {
        self.users.get(&id).map(|name| name.value().clone())
    }

    /// Username, or `#<id>` for identities the roster does not know.
    pub fn display_name(&self, id: UserId) -> String {
        self.username(id).unwrap_or_else(|| id.to_string())
    }

    pub fn find_user(&self, username: &str) -> Option<UserId> {
        self.user_ids.get(username.trim()).map(|id| *id.value())
    }

    /// All known users, ordered by id.
    pub fn users(&self) -> Vec<(UserId, String)> {
        let mut users: Vec<(UserId, String)> = self
            .users
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        users.sort_by_key(|(id, _)| *id);
        users
    }

    // === Equipment ===

    /// Adds an equipment type to the catalog.
    ///
    /// # Errors
    ///
    /// - [`InventoryError::DuplicateEquipment`] - Another equipment has the same name.
    pub fn register_equipment(&self, mut new: NewEquipment) -> Result<EquipmentId, InventoryError> {
        new.name = new.name.trim().to_string();
        match self.equipment_ids.entry(new.name.clone()) {
            Entry::Occupied(_) => Err(InventoryError::DuplicateEquipment(new.name)),
            Entry::Vacant(entry) => {
                let id = EquipmentId(self.next_equipment.fetch_add(1, Ordering::SeqCst));
                debug!(equipment = %id, name = %new.name, quantity = new.quantity, "equipment registered");
                self.equipment
                    .insert(id, Arc::new(EquipmentStock::new(id, new)));
                entry.insert(id);
                Ok(id)
            }
        }
    }

    /// Clones the row handle out of the map so no shard lock outlives this call.
    fn stock(&self, id: EquipmentId) -> Result<Arc<EquipmentStock>, InventoryError> {
        self.equipment
            .get(&id)
            .map(|stock| Arc::clone(stock.value()))
            .ok_or(InventoryError::EquipmentNotFound(id))
    }

    fn all_stock(&self) -> Vec<Arc<EquipmentStock>> {
        self.equipment
            .iter()
            .map(|stock| Arc::clone(stock.value()))
            .collect()
    }

    pub fn equipment(&self, id: EquipmentId) -> Result<Equipment, InventoryError> {
        Ok(self.stock(id)?.snapshot())
    }

    pub fn find_equipment(&self, name: &str) -> Option<EquipmentId> {
        self.equipment_ids.get(name.trim()).map(|id| *id.value())
    }

    /// Snapshot of the whole catalog, ordered by name.
    pub fn equipment_list(&self) -> Vec<Equipment> {
        let mut list: Vec<Equipment> = self
            .all_stock()
            .iter()
            .map(|stock| stock.snapshot())
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        list
    }

    /// Equipment at or below its minimum threshold, ordered by name.
    pub fn low_stock(&self) -> Vec<Equipment> {
        self.equipment_list()
            .into_iter()
            .filter(Equipment::is_low_stock)
            .collect()
    }

    /// Adds delivered units to company stock.
    pub fn receive_stock(
        &self,
        id: EquipmentId,
        quantity: u32,
    ) -> Result<Equipment, InventoryError> {
        let stock = self.stock(id)?;
        stock.receive(quantity)?;
        info!(equipment = %id, quantity, "stock received");
        Ok(stock.snapshot())
    }

    pub fn set_minimum(&self, id: EquipmentId, minimum: u32) -> Result<(), InventoryError> {
        self.stock(id)?.set_minimum(minimum);
        Ok(())
    }

    // === Wallets ===

    /// Units of `equipment` held by `technician`; zero if no wallet exists yet.
    pub fn wallet_balance(
        &self,
        technician: UserId,
        equipment: EquipmentId,
    ) -> Result<u32, InventoryError> {
        Ok(self.stock(equipment)?.wallet(technician).unwrap_or(0))
    }

    /// Every wallet, ordered by technician then equipment.
    pub fn wallets(&self) -> Vec<Wallet> {
        let mut wallets: Vec<Wallet> = self
            .all_stock()
            .iter()
            .flat_map(|stock| stock.wallets())
            .collect();
        wallets.sort_by_key(|wallet| (wallet.technician, wallet.equipment));
        wallets
    }

    pub fn wallets_for(&self, technician: UserId) -> Vec<Wallet> {
        self.wallets()
            .into_iter()
            .filter(|wallet| wallet.technician == technician)
            .collect()
    }

    /// Wallets whose technician still holds units.
    pub fn pending_wallets(&self) -> Vec<Wallet> {
        self.wallets()
            .into_iter()
            .filter(Wallet::is_pending)
            .collect()
    }

    // === Movements ===

    /// Checks a movement against the current balances without recording it.
    pub fn validate_movement(&self, request: &MovementRequest) -> Result<(), InventoryError> {
        let stock = self.stock(request.equipment)?;
        let data = stock.lock();
        data.validate(request.technician, request.kind, request.quantity)
    }

    /// Applies a movement and appends it to the history.
    ///
    /// # Errors
    ///
    /// - [`InventoryError::InvalidQuantity`] - Quantity is zero.
    /// - [`InventoryError::EquipmentNotFound`] - Unknown equipment.
    /// - [`InventoryError::InsufficientCompanyStock`] - Withdrawal exceeds company stock.
    /// - [`InventoryError::InsufficientTechnicianBalance`] - Return or write-off exceeds
    ///   the technician's wallet.
    pub fn record_movement(
        &self,
        request: MovementRequest,
        recorded_by: UserId,
    ) -> Result<Movement, InventoryError> {
        let stock = self.stock(request.equipment)?;
        let mut data = stock.lock();

        if let Err(error) = data.apply(request.technician, request.kind, request.quantity) {
            warn!(
                technician = %request.technician,
                equipment = %request.equipment,
                kind = %request.kind,
                quantity = request.quantity,
                %error,
                "movement rejected"
            );
            return Err(error);
        }

        // Logged while the row is still locked so history order matches balance order.
        let movement = self.movements.append(request, recorded_by, None);
        info!(
            movement = %movement.id,
            technician = %movement.technician,
            equipment = %movement.equipment,
            kind = %movement.kind,
            quantity = movement.quantity,
            "movement recorded"
        );
        Ok(movement)
    }

    pub fn movement(&self, id: MovementId) -> Option<Movement> {
        self.movements.get(id)
    }

    pub fn movement_count(&self) -> usize {
        self.movements.len()
    }

    /// Every movement, oldest first.
    pub fn movements(&self) -> Vec<Movement> {
        self.movements.all()
    }

    /// The `limit` newest movements, newest first.
    pub fn recent_movements(&self, limit: usize) -> Vec<Movement> {
        self.movements.recent(limit)
    }

    /// Movements matching `filter`, newest first.
    pub fn search_movements(&self, filter: &MovementFilter) -> Vec<Movement> {
        self.movements.search(filter)
    }

    // === Batches ===

    /// Opens a draft batch.
    ///
    /// # Errors
    ///
    /// - [`InventoryError::InvalidQuantity`] - A line has a zero quantity.
    /// - [`InventoryError::EquipmentNotFound`] - A line references unknown equipment.
    pub fn open_batch(&self, new: NewBatch) -> Result<BatchId, InventoryError> {
        for line in &new.lines {
            self.stock(line.equipment)?;
        }
        let id = BatchId(self.next_batch.fetch_add(1, Ordering::SeqCst));
        let batch = Batch::open(id, new)?;
        debug!(batch = %id, technician = %batch.technician, kind = %batch.kind, lines = batch.lines.len(), "batch opened");
        self.batches.insert(id, Arc::new(Mutex::new(batch)));
        Ok(id)
    }

    /// Appends a line to a draft batch.
    pub fn add_batch_line(&self, id: BatchId, line: BatchLine) -> Result<(), InventoryError> {
        self.stock(line.equipment)?;
        self.batch_handle(id)?.lock().add_line(line)
    }

    /// Appends a line to a draft batch opened for `technician` and `kind`.
    ///
    /// # Errors
    ///
    /// - [`InventoryError::BatchMismatch`] - The batch belongs to another technician
    ///   or movement kind.
    pub fn add_batch_line_for(
        &self,
        id: BatchId,
        technician: UserId,
        kind: MovementKind,
        line: BatchLine,
    ) -> Result<(), InventoryError> {
        self.stock(line.equipment)?;
        let handle = self.batch_handle(id)?;
        let mut batch = handle.lock();
        if batch.technician != technician || batch.kind != kind {
            return Err(InventoryError::BatchMismatch {
                batch: id,
                expected_technician: batch.technician,
                expected_kind: batch.kind,
                technician,
                kind,
            });
        }
        batch.add_line(line)
    }

    pub fn batch(&self, id: BatchId) -> Option<Batch> {
        self.batch_handle(id).ok().map(|batch| batch.lock().clone())
    }

    /// Every batch, ordered by id.
    pub fn batches(&self) -> Vec<Batch> {
        let handles: Vec<Arc<Mutex<Batch>>> = self
            .batches
            .iter()
            .map(|batch| Arc::clone(batch.value()))
            .collect();
        let mut batches: Vec<Batch> = handles.iter().map(|batch| batch.lock().clone()).collect();
        batches.sort_by_key(|batch| batch.id);
        batches
    }

    fn batch_handle(&self, id: BatchId) -> Result<Arc<Mutex<Batch>>, InventoryError> {
        self.batches
            .get(&id)
            .map(|batch| Arc::clone(batch.value()))
            .ok_or(InventoryError::BatchNotFound(id))
    }

    /// Commits a batch all-or-nothing.
    ///
    /// Every line is simulated in order against a working copy of the current
    /// balances, so later lines see the effect of earlier ones. If any line fails
    /// nothing is applied and the batch stays a draft. Otherwise the working copy
    /// replaces the live balances, one movement per line is recorded (carrying the
    /// batch id and note) and the batch is marked committed.
    ///
    /// Committing an already committed batch returns
    /// [`CommitOutcome::AlreadyCommitted`] and changes nothing.
    ///
    /// # Errors
    ///
    /// - [`InventoryError::BatchNotFound`] - Unknown batch.
    /// - [`InventoryError::EmptyBatch`] - The batch has no lines.
    /// - [`InventoryError::BatchRejected`] - A line failed; wraps the line's error.
    pub fn commit_batch(
        &self,
        id: BatchId,
        recorded_by: UserId,
    ) -> Result<CommitOutcome, InventoryError> {
        let handle = self.batch_handle(id)?;
        let mut batch = handle.lock();

        if batch.committed {
            info!(batch = %id, "batch already committed");
            return Ok(CommitOutcome::AlreadyCommitted);
        }
        if batch.lines.is_empty() {
            return Err(InventoryError::EmptyBatch(id));
        }

        let equipment_ids = batch.equipment_ids();
        let rows = equipment_ids
            .iter()
            .map(|equipment| self.stock(*equipment))
            .collect::<Result<Vec<_>, _>>()?;

        // Ascending id order; every multi-row lock in the crate follows it.
        let mut guards: Vec<MutexGuard<'_, StockData>> = rows.iter().map(|row| row.lock()).collect();

        // Phase 1: simulate on working copies.
        let mut working: Vec<StockData> = guards.iter().map(|guard| (**guard).clone()).collect();
        for (index, line) in batch.lines.iter().enumerate() {
            let slot = equipment_ids
                .binary_search(&line.equipment)
                .map_err(|_| InventoryError::EquipmentNotFound(line.equipment))?;
            let row = &mut working[slot];
            let simulated = row
                .validate(batch.technician, batch.kind, line.quantity)
                .and_then(|()| row.apply(batch.technician, batch.kind, line.quantity));

            if let Err(source) = simulated {
                let error = InventoryError::BatchRejected {
                    batch: id,
                    line: index + 1,
                    equipment: row.name().to_string(),
                    source: Box::new(source),
                };
                warn!(batch = %id, line = index + 1, %error, "batch rejected");
                return Err(error);
            }
        }

        // Phase 2: publish balances and record movements.
        for (guard, data) in guards.iter_mut().zip(working) {
            **guard = data;
        }
        for line in &batch.lines {
            let request = MovementRequest {
                technician: batch.technician,
                equipment: line.equipment,
                kind: batch.kind,
                quantity: line.quantity,
                note: batch.note.clone(),
            };
            self.movements.append(request, recorded_by, Some(id));
        }
        drop(guards);

        batch.mark_committed();
        let movements = batch.lines.len();
        info!(batch = %id, technician = %batch.technician, kind = %batch.kind, movements, "batch committed");
        Ok(CommitOutcome::Committed { movements })
    }

    /// Opens a batch and commits it in one call.
    pub fn submit_batch(
        &self,
        new: NewBatch,
        recorded_by: UserId,
    ) -> Result<(BatchId, CommitOutcome), InventoryError> {
        let id = self.open_batch(new)?;
        let outcome = self.commit_batch(id, recorded_by)?;
        Ok((id, outcome))
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equipment::Category;
    use crate::movement::MovementKind;

    fn setup() -> (Inventory, UserId, UserId, EquipmentId) {
        let inventory = Inventory::new();
        let technician = inventory.register_user("joao");
        let operator = inventory.register_user("secretaria");
        let splicer = inventory
            .register_equipment(NewEquipment::new("Fiber Splicer", Category::Fiber, 10))
            .unwrap();
        (inventory, technician, operator, splicer)
    }

    #[test]
    fn register_user_is_idempotent() {
        let inventory = Inventory::new();
        let first = inventory.register_user("maria");
        let again = inventory.register_user(" maria ");
        assert_eq!(first, again);
        assert_eq!(inventory.users().len(), 1);
        assert_eq!(inventory.display_name(first), "maria");
        assert_eq!(inventory.display_name(UserId(99)), "#99");
    }

    #[test]
    fn duplicate_equipment_names_are_rejected() {
        let (inventory, _, _, _) = setup();
        let result =
            inventory.register_equipment(NewEquipment::new("Fiber Splicer", Category::Tool, 1));
        assert_eq!(
            result,
            Err(InventoryError::DuplicateEquipment("Fiber Splicer".to_string()))
        );
    }

    #[test]
    fn rejected_movement_is_not_logged() {
        let (inventory, technician, operator, splicer) = setup();
        let result = inventory.record_movement(
            MovementRequest {
                technician,
                equipment: splicer,
                kind: MovementKind::Withdraw,
                quantity: 11,
                note: None,
            },
            operator,
        );
        assert!(matches!(
            result,
            Err(InventoryError::InsufficientCompanyStock { .. })
        ));
        assert_eq!(inventory.movement_count(), 0);
        assert_eq!(inventory.equipment(splicer).unwrap().quantity, 10);
    }

    #[test]
    fn rejected_batch_leaves_no_wallet_behind() {
        let (inventory, technician, operator, splicer) = setup();
        let batch = inventory
            .open_batch(NewBatch {
                technician,
                kind: MovementKind::Return,
                note: None,
                lines: vec![BatchLine {
                    equipment: splicer,
                    quantity: 1,
                }],
            })
            .unwrap();
        assert!(inventory.commit_batch(batch, operator).is_err());
        assert!(inventory.wallets().is_empty());
    }

    #[test]
    fn committed_batch_movements_carry_batch_and_note() {
        let (inventory, technician, operator, splicer) = setup();
        let (batch, outcome) = inventory
            .submit_batch(
                NewBatch {
                    technician,
                    kind: MovementKind::Withdraw,
                    note: Some("OS 77".to_string()),
                    lines: vec![BatchLine {
                        equipment: splicer,
                        quantity: 2,
                    }],
                },
                operator,
            )
            .unwrap();
        assert_eq!(outcome, CommitOutcome::Committed { movements: 1 });

        let movement = inventory.movement(MovementId(1)).unwrap();
        assert_eq!(movement.batch, Some(batch));
        assert_eq!(movement.note.as_deref(), Some("OS 77"));
        assert_eq!(movement.recorded_by, operator);
    }
}
