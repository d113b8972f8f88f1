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

//! Append-only movement history.
//!
//! Assigns movement ids in insertion order, so the id order is also the order in
//! which balance effects were applied.

use crate::base::{BatchId, MovementId, UserId};
use crate::movement::{Movement, MovementFilter, MovementRequest};
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;

/// Thread-safe, append-only log of recorded movements.
#[derive(Debug, Default)]
pub(crate) struct MovementLog {
    /// Movement `n` lives at index `n - 1`.
    movements: RwLock<Vec<Arc<Movement>>>,
}

impl MovementLog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records a movement whose balance effects have already been applied.
    pub(crate) fn append(
        &self,
        request: MovementRequest,
        recorded_by: UserId,
        batch: Option<BatchId>,
    ) -> Movement {
        let mut movements = self.movements.write();
        let movement = Movement {
            id: MovementId(movements.len() as u64 + 1),
            technician: request.technician,
            equipment: request.equipment,
            kind: request.kind,
            quantity: request.quantity,
            note: request.note,
            created_at: Utc::now(),
            recorded_by,
            batch,
        };
        movements.push(Arc::new(movement.clone()));
        movement
    }

    pub(crate) fn len(&self) -> usize {
        self.movements.read().len()
    }

    pub(crate) fn get(&self, id: MovementId) -> Option<Movement> {
        let index = usize::try_from(id.0).ok()?.checked_sub(1)?;
        self.movements.read().get(index).map(|m| (**m).clone())
    }

    /// Every movement in the order it was recorded.
    pub(crate) fn all(&self) -> Vec<Movement> {
        self.movements.read().iter().map(|m| (**m).clone()).collect()
    }

    /// The `limit` most recent movements, newest first.
    pub(crate) fn recent(&self, limit: usize) -> Vec<Movement> {
        self.movements
            .read()
            .iter()
            .rev()
            .take(limit)
            .map(|m| (**m).clone())
            .collect()
    }

    /// Movements matching the filter, newest first.
    pub(crate) fn search(&self, filter: &MovementFilter) -> Vec<Movement> {
        self.movements
            .read()
            .iter()
            .rev()
            .filter(|m| filter.matches(m))
            .map(|m| (**m).clone())
            .collect()
    }
}
