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

//! Batches of movements committed all-or-nothing.
//!
//! ```text
//!   Draft (committed = false) ──commit──► Committed (committed = true)
//! ```
//!
//! A committed batch never goes back to draft, and committing it again is a no-op.

use crate::base::{BatchId, EquipmentId, UserId};
use crate::error::InventoryError;
use crate::movement::MovementKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One line of a batch: how many units of which equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchLine {
    pub equipment: EquipmentId,
    pub quantity: u32,
}

/// Data needed to open a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBatch {
    pub technician: UserId,
    pub kind: MovementKind,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub lines: Vec<BatchLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Draft,
    Committed,
}

/// A group of movements for one technician and one movement kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub technician: UserId,
    pub kind: MovementKind,
    pub note: Option<String>,
    pub lines: Vec<BatchLine>,
    pub committed: bool,
}

impl Batch {
    pub(crate) fn open(id: BatchId, new: NewBatch) -> Result<Self, InventoryError> {
        let mut batch = Self {
            id,
            technician: new.technician,
            kind: new.kind,
            note: new.note,
            lines: Vec::with_capacity(new.lines.len()),
            committed: false,
        };
        for line in new.lines {
            batch.add_line(line)?;
        }
        Ok(batch)
    }

    pub fn status(&self) -> BatchStatus {
        if self.committed {
            BatchStatus::Committed
        } else {
            BatchStatus::Draft
        }
    }

    pub(crate) fn add_line(&mut self, line: BatchLine) -> Result<(), InventoryError> {
        if self.committed {
            return Err(InventoryError::BatchLocked(self.id));
        }
        if line.quantity == 0 {
            return Err(InventoryError::InvalidQuantity);
        }
        self.lines.push(line);
        Ok(())
    }

    /// Distinct equipment touched by the batch, in ascending id order.
    pub fn equipment_ids(&self) -> Vec<EquipmentId> {
        let mut ids: Vec<EquipmentId> = self.lines.iter().map(|l| l.equipment).collect();
        ids.sort();
        ids.dedup();
        ids
    }

    pub(crate) fn mark_committed(&mut self) {
        self.committed = true;
    }
}

/// Result of a commit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommitOutcome {
    /// Every line was applied; one movement per line was recorded.
    Committed { movements: usize },
    /// The batch had been committed before; nothing was done.
    AlreadyCommitted,
}

impl fmt::Display for CommitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Committed { movements } => {
                write!(f, "{} movements recorded successfully", movements)
            }
            Self::AlreadyCommitted => f.write_str("batch already processed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_batch(lines: Vec<BatchLine>) -> NewBatch {
        NewBatch {
            technician: UserId(1),
            kind: MovementKind::Withdraw,
            note: Some("OS 1234".to_string()),
            lines,
        }
    }

    fn line(equipment: u32, quantity: u32) -> BatchLine {
        BatchLine {
            equipment: EquipmentId(equipment),
            quantity,
        }
    }

    #[test]
    fn opens_as_draft() {
        let batch = Batch::open(BatchId(1), new_batch(vec![line(1, 2)])).unwrap();
        assert_eq!(batch.status(), BatchStatus::Draft);
        assert!(!batch.committed);
        assert_eq!(batch.lines.len(), 1);
    }

    #[test]
    fn rejects_zero_quantity_lines() {
        let result = Batch::open(BatchId(1), new_batch(vec![line(1, 0)]));
        assert_eq!(result, Err(InventoryError::InvalidQuantity));
    }

    #[test]
    fn committed_batch_is_locked() {
        let mut batch = Batch::open(BatchId(3), new_batch(vec![line(1, 2)])).unwrap();
        batch.mark_committed();
        assert_eq!(batch.status(), BatchStatus::Committed);
        assert_eq!(batch.add_line(line(2, 1)), Err(InventoryError::BatchLocked(BatchId(3))));
        assert_eq!(batch.lines.len(), 1);
    }

    #[test]
    fn equipment_ids_are_sorted_and_unique() {
        let batch = Batch::open(
            BatchId(1),
            new_batch(vec![line(3, 1), line(1, 1), line(3, 2), line(2, 1)]),
        )
        .unwrap();
        assert_eq!(
            batch.equipment_ids(),
            vec![EquipmentId(1), EquipmentId(2), EquipmentId(3)]
        );
    }

    #[test]
    fn outcome_messages() {
        assert_eq!(
            CommitOutcome::Committed { movements: 3 }.to_string(),
            "3 movements recorded successfully"
        );
        assert_eq!(CommitOutcome::AlreadyCommitted.to_string(), "batch already processed");
    }
}
