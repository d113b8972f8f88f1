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

//! Stock movements.
//!
//! A movement transfers units between company stock and a technician wallet:
//!
//! ```text
//!   company stock ──WITHDRAW──► technician wallet
//!   company stock ◄──RETURN─── technician wallet
//!                               technician wallet ──WRITE_OFF──► (used at customer)
//! ```
//!
//! Movements are immutable once recorded. Their balance effects are applied exactly
//! once, when the movement is created.

use crate::base::{BatchId, EquipmentId, MovementId, UserId};
use crate::error::UnknownMovementKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    /// Units leave company stock and go to the technician.
    Withdraw,
    /// Units come back from the technician to company stock.
    Return,
    /// Units held by the technician were used at a customer site.
    WriteOff,
}

impl MovementKind {
    pub const ALL: [MovementKind; 3] = [Self::Withdraw, Self::Return, Self::WriteOff];

    /// Short code used in reports and CSV files.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Withdraw => "WITHDRAW",
            Self::Return => "RETURN",
            Self::WriteOff => "WRITE_OFF",
        }
    }

    /// Operator-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Withdraw => "Withdrawal (goes to technician)",
            Self::Return => "Return (back to company)",
            Self::WriteOff => "Write-off (used at customer)",
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for MovementKind {
    type Err = UnknownMovementKind;

    /// Accepts the English codes and the Portuguese ones used by the old admin
    /// screens (`SAIDA`, `DEVOLUCAO`, `BAIXA`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "withdraw" | "withdrawal" | "saida" => Ok(Self::Withdraw),
            "return" | "devolucao" => Ok(Self::Return),
            "write_off" | "writeoff" | "baixa" => Ok(Self::WriteOff),
            _ => Err(UnknownMovementKind(s.to_string())),
        }
    }
}

/// A request to move stock, before it is validated and recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRequest {
    pub technician: UserId,
    pub equipment: EquipmentId,
    pub kind: MovementKind,
    pub quantity: u32,
    #[serde(default)]
    pub note: Option<String>,
}

/// A recorded, immutable movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub technician: UserId,
    pub equipment: EquipmentId,
    pub kind: MovementKind,
    pub quantity: u32,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Operator who recorded the movement.
    pub recorded_by: UserId,
    /// Set when the movement was created by committing a batch.
    pub batch: Option<BatchId>,
}

/// Criteria for searching the movement history. Empty criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementFilter {
    pub technician: Option<UserId>,
    pub kind: Option<MovementKind>,
    pub equipment: Option<EquipmentId>,
    pub batch: Option<BatchId>,
    /// Case-insensitive substring of the note.
    pub note: Option<String>,
}

impl MovementFilter {
    pub fn matches(&self, movement: &Movement) -> bool {
        if self.technician.is_some_and(|t| t != movement.technician) {
            return false;
        }
        if self.kind.is_some_and(|k| k != movement.kind) {
            return false;
        }
        if self.equipment.is_some_and(|e| e != movement.equipment) {
            return false;
        }
        if self.batch.is_some_and(|b| Some(b) != movement.batch) {
            return false;
        }
        match (&self.note, &movement.note) {
            (None, _) => true,
            (Some(needle), Some(note)) => note.to_lowercase().contains(&needle.to_lowercase()),
            (Some(_), None) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(kind: MovementKind, note: Option<&str>) -> Movement {
        Movement {
            id: MovementId(1),
            technician: UserId(1),
            equipment: EquipmentId(1),
            kind,
            quantity: 1,
            note: note.map(str::to_string),
            created_at: Utc::now(),
            recorded_by: UserId(9),
            batch: None,
        }
    }

    #[test]
    fn parses_english_and_legacy_codes() {
        assert_eq!("withdraw".parse(), Ok(MovementKind::Withdraw));
        assert_eq!(" SAIDA ".parse(), Ok(MovementKind::Withdraw));
        assert_eq!("Return".parse(), Ok(MovementKind::Return));
        assert_eq!("devolucao".parse(), Ok(MovementKind::Return));
        assert_eq!("write-off".parse(), Ok(MovementKind::WriteOff));
        assert_eq!("BAIXA".parse(), Ok(MovementKind::WriteOff));
        assert!("deposit".parse::<MovementKind>().is_err());
    }

    #[test]
    fn code_round_trips_through_from_str() {
        for kind in MovementKind::ALL {
            assert_eq!(kind.code().parse(), Ok(kind));
        }
    }

    #[test]
    fn filter_matches_note_case_insensitively() {
        let filter = MovementFilter {
            note: Some("os 12".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&sample(MovementKind::WriteOff, Some("OS 1234"))));
        assert!(!filter.matches(&sample(MovementKind::WriteOff, Some("OS 99"))));
        assert!(!filter.matches(&sample(MovementKind::WriteOff, None)));
    }

    #[test]
    fn filter_by_kind() {
        let filter = MovementFilter {
            kind: Some(MovementKind::Return),
            ..Default::default()
        };
        assert!(filter.matches(&sample(MovementKind::Return, None)));
        assert!(!filter.matches(&sample(MovementKind::Withdraw, None)));
    }

    #[test]
    fn serializes_kind_as_screaming_code() {
        let json = serde_json::to_string(&MovementKind::WriteOff).unwrap();
        assert_eq!(json, "\"WRITE_OFF\"");
    }
}
