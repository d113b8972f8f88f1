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

//! The balance-transfer rule.
//!
//! [`Balances`] is the pair of counters one movement touches: the company's on-hand
//! quantity of an equipment type and one technician's wallet for it. Checking and
//! applying are separate steps so a batch can be simulated before anything moves.
//!
//! # Example
//!
//! ```
//! use field_stock_rs::{Balances, MovementKind};
//!
//! let mut balances = Balances::new(10, 0);
//! balances.apply(MovementKind::Withdraw, 3).unwrap();
//! assert_eq!(balances, Balances::new(7, 3));
//!
//! // The technician only holds 3.
//! assert!(balances.check(MovementKind::WriteOff, 5).is_err());
//! assert_eq!(balances, Balances::new(7, 3));
//! ```

use crate::movement::MovementKind;

/// Company and wallet counters for one (technician, equipment) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Balances {
    /// Units on hand at the company.
    pub company: u32,
    /// Units held by the technician.
    pub wallet: u32,
}

/// Why a movement cannot be applied to a pair of balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceViolation {
    /// The company does not hold enough units.
    CompanyStock { available: u32, requested: u32 },
    /// The technician does not hold enough units.
    TechnicianBalance { available: u32, requested: u32 },
    /// The receiving counter would exceed `u32::MAX`.
    Overflow,
}

impl Balances {
    pub fn new(company: u32, wallet: u32) -> Self {
        Self { company, wallet }
    }

    /// Validates a movement without touching the counters.
    pub fn check(&self, kind: MovementKind, quantity: u32) -> Result<(), BalanceViolation> {
        self.after(kind, quantity).map(|_| ())
    }

    /// Applies a movement. Either both counters change or neither does.
    pub fn apply(&mut self, kind: MovementKind, quantity: u32) -> Result<(), BalanceViolation> {
        *self = self.after(kind, quantity)?;
        Ok(())
    }

    /// Returns the counters as they would be after the movement.
    fn after(&self, kind: MovementKind, quantity: u32) -> Result<Self, BalanceViolation> {
        match kind {
            MovementKind::Withdraw => {
                if self.company < quantity {
                    return Err(BalanceViolation::CompanyStock {
                        available: self.company,
                        requested: quantity,
                    });
                }
                Ok(Self {
                    company: self.company - quantity,
                    wallet: self
                        .wallet
                        .checked_add(quantity)
                        .ok_or(BalanceViolation::Overflow)?,
                })
            }
            MovementKind::Return => {
                self.ensure_wallet_covers(quantity)?;
                Ok(Self {
                    company: self
                        .company
                        .checked_add(quantity)
                        .ok_or(BalanceViolation::Overflow)?,
                    wallet: self.wallet - quantity,
                })
            }
            MovementKind::WriteOff => {
                self.ensure_wallet_covers(quantity)?;
                Ok(Self {
                    company: self.company,
                    wallet: self.wallet - quantity,
                })
            }
        }
    }

    fn ensure_wallet_covers(&self, quantity: u32) -> Result<(), BalanceViolation> {
        if self.wallet < quantity {
            return Err(BalanceViolation::TechnicianBalance {
                available: self.wallet,
                requested: quantity,
            });
        }
        Ok(())
    }
}
