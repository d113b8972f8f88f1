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

//! Property-based tests for the inventory.
//!
//! These tests verify invariants that should hold for any sequence of
//! movements and batches, accepted or rejected.

use field_stock_rs::{
    Balances, BatchLine, Category, EquipmentId, Inventory, MovementKind, MovementRequest,
    NewBatch, NewEquipment, UserId,
};
use proptest::prelude::*;

// =============================================================================
// Arbitrary Strategies
// =============================================================================

fn arb_kind() -> impl Strategy<Value = MovementKind> {
    prop_oneof![
        Just(MovementKind::Withdraw),
        Just(MovementKind::Return),
        Just(MovementKind::WriteOff),
    ]
}

/// A movement on one of three technicians and two equipment types.
fn arb_movement() -> impl Strategy<Value = (u32, u32, MovementKind, u32)> {
    (1u32..=3, 1u32..=2, arb_kind(), 0u32..=15)
}

fn make_inventory(stock: &[u32]) -> (Inventory, UserId, Vec<EquipmentId>) {
    let inventory = Inventory::new();
    let operator = inventory.register_user("operator");
    for tech in ["joao", "maria", "pedro"] {
        inventory.register_user(tech);
    }
    let ids = stock
        .iter()
        .enumerate()
        .map(|(i, qty)| {
            inventory
                .register_equipment(NewEquipment::new(format!("Item {}", i), Category::Tool, *qty))
                .unwrap()
        })
        .collect();
    (inventory, operator, ids)
}

/// Company stock plus every wallet for one equipment type.
fn units_outside_customers(inventory: &Inventory, equipment: EquipmentId) -> u64 {
    let company = u64::from(inventory.equipment(equipment).unwrap().quantity);
    let wallets: u64 = inventory
        .wallets()
        .iter()
        .filter(|w| w.equipment == equipment)
        .map(|w| u64::from(w.quantity))
        .sum();
    company + wallets
}

/// Sum of every write-off recorded for one equipment type.
fn written_off(inventory: &Inventory, equipment: EquipmentId) -> u64 {
    inventory
        .movements()
        .iter()
        .filter(|m| m.equipment == equipment && m.kind == MovementKind::WriteOff)
        .map(|m| u64::from(m.quantity))
        .sum()
}

// =============================================================================
// Balance Invariant Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Withdrawals and returns conserve units; write-offs are the only sink.
    #[test]
    fn units_are_conserved(
        stock in prop::collection::vec(0u32..=20, 2),
        movements in prop::collection::vec(arb_movement(), 0..40),
    ) {
        let (inventory, operator, ids) = make_inventory(&stock);

        for (tech, equipment, kind, quantity) in movements {
            let request = MovementRequest {
                technician: UserId(tech + 1),
                equipment: ids[(equipment - 1) as usize],
                kind,
                quantity,
                note: None,
            };
            let _ = inventory.record_movement(request, operator);
        }

        for (initial, id) in stock.iter().zip(&ids) {
            prop_assert_eq!(
                units_outside_customers(&inventory, *id) + written_off(&inventory, *id),
                u64::from(*initial)
            );
        }
    }

    /// A checked movement either applies exactly or leaves the balances untouched.
    #[test]
    fn balances_apply_exactly_or_not_at_all(
        company in 0u32..=50,
        wallet in 0u32..=50,
        kind in arb_kind(),
        quantity in 0u32..=60,
    ) {
        let mut balances = Balances::new(company, wallet);
        let before = balances;

        match balances.apply(kind, quantity) {
            Ok(()) => match kind {
                MovementKind::Withdraw => {
                    prop_assert_eq!(balances, Balances::new(company - quantity, wallet + quantity));
                }
                MovementKind::Return => {
                    prop_assert_eq!(balances, Balances::new(company + quantity, wallet - quantity));
                }
                MovementKind::WriteOff => {
                    prop_assert_eq!(balances, Balances::new(company, wallet - quantity));
                }
            },
            Err(_) => prop_assert_eq!(balances, before),
        }
    }

    /// Withdrawing then returning the same quantity restores both balances.
    #[test]
    fn withdraw_then_return_round_trips(
        initial in 1u32..=100,
        fraction in 1u32..=100,
    ) {
        let quantity = (initial * fraction).div_ceil(100);
        let (inventory, operator, ids) = make_inventory(&[initial]);
        let tech = UserId(2);

        let withdraw = MovementRequest {
            technician: tech,
            equipment: ids[0],
            kind: MovementKind::Withdraw,
            quantity,
            note: None,
        };
        let ret = MovementRequest { kind: MovementKind::Return, ..withdraw.clone() };
        inventory.record_movement(withdraw, operator).unwrap();
        inventory.record_movement(ret, operator).unwrap();

        prop_assert_eq!(inventory.equipment(ids[0]).unwrap().quantity, initial);
        prop_assert_eq!(inventory.wallet_balance(tech, ids[0]).unwrap(), 0);
    }

    /// A batch commits every line or none: on rejection nothing moves.
    #[test]
    fn batch_is_all_or_nothing(
        stock in prop::collection::vec(0u32..=10, 2),
        kind in arb_kind(),
        lines in prop::collection::vec((0usize..2, 1u32..=6), 1..6),
    ) {
        let (inventory, operator, ids) = make_inventory(&stock);
        let tech = UserId(3);
        // Seed the wallet so returns and write-offs can succeed.
        for id in &ids {
            let available = inventory.equipment(*id).unwrap().quantity;
            if available > 0 {
                let seed = MovementRequest {
                    technician: tech,
                    equipment: *id,
                    kind: MovementKind::Withdraw,
                    quantity: available.div_ceil(2),
                    note: None,
                };
                inventory.record_movement(seed, operator).unwrap();
            }
        }
        let before: Vec<(u32, u32)> = ids
            .iter()
            .map(|id| {
                (
                    inventory.equipment(*id).unwrap().quantity,
                    inventory.wallet_balance(tech, *id).unwrap(),
                )
            })
            .collect();
        let movements_before = inventory.movement_count();

        let batch = NewBatch {
            technician: tech,
            kind,
            note: None,
            lines: lines
                .iter()
                .map(|(slot, quantity)| BatchLine { equipment: ids[*slot], quantity: *quantity })
                .collect(),
        };
        let result = inventory.submit_batch(batch, operator);

        let after: Vec<(u32, u32)> = ids
            .iter()
            .map(|id| {
                (
                    inventory.equipment(*id).unwrap().quantity,
                    inventory.wallet_balance(tech, *id).unwrap(),
                )
            })
            .collect();

        if result.is_ok() {
            prop_assert_eq!(inventory.movement_count(), movements_before + lines.len());
            for (slot, (b, a)) in before.iter().zip(&after).enumerate() {
                let total: u32 = lines.iter().filter(|(s, _)| *s == slot).map(|(_, q)| *q).sum();
                let expected = match kind {
                    MovementKind::Withdraw => (b.0 - total, b.1 + total),
                    MovementKind::Return => (b.0 + total, b.1 - total),
                    MovementKind::WriteOff => (b.0, b.1 - total),
                };
                prop_assert_eq!(*a, expected);
            }
        } else {
            prop_assert_eq!(inventory.movement_count(), movements_before);
            prop_assert_eq!(after, before);
        }
    }
}
