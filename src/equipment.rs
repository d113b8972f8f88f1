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

//! Equipment catalog records.

use crate::base::EquipmentId;
use crate::error::UnknownCategory;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed equipment categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Fiber,
    Radio,
    Tool,
}

impl Category {
    /// Label shown in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fiber => "Fibra Óptica",
            Self::Radio => "Via Rádio",
            Self::Tool => "Ferramentas",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fiber" | "fibra" => Ok(Self::Fiber),
            "radio" => Ok(Self::Radio),
            "tool" | "tools" | "ferramenta" | "ferramentas" => Ok(Self::Tool),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

/// Data needed to add an equipment type to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEquipment {
    pub name: String,
    pub category: Category,
    /// Initial company stock.
    #[serde(default)]
    pub quantity: u32,
    #[serde(default = "NewEquipment::default_minimum")]
    pub minimum: u32,
    #[serde(default)]
    pub specifications: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewEquipment {
    pub const DEFAULT_MINIMUM: u32 = 5;

    pub fn new(name: impl Into<String>, category: Category, quantity: u32) -> Self {
        Self {
            name: name.into(),
            category,
            quantity,
            minimum: Self::DEFAULT_MINIMUM,
            specifications: None,
            notes: None,
        }
    }

    pub fn with_minimum(mut self, minimum: u32) -> Self {
        self.minimum = minimum;
        self
    }

    fn default_minimum() -> u32 {
        Self::DEFAULT_MINIMUM
    }
}

/// Point-in-time view of an equipment type and its company stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: EquipmentId,
    pub name: String,
    pub category: Category,
    /// Units on hand at the company.
    pub quantity: u32,
    /// Low-stock threshold.
    pub minimum: u32,
    pub specifications: Option<String>,
    pub notes: Option<String>,
}

impl Equipment {
    pub(crate) fn from_new(id: EquipmentId, new: NewEquipment) -> Self {
        Self {
            id,
            name: new.name,
            category: new.category,
            quantity: new.quantity,
            minimum: new.minimum,
            specifications: new.specifications,
            notes: new.notes,
        }
    }

    /// Stock is low once it reaches the minimum threshold.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.minimum
    }
}
