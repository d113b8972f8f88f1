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

//! Settings loaded from an optional TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) is valid.
//!
//! ```toml
//! [equipment]
//! default_minimum = 5
//!
//! [report]
//! recent_movements = 20
//! lines_per_page = 50
//!
//! [logging]
//! format = "json"
//! ```

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub equipment: EquipmentSettings,
    pub report: ReportSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EquipmentSettings {
    /// Low-stock threshold for catalog rows that do not set one.
    pub default_minimum: u32,
}

impl Default for EquipmentSettings {
    fn default() -> Self {
        Self { default_minimum: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub title: String,
    /// How many of the newest movements the history section lists.
    pub recent_movements: usize,
    /// Body lines per page, header and footer excluded.
    pub lines_per_page: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            title: "FUTURANET - Stock Control (Branch)".to_string(),
            recent_movements: 20,
            lines_per_page: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub format: LogFormat,
    /// `EnvFilter` directives; `RUST_LOG` takes precedence.
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            filter: "field_stock_rs=info,field_stock=info".to_string(),
        }
    }
}

impl Settings {
    /// Reads settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Loads `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
