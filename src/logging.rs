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

//! Logging initialisation.

use crate::config::{LogFormat, LoggingSettings};
use std::sync::Once;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::SubscriberInitExt;

static INIT_ONCE: Once = Once::new();

/// Installs the global `tracing` subscriber. Only the first call has an effect.
///
/// Events go to stderr so reports written to stdout stay clean. `RUST_LOG`
/// overrides the configured filter.
pub fn init(settings: &LoggingSettings) {
    INIT_ONCE.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&settings.filter));
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr);

        // A subscriber may already be set by an embedding application.
        let _ = match settings.format {
            LogFormat::Pretty => builder.finish().try_init(),
            LogFormat::Json => builder.json().finish().try_init(),
        };
    });
}
