// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Logger installation for hosts embedding the lighting core.

use anyhow::Context;
use env_logger::{Builder, Env};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info";

/// Installs `env_logger` as the global logger.
///
/// `RUST_LOG` overrides [`DEFAULT_FILTER`]. Per-leaf visibility detail is
/// logged at `trace` under `photon_lanes::light_lane`.
///
/// # Errors
///
/// Fails if another logger is already installed.
pub fn init_logging() -> anyhow::Result<()> {
    Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER))
        .try_init()
        .context("failed to install the global logger")
}
