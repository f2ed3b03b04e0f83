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

//! Rate limiting for diagnostics raised on the per-frame path.

use std::fmt;
use std::time::{Duration, Instant};

/// Interval used when no setting overrides it.
pub const DEFAULT_THROTTLE_INTERVAL: Duration = Duration::from_secs(10);

/// Emits at most one message per interval for a single diagnostic site.
///
/// Messages arriving inside the interval are counted and the count is
/// appended to the next message that gets through.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
    suppressed: u64,
    emitted: u64,
}

impl Throttle {
    /// Creates a throttle that lets one message through per `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
            suppressed: 0,
            emitted: 0,
        }
    }

    /// Returns `true` and records the emission if a message may be logged now.
    pub fn permit(&mut self) -> bool {
        self.permit_at(Instant::now())
    }

    fn permit_at(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last {
            if now.saturating_duration_since(last) < self.interval {
                self.suppressed += 1;
                return false;
            }
        }
        self.last = Some(now);
        self.emitted += 1;
        true
    }

    /// Logs `args` at error level unless a message went out recently.
    ///
    /// Returns whether the message was logged.
    pub fn error(&mut self, args: fmt::Arguments<'_>) -> bool {
        let pending = self.suppressed;
        if !self.permit() {
            return false;
        }
        if pending > 0 {
            log::error!("{args} ({pending} similar messages suppressed)");
        } else {
            log::error!("{args}");
        }
        self.suppressed = 0;
        true
    }

    /// Number of messages that were logged.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Number of messages dropped since the last one that was logged.
    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_THROTTLE_INTERVAL)
    }
}
