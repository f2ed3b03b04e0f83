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

//! # Photon Lanes
//!
//! Per-frame pipelines of the ray-traced lighting core.
//!
//! - [`light_lane`]: Light registry, visibility cache, spatial grid and the
//!   dirty-range uploader.
//! - [`accel_lane`]: Bottom- and top-level acceleration structure builds.
//! - [`frame_lane`]: The frame context that drives both lanes in order.

#![warn(missing_docs)]

pub mod accel_lane;
pub mod config;
pub mod frame_lane;
pub mod light_lane;
pub mod throttle;

pub use self::throttle::Throttle;
