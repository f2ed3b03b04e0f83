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

//! Acceleration lane: the two-level BVH traced by the ray shaders.
//!
//! - [`AccelBuilder`]: creates, refits and rebuilds bottom-level structures,
//!   and rebuilds the top level from the frame's instances.
//! - [`ScratchArena`]: per-frame build scratch.
//! - [`MaterialClass`]: instance mask, hit group and opacity.
//! - [`TransformHistory`]: last frame's transforms.

mod builder;
mod error;
mod history;
mod instance;
mod scratch;

pub use self::builder::{
    AccelBuilder, AccelState, AccelStats, ObjectAccel, ObjectDescriptor, ObjectId, TopLevel,
};
pub use self::error::AccelError;
pub use self::history::{EntityId, PreviousTransform, TransformHistory};
pub use self::instance::{
    InstanceDraw, MaterialClass, RenderMode, HIT_GROUP_ADDITIVE, HIT_GROUP_ALPHA_TEST,
    HIT_GROUP_REGULAR,
};
pub use self::scratch::ScratchArena;
