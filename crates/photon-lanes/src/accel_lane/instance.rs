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

//! Material classes and their instance encoding.
//!
//! The class decides which rays see an instance (the mask), which hit group
//! shades it and whether any-hit shaders run. These bits only exist in the
//! packed [`GpuInstance`].

use super::builder::ObjectId;
use photon_core::math::RowTransform;
use photon_core::renderer::api::{DeviceAddress, GpuInstance, InstanceFlags};

/// Hit group for regular opaque geometry.
pub const HIT_GROUP_REGULAR: u32 = 0;
/// Hit group running the alpha test.
pub const HIT_GROUP_ALPHA_TEST: u32 = 1;
/// Hit group for additive geometry.
pub const HIT_GROUP_ADDITIVE: u32 = 2;

/// How an instance interacts with rays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaterialClass {
    /// Solid geometry.
    #[default]
    Opaque,
    /// Cut-out geometry tested against the texture alpha.
    AlphaTest,
    /// Glass and water.
    Refractive,
    /// Glowing geometry added on top of what is behind it.
    Additive,
}

impl MaterialClass {
    /// Ray mask bit of the class.
    pub const fn mask(self) -> u8 {
        match self {
            MaterialClass::Opaque => 0x01,
            MaterialClass::AlphaTest => 0x02,
            MaterialClass::Refractive => 0x04,
            MaterialClass::Additive => 0x08,
        }
    }

    /// Offset of the class's hit group in the shader binding table.
    pub const fn hit_group(self) -> u32 {
        match self {
            MaterialClass::Opaque | MaterialClass::Refractive => HIT_GROUP_REGULAR,
            MaterialClass::AlphaTest => HIT_GROUP_ALPHA_TEST,
            MaterialClass::Additive => HIT_GROUP_ADDITIVE,
        }
    }

    /// Opacity flags of the class.
    pub const fn flags(self) -> InstanceFlags {
        match self {
            MaterialClass::Opaque | MaterialClass::Refractive => InstanceFlags::FORCE_OPAQUE,
            MaterialClass::AlphaTest | MaterialClass::Additive => InstanceFlags::FORCE_NO_OPAQUE,
        }
    }
}

/// Render modes of entities, as set by game code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RenderMode {
    /// Drawn as is.
    #[default]
    Normal,
    /// Single color, blended.
    TransColor,
    /// Texture, blended.
    TransTexture,
    /// Sprite glow.
    Glow,
    /// Alpha-tested texture.
    TransAlpha,
    /// Additive blend.
    TransAdd,
}

impl From<RenderMode> for MaterialClass {
    fn from(mode: RenderMode) -> Self {
        match mode {
            RenderMode::Normal => MaterialClass::Opaque,
            RenderMode::TransColor | RenderMode::TransTexture => MaterialClass::Refractive,
            RenderMode::Glow | RenderMode::TransAdd => MaterialClass::Additive,
            RenderMode::TransAlpha => MaterialClass::AlphaTest,
        }
    }
}

/// One object placed in the scene for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceDraw {
    /// Object whose bottom-level structure is instanced.
    pub object: ObjectId,
    /// Object-to-world transform.
    pub transform: RowTransform,
    /// Value the shaders read back for hits on this instance (24 bits).
    pub custom_index: u32,
    /// Material class.
    pub material: MaterialClass,
}

impl InstanceDraw {
    /// Packs the draw for the device, given its structure's address.
    pub fn pack(&self, accel: DeviceAddress) -> GpuInstance {
        GpuInstance::new(
            &self.transform,
            self.custom_index,
            self.material.mask(),
            self.material.hit_group(),
            self.material.flags(),
            accel,
        )
    }
}
