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

//! Bottom- and top-level acceleration structure builds.
//!
//! # Object lifecycle
//!
//! An object is registered with its geometry and gets a structure on its
//! first [`build_object`](AccelBuilder::build_object). Later builds either
//! refit the existing structure in place (dynamic objects, when refit is
//! allowed) or rebuild it, recreating it when it outgrew its storage block.
//!
//! # Frame
//!
//! [`begin_frame`](AccelBuilder::begin_frame) resets the scratch arena and
//! the instance list. Builds and instance additions follow, then
//! [`build_top_level`](AccelBuilder::build_top_level) writes the instances
//! into the active half of the instance region and rebuilds the top-level
//! structure over them.

use super::error::AccelError;
use super::instance::InstanceDraw;
use super::scratch::ScratchArena;
use crate::throttle::Throttle;
use photon_core::memory::{FirstFitPool, FlippingBuffer, PoolBlock};
use photon_core::renderer::api::{
    AccelBuildCommand, AccelBuildSizes, AccelCreateDescriptor, AccelGeometry, AccelId, BuildMode,
    GpuInstance, TriangleGeometry,
};
use photon_core::renderer::{AccelSettings, AccelerationDevice, RefitPolicy};
use std::time::Duration;

/// Handle of a registered object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

/// Where an object's structure stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccelState {
    /// Registered, never built.
    Uncreated,
    /// Created and built for the first time.
    Built,
    /// Refit in place.
    Updated,
    /// Built again from scratch.
    Rebuilt,
    /// Destroyed; the id may be reused.
    Destroyed,
}

/// Geometry and lifetime flags of an object to register.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDescriptor {
    /// Name used in logs.
    pub label: Option<String>,
    /// Triangle runs making up the object.
    pub geometry: Vec<TriangleGeometry>,
    /// Animated geometry that may be refit.
    pub dynamic: bool,
}

/// An object and its bottom-level structure.
#[derive(Debug, Clone)]
pub struct ObjectAccel {
    label: Option<String>,
    geometry: AccelGeometry,
    dynamic: bool,
    handle: Option<AccelId>,
    block: Option<PoolBlock>,
    state: AccelState,
}

impl ObjectAccel {
    /// Current state.
    pub fn state(&self) -> AccelState {
        self.state
    }

    /// Device structure, once built.
    pub fn handle(&self) -> Option<AccelId> {
        self.handle
    }

    /// Storage block backing the structure.
    pub fn block(&self) -> Option<PoolBlock> {
        self.block
    }

    /// Whether the object may be refit.
    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    /// Replaces the geometry, e.g. after animation changed vertex counts.
    pub fn set_geometry(&mut self, geometry: Vec<TriangleGeometry>) {
        self.geometry = AccelGeometry::Triangles(geometry);
    }

    fn name(&self) -> &str {
        self.label.as_deref().unwrap_or("<unnamed>")
    }
}

/// Result of [`AccelBuilder::build_top_level`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopLevel {
    /// The structure was rebuilt over this frame's instances.
    Built(AccelId),
    /// No instances; nothing to trace.
    Skipped,
}

/// Counters of the current frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccelStats {
    /// Instances in the last top-level build.
    pub blas_count: u32,
    /// Structures built or refit this frame, top level included.
    pub accels_built: u32,
}

#[derive(Debug, Clone, Copy)]
struct TopLevelAccel {
    handle: AccelId,
    block: PoolBlock,
}

/// Builds and tracks every acceleration structure of the scene.
#[derive(Debug)]
pub struct AccelBuilder {
    settings: AccelSettings,
    pool: FirstFitPool,
    scratch: ScratchArena,
    instances: FlippingBuffer,
    objects: Vec<ObjectAccel>,
    free_ids: Vec<ObjectId>,
    draws: Vec<InstanceDraw>,
    packed: Vec<GpuInstance>,
    top_level: Option<TopLevelAccel>,
    built_this_frame: Option<AccelId>,
    frozen: bool,
    overflow: Throttle,
    stats: AccelStats,
}

impl AccelBuilder {
    /// Creates a builder with empty storage. Call [`new_map`](Self::new_map)
    /// before building anything.
    pub fn new(settings: AccelSettings, throttle_interval: Duration) -> Self {
        Self {
            pool: new_pool(&settings),
            scratch: ScratchArena::new(settings.scratch_budget, 1),
            instances: FlippingBuffer::new(settings.max_instances.saturating_mul(2)),
            objects: Vec::new(),
            free_ids: Vec::new(),
            draws: Vec::with_capacity(settings.max_instances as usize),
            packed: Vec::with_capacity(settings.max_instances as usize),
            top_level: None,
            built_this_frame: None,
            frozen: false,
            overflow: Throttle::new(throttle_interval),
            stats: AccelStats::default(),
            settings,
        }
    }

    /// Destroys every structure and recreates the storage pool and the
    /// top-level structure.
    pub fn new_map(&mut self, device: &dyn AccelerationDevice) -> Result<(), AccelError> {
        for object in &mut self.objects {
            if let Some(handle) = object.handle.take() {
                device.destroy_accel(handle);
            }
        }
        if let Some(top) = self.top_level.take() {
            device.destroy_accel(top.handle);
        }
        self.objects.clear();
        self.free_ids.clear();
        self.draws.clear();
        self.packed.clear();
        self.instances.clear();
        self.built_this_frame = None;
        self.frozen = false;
        self.pool = new_pool(&self.settings);
        self.scratch = ScratchArena::new(
            self.settings.scratch_budget,
            device.min_scratch_alignment(),
        );

        let geometry = AccelGeometry::Instances {
            first: 0,
            count: self.settings.max_instances,
        };
        let sizes = device.build_sizes(&geometry, false)?;
        let (handle, block) = self.create(device, &geometry, sizes)?;
        self.top_level = Some(TopLevelAccel { handle, block });
        log::info!(
            "AccelBuilder: top level for {} instances uses {} bytes",
            self.settings.max_instances,
            sizes.accel_size
        );
        Ok(())
    }

    /// Resets the scratch arena and, unless frozen, the instance list.
    pub fn begin_frame(&mut self) {
        self.scratch.reset();
        if !self.frozen {
            self.draws.clear();
        }
        self.built_this_frame = None;
        self.stats.accels_built = 0;
    }

    /// Registers an object. No device work happens until it is built.
    pub fn register_object(&mut self, desc: ObjectDescriptor) -> ObjectId {
        let object = ObjectAccel {
            label: desc.label,
            geometry: AccelGeometry::Triangles(desc.geometry),
            dynamic: desc.dynamic,
            handle: None,
            block: None,
            state: AccelState::Uncreated,
        };
        match self.free_ids.pop() {
            Some(id) => {
                self.objects[id.0 as usize] = object;
                id
            }
            None => {
                self.objects.push(object);
                ObjectId(self.objects.len() as u32 - 1)
            }
        }
    }

    /// Destroys an object's structure and frees its id.
    pub fn destroy_object(&mut self, device: &dyn AccelerationDevice, id: ObjectId) -> Result<(), AccelError> {
        let object = self.live_object_mut(id)?;
        let handle = object.handle.take();
        let block = object.block.take();
        object.state = AccelState::Destroyed;
        if let Some(handle) = handle {
            device.destroy_accel(handle);
        }
        if let Some(block) = block {
            self.pool.free(block);
        }
        self.free_ids.push(id);
        Ok(())
    }

    /// Creates, refits or rebuilds an object's bottom-level structure.
    pub fn build_object(&mut self, device: &dyn AccelerationDevice, id: ObjectId) -> Result<AccelState, AccelError> {
        let refit = self.refit_allowed(device);
        let object = self.live_object(id)?;
        let should_create = object.handle.is_none();
        let should_update = !should_create && object.dynamic && refit;
        let mode = if should_update { BuildMode::Update } else { BuildMode::Build };

        let sizes = device.build_sizes(&object.geometry, object.dynamic && refit)?;
        let scratch_size = sizes.scratch_for(mode);
        if let Err(err) = self.scratch.check(scratch_size) {
            log::error!("AccelBuilder: {}: {err}", object.name());
            return Err(err);
        }

        let outgrown = !should_create
            && mode == BuildMode::Build
            && object.block.map_or(true, |b| b.size < sizes.accel_size);
        if outgrown {
            log::debug!(
                "AccelBuilder: {} needs {} bytes, recreating",
                object.name(),
                sizes.accel_size
            );
            let object = &mut self.objects[id.0 as usize];
            if let Some(handle) = object.handle.take() {
                device.destroy_accel(handle);
            }
            if let Some(block) = object.block.take() {
                self.pool.free(block);
            }
        }

        if self.objects[id.0 as usize].handle.is_none() {
            let geometry = self.objects[id.0 as usize].geometry.clone();
            let (handle, block) = self.create(device, &geometry, sizes)?;
            let object = &mut self.objects[id.0 as usize];
            object.handle = Some(handle);
            object.block = Some(block);
        }

        let offset = self.scratch.allocate(scratch_size)?;
        let object = &mut self.objects[id.0 as usize];
        let dst = object.handle.ok_or(AccelError::NotBuilt(id))?;
        device.record_build(&AccelBuildCommand {
            mode,
            geometry: &object.geometry,
            dst,
            src: should_update.then_some(dst),
            scratch: device.scratch_base().offset(offset),
        })?;

        object.state = if should_create {
            AccelState::Built
        } else if should_update {
            AccelState::Updated
        } else {
            AccelState::Rebuilt
        };
        self.stats.accels_built += 1;
        Ok(object.state)
    }

    /// Queues an instance of a built object for this frame's top level.
    ///
    /// Ignored while frozen.
    pub fn add_instance(&mut self, draw: InstanceDraw) -> Result<(), AccelError> {
        if self.frozen {
            return Ok(());
        }
        let object = self.live_object(draw.object)?;
        if object.handle.is_none() {
            return Err(AccelError::NotBuilt(draw.object));
        }
        let capacity = self.instances.frame_capacity();
        if self.draws.len() >= capacity as usize {
            self.overflow.error(format_args!(
                "Too many instances, capacity is {capacity}; dropping the rest"
            ));
            return Err(AccelError::InstanceCapacity { capacity });
        }
        self.draws.push(draw);
        Ok(())
    }

    /// Writes this frame's instances and rebuilds the top level over them.
    pub fn build_top_level(&mut self, device: &dyn AccelerationDevice) -> Result<TopLevel, AccelError> {
        let top = self.top_level.ok_or(AccelError::NoTopLevel)?;
        if self.draws.is_empty() {
            self.stats.blas_count = 0;
            return Ok(TopLevel::Skipped);
        }

        let count = self.draws.len() as u32;
        self.instances.flip();
        let first = self
            .instances
            .alloc(count, 1)
            .ok_or(AccelError::InstanceCapacity {
                capacity: self.instances.frame_capacity(),
            })?;

        self.packed.clear();
        for draw in &self.draws {
            let handle = self
                .objects
                .get(draw.object.0 as usize)
                .and_then(|o| o.handle)
                .ok_or(AccelError::NotBuilt(draw.object))?;
            self.packed.push(draw.pack(device.accel_address(handle)?));
        }
        device.write_instances(first, &self.packed)?;

        let geometry = AccelGeometry::Instances { first, count };
        let sizes = device.build_sizes(&geometry, false)?;
        let scratch_size = sizes.scratch_for(BuildMode::Build);
        let offset = match self.scratch.allocate(scratch_size) {
            Ok(offset) => offset,
            Err(err) => {
                log::error!("AccelBuilder: top level: {err}");
                return Err(err);
            }
        };
        device.record_build(&AccelBuildCommand {
            mode: BuildMode::Build,
            geometry: &geometry,
            dst: top.handle,
            src: None,
            scratch: device.scratch_base().offset(offset),
        })?;

        self.stats.blas_count = count;
        self.stats.accels_built += 1;
        self.built_this_frame = Some(top.handle);
        Ok(TopLevel::Built(top.handle))
    }

    /// The top-level structure built this frame.
    pub fn request_top_level(&self) -> Option<AccelId> {
        self.built_this_frame
    }

    /// Keeps the current instance list until unfrozen.
    pub fn set_frozen(&mut self, frozen: bool) {
        if self.frozen != frozen {
            log::info!("AccelBuilder: instance list {}", if frozen { "frozen" } else { "unfrozen" });
        }
        self.frozen = frozen;
    }

    /// Whether the instance list is frozen.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Looks up an object.
    pub fn object(&self, id: ObjectId) -> Option<&ObjectAccel> {
        self.objects.get(id.0 as usize)
    }

    /// Looks up an object for modification.
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut ObjectAccel> {
        self.objects.get_mut(id.0 as usize)
    }

    /// Instances queued this frame.
    pub fn instance_count(&self) -> usize {
        self.draws.len()
    }

    /// Counters of the current frame.
    pub fn stats(&self) -> AccelStats {
        self.stats
    }

    /// Bytes still free in the storage pool.
    pub fn free_storage(&self) -> u64 {
        self.pool.free_bytes()
    }

    /// Scratch bytes still free this frame.
    pub fn free_scratch(&self) -> u64 {
        self.scratch.available()
    }

    fn refit_allowed(&self, device: &dyn AccelerationDevice) -> bool {
        self.settings.refit == RefitPolicy::RefitWhenSupported && device.supports_refit()
    }

    fn live_object(&self, id: ObjectId) -> Result<&ObjectAccel, AccelError> {
        self.objects
            .get(id.0 as usize)
            .filter(|o| o.state != AccelState::Destroyed)
            .ok_or(AccelError::UnknownObject(id))
    }

    fn live_object_mut(&mut self, id: ObjectId) -> Result<&mut ObjectAccel, AccelError> {
        self.objects
            .get_mut(id.0 as usize)
            .filter(|o| o.state != AccelState::Destroyed)
            .ok_or(AccelError::UnknownObject(id))
    }

    fn create(
        &mut self,
        device: &dyn AccelerationDevice,
        geometry: &AccelGeometry,
        sizes: AccelBuildSizes,
    ) -> Result<(AccelId, PoolBlock), AccelError> {
        let block = self
            .pool
            .allocate(sizes.accel_size, self.settings.storage_alignment)
            .ok_or_else(|| {
                log::error!(
                    "AccelBuilder: no storage block of {} bytes ({} free)",
                    sizes.accel_size,
                    self.pool.free_bytes()
                );
                AccelError::StorageExhausted {
                    requested: sizes.accel_size,
                }
            })?;
        let desc = AccelCreateDescriptor {
            kind: geometry.kind(),
            storage_offset: block.offset,
            size: sizes.accel_size,
        };
        match device.create_accel(&desc) {
            Ok(handle) => Ok((handle, block)),
            Err(err) => {
                self.pool.free(block);
                Err(err.into())
            }
        }
    }
}

fn new_pool(settings: &AccelSettings) -> FirstFitPool {
    FirstFitPool::new(
        settings.storage_budget,
        settings.expected_accels,
        settings.storage_alignment,
    )
}
