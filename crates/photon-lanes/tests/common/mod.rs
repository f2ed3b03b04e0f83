//! Recording stand-ins for the device traits, shared by the integration tests.

#![allow(dead_code)]

use photon_core::math::{Aabb, Vec3};
use photon_core::renderer::api::*;
use photon_core::renderer::clustering::LightBindings;
use photon_core::renderer::{
    AccelerationDevice, FenceStatus, FrameFence, RayOutput, RenderError, ResourceError,
    TransferChannel,
};
use photon_core::spatial::pvs::compress;
use photon_core::spatial::{BspMap, LeafBits, LeafIndex, MapLeaf, MapSurface, SpatialMap, SurfaceId};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Byte value of GPU memory nothing has written to.
pub const UNTOUCHED: u8 = 0xAA;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// `n` leaves of one cell each, in a row along +X, no visibility data.
/// Every leaf draws surface 0.
pub fn strip_map(n: usize) -> Arc<dyn SpatialMap> {
    let leaves = (0..n)
        .map(|i| MapLeaf {
            bounds: Aabb::from_min_max(
                Vec3::new(i as f32 * 128.0, 0.0, 0.0),
                Vec3::new((i + 1) as f32 * 128.0, 128.0, 128.0),
            ),
            compressed_pvs: None,
            marked_surfaces: vec![SurfaceId(0)],
        })
        .collect();
    let surfaces = vec![MapSurface {
        bounds: Aabb::from_min_max(Vec3::ZERO, Vec3::splat(8.0)),
        texture: "+0~light1".into(),
    }];
    Arc::new(BspMap::new("maps/strip.bsp", leaves, surfaces))
}

/// `n` one-cell leaves in a row along +X where each leaf sees only its
/// direct neighbours.
pub fn corridor_map(n: usize) -> Arc<dyn SpatialMap> {
    let leaves = (0..n)
        .map(|i| {
            let mut visible = LeafBits::new(n);
            let leaf = i as u32 + 1;
            for neighbour in [leaf - 1, leaf + 1] {
                if (1..=n as u32).contains(&neighbour) {
                    visible.insert(LeafIndex(neighbour));
                }
            }
            MapLeaf {
                bounds: Aabb::from_min_max(
                    Vec3::new(i as f32 * 128.0, 0.0, 0.0),
                    Vec3::new((i + 1) as f32 * 128.0, 128.0, 128.0),
                ),
                compressed_pvs: Some(compress(&visible, n)),
                marked_surfaces: Vec::new(),
            }
        })
        .collect();
    Arc::new(BspMap::new("maps/corridor.bsp", leaves, Vec::new()))
}

/// Center of leaf `i` (zero based) of [`strip_map`] or [`corridor_map`].
pub fn leaf_center(i: usize) -> Vec3 {
    Vec3::new(i as f32 * 128.0 + 64.0, 64.0, 64.0)
}

// --- Transfer ---

/// A transfer channel copying straight into a byte vector standing in for
/// the light buffer.
#[derive(Debug, Default)]
pub struct MockTransfer {
    /// Device memory, grown on demand and filled with [`UNTOUCHED`].
    pub gpu: Vec<u8>,
    /// Every submitted request, in order.
    pub writes: Vec<StagingRequest>,
    /// Staging bytes left; `None` for unlimited.
    pub budget: Option<u64>,
    staging: Vec<u8>,
    locked: Option<(StagingHandle, StagingRequest)>,
    next_handle: usize,
}

impl MockTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_budget(budget: u64) -> Self {
        Self {
            budget: Some(budget),
            ..Self::default()
        }
    }

    /// Bytes of one grid cell as last written.
    pub fn cluster(&self, bindings: &LightBindings, index: usize) -> &[u8] {
        let start = bindings.cluster_offset(index) as usize;
        let end = start + LightBindings::CLUSTER_SIZE as usize;
        &self.gpu[start.min(self.gpu.len())..end.min(self.gpu.len())]
    }

    /// Writes that targeted the cell array.
    pub fn cluster_writes(&self, bindings: &LightBindings) -> Vec<StagingRequest> {
        self.writes
            .iter()
            .filter(|w| w.offset >= bindings.grid.offset)
            .copied()
            .collect()
    }
}

impl TransferChannel for MockTransfer {
    fn lock_region(&mut self, request: StagingRequest) -> Result<StagingRegion<'_>, ResourceError> {
        if let Some(budget) = self.budget {
            if request.size > budget {
                return Err(ResourceError::ChannelExhausted {
                    requested: request.size,
                });
            }
            self.budget = Some(budget - request.size);
        }
        let handle = StagingHandle(self.next_handle);
        self.next_handle += 1;
        self.staging.clear();
        self.staging.resize(request.size as usize, 0xCD);
        self.locked = Some((handle, request));
        Ok(StagingRegion {
            handle,
            data: &mut self.staging,
        })
    }

    fn unlock(&mut self, handle: StagingHandle) -> Result<(), ResourceError> {
        let (locked, request) = self.locked.take().ok_or(ResourceError::InvalidHandle)?;
        if locked != handle {
            return Err(ResourceError::InvalidHandle);
        }
        let start = request.offset as usize;
        let end = start + request.size as usize;
        if self.gpu.len() < end {
            self.gpu.resize(end, UNTOUCHED);
        }
        self.gpu[start..end].copy_from_slice(&self.staging);
        self.writes.push(request);
        Ok(())
    }
}

// --- Acceleration device ---

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedBuild {
    pub mode: BuildMode,
    pub kind: AccelKind,
    pub dst: AccelId,
    pub src: Option<AccelId>,
    pub scratch: DeviceAddress,
    pub primitives: u64,
}

#[derive(Debug, Default)]
pub struct DeviceLog {
    pub creates: Vec<(AccelId, AccelCreateDescriptor)>,
    pub destroyed: Vec<AccelId>,
    pub builds: Vec<RecordedBuild>,
    pub instance_writes: Vec<(u32, Vec<GpuInstance>)>,
    next_id: usize,
}

/// Records every call. Sizes grow linearly with the primitive count.
#[derive(Debug)]
pub struct MockDevice {
    pub refit: bool,
    pub scratch_alignment: u64,
    pub log: Mutex<DeviceLog>,
}

pub const SCRATCH_BASE: u64 = 0x1000_0000;
pub const ACCEL_BASE: u64 = 0x2000_0000;

impl MockDevice {
    pub fn new(refit: bool) -> Self {
        Self {
            refit,
            scratch_alignment: 128,
            log: Mutex::new(DeviceLog::default()),
        }
    }

    pub fn builds(&self) -> Vec<RecordedBuild> {
        self.log.lock().unwrap().builds.clone()
    }

    pub fn create_count(&self) -> usize {
        self.log.lock().unwrap().creates.len()
    }

    pub fn destroyed(&self) -> Vec<AccelId> {
        self.log.lock().unwrap().destroyed.clone()
    }

    pub fn clear_builds(&self) {
        self.log.lock().unwrap().builds.clear();
    }
}

impl AccelerationDevice for MockDevice {
    fn build_sizes(
        &self,
        geometry: &AccelGeometry,
        allow_update: bool,
    ) -> Result<AccelBuildSizes, ResourceError> {
        let n = geometry.primitive_count();
        Ok(AccelBuildSizes {
            accel_size: 1024 + 256 * n,
            build_scratch_size: 512 + 64 * n,
            update_scratch_size: if allow_update { 128 + 16 * n } else { 0 },
        })
    }

    fn create_accel(&self, descriptor: &AccelCreateDescriptor) -> Result<AccelId, ResourceError> {
        let mut log = self.log.lock().unwrap();
        let id = AccelId(log.next_id);
        log.next_id += 1;
        log.creates.push((id, *descriptor));
        Ok(id)
    }

    fn destroy_accel(&self, id: AccelId) {
        self.log.lock().unwrap().destroyed.push(id);
    }

    fn accel_address(&self, id: AccelId) -> Result<DeviceAddress, ResourceError> {
        Ok(DeviceAddress(ACCEL_BASE + id.0 as u64 * 0x1_0000))
    }

    fn scratch_base(&self) -> DeviceAddress {
        DeviceAddress(SCRATCH_BASE)
    }

    fn record_build(&self, command: &AccelBuildCommand<'_>) -> Result<(), ResourceError> {
        self.log.lock().unwrap().builds.push(RecordedBuild {
            mode: command.mode,
            kind: command.geometry.kind(),
            dst: command.dst,
            src: command.src,
            scratch: command.scratch,
            primitives: command.geometry.primitive_count(),
        });
        Ok(())
    }

    fn write_instances(&self, first: u32, instances: &[GpuInstance]) -> Result<(), ResourceError> {
        self.log
            .lock()
            .unwrap()
            .instance_writes
            .push((first, instances.to_vec()));
        Ok(())
    }

    fn min_scratch_alignment(&self) -> u64 {
        self.scratch_alignment
    }

    fn supports_refit(&self) -> bool {
        self.refit
    }
}

pub fn triangles(count: u32) -> Vec<TriangleGeometry> {
    vec![TriangleGeometry {
        buffer: BufferId(7),
        vertex_offset: 0,
        vertex_stride: 12,
        max_vertex: count * 3,
        index_offset: None,
        primitive_count: count,
    }]
}

// --- Fence and output ---

#[derive(Debug)]
pub struct MockFence {
    pub signaled: bool,
    pub waits: Mutex<Vec<(usize, Duration)>>,
}

impl MockFence {
    pub fn signaled() -> Self {
        Self {
            signaled: true,
            waits: Mutex::new(Vec::new()),
        }
    }

    pub fn stuck() -> Self {
        Self {
            signaled: false,
            waits: Mutex::new(Vec::new()),
        }
    }
}

impl FrameFence for MockFence {
    fn wait(&self, slot: usize, timeout: Duration) -> Result<FenceStatus, ResourceError> {
        self.waits.lock().unwrap().push((slot, timeout));
        Ok(if self.signaled {
            FenceStatus::Signaled
        } else {
            FenceStatus::TimedOut
        })
    }
}

#[derive(Debug, Default)]
pub struct MockOutput {
    pub traced: Vec<(AccelId, LightBindings)>,
    pub forwarded: usize,
    /// Stands in for the output image; every trace writes a new value.
    pub image: u32,
}

impl RayOutput for MockOutput {
    fn trace(&mut self, tlas: AccelId, lights: &LightBindings) -> Result<(), RenderError> {
        self.traced.push((tlas, *lights));
        self.image = self.image.wrapping_add(1);
        Ok(())
    }

    fn forward_previous(&mut self) -> Result<(), RenderError> {
        self.forwarded += 1;
        Ok(())
    }
}
