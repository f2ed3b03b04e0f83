mod common;

use common::*;
use photon_core::math::{Aabb, Vec3};
use photon_core::renderer::api::BufferId;
use photon_core::renderer::clustering::{GpuLightCluster, LightBindings, MAX_ADDRESSABLE_POLYGONS};
use photon_core::renderer::{LightSettings, RenderError};
use photon_core::spatial::{BspMap, MapLeaf, SurfaceId};
use photon_lanes::light_lane::{
    LightDescriptor, LightRegistry, LightUploader, PolygonDescriptor, PolygonSource,
};
use std::collections::HashMap;
use std::sync::Arc;

fn no_annotations() -> HashMap<String, String> {
    HashMap::new()
}

fn read_cluster(transfer: &MockTransfer, bindings: &LightBindings, index: usize) -> GpuLightCluster {
    bytemuck::pod_read_unaligned(transfer.cluster(bindings, index))
}

fn white_light(i: usize) -> LightDescriptor {
    LightDescriptor::point(leaf_center(i), Vec3::splat(255.0), 50.0)
}

fn triangle(x: f32) -> [Vec3; 3] {
    [
        Vec3::new(x, 10.0, 10.0),
        Vec3::new(x, 20.0, 10.0),
        Vec3::new(x, 10.0, 20.0),
    ]
}

#[test]
fn test_only_changed_cells_are_uploaded() {
    init_logging();
    let mut registry = LightRegistry::new(LightSettings::default());
    registry.begin_map_load(corridor_map(6), &no_annotations()).unwrap();
    registry.add_static_light(&white_light(0)).unwrap();
    registry.end_map_load().unwrap();

    let mut uploader = LightUploader::new(BufferId(3));
    let mut transfer = MockTransfer::new();
    let bindings = uploader.bindings();

    // First frame: the whole grid goes up.
    registry.begin_frame().unwrap();
    let stats = registry.end_frame();
    assert_eq!(stats.dirty_cells, 6);
    uploader.upload(&mut registry, &mut transfer).unwrap();
    assert_eq!(uploader.last_ranges(), &[0..6]);
    let static_cell = read_cluster(&transfer, &bindings, 0);
    assert_eq!(static_cell.num_point_lights, 1);
    assert_eq!(static_cell.point_lights[0], 0);
    assert_eq!(read_cluster(&transfer, &bindings, 1).num_point_lights, 1);
    assert_eq!(read_cluster(&transfer, &bindings, 2).num_point_lights, 0);

    // Second frame: a dynamic light in leaf 5 reaches cells 3, 4 and 5.
    let before: Vec<u8> = transfer.cluster(&bindings, 0).to_vec();
    transfer.writes.clear();
    registry.begin_frame().unwrap();
    registry.add_dynamic_light(&white_light(4)).unwrap();
    let stats = registry.end_frame();
    assert_eq!(stats.dirty_cells, 3);
    assert_eq!(stats.newly_dirty_cells, 3);
    uploader.upload(&mut registry, &mut transfer).unwrap();
    assert_eq!(uploader.last_ranges(), &[3..6]);

    let cluster_writes = transfer.cluster_writes(&bindings);
    assert_eq!(cluster_writes.len(), 1);
    assert_eq!(cluster_writes[0].offset, bindings.cluster_offset(3));
    assert_eq!(cluster_writes[0].size, 3 * LightBindings::CLUSTER_SIZE);
    assert_eq!(transfer.cluster(&bindings, 0), &before[..]);
    let dynamic_cell = read_cluster(&transfer, &bindings, 4);
    assert_eq!(dynamic_cell.num_point_lights, 1);
    assert_eq!(dynamic_cell.point_lights[0], 1);

    // Third frame: the dynamic light is gone, so the same cells go up empty.
    transfer.writes.clear();
    registry.begin_frame().unwrap();
    registry.end_frame();
    uploader.upload(&mut registry, &mut transfer).unwrap();
    assert_eq!(uploader.last_ranges(), &[3..6]);
    assert_eq!(read_cluster(&transfer, &bindings, 4).num_point_lights, 0);

    // Fourth frame: nothing changed, only the metadata block is written.
    transfer.writes.clear();
    registry.begin_frame().unwrap();
    registry.end_frame();
    uploader.upload(&mut registry, &mut transfer).unwrap();
    assert!(uploader.last_ranges().is_empty());
    assert_eq!(transfer.writes.len(), 1);
    assert_eq!(transfer.writes[0].offset, bindings.metadata.offset);
    assert_eq!(transfer.writes[0].size, LightBindings::METADATA_SIZE);
}

#[test]
fn test_rebuilding_frames_gives_identical_cells() {
    init_logging();
    let mut registry = LightRegistry::new(LightSettings::default());
    registry.begin_map_load(corridor_map(5), &no_annotations()).unwrap();
    registry.add_static_light(&white_light(2)).unwrap();
    registry.end_map_load().unwrap();

    let snapshot = |registry: &LightRegistry| -> Vec<(Vec<u8>, Vec<u8>)> {
        registry
            .grid()
            .unwrap()
            .cells()
            .iter()
            .map(|c| (c.point_lights().to_vec(), c.polygons().to_vec()))
            .collect()
    };

    let mut frames = Vec::new();
    for _ in 0..3 {
        registry.begin_frame().unwrap();
        registry.add_dynamic_light(&white_light(0)).unwrap();
        registry.add_flashlight(leaf_center(4), Vec3::new(1.0, 0.0, 0.0), true).unwrap();
        registry.end_frame();
        frames.push(snapshot(&registry));
    }
    assert_eq!(frames[0], frames[1]);
    assert_eq!(frames[1], frames[2]);

    // Cell 0 sees the dynamic light at index 1 only; cell 3 has the static
    // light and the flashlight.
    assert_eq!(frames[0][0].0, vec![1]);
    assert_eq!(frames[0][3].0, vec![0, 2]);
    assert_eq!(registry.point_lights().len(), 3);
    assert_eq!(registry.static_counts().point_lights, 1);
}

#[test]
fn test_light_counted_once_per_cell() {
    init_logging();
    // Four thin leaves all inside cell 0.
    let leaves = (0..4)
        .map(|i| MapLeaf {
            bounds: Aabb::from_min_max(
                Vec3::new(i as f32 * 32.0, 0.0, 0.0),
                Vec3::new((i + 1) as f32 * 32.0, 128.0, 128.0),
            ),
            ..Default::default()
        })
        .collect();
    let map = Arc::new(BspMap::new("maps/thin.bsp", leaves, Vec::new()));
    let mut registry = LightRegistry::new(LightSettings::default());
    registry.begin_map_load(map, &no_annotations()).unwrap();
    registry
        .add_static_light(&LightDescriptor::point(Vec3::splat(16.0), Vec3::splat(200.0), 10.0))
        .unwrap();
    registry.end_map_load().unwrap();

    let grid = registry.grid().unwrap();
    assert_eq!(grid.cell_count(), 1);
    assert_eq!(grid.cells()[0].point_lights(), &[0]);
}

#[test]
fn test_polygon_overflow_is_clamped_with_one_message() {
    init_logging();
    let mut registry = LightRegistry::new(LightSettings::default());
    registry.begin_map_load(strip_map(2), &no_annotations()).unwrap();
    let add = |registry: &mut LightRegistry, i: usize| {
        let vertices = triangle(i as f32 * 0.5);
        registry
            .add_emissive_polygon(&PolygonDescriptor {
                vertices: &vertices,
                transform: None,
                emissive: Vec3::splat(1.0),
                source: PolygonSource::Static(SurfaceId(0)),
                label: None,
            })
            .unwrap();
    };
    for i in 0..200 {
        add(&mut registry, i);
    }
    registry.end_map_load().unwrap();

    for _ in 0..2 {
        registry.begin_frame().unwrap();
        for i in 200..256 {
            add(&mut registry, i);
        }
        let stats = registry.end_frame();
        assert_eq!(stats.polygons, MAX_ADDRESSABLE_POLYGONS);
        assert_eq!(registry.polygon_vertices().len(), MAX_ADDRESSABLE_POLYGONS * 3);
    }

    let clamp = &registry.diagnostics().polygon_clamp;
    assert_eq!(clamp.emitted(), 1);
    assert_eq!(clamp.suppressed(), 1);

    // The static baseline survives the clamp.
    registry.begin_frame().unwrap();
    assert_eq!(registry.polygons().len(), 200);
    assert_eq!(registry.polygon_vertices().len(), 600);
}

#[test]
fn test_upload_without_staging_space_fails() {
    init_logging();
    let mut registry = LightRegistry::new(LightSettings::default());
    registry.begin_map_load(strip_map(2), &no_annotations()).unwrap();
    registry.end_map_load().unwrap();
    registry.begin_frame().unwrap();
    registry.end_frame();

    let mut uploader = LightUploader::new(BufferId(0));
    let mut transfer = MockTransfer::with_budget(LightBindings::METADATA_SIZE);
    let err = uploader.upload(&mut registry, &mut transfer).unwrap_err();
    assert!(matches!(
        err,
        RenderError::TransferChannelExhausted { requested } if requested == 2 * LightBindings::CLUSTER_SIZE
    ));
}

#[test]
fn test_upload_before_map_load() {
    let mut registry = LightRegistry::new(LightSettings::default());
    let mut uploader = LightUploader::new(BufferId(0));
    let mut transfer = MockTransfer::new();
    assert!(matches!(
        uploader.upload(&mut registry, &mut transfer),
        Err(RenderError::NotInitialized)
    ));
    assert!(transfer.writes.is_empty());
}
