mod common;

use approx::assert_relative_eq;
use common::*;
use photon_core::io::DirectoryTextSource;
use photon_core::math::{RowTransform, Vec3};
use photon_core::renderer::api::BufferId;
use photon_core::renderer::{RayTracingSettings, RenderError};
use photon_core::telemetry::MetricId;
use photon_lanes::accel_lane::{EntityId, InstanceDraw, ObjectDescriptor, PreviousTransform, RenderMode, TopLevel};
use photon_lanes::config;
use photon_lanes::frame_lane::{RtContext, RtMetrics};
use photon_lanes::light_lane::{LightDescriptor, RegistryPhase};
use photon_telemetry::MetricsRegistry;
use std::collections::HashMap;
use std::fs;
use std::time::Duration;

fn loaded_context(settings: RayTracingSettings, device: &MockDevice) -> RtContext {
    let mut ctx = RtContext::new(settings, BufferId(1));
    ctx.load_map(corridor_map(6), &HashMap::<String, String>::new(), device)
        .unwrap();
    ctx
}

#[test]
fn test_three_lights_end_to_end() {
    init_logging();
    let device = MockDevice::new(false);
    let fence = MockFence::signaled();
    let mut transfer = MockTransfer::new();
    let mut output = MockOutput::default();
    let mut ctx = loaded_context(RayTracingSettings::default(), &device);

    let lights = [
        LightDescriptor::point(leaf_center(0), Vec3::new(255.0, 200.0, 150.0), 60.0),
        LightDescriptor::spot(
            leaf_center(3),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::splat(255.0),
            20.0,
            35.0,
        )
        .with_label("spot"),
        LightDescriptor::point(leaf_center(5), Vec3::splat(100.0), 0.0).with_style(1),
    ];
    assert_eq!(ctx.lights_mut().add_static_lights(&lights), 3);
    ctx.finish_map_load().unwrap();
    assert_eq!(ctx.lights().phase(), RegistryPhase::Ready);

    ctx.begin_frame(&fence).unwrap();
    let id = ctx.accel_mut().register_object(ObjectDescriptor {
        label: Some("crate".into()),
        geometry: triangles(12),
        dynamic: false,
    });
    ctx.accel_mut().build_object(&device, id).unwrap();
    ctx.accel_mut()
        .add_instance(InstanceDraw {
            object: id,
            transform: RowTransform::IDENTITY,
            custom_index: 0,
            material: RenderMode::Normal.into(),
        })
        .unwrap();
    ctx.lights_mut().apply_light_styles(&[255.0, 0.0]);
    let report = ctx.end_frame(&mut transfer, &device, &mut output).unwrap();

    assert_eq!(report.frame_index, 0);
    assert_eq!(report.lights.point_lights, 3);
    assert_eq!(report.lights.dirty_cells, 6);
    assert_eq!(report.ranges_uploaded, 1);
    assert_eq!(report.accel.blas_count, 1);
    assert_eq!(report.accel.accels_built, 2);

    let TopLevel::Built(tlas) = report.top_level else {
        panic!("expected a top level, got {:?}", report.top_level);
    };
    assert_eq!(output.traced, vec![(tlas, ctx.uploader().bindings())]);
    assert_eq!(output.image, 1);
    assert_eq!(output.forwarded, 0);

    // The styled light is switched off; the others keep their color.
    let uploaded = ctx.lights().point_lights();
    assert_eq!(uploaded[2].color, Vec3::ZERO);
    assert_ne!(uploaded[0].color, Vec3::ZERO);

    // Cell 4 sees the spot light (leaf 4 neighbours leaf 5) and the styled
    // light in leaf 6.
    let cell = &ctx.lights().grid().unwrap().cells()[4];
    assert_eq!(cell.point_lights(), &[1, 2]);

    // The next frame uploads nothing new.
    ctx.begin_frame(&fence).unwrap();
    let report = ctx.end_frame(&mut transfer, &device, &mut output).unwrap();
    assert_eq!(report.frame_index, 1);
    assert_eq!(report.ranges_uploaded, 0);
    assert_eq!(report.top_level, TopLevel::Skipped);
    assert_eq!(output.forwarded, 1);
    assert_eq!(ctx.frame_index(), 2);
}

#[test]
fn test_frame_without_instances_forwards_previous_image() {
    init_logging();
    let device = MockDevice::new(false);
    let fence = MockFence::signaled();
    let mut ctx = loaded_context(RayTracingSettings::default(), &device);
    ctx.finish_map_load().unwrap();
    let mut transfer = MockTransfer::new();
    let mut output = MockOutput {
        image: 0xC0FFEE,
        ..MockOutput::default()
    };

    ctx.begin_frame(&fence).unwrap();
    let report = ctx.end_frame(&mut transfer, &device, &mut output).unwrap();
    assert_eq!(report.top_level, TopLevel::Skipped);
    assert!(output.traced.is_empty());
    assert_eq!(output.forwarded, 1);
    assert_eq!(output.image, 0xC0FFEE);
    // Lights are still uploaded.
    assert!(!transfer.writes.is_empty());
}

#[test]
fn test_fence_slots_cycle_and_timeout_fails() {
    init_logging();
    let device = MockDevice::new(false);
    let settings =
        config::from_ron_str("(frame: (frames_in_flight: 3, fence_timeout_ms: 50))").unwrap();
    let mut ctx = loaded_context(settings, &device);
    ctx.finish_map_load().unwrap();

    let fence = MockFence::signaled();
    let mut transfer = MockTransfer::new();
    let mut output = MockOutput::default();
    for _ in 0..4 {
        ctx.begin_frame(&fence).unwrap();
        ctx.end_frame(&mut transfer, &device, &mut output).unwrap();
    }
    let slots: Vec<usize> = fence.waits.lock().unwrap().iter().map(|w| w.0).collect();
    assert_eq!(slots, vec![0, 1, 2, 0]);

    let stuck = MockFence::stuck();
    let err = ctx.begin_frame(&stuck).unwrap_err();
    assert!(matches!(
        err,
        RenderError::DeviceTimeout { waited } if waited == Duration::from_millis(50)
    ));
    assert_eq!(stuck.waits.lock().unwrap()[0], (1, Duration::from_millis(50)));
}

#[test]
fn test_frame_before_map_is_rejected() {
    let mut ctx = RtContext::new(RayTracingSettings::default(), BufferId(1));
    let fence = MockFence::signaled();
    assert!(matches!(
        ctx.begin_frame(&fence),
        Err(RenderError::NotInitialized)
    ));
}

#[test]
fn test_annotations_load_from_directory() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let maps = dir.path().join("maps");
    fs::create_dir_all(&maps).unwrap();
    fs::write(
        maps.join("lights.rad"),
        "+0~light1 255 128 0 255\n~dark 40 40 40\n",
    )
    .unwrap();
    fs::write(maps.join("strip.rad"), "~sky 100\n~dark 0 0 0\n").unwrap();

    let device = MockDevice::new(false);
    let mut ctx = RtContext::new(RayTracingSettings::default(), BufferId(1));
    ctx.load_map(strip_map(2), &DirectoryTextSource::new(dir.path()), &device)
        .unwrap();

    let light = ctx.lights().emissive_for_texture("+0~Light1").unwrap();
    assert_relative_eq!(light.x, 25.5, epsilon = 1e-4);
    assert_relative_eq!(light.y, 12.8, epsilon = 1e-4);
    assert_relative_eq!(light.z, 0.0);

    let sky = ctx.lights().emissive_for_texture("~sky").unwrap();
    assert_relative_eq!(sky.x, 10.0, epsilon = 1e-4);
    assert_eq!(ctx.lights().emissive_for_texture("~dark"), None);
}

#[test]
fn test_metrics_follow_the_frame() {
    init_logging();
    let registry = MetricsRegistry::new();
    let device = MockDevice::new(false);
    let mut ctx = loaded_context(RayTracingSettings::default(), &device)
        .with_metrics(RtMetrics::register(&registry).unwrap());
    ctx.finish_map_load().unwrap();

    let fence = MockFence::signaled();
    let mut transfer = MockTransfer::new();
    let mut output = MockOutput::default();
    ctx.begin_frame(&fence).unwrap();
    ctx.lights_mut()
        .add_dlight(&photon_lanes::light_lane::DynamicLight {
            origin: leaf_center(2),
            color: Vec3::splat(200.0),
            radius: 200.0,
        })
        .unwrap();
    let report = ctx.end_frame(&mut transfer, &device, &mut output).unwrap();

    let gauge = |ns: &str, name: &str| {
        registry
            .get_metric(&MetricId::new(ns, name))
            .unwrap()
            .value
            .as_f64()
    };
    assert_eq!(gauge("lights", "dirty_cells"), report.lights.dirty_cells as f64);
    assert_eq!(gauge("lights", "ranges_uploaded"), 1.0);
    assert_eq!(gauge("accel", "blas_count"), 0.0);
    assert_eq!(gauge("frame", "frames"), 1.0);
}

#[test]
fn test_transform_history_spans_one_frame() {
    init_logging();
    let device = MockDevice::new(false);
    let fence = MockFence::signaled();
    let mut ctx = loaded_context(RayTracingSettings::default(), &device);
    ctx.finish_map_load().unwrap();
    let mut transfer = MockTransfer::new();
    let mut output = MockOutput::default();

    let entity = EntityId(42);
    let moved = RowTransform::from_translation(Vec3::new(1.0, 2.0, 3.0));
    ctx.begin_frame(&fence).unwrap();
    ctx.history_mut().record(entity, moved);
    assert_eq!(ctx.history().previous(entity), PreviousTransform::NotFound);
    ctx.end_frame(&mut transfer, &device, &mut output).unwrap();

    ctx.begin_frame(&fence).unwrap();
    assert_eq!(ctx.history().previous(entity), PreviousTransform::Found(moved));
    ctx.end_frame(&mut transfer, &device, &mut output).unwrap();
    assert_eq!(ctx.history().previous(entity), PreviousTransform::NotFound);
}
