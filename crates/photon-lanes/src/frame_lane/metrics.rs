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

//! Per-frame counters published to the metrics registry.

use super::context::FrameReport;
use photon_telemetry::{CounterHandle, GaugeHandle, MetricsRegistry};
use photon_core::telemetry::MetricsResult;

/// Gauges of the lighting and acceleration lanes.
#[derive(Debug, Clone)]
pub struct RtMetrics {
    frames: CounterHandle,
    dirty_cells: GaugeHandle,
    dirty_cells_size: GaugeHandle,
    ranges_uploaded: GaugeHandle,
    blas_count: GaugeHandle,
    accels_built: GaugeHandle,
}

impl RtMetrics {
    /// Registers every metric in `registry`.
    pub fn register(registry: &MetricsRegistry) -> MetricsResult<Self> {
        Ok(Self {
            frames: registry.register_counter("frame", "frames", "Frames completed")?,
            dirty_cells: registry.register_gauge(
                "lights",
                "dirty_cells",
                "Grid cells uploaded this frame",
                "count",
            )?,
            dirty_cells_size: registry.register_gauge(
                "lights",
                "dirty_cells_size",
                "Size of the grid cells uploaded this frame",
                "KiB",
            )?,
            ranges_uploaded: registry.register_gauge(
                "lights",
                "ranges_uploaded",
                "Staging writes for grid cells this frame",
                "count",
            )?,
            blas_count: registry.register_gauge(
                "accel",
                "blas_count",
                "Instances in the top-level structure",
                "count",
            )?,
            accels_built: registry.register_gauge(
                "accel",
                "accels_built",
                "Structures built or refit this frame",
                "count",
            )?,
        })
    }

    /// Writes a frame's counters. Failures are logged and otherwise ignored.
    pub fn publish(&self, report: &FrameReport) {
        let results = [
            self.frames.increment().map(drop),
            self.dirty_cells.set(report.lights.dirty_cells as f64),
            self.dirty_cells_size.set(f64::from(report.lights.dirty_cells_kib)),
            self.ranges_uploaded.set(report.ranges_uploaded as f64),
            self.blas_count.set(f64::from(report.accel.blas_count)),
            self.accels_built.set(f64::from(report.accel.accels_built)),
        ];
        for err in results.into_iter().filter_map(Result::err) {
            log::warn!("RtMetrics: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel_lane::{AccelStats, TopLevel};
    use crate::light_lane::LightFrameStats;
    use photon_core::telemetry::MetricId;

    #[test]
    fn test_publish_sets_gauges() {
        let registry = MetricsRegistry::new();
        let metrics = RtMetrics::register(&registry).unwrap();
        let report = FrameReport {
            frame_index: 0,
            lights: LightFrameStats {
                dirty_cells: 4,
                dirty_cells_kib: 1.125,
                ..LightFrameStats::default()
            },
            ranges_uploaded: 2,
            top_level: TopLevel::Skipped,
            accel: AccelStats {
                blas_count: 0,
                accels_built: 3,
            },
        };
        metrics.publish(&report);
        metrics.publish(&report);

        let gauge = |ns: &str, name: &str| {
            registry
                .get_metric(&MetricId::new(ns, name))
                .unwrap()
                .value
                .as_f64()
        };
        assert_eq!(gauge("lights", "dirty_cells"), 4.0);
        assert_eq!(gauge("lights", "dirty_cells_size"), 1.125);
        assert_eq!(gauge("lights", "ranges_uploaded"), 2.0);
        assert_eq!(gauge("accel", "accels_built"), 3.0);
        assert_eq!(gauge("frame", "frames"), 2.0);
        assert_eq!(registry.metric_count(), 6);
    }
}
