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

//! Registry for managing metrics.

use crate::storage::{InMemoryBackend, MetricsBackend};
use photon_core::telemetry::{
    Metric, MetricId, MetricType, MetricValue, MetricsError, MetricsResult,
};
use std::sync::Arc;

/// Entry point of the metrics system.
///
/// Registration returns a typed handle that writes straight to the backend,
/// so the hot path never looks a metric up by name.
#[derive(Debug, Clone)]
pub struct MetricsRegistry {
    backend: Arc<dyn MetricsBackend>,
}

impl MetricsRegistry {
    /// Create a new metrics registry with the default in-memory backend
    pub fn new() -> Self {
        Self {
            backend: Arc::new(InMemoryBackend::new()),
        }
    }

    /// Create a new metrics registry with a custom backend
    pub fn with_backend(backend: Arc<dyn MetricsBackend>) -> Self {
        Self { backend }
    }

    /// Register a counter starting at zero
    pub fn register_counter(
        &self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> MetricsResult<CounterHandle> {
        let id = MetricId::new(namespace, name);
        self.backend.put_metric(Metric::new(
            id.clone(),
            description,
            "count",
            MetricValue::Counter(0),
        ))?;
        Ok(CounterHandle {
            id,
            backend: self.backend.clone(),
        })
    }

    /// Register a gauge starting at zero
    pub fn register_gauge(
        &self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        unit: impl Into<String>,
    ) -> MetricsResult<GaugeHandle> {
        let id = MetricId::new(namespace, name);
        self.backend.put_metric(Metric::new(
            id.clone(),
            description,
            unit,
            MetricValue::Gauge(0.0),
        ))?;
        Ok(GaugeHandle {
            id,
            backend: self.backend.clone(),
        })
    }

    /// Get a metric by ID
    pub fn get_metric(&self, id: &MetricId) -> MetricsResult<Metric> {
        self.backend.get_metric(id)
    }

    /// Check if a metric exists
    pub fn contains_metric(&self, id: &MetricId) -> bool {
        self.backend.contains_metric(id)
    }

    /// All metrics, sorted by ID
    pub fn snapshot(&self) -> Vec<Metric> {
        self.backend.list_all_metrics()
    }

    /// Get the total number of metrics
    pub fn metric_count(&self) -> usize {
        self.backend.metric_count()
    }

    /// Clear all metrics
    pub fn clear_all(&self) -> MetricsResult<()> {
        self.backend.clear_all()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for counter updates
#[derive(Debug, Clone)]
pub struct CounterHandle {
    id: MetricId,
    backend: Arc<dyn MetricsBackend>,
}

impl CounterHandle {
    /// Increment the counter by 1
    pub fn increment(&self) -> MetricsResult<u64> {
        self.backend.increment_counter(&self.id, 1)
    }

    /// Increment the counter by a specific amount
    pub fn increment_by(&self, amount: u64) -> MetricsResult<u64> {
        self.backend.increment_counter(&self.id, amount)
    }

    /// Get the current counter value
    pub fn get(&self) -> MetricsResult<u64> {
        match self.backend.get_metric(&self.id)?.value {
            MetricValue::Counter(v) => Ok(v),
            other => Err(MetricsError::TypeMismatch {
                expected: MetricType::Counter,
                found: other.metric_type(),
            }),
        }
    }

    /// Get the metric ID
    pub fn id(&self) -> &MetricId {
        &self.id
    }
}

/// Handle for gauge updates
#[derive(Debug, Clone)]
pub struct GaugeHandle {
    id: MetricId,
    backend: Arc<dyn MetricsBackend>,
}

impl GaugeHandle {
    /// Set the gauge to a specific value
    pub fn set(&self, value: f64) -> MetricsResult<()> {
        self.backend.set_gauge(&self.id, value)
    }

    /// Get the current gauge value
    pub fn get(&self) -> MetricsResult<f64> {
        match self.backend.get_metric(&self.id)?.value {
            MetricValue::Gauge(v) => Ok(v),
            other => Err(MetricsError::TypeMismatch {
                expected: MetricType::Gauge,
                found: other.metric_type(),
            }),
        }
    }

    /// Get the metric ID
    pub fn id(&self) -> &MetricId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_handle() {
        let registry = MetricsRegistry::new();
        let built = registry
            .register_counter("accel", "accels_built", "Structures built")
            .unwrap();
        built.increment().unwrap();
        assert_eq!(built.increment_by(4).unwrap(), 5);
        assert_eq!(built.get().unwrap(), 5);
    }

    #[test]
    fn test_gauge_handle_and_snapshot() {
        let registry = MetricsRegistry::new();
        let dirty = registry
            .register_gauge("lights", "dirty_cells", "Cells uploaded", "count")
            .unwrap();
        let blas = registry
            .register_gauge("accel", "blas_count", "Bottom-level structures", "count")
            .unwrap();
        dirty.set(17.0).unwrap();
        blas.set(3.0).unwrap();

        let names: Vec<String> = registry.snapshot().iter().map(|m| m.id.to_string()).collect();
        assert_eq!(names, vec!["accel.blas_count", "lights.dirty_cells"]);
        assert_eq!(dirty.get().unwrap(), 17.0);
    }

    #[test]
    fn test_type_mismatch_between_handles() {
        let registry = MetricsRegistry::new();
        let counter = registry.register_counter("a", "b", "").unwrap();
        let backend_err = registry
            .backend
            .set_gauge(counter.id(), 1.0)
            .unwrap_err();
        assert_eq!(
            backend_err,
            MetricsError::TypeMismatch {
                expected: MetricType::Gauge,
                found: MetricType::Counter
            }
        );
    }
}
