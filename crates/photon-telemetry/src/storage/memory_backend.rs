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

use crate::storage::backend::MetricsBackend;
use photon_core::telemetry::{Metric, MetricId, MetricsError, MetricsResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory metrics backend using `RwLock<HashMap>`.
///
/// Readers never block each other; a poisoned lock surfaces as
/// [`MetricsError::StorageError`] on writes and as an empty view on reads.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    storage: RwLock<HashMap<MetricId, Metric>>,
}

impl InMemoryBackend {
    /// Create a new in-memory backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Metrics of one namespace, sorted by ID
    pub fn metrics_in_namespace(&self, namespace: &str) -> Vec<Metric> {
        let mut out: Vec<Metric> = match self.storage.read() {
            Ok(storage) => storage
                .values()
                .filter(|m| m.id.namespace == namespace)
                .cloned()
                .collect(),
            Err(_) => Vec::new(),
        };
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }
}

fn lock_error() -> MetricsError {
    MetricsError::StorageError("metrics storage lock poisoned".to_string())
}

impl MetricsBackend for InMemoryBackend {
    fn put_metric(&self, metric: Metric) -> MetricsResult<()> {
        let mut storage = self.storage.write().map_err(|_| lock_error())?;
        storage.insert(metric.id.clone(), metric);
        Ok(())
    }

    fn get_metric(&self, id: &MetricId) -> MetricsResult<Metric> {
        let storage = self.storage.read().map_err(|_| lock_error())?;
        storage
            .get(id)
            .cloned()
            .ok_or_else(|| MetricsError::MetricNotFound(id.clone()))
    }

    fn contains_metric(&self, id: &MetricId) -> bool {
        self.storage
            .read()
            .map(|s| s.contains_key(id))
            .unwrap_or(false)
    }

    fn list_all_metrics(&self) -> Vec<Metric> {
        let mut out: Vec<Metric> = match self.storage.read() {
            Ok(storage) => storage.values().cloned().collect(),
            Err(_) => Vec::new(),
        };
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    fn clear_all(&self) -> MetricsResult<()> {
        self.storage.write().map_err(|_| lock_error())?.clear();
        Ok(())
    }

    fn metric_count(&self) -> usize {
        self.storage.read().map(|s| s.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photon_core::telemetry::MetricValue;
    use std::sync::Arc;
    use std::thread;

    fn gauge(ns: &str, name: &str) -> Metric {
        Metric::new(MetricId::new(ns, name), "test", "count", MetricValue::Gauge(0.0))
    }

    #[test]
    fn test_put_get_and_namespace_filter() {
        let backend = InMemoryBackend::new();
        backend.put_metric(gauge("lights", "dirty_cells")).unwrap();
        backend.put_metric(gauge("accel", "blas_count")).unwrap();
        backend.put_metric(gauge("lights", "ranges_uploaded")).unwrap();

        assert_eq!(backend.metric_count(), 3);
        let lights = backend.metrics_in_namespace("lights");
        assert_eq!(lights.len(), 2);
        assert_eq!(lights[0].id.name, "dirty_cells");

        backend.set_gauge(&MetricId::new("accel", "blas_count"), 12.0).unwrap();
        let value = backend
            .get_metric(&MetricId::new("accel", "blas_count"))
            .unwrap()
            .value;
        assert_eq!(value, MetricValue::Gauge(12.0));
    }

    #[test]
    fn test_concurrent_counter_increments() {
        let backend = Arc::new(InMemoryBackend::new());
        let id = MetricId::new("accel", "accels_built");
        backend
            .put_metric(Metric::new(id.clone(), "", "count", MetricValue::Counter(0)))
            .unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let backend = backend.clone();
                let id = id.clone();
                thread::spawn(move || {
                    for _ in 0..10 {
                        // Read-modify-write is not atomic; only check the value type.
                        let _ = backend.increment_counter(&id, 1);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let metric = backend.get_metric(&id).unwrap();
        assert!(matches!(metric.value, MetricValue::Counter(n) if (1..=40).contains(&n)));
    }

    #[test]
    fn test_clear_all() {
        let backend = InMemoryBackend::new();
        backend.put_metric(gauge("lights", "dirty_cells")).unwrap();
        backend.clear_all().unwrap();
        assert_eq!(backend.metric_count(), 0);
        assert!(!backend.contains_metric(&MetricId::new("lights", "dirty_cells")));
    }
}
