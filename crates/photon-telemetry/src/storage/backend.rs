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

use photon_core::telemetry::{
    Metric, MetricId, MetricType, MetricValue, MetricsError, MetricsResult,
};
use std::fmt::Debug;
use std::time::Instant;

/// Trait defining the interface for metrics storage backends
pub trait MetricsBackend: Send + Sync + Debug + 'static {
    /// Store or replace a metric
    fn put_metric(&self, metric: Metric) -> MetricsResult<()>;

    /// Retrieve a metric by ID
    fn get_metric(&self, id: &MetricId) -> MetricsResult<Metric>;

    /// Check if a metric exists
    fn contains_metric(&self, id: &MetricId) -> bool;

    /// Get all metrics, sorted by ID
    fn list_all_metrics(&self) -> Vec<Metric>;

    /// Clear all metrics
    fn clear_all(&self) -> MetricsResult<()>;

    /// Get the number of metrics stored
    fn metric_count(&self) -> usize;

    /// Increment a counter by the given amount, returning the new value
    fn increment_counter(&self, id: &MetricId, delta: u64) -> MetricsResult<u64> {
        let mut metric = self.get_metric(id)?;
        match metric.value {
            MetricValue::Counter(value) => {
                let next = value.saturating_add(delta);
                metric.value = MetricValue::Counter(next);
                metric.last_updated = Instant::now();
                self.put_metric(metric)?;
                Ok(next)
            }
            found => Err(MetricsError::TypeMismatch {
                expected: MetricType::Counter,
                found: found.metric_type(),
            }),
        }
    }

    /// Set a gauge value
    fn set_gauge(&self, id: &MetricId, value: f64) -> MetricsResult<()> {
        let mut metric = self.get_metric(id)?;
        match metric.value {
            MetricValue::Gauge(_) => {
                metric.value = MetricValue::Gauge(value);
                metric.last_updated = Instant::now();
                self.put_metric(metric)
            }
            found => Err(MetricsError::TypeMismatch {
                expected: MetricType::Gauge,
                found: found.metric_type(),
            }),
        }
    }
}
