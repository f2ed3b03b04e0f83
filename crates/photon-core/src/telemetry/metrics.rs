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

//! Abstract definitions for renderer metrics.

use std::fmt::{self, Display};
use std::time::Instant;

/// Identifies a metric as `namespace.name`, e.g. `lights.dirty_cells`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricId {
    /// The subsystem reporting the metric (e.g., "lights", "accel").
    pub namespace: String,
    /// The metric's name inside the namespace.
    pub name: String,
}

impl MetricId {
    /// Creates a new `MetricId` with a namespace and a name.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

/// The fundamental type of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    /// A value that only ever increases or resets to zero.
    Counter,
    /// A value that can go up or down.
    Gauge,
}

/// The current value of a metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    /// Monotonic count.
    Counter(u64),
    /// Sampled value.
    Gauge(f64),
}

impl MetricValue {
    /// Returns the [`MetricType`] corresponding to this value.
    pub fn metric_type(&self) -> MetricType {
        match self {
            MetricValue::Counter(_) => MetricType::Counter,
            MetricValue::Gauge(_) => MetricType::Gauge,
        }
    }

    /// The value widened to `f64`.
    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Counter(v) => *v as f64,
            MetricValue::Gauge(v) => *v,
        }
    }
}

/// A metric with its description and latest value.
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric's unique identifier.
    pub id: MetricId,
    /// What the metric measures.
    pub description: String,
    /// Unit of measurement (e.g., "count", "KiB").
    pub unit: String,
    /// Latest value.
    pub value: MetricValue,
    /// When `value` was last written.
    pub last_updated: Instant,
}

impl Metric {
    /// Creates a metric holding `value`.
    pub fn new(
        id: MetricId,
        description: impl Into<String>,
        unit: impl Into<String>,
        value: MetricValue,
    ) -> Self {
        Self {
            id,
            description: description.into(),
            unit: unit.into(),
            value,
            last_updated: Instant::now(),
        }
    }

    /// The metric's type.
    pub fn metric_type(&self) -> MetricType {
        self.value.metric_type()
    }
}

/// A specialized `Result` type for metric-related operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// An error that can occur within the metrics system.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricsError {
    /// The requested metric was not found in the registry.
    MetricNotFound(MetricId),
    /// An operation was attempted on a metric of the wrong type.
    TypeMismatch {
        /// The expected metric type for the operation.
        expected: MetricType,
        /// The actual metric type that was found.
        found: MetricType,
    },
    /// An error originating from the backend storage layer.
    StorageError(String),
}

impl Display for MetricsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricsError::MetricNotFound(id) => write!(f, "Metric not found: {id}"),
            MetricsError::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {expected:?}, found {found:?}")
            }
            MetricsError::StorageError(msg) => write!(f, "Storage error: {msg}"),
        }
    }
}

impl std::error::Error for MetricsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_id_display() {
        let id = MetricId::new("lights", "dirty_cells");
        assert_eq!(id.to_string(), "lights.dirty_cells");
    }

    #[test]
    fn test_metric_value_types() {
        let counter = MetricValue::Counter(42);
        assert_eq!(counter.metric_type(), MetricType::Counter);
        assert_eq!(counter.as_f64(), 42.0);

        let gauge = MetricValue::Gauge(1.5);
        assert_eq!(gauge.metric_type(), MetricType::Gauge);
        assert_eq!(gauge.as_f64(), 1.5);
    }

    #[test]
    fn test_error_display() {
        let err = MetricsError::TypeMismatch {
            expected: MetricType::Gauge,
            found: MetricType::Counter,
        };
        assert_eq!(err.to_string(), "Type mismatch: expected Gauge, found Counter");
    }
}
