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

//! Previous-frame transforms for motion vectors.

use ahash::AHashMap;
use photon_core::math::RowTransform;

/// Identifies an entity across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// Result of looking up last frame's transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PreviousTransform {
    /// The entity was recorded last frame.
    Found(RowTransform),
    /// The entity is new this frame.
    NotFound,
}

/// Current and previous world transform per entity.
#[derive(Debug, Clone, Default)]
pub struct TransformHistory {
    current: AHashMap<EntityId, RowTransform>,
    previous: AHashMap<EntityId, RowTransform>,
}

impl TransformHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records this frame's transform of `entity`.
    pub fn record(&mut self, entity: EntityId, transform: RowTransform) {
        self.current.insert(entity, transform);
    }

    /// Last frame's transform of `entity`.
    pub fn previous(&self, entity: EntityId) -> PreviousTransform {
        match self.previous.get(&entity) {
            Some(t) => PreviousTransform::Found(*t),
            None => PreviousTransform::NotFound,
        }
    }

    /// Last frame's transform, or `current` for an entity that just appeared.
    pub fn previous_or(&self, entity: EntityId, current: &RowTransform) -> RowTransform {
        match self.previous(entity) {
            PreviousTransform::Found(t) => t,
            PreviousTransform::NotFound => *current,
        }
    }

    /// Makes this frame's transforms the previous ones.
    pub fn end_frame(&mut self) {
        std::mem::swap(&mut self.current, &mut self.previous);
        self.current.clear();
    }

    /// Forgets an entity.
    pub fn remove(&mut self, entity: EntityId) {
        self.current.remove(&entity);
        self.previous.remove(&entity);
    }

    /// Forgets everything, e.g. on map change.
    pub fn clear(&mut self) {
        self.current.clear();
        self.previous.clear();
    }

    /// Entities recorded this frame.
    pub fn len(&self) -> usize {
        self.current.len()
    }

    /// Returns `true` if nothing was recorded this frame.
    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use photon_core::math::Vec3;

    #[test]
    fn test_previous_after_end_frame() {
        let mut history = TransformHistory::new();
        let a = EntityId(1);
        let t0 = RowTransform::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let t1 = RowTransform::from_translation(Vec3::new(2.0, 0.0, 0.0));

        history.record(a, t0);
        assert_eq!(history.previous(a), PreviousTransform::NotFound);
        assert_eq!(history.previous_or(a, &t0), t0);

        history.end_frame();
        history.record(a, t1);
        assert_eq!(history.previous(a), PreviousTransform::Found(t0));
        assert_eq!(history.previous_or(a, &t1), t0);
    }

    #[test]
    fn test_entities_not_seen_drop_out() {
        let mut history = TransformHistory::new();
        let a = EntityId(7);
        history.record(a, RowTransform::IDENTITY);
        history.end_frame();
        history.end_frame();
        assert_eq!(history.previous(a), PreviousTransform::NotFound);
        assert!(history.is_empty());
    }
}
