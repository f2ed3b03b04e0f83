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

//! Error type for the acceleration lane.

use super::builder::ObjectId;
use photon_core::renderer::{RenderError, ResourceError};
use thiserror::Error;

/// Failure while creating or building an acceleration structure.
#[derive(Debug, Error)]
pub enum AccelError {
    /// The build needs more scratch memory than the frame has left.
    #[error("Scratch buffer overflow: {requested} bytes requested, {available} available")]
    ScratchExhausted {
        /// Scratch bytes needed.
        requested: u64,
        /// Scratch bytes left.
        available: u64,
    },

    /// The storage pool has no block large enough.
    #[error("Acceleration storage exhausted: no block of {requested} bytes")]
    StorageExhausted {
        /// Storage bytes needed.
        requested: u64,
    },

    /// The frame already holds the maximum number of instances.
    #[error("Too many instances (capacity {capacity})")]
    InstanceCapacity {
        /// Instance capacity per frame.
        capacity: u32,
    },

    /// The object has never been built.
    #[error("Object {0:?} has no acceleration structure")]
    NotBuilt(ObjectId),

    /// The object id does not refer to a live object.
    #[error("Unknown object {0:?}")]
    UnknownObject(ObjectId),

    /// `new_map` has not created the top-level structure yet.
    #[error("The top-level structure has not been created")]
    NoTopLevel,

    /// The device rejected a call.
    #[error("Device error: {0}")]
    Resource(#[from] ResourceError),
}

impl AccelError {
    /// Whether the frame cannot continue.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AccelError::ScratchExhausted { .. } | AccelError::NoTopLevel | AccelError::Resource(_)
        )
    }
}

impl From<AccelError> for RenderError {
    fn from(err: AccelError) -> Self {
        match err {
            AccelError::ScratchExhausted {
                requested,
                available,
            } => RenderError::ScratchExhausted {
                requested,
                available,
            },
            AccelError::Resource(inner) => RenderError::ResourceError(inner),
            AccelError::NoTopLevel => RenderError::NotInitialized,
            other => RenderError::RenderingFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality() {
        assert!(AccelError::ScratchExhausted {
            requested: 10,
            available: 2
        }
        .is_fatal());
        assert!(AccelError::Resource(ResourceError::InvalidHandle).is_fatal());
        assert!(!AccelError::InstanceCapacity { capacity: 4 }.is_fatal());
        assert!(!AccelError::StorageExhausted { requested: 1 }.is_fatal());
    }

    #[test]
    fn test_into_render_error() {
        let err: RenderError = AccelError::ScratchExhausted {
            requested: 64,
            available: 32,
        }
        .into();
        assert!(matches!(
            err,
            RenderError::ScratchExhausted {
                requested: 64,
                available: 32
            }
        ));
        let err: RenderError = AccelError::NotBuilt(ObjectId(3)).into();
        assert_eq!(
            err.to_string(),
            "A critical rendering operation failed: Object ObjectId(3) has no acceleration structure"
        );
    }
}
