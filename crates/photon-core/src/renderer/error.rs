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

//! Defines the hierarchy of error types for the ray-tracing subsystem.

use std::fmt;
use std::time::Duration;

/// An error related to the creation or use of a GPU resource (buffers, staging regions, etc.).
#[derive(Debug)]
pub enum ResourceError {
    /// A generic resource could not be found.
    NotFound,
    /// The handle or ID used to reference a resource is invalid.
    InvalidHandle,
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
    /// An attempt was made to access a resource out of its bounds (e.g., in a buffer).
    OutOfBounds,
    /// A transfer channel has no staging space left for this frame.
    ChannelExhausted {
        /// Number of bytes that were requested.
        requested: u64,
    },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::NotFound => write!(f, "Resource not found with ID."),
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle or ID."),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
            ResourceError::OutOfBounds => {
                write!(f, "Resource access out of bounds.")
            }
            ResourceError::ChannelExhausted { requested } => {
                write!(f, "Transfer channel exhausted while requesting {requested} bytes.")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

/// A high-level error that can occur while producing a ray-traced frame.
#[derive(Debug)]
pub enum RenderError {
    /// An operation was attempted before the rendering system was initialized.
    NotInitialized,
    /// A critical, unrecoverable rendering operation failed.
    RenderingFailed(String),
    /// An error occurred while managing a GPU resource.
    ResourceError(ResourceError),
    /// The graphics device was lost (e.g., GPU driver crashed or was updated).
    /// This is a catastrophic error that typically requires reinitialization.
    DeviceLost,
    /// The fence guarding a frame slot did not signal within the allowed time.
    DeviceTimeout {
        /// How long the frame waited before giving up.
        waited: Duration,
    },
    /// An acceleration-structure build needs more scratch memory than the frame arena holds.
    ScratchExhausted {
        /// Scratch bytes the build asked for.
        requested: u64,
        /// Scratch bytes left in the arena.
        available: u64,
    },
    /// No staging region could be obtained for a light upload.
    TransferChannelExhausted {
        /// Number of bytes that were requested.
        requested: u64,
    },
    /// An unexpected or internal error occurred.
    Internal(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::NotInitialized => {
                write!(f, "The rendering system is not initialized.")
            }
            RenderError::RenderingFailed(msg) => {
                write!(f, "A critical rendering operation failed: {msg}")
            }
            RenderError::ResourceError(err) => {
                write!(f, "Graphics resource operation failed: {err}")
            }
            RenderError::DeviceLost => write!(
                f,
                "The graphics device was lost and needs to be reinitialized."
            ),
            RenderError::DeviceTimeout { waited } => {
                write!(
                    f,
                    "Timed out after {} ms waiting for the frame fence.",
                    waited.as_millis()
                )
            }
            RenderError::ScratchExhausted {
                requested,
                available,
            } => write!(
                f,
                "Acceleration scratch exhausted: requested {requested} bytes, {available} available."
            ),
            RenderError::TransferChannelExhausted { requested } => {
                write!(
                    f,
                    "Could not obtain a staging region of {requested} bytes for the light upload."
                )
            }
            RenderError::Internal(msg) => {
                write!(f, "An internal or unexpected error occurred: {msg}")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::ResourceError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::ResourceError(err)
    }
}
