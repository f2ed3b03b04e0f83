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

//! CPU-side bookkeeping for GPU memory regions.
//!
//! None of these types own device memory. They hand out offsets into buffers
//! that a backend created once, which keeps the allocation policy testable
//! without a device.

pub mod bitset;
pub mod flipping;
pub mod pool;

pub use self::bitset::BitSet;
pub use self::flipping::FlippingBuffer;
pub use self::pool::{FirstFitPool, PoolBlock};
