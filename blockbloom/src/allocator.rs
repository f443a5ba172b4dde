// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Allocation strategy for filter bit buffers.
//!
//! A filter obtains its buffer from a [`BufferAllocator`] and gives it back to the same
//! allocator (or one equal to it). What happens to the allocator itself when a filter is
//! copied, moved or swapped is governed by [`BufferAllocator::PROPAGATION`]; see
//! [`BloomFilter`](crate::bloom::BloomFilter) for how each operation uses it.

use std::alloc::Layout;
use std::ptr::NonNull;

/// How an allocator travels with the filter that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Propagation {
    /// `clone_from` replaces the destination's allocator with a copy of the source's.
    pub on_copy: bool,
    /// `move_from` replaces the destination's allocator with the source's.
    pub on_move: bool,
    /// `swap` exchanges allocators along with the buffers.
    pub on_swap: bool,
    /// Any two instances can free each other's memory, whatever `==` says.
    pub always_equal: bool,
}

impl Propagation {
    /// The allocator stays with the filter it was given to.
    pub const NONE: Propagation = Propagation {
        on_copy: false,
        on_move: false,
        on_swap: false,
        always_equal: false,
    };

    /// The allocator follows the contents on copy, move and swap.
    pub const ALL: Propagation = Propagation {
        on_copy: true,
        on_move: true,
        on_swap: true,
        always_equal: false,
    };
}

/// Source of filter bit buffers.
///
/// # Safety
///
/// `allocate` must return memory valid for reads and writes of `layout.size()` bytes and
/// aligned to `layout.align()`, which stays valid until passed to `deallocate` on this
/// allocator or on one it is [equal](BufferAllocator::is_equal) to.
pub unsafe trait BufferAllocator: Clone + PartialEq {
    /// Propagation behavior of this allocator type.
    const PROPAGATION: Propagation;

    /// Allocates a block for `layout`, whose size is never zero.
    ///
    /// Returns `None` when the memory cannot be provided. The contents of the block are
    /// unspecified.
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Releases a block obtained from [`allocate`](BufferAllocator::allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate` on this allocator or an equal one, called with the
    /// same `layout`, and must not be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Returns the allocator a copy of a filter using `self` should use.
    fn select_on_copy(&self) -> Self {
        self.clone()
    }

    /// Returns whether memory allocated by `self` can be released by `other` and vice versa.
    fn is_equal(&self, other: &Self) -> bool {
        Self::PROPAGATION.always_equal || self == other
    }
}

/// The global allocator.
///
/// Stateless: every instance is equal to every other, so moves and swaps between filters never
/// copy their buffers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DefaultAllocator;

// SAFETY: forwards to the global allocator, which any instance may free into.
unsafe impl BufferAllocator for DefaultAllocator {
    const PROPAGATION: Propagation = Propagation {
        on_copy: false,
        on_move: true,
        on_swap: false,
        always_equal: true,
    };

    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        debug_assert!(layout.size() > 0);
        // SAFETY: `layout` has a non-zero size.
        NonNull::new(unsafe { std::alloc::alloc(layout) })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: the caller guarantees `ptr` was allocated with `layout`.
        unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) }
    }
}
