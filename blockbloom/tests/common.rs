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

#![allow(dead_code)] // each test binary uses a different subset

use std::alloc::Layout;
use std::cell::Cell;
use std::collections::HashSet;
use std::hash::BuildHasher;
use std::iter;
use std::ops::Range;
use std::ptr;
use std::ptr::NonNull;
use std::rc::Rc;

use blockbloom::allocator::BufferAllocator;
use blockbloom::allocator::Propagation;
use blockbloom::hash::DefaultHashBuilder;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

const VALUES_SEED: u64 = 0x5EED_B100;

/// Distinct pseudo-random values for the indices in `range`.
///
/// All calls draw from the same deduplicated sequence, so disjoint ranges give disjoint value
/// sets.
pub fn distinct_values(range: Range<u64>) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(VALUES_SEED);
    let mut seen = HashSet::new();
    let values: Vec<u64> = iter::repeat_with(|| rng.random::<u64>())
        .filter(|x| seen.insert(*x))
        .take(range.end as usize)
        .collect();
    values[range.start as usize..].to_vec()
}

/// A hasher builder carrying an observable state.
#[derive(Debug, Default, Clone)]
pub struct StatefulHasher {
    pub state: i32,
    inner: DefaultHashBuilder,
}

impl StatefulHasher {
    pub fn new(state: i32) -> Self {
        Self {
            state,
            inner: DefaultHashBuilder::default(),
        }
    }
}

impl BuildHasher for StatefulHasher {
    type Hasher = <DefaultHashBuilder as BuildHasher>::Hasher;

    fn build_hasher(&self) -> Self::Hasher {
        self.inner.build_hasher()
    }
}

/// An allocator with a state that decides equality, recording what it hands out.
///
/// `PROPAGATE` sets every propagation flag; `ALWAYS_EQUAL` makes all instances equal.
/// Clones share the allocation counter.
#[derive(Debug, Clone)]
pub struct StatefulAllocator<const PROPAGATE: bool = false, const ALWAYS_EQUAL: bool = false> {
    pub state: i32,
    last_allocation: Cell<*mut u8>,
    allocations: Rc<Cell<usize>>,
}

impl<const PROPAGATE: bool, const ALWAYS_EQUAL: bool> StatefulAllocator<PROPAGATE, ALWAYS_EQUAL> {
    pub fn new(state: i32) -> Self {
        Self {
            state,
            last_allocation: Cell::new(ptr::null_mut()),
            allocations: Rc::new(Cell::new(0)),
        }
    }

    /// Address of the most recent live allocation of this instance, null if none.
    pub fn last_allocation(&self) -> *mut u8 {
        self.last_allocation.get()
    }

    /// Number of allocations made by this instance and its clones.
    pub fn allocations(&self) -> usize {
        self.allocations.get()
    }
}

impl<const PROPAGATE: bool, const ALWAYS_EQUAL: bool> Default
    for StatefulAllocator<PROPAGATE, ALWAYS_EQUAL>
{
    fn default() -> Self {
        Self::new(0)
    }
}

impl<const PROPAGATE: bool, const ALWAYS_EQUAL: bool> PartialEq
    for StatefulAllocator<PROPAGATE, ALWAYS_EQUAL>
{
    fn eq(&self, other: &Self) -> bool {
        ALWAYS_EQUAL || self.state == other.state
    }
}

// SAFETY: forwards to the global allocator, which any instance may free into.
unsafe impl<const PROPAGATE: bool, const ALWAYS_EQUAL: bool> BufferAllocator
    for StatefulAllocator<PROPAGATE, ALWAYS_EQUAL>
{
    const PROPAGATION: Propagation = Propagation {
        on_copy: PROPAGATE,
        on_move: PROPAGATE,
        on_swap: PROPAGATE,
        always_equal: ALWAYS_EQUAL,
    };

    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        // SAFETY: buffer layouts are never zero-sized.
        let ptr = NonNull::new(unsafe { std::alloc::alloc(layout) })?;
        self.last_allocation.set(ptr.as_ptr());
        self.allocations.set(self.allocations.get() + 1);
        Some(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: the caller guarantees `ptr` was allocated with `layout`.
        unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) };
        if self.last_allocation.get() == ptr.as_ptr() {
            self.last_allocation.set(ptr::null_mut());
        }
    }
}

/// An allocator that never provides memory.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FailingAllocator;

// SAFETY: never hands out memory.
unsafe impl BufferAllocator for FailingAllocator {
    const PROPAGATION: Propagation = Propagation::NONE;

    fn allocate(&self, _: Layout) -> Option<NonNull<u8>> {
        None
    }

    unsafe fn deallocate(&self, _: NonNull<u8>, _: Layout) {}
}
