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

//! The untyped part of a filter: bit buffer, bucket positions and allocator.

use std::alloc::Layout;
use std::alloc::handle_alloc_error;
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;
use std::slice;

use log::debug;

use crate::allocator::BufferAllocator;
use crate::bloom::fpr::FprModel;
use crate::bloom::position::Positions;
use crate::error::Error;
use crate::probe::Subfilter;

const CACHELINE: usize = 64;

/// Alignment of every bit buffer.
const BUFFER_ALIGN: usize = 64;

/// Largest power of two dividing `x`, capped at `p` (itself a power of two).
const fn gcd_pow2(x: usize, p: usize) -> usize {
    let lowest = x & x.wrapping_neg();
    if lowest == 0 || lowest > p { p } else { lowest }
}

#[inline(always)]
fn prefetch(p: *const u8, lines: usize) {
    #[cfg(all(feature = "prefetch", target_arch = "x86_64"))]
    use std::arch::x86_64 as arch;
    #[cfg(all(feature = "prefetch", target_arch = "x86", target_feature = "sse"))]
    use std::arch::x86 as arch;

    #[cfg(any(
        all(feature = "prefetch", target_arch = "x86_64"),
        all(feature = "prefetch", target_arch = "x86", target_feature = "sse")
    ))]
    for i in 0..lines {
        // SAFETY: prefetching is a hint and never faults, whatever the address.
        unsafe {
            arch::_mm_prefetch::<{ arch::_MM_HINT_T0 }>(p.wrapping_add(i * CACHELINE).cast())
        }
    }

    #[cfg(not(any(
        all(feature = "prefetch", target_arch = "x86_64"),
        all(feature = "prefetch", target_arch = "x86", target_feature = "sse")
    )))]
    let _ = (p, lines);
}

/// Why a bit buffer could not be obtained.
#[derive(Debug, Clone, Copy)]
pub(crate) enum AllocFailure {
    CapacityOverflow { buckets: usize },
    OutOfMemory(Layout),
}

impl AllocFailure {
    pub fn into_error(self) -> Error {
        match self {
            AllocFailure::CapacityOverflow { buckets } => Error::capacity_overflow(buckets),
            AllocFailure::OutOfMemory(layout) => Error::allocation_failed(layout),
        }
    }

    /// Fails the way infallible std collections do.
    pub fn handle(self) -> ! {
        match self {
            AllocFailure::CapacityOverflow { .. } => panic!("capacity overflow"),
            AllocFailure::OutOfMemory(layout) => handle_alloc_error(layout),
        }
    }
}

#[derive(Clone, Copy)]
struct Buffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

/// Bit buffer of `range` overlapping buckets plus the allocator that owns it.
///
/// Bucket `p` starts `p * BUCKET_SIZE` bytes into the buffer and a block starting there spans
/// `P::BLOCK_SIZE` bytes, so the buffer carries `P::BLOCK_SIZE - BUCKET_SIZE` extra bytes past
/// the last bucket. No buffer is held when the range is 0.
pub(crate) struct FilterCore<P, const K: usize, const B: usize, A: BufferAllocator> {
    positions: Positions,
    data: Option<Buffer>,
    alloc: A,
    _marker: PhantomData<fn() -> P>,
}

// SAFETY: the buffer is uniquely owned and only reachable through `&self` / `&mut self`.
unsafe impl<P, const K: usize, const B: usize, A> Send for FilterCore<P, K, B, A> where
    A: BufferAllocator + Send
{
}

// SAFETY: shared access only ever reads the buffer.
unsafe impl<P, const K: usize, const B: usize, A> Sync for FilterCore<P, K, B, A> where
    A: BufferAllocator + Sync
{
}

impl<P, const K: usize, const B: usize, A: BufferAllocator> FilterCore<P, K, B, A> {
    fn release(&mut self) {
        if let Some(buf) = self.data.take() {
            debug!("released bit buffer: {} bytes", buf.layout.size());
            // SAFETY: `buf` was allocated by `self.alloc` or an allocator equal to it.
            unsafe { self.alloc.deallocate(buf.ptr, buf.layout) };
        }
    }
}

impl<P: Subfilter, const K: usize, const B: usize, A: BufferAllocator> FilterCore<P, K, B, A> {
    pub const BLOCK_SIZE: usize = P::BLOCK_SIZE;

    pub const USED_SIZE: usize = {
        assert!(P::USED_SIZE <= P::BLOCK_SIZE);
        P::USED_SIZE
    };

    pub const BUCKET_SIZE: usize = {
        assert!(K > 0, "K must be at least 1");
        assert!(
            B <= P::USED_SIZE,
            "bucket size cannot exceed the used size of the subfilter block"
        );
        if B == 0 { P::USED_SIZE } else { B }
    };

    const TAIL_SIZE: usize = Self::BLOCK_SIZE - Self::BUCKET_SIZE;

    const PREFETCHED_CACHELINES: usize = 1
        + (Self::BLOCK_SIZE + CACHELINE - 1 - gcd_pow2(Self::BUCKET_SIZE, CACHELINE))
            / CACHELINE;

    pub fn model() -> FprModel {
        FprModel {
            k: K,
            k_total: K * P::K,
            used_size: Self::USED_SIZE,
            bucket_size: Self::BUCKET_SIZE,
            subfilter_fpr: P::fpr,
        }
    }

    /// Number of buckets needed for at least `m` bits of capacity.
    fn requested_range(m: usize) -> usize {
        let mut m = m;
        let slack = (Self::USED_SIZE - Self::BUCKET_SIZE) * 8;
        if m > slack {
            // makes `with_capacity(f.capacity()).capacity() == f.capacity()`
            m -= slack;
        }
        let bucket_bits = Self::BUCKET_SIZE * 8;
        if usize::MAX - m >= bucket_bits - 1 {
            m.div_ceil(bucket_bits)
        } else {
            m / bucket_bits
        }
    }

    fn layout_for(rng: usize) -> Result<Layout, AllocFailure> {
        rng.checked_mul(Self::BUCKET_SIZE)
            .and_then(|size| size.checked_add(Self::TAIL_SIZE))
            .and_then(|size| Layout::from_size_align(size, BUFFER_ALIGN).ok())
            .ok_or(AllocFailure::CapacityOverflow { buckets: rng })
    }

    /// Allocates a zeroed buffer of `rng` buckets; none for a range of 0.
    fn new_buffer(alloc: &A, rng: usize) -> Result<Option<Buffer>, AllocFailure> {
        if rng == 0 {
            return Ok(None);
        }
        let layout = Self::layout_for(rng)?;
        let ptr = alloc
            .allocate(layout)
            .ok_or(AllocFailure::OutOfMemory(layout))?;
        // SAFETY: `ptr` is valid for writes of `layout.size()` bytes.
        unsafe { ptr.as_ptr().write_bytes(0, layout.size()) };
        debug!(
            "allocated bit buffer: {} buckets, {} bytes",
            rng,
            layout.size()
        );
        Ok(Some(Buffer { ptr, layout }))
    }

    /// Releases the buffer and leaves the core with capacity 0.
    fn make_empty(&mut self) {
        self.release();
        self.positions = Positions::new(0);
    }

    pub fn new_in(m: usize, alloc: A) -> Result<Self, AllocFailure> {
        let positions = Positions::new(Self::requested_range(m));
        let rng = if m > 0 { positions.range() } else { 0 };
        let data = Self::new_buffer(&alloc, rng)?;
        Ok(Self {
            positions,
            data,
            alloc,
            _marker: PhantomData,
        })
    }

    pub fn with_accuracy_in(n: usize, fpr: f64, alloc: A) -> Result<Self, AllocFailure> {
        Self::new_in(Self::model().capacity_for(n, fpr), alloc)
    }

    /// Copy of `self` whose buffer comes from `alloc`.
    pub fn try_clone_in(&self, alloc: A) -> Result<Self, AllocFailure> {
        let data = Self::new_buffer(&alloc, self.range())?;
        let mut res = Self {
            positions: self.positions,
            data,
            alloc,
            _marker: PhantomData,
        };
        res.copy_bytes(self);
        Ok(res)
    }

    /// Moves the contents of `self` into a core using `alloc`, leaving `self` empty.
    ///
    /// The buffer itself changes hands when `alloc` can release it; otherwise it is copied.
    pub fn take_in(&mut self, alloc: A) -> Result<Self, AllocFailure> {
        let res = if alloc.is_equal(&self.alloc) {
            Self {
                positions: self.positions,
                data: self.data.take(),
                alloc,
                _marker: PhantomData,
            }
        } else {
            self.try_clone_in(alloc)?
        };
        self.make_empty();
        Ok(res)
    }

    /// Copy assignment.
    pub fn copy_from(&mut self, src: &Self) -> Result<(), AllocFailure> {
        if A::PROPAGATION.on_copy {
            if !self.alloc.is_equal(&src.alloc) || self.range() != src.range() {
                let data = Self::new_buffer(&src.alloc, src.range())?;
                self.release();
                self.data = data;
            }
            self.alloc = src.alloc.clone();
        } else if self.range() != src.range() {
            let data = Self::new_buffer(&self.alloc, src.range())?;
            self.release();
            self.data = data;
        }
        self.positions = src.positions;
        self.copy_bytes(src);
        Ok(())
    }

    /// Move assignment. `src` is left empty.
    pub fn move_from(&mut self, src: &mut Self) -> Result<(), AllocFailure> {
        if A::PROPAGATION.on_move || self.alloc.is_equal(&src.alloc) {
            self.release();
            if A::PROPAGATION.on_move {
                self.alloc = src.alloc.clone();
            }
            self.positions = src.positions;
            self.data = src.data.take();
        } else {
            if self.range() != src.range() {
                let data = Self::new_buffer(&self.alloc, src.range())?;
                self.release();
                self.data = data;
            }
            self.positions = src.positions;
            self.copy_bytes(src);
        }
        src.make_empty();
        Ok(())
    }

    /// Exchanges contents with `other`.
    ///
    /// Buffers trade places unless the allocators stay put and cannot release each other's
    /// memory, in which case each side gets a copy of the other's contents in a buffer of its
    /// own allocator.
    pub fn swap(&mut self, other: &mut Self) -> Result<(), AllocFailure> {
        if A::PROPAGATION.on_swap {
            mem::swap(&mut self.alloc, &mut other.alloc);
        } else if !self.alloc.is_equal(&other.alloc) {
            let mine = other.try_clone_in(self.alloc.clone())?;
            let theirs = self.try_clone_in(other.alloc.clone())?;
            *self = mine;
            *other = theirs;
            return Ok(());
        }
        mem::swap(&mut self.positions, &mut other.positions);
        mem::swap(&mut self.data, &mut other.data);
        Ok(())
    }

    /// Clears all bits, growing the buffer first if it holds fewer than `m` bits.
    ///
    /// `m == 0` releases the buffer. A buffer that is already large enough is kept.
    pub fn reset(&mut self, m: usize) -> Result<(), AllocFailure> {
        if m == 0 {
            self.make_empty();
        } else if m > self.capacity() {
            let positions = Positions::new(Self::requested_range(m));
            let data = Self::new_buffer(&self.alloc, positions.range())?;
            debug!(
                "reallocating bit buffer: {} -> {} bits requested",
                self.capacity(),
                m
            );
            self.release();
            self.positions = positions;
            self.data = data;
        } else {
            self.clear();
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        if let Some(buf) = self.data {
            // SAFETY: the buffer is valid for writes of `layout.size()` bytes.
            unsafe { buf.ptr.as_ptr().write_bytes(0, buf.layout.size()) };
        }
    }

    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    pub fn range(&self) -> usize {
        if self.data.is_some() {
            self.positions.range()
        } else {
            0
        }
    }

    fn used_array_size(&self) -> usize {
        match self.range() {
            0 => 0,
            rng => rng * Self::BUCKET_SIZE + (Self::USED_SIZE - Self::BUCKET_SIZE),
        }
    }

    pub fn capacity(&self) -> usize {
        self.used_array_size() * 8
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self.data {
            // SAFETY: the buffer holds at least `used_array_size()` initialized bytes.
            Some(buf) => unsafe { slice::from_raw_parts(buf.ptr.as_ptr(), self.used_array_size()) },
            None => &[],
        }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        let len = self.used_array_size();
        match self.data {
            // SAFETY: as in `as_bytes`, and `&mut self` guarantees exclusive access.
            Some(buf) => unsafe { slice::from_raw_parts_mut(buf.ptr.as_ptr(), len) },
            None => &mut [],
        }
    }

    /// The whole allocation, tail included.
    fn buffer(&self) -> Option<&[u8]> {
        self.data.map(|buf| {
            // SAFETY: the buffer is valid for reads of `layout.size()` initialized bytes.
            unsafe { slice::from_raw_parts(buf.ptr.as_ptr(), buf.layout.size()) }
        })
    }

    fn buffer_mut(&mut self) -> Option<&mut [u8]> {
        self.data.map(|buf| {
            // SAFETY: as in `buffer`, and `&mut self` guarantees exclusive access.
            unsafe { slice::from_raw_parts_mut(buf.ptr.as_ptr(), buf.layout.size()) }
        })
    }

    fn copy_bytes(&mut self, src: &Self) {
        debug_assert_eq!(self.range(), src.range());
        self.as_bytes_mut().copy_from_slice(src.as_bytes());
    }

    #[inline(always)]
    fn next_offset(positions: &Positions, bytes: &[u8], hash: &mut u64) -> usize {
        let offset = positions.next_position(hash) * Self::BUCKET_SIZE;
        prefetch(bytes.as_ptr().wrapping_add(offset), Self::PREFETCHED_CACHELINES);
        offset
    }

    #[inline]
    pub fn insert(&mut self, mut hash: u64) {
        let positions = self.positions;
        let Some(bytes) = self.buffer_mut() else {
            return;
        };
        positions.prepare_hash(&mut hash);
        for _ in 0..K {
            let offset = Self::next_offset(&positions, bytes, &mut hash);
            P::mark(&mut bytes[offset..offset + Self::BLOCK_SIZE], hash);
        }
    }

    #[inline]
    pub fn may_contain(&self, mut hash: u64) -> bool {
        let Some(bytes) = self.buffer() else {
            return false;
        };
        let positions = &self.positions;
        positions.prepare_hash(&mut hash);
        // the next bucket is located (and prefetched) before the current one is checked
        let mut p0 = Self::next_offset(positions, bytes, &mut hash);
        for _ in 1..K {
            let p = p0;
            let hash0 = hash;
            p0 = Self::next_offset(positions, bytes, &mut hash);
            if !P::check(&bytes[p..p + Self::BLOCK_SIZE], hash0) {
                return false;
            }
        }
        P::check(&bytes[p0..p0 + Self::BLOCK_SIZE], hash)
    }

    fn combine(&mut self, other: &Self, f: impl Fn(&mut u8, u8)) -> Result<(), Error> {
        if self.range() != other.range() {
            return Err(Error::incompatible_filters(
                self.capacity(),
                other.capacity(),
            ));
        }
        for (a, &b) in self.as_bytes_mut().iter_mut().zip(other.as_bytes()) {
            f(a, b);
        }
        Ok(())
    }

    pub fn union(&mut self, other: &Self) -> Result<(), Error> {
        self.combine(other, |a, b| *a |= b)
    }

    pub fn intersect(&mut self, other: &Self) -> Result<(), Error> {
        self.combine(other, |a, b| *a &= b)
    }
}

impl<P: Subfilter, const K: usize, const B: usize, A: BufferAllocator> PartialEq
    for FilterCore<P, K, B, A>
{
    fn eq(&self, other: &Self) -> bool {
        self.range() == other.range() && self.as_bytes() == other.as_bytes()
    }
}

impl<P, const K: usize, const B: usize, A: BufferAllocator> Drop for FilterCore<P, K, B, A> {
    fn drop(&mut self) {
        self.release();
    }
}
