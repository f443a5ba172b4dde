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

use std::fmt;
use std::hash::BuildHasher;
use std::hash::Hash;
use std::marker::PhantomData;
use std::mem;

use crate::allocator::BufferAllocator;
use crate::allocator::DefaultAllocator;
use crate::bloom::core::AllocFailure;
use crate::bloom::core::FilterCore;
use crate::error::Error;
use crate::hash::DefaultHashBuilder;
use crate::probe::Block;
use crate::probe::Subfilter;

/// A Bloom filter over elements of type `T`.
///
/// Every element is hashed once to a 64-bit value. `K` buckets are chosen from the hash and
/// the subfilter `P` marks (or checks) `P::K` bits in the block at each of them, so an
/// element sets `K * P::K` bits in total.
///
/// Provides fast membership queries with:
/// - No false negatives (inserted items always return `true`)
/// - Tunable false positive rate
/// - Constant space usage
///
/// # Type parameters
///
/// - `T`: element type, possibly unsized (`str`, `[u8]`)
/// - `K`: number of buckets touched per element
/// - `P`: block layout, see [`probe`](crate::probe); defaults to single-bit blocks, i.e. a
///   classical Bloom filter with `K` hash functions
/// - `BUCKET_SIZE`: distance in bytes between consecutive buckets; `0` means the used size
///   of `P`'s block so buckets do not overlap
/// - `S`: hasher builder
/// - `A`: allocator of the bit buffer
///
/// # Examples
///
/// ```
/// # use blockbloom::bloom::BloomFilter;
/// # use blockbloom::probe::Block;
/// // one 64-bit block per element, 5 bits set in it
/// let mut filter = BloomFilter::<str, 1, Block<u64, 5>>::with_accuracy(1000, 0.01);
/// filter.insert("apple");
///
/// assert!(filter.may_contain("apple"));
/// assert!(filter.capacity() > 0);
/// ```
pub struct BloomFilter<
    T: ?Sized,
    const K: usize,
    P = Block<u8, 1>,
    const BUCKET_SIZE: usize = 0,
    S = DefaultHashBuilder,
    A: BufferAllocator = DefaultAllocator,
> {
    core: FilterCore<P, K, BUCKET_SIZE, A>,
    hasher: S,
    _marker: PhantomData<fn(&T)>,
}

impl<T, const K: usize, P, const BUCKET_SIZE: usize> BloomFilter<T, K, P, BUCKET_SIZE>
where
    T: ?Sized + Hash,
    P: Subfilter,
{
    /// Creates an empty filter with capacity 0.
    ///
    /// No memory is allocated; [`may_contain`](Self::may_contain) returns `false` for
    /// everything until the filter is [`reset`](Self::reset) to a non-zero capacity.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a filter with at least `num_bits` bits.
    ///
    /// The capacity is rounded up to a whole number of buckets; see
    /// [`capacity`](Self::capacity).
    ///
    /// # Examples
    ///
    /// ```
    /// # use blockbloom::bloom::BloomFilter;
    /// let filter = BloomFilter::<u64, 7>::with_capacity(10_000);
    /// assert!(filter.capacity() >= 10_000);
    /// ```
    pub fn with_capacity(num_bits: usize) -> Self {
        Self::with_capacity_and_hasher_in(
            num_bits,
            DefaultHashBuilder::default(),
            DefaultAllocator,
        )
    }

    /// Creates a filter sized so that `max_items` insertions keep the false-positive rate
    /// at or below `fpr`.
    ///
    /// # Panics
    ///
    /// Panics if `fpr` is not in [0.0, 1.0].
    pub fn with_accuracy(max_items: usize, fpr: f64) -> Self {
        Self::with_accuracy_and_hasher_in(
            max_items,
            fpr,
            DefaultHashBuilder::default(),
            DefaultAllocator,
        )
    }
}

impl<T, const K: usize, P, const BUCKET_SIZE: usize, S, A> BloomFilter<T, K, P, BUCKET_SIZE, S, A>
where
    T: ?Sized + Hash,
    P: Subfilter,
    S: BuildHasher,
    A: BufferAllocator,
{
    fn from_parts(
        core: Result<FilterCore<P, K, BUCKET_SIZE, A>, AllocFailure>,
        hasher: S,
    ) -> Result<Self, AllocFailure> {
        Ok(Self {
            core: core?,
            hasher,
            _marker: PhantomData,
        })
    }

    /// Creates a filter with at least `num_bits` bits, using `hasher` and `alloc`.
    ///
    /// Allocation failure aborts like it does for `Vec`; see
    /// [`try_with_capacity_and_hasher_in`](Self::try_with_capacity_and_hasher_in) for a
    /// fallible version.
    pub fn with_capacity_and_hasher_in(num_bits: usize, hasher: S, alloc: A) -> Self {
        Self::from_parts(FilterCore::new_in(num_bits, alloc), hasher)
            .unwrap_or_else(|e| e.handle())
    }

    /// Fallible version of [`with_capacity_and_hasher_in`](Self::with_capacity_and_hasher_in).
    ///
    /// # Errors
    ///
    /// Returns [`AllocationFailed`](crate::error::ErrorKind::AllocationFailed) if the buffer
    /// size overflows or `alloc` cannot provide it.
    pub fn try_with_capacity_and_hasher_in(
        num_bits: usize,
        hasher: S,
        alloc: A,
    ) -> Result<Self, Error> {
        Self::from_parts(FilterCore::new_in(num_bits, alloc), hasher)
            .map_err(AllocFailure::into_error)
    }

    /// Creates a filter for `max_items` elements at false-positive rate `fpr`, using `hasher`
    /// and `alloc`.
    ///
    /// # Panics
    ///
    /// Panics if `fpr` is not in [0.0, 1.0].
    pub fn with_accuracy_and_hasher_in(max_items: usize, fpr: f64, hasher: S, alloc: A) -> Self {
        assert_fpr(fpr);
        Self::from_parts(FilterCore::with_accuracy_in(max_items, fpr, alloc), hasher)
            .unwrap_or_else(|e| e.handle())
    }

    /// Fallible version of [`with_accuracy_and_hasher_in`](Self::with_accuracy_and_hasher_in).
    ///
    /// # Panics
    ///
    /// Panics if `fpr` is not in [0.0, 1.0].
    ///
    /// # Errors
    ///
    /// Returns [`AllocationFailed`](crate::error::ErrorKind::AllocationFailed) if the buffer
    /// cannot be allocated.
    pub fn try_with_accuracy_and_hasher_in(
        max_items: usize,
        fpr: f64,
        hasher: S,
        alloc: A,
    ) -> Result<Self, Error> {
        assert_fpr(fpr);
        Self::from_parts(FilterCore::with_accuracy_in(max_items, fpr, alloc), hasher)
            .map_err(AllocFailure::into_error)
    }

    /// Inserts an item into the filter.
    ///
    /// After insertion, `may_contain(item)` will always return `true`. Inserting into a filter
    /// of capacity 0 does nothing.
    ///
    /// # Examples
    ///
    /// ```
    /// # use blockbloom::bloom::BloomFilter;
    /// let mut filter = BloomFilter::<[u8], 3>::with_capacity(1024);
    /// filter.insert(b"apple");
    /// assert!(filter.may_contain(b"apple"));
    /// ```
    #[inline]
    pub fn insert(&mut self, item: &T) {
        let hash = self.hasher.hash_one(item);
        self.core.insert(hash);
    }

    /// Inserts every item of `items`.
    pub fn insert_all<'a, I>(&mut self, items: I)
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        for item in items {
            self.insert(item);
        }
    }

    /// Replaces the contents of the filter with `items`, keeping its capacity.
    pub fn assign<'a, I>(&mut self, items: I)
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        self.clear();
        self.insert_all(items);
    }

    /// Tests whether an item is possibly in the set.
    ///
    /// Returns:
    /// - `true`: Item was **possibly** inserted (or false positive)
    /// - `false`: Item was **definitely not** inserted
    ///
    /// A filter of capacity 0 returns `false` for every item.
    ///
    /// # Examples
    ///
    /// ```
    /// # use blockbloom::bloom::BloomFilter;
    /// let mut filter = BloomFilter::<str, 5>::with_accuracy(100, 0.01);
    /// filter.insert("apple");
    ///
    /// assert!(filter.may_contain("apple")); // true - was inserted
    /// assert!(!BloomFilter::<str, 5>::new().may_contain("apple")); // nothing to find
    /// ```
    #[inline]
    pub fn may_contain(&self, item: &T) -> bool {
        self.core.may_contain(self.hasher.hash_one(item))
    }

    /// Tests every item of `items`, reporting each result to `f` in iteration order.
    ///
    /// # Examples
    ///
    /// ```
    /// # use blockbloom::bloom::BloomFilter;
    /// let mut filter = BloomFilter::<u32, 4>::with_accuracy(100, 0.01);
    /// filter.insert_all(&[1, 2, 3]);
    ///
    /// let mut hits = 0;
    /// filter.may_contain_each(&[1, 2, 3], |_, found| hits += usize::from(found));
    /// assert_eq!(hits, 3);
    /// ```
    pub fn may_contain_each<'a, I, F>(&self, items: I, mut f: F)
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
        F: FnMut(&'a T, bool),
    {
        for item in items {
            f(item, self.may_contain(item));
        }
    }

    /// Returns the capacity of the filter in bits.
    ///
    /// A filter created with this capacity has exactly the same capacity.
    pub fn capacity(&self) -> usize {
        self.core.capacity()
    }

    /// Clears all bits, keeping the capacity.
    pub fn clear(&mut self) {
        self.core.clear();
    }

    /// Clears the filter and makes sure it holds at least `num_bits` bits.
    ///
    /// The current buffer is kept when it is already large enough; otherwise a new one is
    /// allocated, exactly once. `reset(0)` releases the buffer and leaves capacity 0.
    pub fn reset(&mut self, num_bits: usize) {
        self.core.reset(num_bits).unwrap_or_else(|e| e.handle());
    }

    /// Fallible version of [`reset`](Self::reset). The filter is unchanged on error.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationFailed`](crate::error::ErrorKind::AllocationFailed) if a larger
    /// buffer is needed and cannot be allocated.
    pub fn try_reset(&mut self, num_bits: usize) -> Result<(), Error> {
        self.core.reset(num_bits).map_err(AllocFailure::into_error)
    }

    /// Returns the bit buffer, `capacity() / 8` bytes long.
    ///
    /// Together with [`as_bytes_mut`](Self::as_bytes_mut) this allows saving and restoring
    /// a filter: copying the bytes into a filter of the same configuration and capacity
    /// yields an equal filter.
    pub fn as_bytes(&self) -> &[u8] {
        self.core.as_bytes()
    }

    /// Returns the bit buffer for writing.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.core.as_bytes_mut()
    }

    /// Returns the hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Returns the allocator.
    pub fn allocator(&self) -> &A {
        self.core.allocator()
    }

    /// Merges another filter into this one via bitwise OR (union).
    ///
    /// After merging, this filter recognizes items from either filter. Both filters must use
    /// equivalent hashers for the result to be meaningful.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidArgument`](crate::error::ErrorKind::InvalidArgument) if the
    /// capacities differ.
    ///
    /// # Examples
    ///
    /// ```
    /// # use blockbloom::bloom::BloomFilter;
    /// let mut f1 = BloomFilter::<str, 5>::with_capacity(1000);
    /// let mut f2 = BloomFilter::<str, 5>::with_capacity(1000);
    /// f1.insert("a");
    /// f2.insert("b");
    ///
    /// f1.union(&f2).unwrap();
    /// assert!(f1.may_contain("a"));
    /// assert!(f1.may_contain("b"));
    ///
    /// let f3 = BloomFilter::<str, 5>::with_capacity(2000);
    /// assert!(f1.union(&f3).is_err());
    /// ```
    pub fn union(&mut self, other: &Self) -> Result<(), Error> {
        self.core.union(&other.core)
    }

    /// Intersects this filter with another via bitwise AND.
    ///
    /// After intersection, this filter recognizes items present in both filters (plus false
    /// positives).
    ///
    /// # Errors
    ///
    /// Returns [`InvalidArgument`](crate::error::ErrorKind::InvalidArgument) if the
    /// capacities differ.
    pub fn intersect(&mut self, other: &Self) -> Result<(), Error> {
        self.core.intersect(&other.core)
    }

    /// Expected false-positive rate of a filter of `num_bits` bits holding `num_items`
    /// elements.
    ///
    /// # Examples
    ///
    /// ```
    /// # use blockbloom::bloom::BloomFilter;
    /// type Filter = BloomFilter<u64, 7>;
    /// assert_eq!(Filter::fpr_for(100, 0), 1.0);
    /// assert_eq!(Filter::fpr_for(0, 1000), 0.0);
    /// assert!(Filter::fpr_for(1000, 10_000) < 0.01);
    /// ```
    pub fn fpr_for(num_items: usize, num_bits: usize) -> f64 {
        FilterCore::<P, K, BUCKET_SIZE, A>::model().fpr_for(num_items, num_bits)
    }

    /// Capacity in bits needed for `max_items` elements at false-positive rate `fpr`.
    ///
    /// # Panics
    ///
    /// Panics if `fpr` is not in [0.0, 1.0].
    pub fn capacity_for(max_items: usize, fpr: f64) -> usize {
        assert_fpr(fpr);
        FilterCore::<P, K, BUCKET_SIZE, A>::model().capacity_for(max_items, fpr)
    }

    /// Exchanges the contents of two filters.
    ///
    /// Constant time when the allocator propagates on swap or both allocators are equal.
    /// Otherwise the buffers stay with their allocators and the contents are copied across,
    /// which allocates.
    pub fn swap(&mut self, other: &mut Self) {
        self.core
            .swap(&mut other.core)
            .unwrap_or_else(|e| e.handle());
        mem::swap(&mut self.hasher, &mut other.hasher);
    }
}

impl<T, const K: usize, P, const BUCKET_SIZE: usize, S, A> BloomFilter<T, K, P, BUCKET_SIZE, S, A>
where
    T: ?Sized + Hash,
    P: Subfilter,
    S: BuildHasher + Clone,
    A: BufferAllocator,
{
    /// Returns a copy of the filter whose buffer comes from `alloc`.
    pub fn clone_in(&self, alloc: A) -> Self {
        Self::from_parts(self.core.try_clone_in(alloc), self.hasher.clone())
            .unwrap_or_else(|e| e.handle())
    }

    /// Fallible version of [`clone_in`](Self::clone_in).
    ///
    /// # Errors
    ///
    /// Returns [`AllocationFailed`](crate::error::ErrorKind::AllocationFailed) if the buffer
    /// cannot be allocated.
    pub fn try_clone_in(&self, alloc: A) -> Result<Self, Error> {
        Self::from_parts(self.core.try_clone_in(alloc), self.hasher.clone())
            .map_err(AllocFailure::into_error)
    }

    /// Moves the contents into a new filter using `alloc`, leaving `self` with capacity 0.
    ///
    /// The buffer is handed over as is when `alloc` is equal to the current allocator, and
    /// copied into a buffer of `alloc` otherwise.
    pub fn take_in(&mut self, alloc: A) -> Self {
        Self::from_parts(self.core.take_in(alloc), self.hasher.clone())
            .unwrap_or_else(|e| e.handle())
    }

    /// Moves the contents of `src` into `self`, leaving `src` with capacity 0.
    ///
    /// When the allocator propagates on move, `self` takes over `src`'s allocator and buffer.
    /// Without propagation the buffer is only taken over if the two allocators are equal;
    /// otherwise `self` copies the bits into a buffer of its own allocator and `src`'s buffer
    /// is released.
    pub fn move_from(&mut self, src: &mut Self) {
        self.core
            .move_from(&mut src.core)
            .unwrap_or_else(|e| e.handle());
        self.hasher = src.hasher.clone();
    }
}

fn assert_fpr(fpr: f64) {
    assert!(
        (0.0..=1.0).contains(&fpr),
        "fpr must be between 0.0 and 1.0 (inclusive)"
    );
}

impl<T, const K: usize, P, const BUCKET_SIZE: usize, S, A> Default
    for BloomFilter<T, K, P, BUCKET_SIZE, S, A>
where
    T: ?Sized + Hash,
    P: Subfilter,
    S: BuildHasher + Default,
    A: BufferAllocator + Default,
{
    fn default() -> Self {
        Self::with_capacity_and_hasher_in(0, S::default(), A::default())
    }
}

/// Copies use [`BufferAllocator::select_on_copy`]; `clone_from` reuses the destination buffer
/// when capacities match and follows [`Propagation::on_copy`](crate::allocator::Propagation).
impl<T, const K: usize, P, const BUCKET_SIZE: usize, S, A> Clone
    for BloomFilter<T, K, P, BUCKET_SIZE, S, A>
where
    T: ?Sized + Hash,
    P: Subfilter,
    S: BuildHasher + Clone,
    A: BufferAllocator,
{
    fn clone(&self) -> Self {
        self.clone_in(self.allocator().select_on_copy())
    }

    fn clone_from(&mut self, source: &Self) {
        self.core
            .copy_from(&source.core)
            .unwrap_or_else(|e| e.handle());
        self.hasher = source.hasher.clone();
    }
}

/// Filters are equal when they have the same capacity and the same bits.
impl<T, const K: usize, P, const BUCKET_SIZE: usize, S, A> PartialEq
    for BloomFilter<T, K, P, BUCKET_SIZE, S, A>
where
    T: ?Sized,
    P: Subfilter,
    A: BufferAllocator,
{
    fn eq(&self, other: &Self) -> bool {
        self.core == other.core
    }
}

impl<T, const K: usize, P, const BUCKET_SIZE: usize, S, A> fmt::Debug
    for BloomFilter<T, K, P, BUCKET_SIZE, S, A>
where
    T: ?Sized,
    P: Subfilter,
    A: BufferAllocator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BloomFilter")
            .field("k", &K)
            .field("marks_per_bucket", &P::K)
            .field("bucket_size", &FilterCore::<P, K, BUCKET_SIZE, A>::BUCKET_SIZE)
            .field("capacity", &self.core.capacity())
            .finish_non_exhaustive()
    }
}

impl<'a, T, const K: usize, P, const BUCKET_SIZE: usize, S, A> Extend<&'a T>
    for BloomFilter<T, K, P, BUCKET_SIZE, S, A>
where
    T: 'a + ?Sized + Hash,
    P: Subfilter,
    S: BuildHasher,
    A: BufferAllocator,
{
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        self.insert_all(iter);
    }
}
