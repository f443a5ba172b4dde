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

use std::hash::BuildHasher;
use std::hash::Hash;

use super::BloomFilter;
use crate::allocator::BufferAllocator;
use crate::allocator::DefaultAllocator;
use crate::error::Error;
use crate::hash::DefaultHashBuilder;
use crate::probe::Subfilter;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Sizing {
    Capacity { num_bits: usize },
    Accuracy { max_items: usize, fpr: f64 },
}

/// Builder for creating [`BloomFilter`] instances.
///
/// Provides two construction modes:
/// - [`with_accuracy()`](Self::with_accuracy): Specify target items and false positive rate
///   (recommended)
/// - [`with_capacity()`](Self::with_capacity): Specify the requested bit count (manual)
///
/// The probe layout is not part of the builder: it comes from the type of the filter being
/// built.
///
/// # Examples
///
/// ```
/// # use blockbloom::bloom::BloomFilter;
/// # use blockbloom::bloom::BloomFilterBuilder;
/// # use blockbloom::probe::Multiblock;
/// let filter: BloomFilter<str, 1, Multiblock<u64, 8>> =
///     BloomFilterBuilder::with_accuracy(10_000, 0.01)
///         .seed(42)
///         .build_from(["apple", "banana"]);
/// assert!(filter.may_contain("apple"));
/// ```
#[derive(Debug, Clone)]
pub struct BloomFilterBuilder<S = DefaultHashBuilder, A = DefaultAllocator> {
    sizing: Sizing,
    hasher: S,
    allocator: A,
}

impl BloomFilterBuilder {
    /// Creates a builder for a filter holding `max_items` elements at false-positive rate
    /// `fpr`.
    ///
    /// The capacity is derived from the layout of the filter being built, so the same builder
    /// yields different capacities for different probe schemes.
    ///
    /// # Panics
    ///
    /// Panics if `fpr` is not in [0.0, 1.0].
    ///
    /// # Examples
    ///
    /// ```
    /// # use blockbloom::bloom::BloomFilter;
    /// # use blockbloom::bloom::BloomFilterBuilder;
    /// // Optimal for 10,000 items with 1% FPR
    /// let filter: BloomFilter<u64, 7> = BloomFilterBuilder::with_accuracy(10_000, 0.01).build();
    /// assert!(filter.capacity() > 90_000);
    /// ```
    pub fn with_accuracy(max_items: usize, fpr: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&fpr),
            "fpr must be between 0.0 and 1.0 (inclusive)"
        );

        BloomFilterBuilder {
            sizing: Sizing::Accuracy { max_items, fpr },
            hasher: DefaultHashBuilder::default(),
            allocator: DefaultAllocator,
        }
    }

    /// Creates a builder for a filter of at least `num_bits` bits.
    ///
    /// The filter rounds the capacity up to a whole number of buckets.
    ///
    /// # Examples
    ///
    /// ```
    /// # use blockbloom::bloom::BloomFilter;
    /// # use blockbloom::bloom::BloomFilterBuilder;
    /// let filter: BloomFilter<u64, 7> = BloomFilterBuilder::with_capacity(10_000).build();
    /// assert!(filter.capacity() >= 10_000);
    /// ```
    pub fn with_capacity(num_bits: usize) -> Self {
        BloomFilterBuilder {
            sizing: Sizing::Capacity { num_bits },
            hasher: DefaultHashBuilder::default(),
            allocator: DefaultAllocator,
        }
    }
}

impl<S, A> BloomFilterBuilder<S, A> {
    /// Uses the default hasher with a custom seed.
    ///
    /// **Important**: Filters with different seeds cannot be merged meaningfully.
    pub fn seed(self, seed: u64) -> BloomFilterBuilder<DefaultHashBuilder, A> {
        self.hasher(DefaultHashBuilder::with_seed(seed))
    }

    /// Uses `hasher` to hash elements.
    pub fn hasher<S2>(self, hasher: S2) -> BloomFilterBuilder<S2, A> {
        BloomFilterBuilder {
            sizing: self.sizing,
            hasher,
            allocator: self.allocator,
        }
    }

    /// Allocates the bit buffer from `allocator`.
    pub fn allocator<A2>(self, allocator: A2) -> BloomFilterBuilder<S, A2> {
        BloomFilterBuilder {
            sizing: self.sizing,
            hasher: self.hasher,
            allocator,
        }
    }
}

impl<S: BuildHasher, A: BufferAllocator> BloomFilterBuilder<S, A> {
    /// Builds the Bloom filter.
    ///
    /// Allocation failure aborts; see [`try_build`](Self::try_build).
    pub fn build<T, const K: usize, P, const BUCKET_SIZE: usize>(
        self,
    ) -> BloomFilter<T, K, P, BUCKET_SIZE, S, A>
    where
        T: ?Sized + Hash,
        P: Subfilter,
    {
        match self.sizing {
            Sizing::Capacity { num_bits } => {
                BloomFilter::with_capacity_and_hasher_in(num_bits, self.hasher, self.allocator)
            }
            Sizing::Accuracy { max_items, fpr } => BloomFilter::with_accuracy_and_hasher_in(
                max_items,
                fpr,
                self.hasher,
                self.allocator,
            ),
        }
    }

    /// Builds the Bloom filter, reporting allocation failure.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationFailed`](crate::error::ErrorKind::AllocationFailed) if the bit
    /// buffer cannot be allocated.
    pub fn try_build<T, const K: usize, P, const BUCKET_SIZE: usize>(
        self,
    ) -> Result<BloomFilter<T, K, P, BUCKET_SIZE, S, A>, Error>
    where
        T: ?Sized + Hash,
        P: Subfilter,
    {
        match self.sizing {
            Sizing::Capacity { num_bits } => {
                BloomFilter::try_with_capacity_and_hasher_in(num_bits, self.hasher, self.allocator)
            }
            Sizing::Accuracy { max_items, fpr } => BloomFilter::try_with_accuracy_and_hasher_in(
                max_items,
                fpr,
                self.hasher,
                self.allocator,
            ),
        }
    }

    /// Builds the Bloom filter and inserts `items` into it.
    pub fn build_from<'a, T, const K: usize, P, const BUCKET_SIZE: usize, I>(
        self,
        items: I,
    ) -> BloomFilter<T, K, P, BUCKET_SIZE, S, A>
    where
        T: 'a + ?Sized + Hash,
        P: Subfilter,
        I: IntoIterator<Item = &'a T>,
    {
        let mut filter = self.build();
        filter.insert_all(items);
        filter
    }
}
