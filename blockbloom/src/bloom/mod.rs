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

//! Bloom filters for probabilistic set membership testing.
//!
//! A Bloom filter is a space-efficient probabilistic data structure used to test whether
//! an element is a member of a set. False positive matches are possible, but false negatives
//! are not. In other words, a query returns either "possibly in set" or "definitely not in set".
//!
//! # Properties
//!
//! - **No false negatives**: If an item was inserted, `may_contain()` will always return `true`
//! - **Possible false positives**: `may_contain()` may return `true` for items never inserted
//! - **Fixed size**: The filter never resizes by itself; [`BloomFilter::reset`] changes its
//!   capacity explicitly
//! - **No deletion**: Bits are only ever set, until the filter is cleared
//!
//! # Usage
//!
//! ```rust
//! use blockbloom::bloom::BloomFilter;
//! use blockbloom::bloom::BloomFilterBuilder;
//! use blockbloom::probe::FastMultiblock32;
//!
//! // Create a filter optimized for 1000 items with 1% false positive rate
//! let mut filter: BloomFilter<str, 1, FastMultiblock32<8>> =
//!     BloomFilterBuilder::with_accuracy(1000, 0.01).build();
//!
//! // Insert items
//! filter.insert("apple");
//! filter.insert("banana");
//!
//! // Check membership
//! assert!(filter.may_contain("apple")); // true - definitely inserted
//! println!("grape: {}", filter.may_contain("grape")); // false, unless a false positive
//!
//! println!("Capacity: {} bits", filter.capacity());
//! ```
//!
//! # Choosing a layout
//!
//! The filter type fixes how the bits of an element are laid out:
//!
//! - `BloomFilter<T, K>`: classical Bloom filter, `K` bits anywhere in the buffer. Best FPR
//!   for a given size, one cache miss per bit.
//! - `BloomFilter<T, 1, Block<u64, K>>`: all `K` bits in one 64-bit word. One memory access,
//!   worse FPR.
//! - `BloomFilter<T, 1, Multiblock<u64, 8>>`: one bit in each of 8 consecutive words, a
//!   cache line. A good middle ground.
//! - `BloomFilter<T, 1, FastMultiblock32<8>>`: the same idea laid out for SIMD registers.
//!
//! See [`probe`](crate::probe) for all layouts.
//!
//! # Sizing
//!
//! [`BloomFilter::capacity_for`] and [`BloomFilter::fpr_for`] translate between capacity and
//! false-positive rate for a given layout, using a model that accounts for the uneven load
//! of blocks. A target FPR can also be given directly:
//!
//! ```rust
//! # use blockbloom::bloom::BloomFilter;
//! # use blockbloom::probe::Block;
//! type Filter = BloomFilter<u64, 1, Block<u64, 8>>;
//! let filter = Filter::with_accuracy(10_000, 0.01);
//! let capacity = Filter::capacity_for(10_000, 0.01);
//! assert_eq!(filter.capacity(), Filter::with_capacity(capacity).capacity());
//! assert!(Filter::fpr_for(10_000, filter.capacity()) <= 0.0101);
//! ```
//!
//! # Memory
//!
//! The bit buffer comes from a [`BufferAllocator`](crate::allocator::BufferAllocator). Copy,
//! move and swap of filters follow the allocator's
//! [`Propagation`](crate::allocator::Propagation) rules; see [`BloomFilter::clone_from`],
//! [`BloomFilter::move_from`] and [`BloomFilter::swap`].
//!
//! # References
//!
//! - Bloom, Burton H. (1970). "Space/time trade-offs in hash coding with allowable errors"
//! - Putze, Sanders and Singler (2007). "Cache-, Hash- and Space-Efficient Bloom Filters"

mod builder;
mod core;
mod filter;
mod fpr;
mod position;

pub use self::builder::BloomFilterBuilder;
pub use self::filter::BloomFilter;
