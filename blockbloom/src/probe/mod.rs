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

//! Probe schemes: how one 64-bit hash becomes the bits of a block.
//!
//! A filter picks a bucket for each of its `K` subfilter applications and hands the bytes of
//! the block starting there to a [`Subfilter`]. The subfilter derives its own marks from the
//! same hash and either sets them ([`Subfilter::mark`]) or tests them
//! ([`Subfilter::check`]).
//!
//! | Scheme | Block | Marks |
//! |---|---|---|
//! | [`Block<W, K>`] | one `W` | `K` bits anywhere in `W` |
//! | [`Multiblock<W, K>`] | `[W; K]` | one bit per word |
//! | [`FastMultiblock32<K>`] | `K` 32-bit lanes, padded to 32-byte groups | one bit per lane |
//! | [`FastMultiblock64<K>`] | `K` 64-bit lanes, padded to 64-byte groups | one bit per lane |
//!
//! `W` is any [`BlockOps`] type: `u8`, `u16`, `u32`, `u64` or an array of them.

mod base;
mod block;
mod multiblock;
mod ops;

pub mod fast;

pub use self::block::Block;
pub use self::fast::FastMultiblock32;
pub use self::fast::FastMultiblock64;
pub use self::multiblock::Multiblock;
pub use self::ops::BlockOps;

/// A block layout together with the way marks are placed in it.
///
/// Implementations are zero-sized markers used as type parameters of
/// [`BloomFilter`](crate::bloom::BloomFilter); they are never instantiated.
pub trait Subfilter {
    /// Number of bits marked per application.
    const K: usize;

    /// Number of bytes a single application may read or write.
    const BLOCK_SIZE: usize;

    /// Number of leading bytes of the block that carry marks.
    ///
    /// Smaller than [`Self::BLOCK_SIZE`] only when the block is padded, as the fast
    /// multiblock layouts are.
    const USED_SIZE: usize = Self::BLOCK_SIZE;

    /// Sets the marks of `hash` in `block`, which is at least [`Self::BLOCK_SIZE`] bytes long.
    fn mark(block: &mut [u8], hash: u64);

    /// Returns whether every mark of `hash` is set in `block`.
    fn check(block: &[u8], hash: u64) -> bool;

    /// False-positive rate of a single block of `w` bits holding `i` elements.
    fn fpr(i: usize, w: usize) -> f64;
}
