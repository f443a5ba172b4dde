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

//! Multiblock variants laid out for 256-bit vector registers.
//!
//! A block is a sequence of groups of eight lanes. Each group takes up to eight marks, one
//! per lane, all derived from the same hash without running the scalar probe loop; the next
//! group uses the hash re-mixed with [`mulx64_mix`]. Lanes past the number of marks left for
//! the last group are never written and always pass the check.
//!
//! The group kernels are chosen at compile time: AVX2 on `x86_64`, NEON on little-endian
//! `aarch64`, and a lane-by-lane emulation everywhere else. All of them produce the same bits.

#[cfg_attr(
    any(
        all(target_arch = "x86_64", target_feature = "avx2"),
        all(target_arch = "aarch64", target_endian = "little", target_feature = "neon")
    ),
    allow(dead_code)
)]
mod portable;

#[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
mod avx2;
#[cfg(all(target_arch = "aarch64", target_endian = "little", target_feature = "neon"))]
mod neon;

#[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
use self::avx2 as kernel;
#[cfg(all(target_arch = "aarch64", target_endian = "little", target_feature = "neon"))]
use self::neon as kernel;
#[cfg(not(any(
    all(target_arch = "x86_64", target_feature = "avx2"),
    all(target_arch = "aarch64", target_endian = "little", target_feature = "neon")
)))]
use self::portable as kernel;

use crate::hash::mulx64_mix;
use crate::probe::Subfilter;

/// Name of the group kernel compiled into this build: `"avx2"`, `"neon"` or `"portable"`.
pub const BACKEND: &str = kernel::NAME;

const LANES: usize = 8;
const GROUP_SIZE_32: usize = 32;
const GROUP_SIZE_64: usize = 64;

const fn ones<T: Copy>(one: T, zero: T) -> [[T; LANES]; LANES] {
    let mut table = [[zero; LANES]; LANES];
    let mut kp = 0;
    while kp < LANES {
        let mut i = 0;
        while i <= kp {
            table[kp][i] = one;
            i += 1;
        }
        kp += 1;
    }
    table
}

/// `ONES_32[kp - 1]` has lanes `0..kp` set to one.
static ONES_32: [[u32; LANES]; LANES] = ones(1, 0);
/// `ONES_64[kp - 1]` has lanes `0..kp` set to one.
static ONES_64: [[u64; LANES]; LANES] = ones(1, 0);

/// Bit selected in each 32-bit lane: lane `2j` takes the top five bits of the low half of
/// `hash << 5j`, lane `2j + 1` those of the high half.
#[inline(always)]
fn lane_shifts_32(hash: u64) -> [u32; LANES] {
    let mut res = [0; LANES];
    for j in 0..LANES / 2 {
        let h = hash << (5 * j);
        res[2 * j] = (h as u32) >> 27;
        res[2 * j + 1] = ((h >> 32) as u32) >> 27;
    }
    res
}

/// Bit selected in each 64-bit lane: lane `i` takes hash bits `[6(i + 1), 6(i + 1) + 6)`.
#[inline(always)]
fn lane_shifts_64(hash: u64) -> [u64; LANES] {
    let mut res = [0; LANES];
    for (i, shift) in res.iter_mut().enumerate() {
        *shift = (hash >> (6 * (i + 1))) & 63;
    }
    res
}

/// Multiblock over 32-bit lanes: `K` marks, one per `u32`.
///
/// The block occupies `32 * ceil(K / 8)` bytes of which the first `4 * K` are used. Marks are
/// placed by lane, not by the scalar probe loop, so the stored bits differ from those of
/// [`Multiblock<u32, K>`](crate::probe::Multiblock) for the same hash on every platform.
pub struct FastMultiblock32<const K: usize>;

/// Multiblock over 64-bit lanes: `K` marks, one per `u64`.
///
/// The block occupies `64 * ceil(K / 8)` bytes of which the first `8 * K` are used. As with
/// [`FastMultiblock32`], the bits differ from those of
/// [`Multiblock<u64, K>`](crate::probe::Multiblock).
pub struct FastMultiblock64<const K: usize>;

macro_rules! impl_fast_multiblock {
    ($name:ident, $group_size:expr, $lane_size:expr, $mark:ident, $check:ident) => {
        impl<const K: usize> $name<K> {
            const VALID: () = assert!(K > 0, "K must be at least 1");
        }

        impl<const K: usize> Subfilter for $name<K> {
            const K: usize = K;
            const BLOCK_SIZE: usize = $group_size * K.div_ceil(LANES);
            const USED_SIZE: usize = $lane_size * K;

            #[inline]
            fn mark(block: &mut [u8], mut hash: u64) {
                let () = Self::VALID;
                let mut groups = block.chunks_exact_mut($group_size);
                for _ in 0..K / LANES {
                    if let Some(group) = groups.next() {
                        kernel::$mark(group, hash, LANES);
                    }
                    hash = mulx64_mix(hash);
                }
                if K % LANES != 0 {
                    if let Some(group) = groups.next() {
                        kernel::$mark(group, hash, K % LANES);
                    }
                }
            }

            #[inline]
            fn check(block: &[u8], mut hash: u64) -> bool {
                let () = Self::VALID;
                let mut groups = block.chunks_exact($group_size);
                for _ in 0..K / LANES {
                    match groups.next() {
                        Some(group) if kernel::$check(group, hash, LANES) => {}
                        _ => return false,
                    }
                    hash = mulx64_mix(hash);
                }
                if K % LANES != 0 {
                    return groups
                        .next()
                        .is_some_and(|group| kernel::$check(group, hash, K % LANES));
                }
                true
            }

            fn fpr(i: usize, w: usize) -> f64 {
                let k = K as f64;
                (1.0 - (1.0 - k / w as f64).powf(i as f64)).powf(k)
            }
        }
    };
}

impl_fast_multiblock!(FastMultiblock32, GROUP_SIZE_32, 4, mark_32, check_32);
impl_fast_multiblock!(FastMultiblock64, GROUP_SIZE_64, 8, mark_64, check_64);
