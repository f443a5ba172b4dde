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

//! The probe loop shared by the scalar schemes.
//!
//! A `width`-bit block needs `shift = log2(width)` hash bits per position. One 64-bit hash
//! yields `(64 - shift) / shift` positions by repeatedly shifting it right; after that the
//! hash is re-mixed with [`mulx64_mix`] and the shifting starts over from the new value.
//! The lowest `shift` bits of every fresh hash are skipped.

use crate::hash::mulx64_mix;

#[inline(always)]
const fn shift_for(width: u64) -> u32 {
    debug_assert!(width.is_power_of_two() && width > 1);
    width.trailing_zeros()
}

/// Calls `f` with each of the `k` positions derived from `hash` for a `width`-bit block.
#[inline(always)]
pub(crate) fn for_each_position(width: u64, k: usize, mut hash: u64, mut f: impl FnMut(u64)) {
    let shift = shift_for(width);
    let mask = width - 1;
    let rehash_k = ((64 - shift) / shift) as usize;

    for _ in 0..k / rehash_k {
        let mut h = hash;
        for _ in 0..rehash_k {
            h >>= shift;
            f(h & mask);
        }
        hash = mulx64_mix(hash);
    }
    let mut h = hash;
    for _ in 0..k % rehash_k {
        h >>= shift;
        f(h & mask);
    }
}

/// Like [`for_each_position`], but stops as soon as `f` returns `false`.
///
/// Returns whether every call returned `true`.
#[inline(always)]
pub(crate) fn all_positions(
    width: u64,
    k: usize,
    mut hash: u64,
    mut f: impl FnMut(u64) -> bool,
) -> bool {
    let shift = shift_for(width);
    let mask = width - 1;
    let rehash_k = ((64 - shift) / shift) as usize;

    for _ in 0..k / rehash_k {
        let mut h = hash;
        for _ in 0..rehash_k {
            h >>= shift;
            if !f(h & mask) {
                return false;
            }
        }
        hash = mulx64_mix(hash);
    }
    let mut h = hash;
    for _ in 0..k % rehash_k {
        h >>= shift;
        if !f(h & mask) {
            return false;
        }
    }
    true
}
