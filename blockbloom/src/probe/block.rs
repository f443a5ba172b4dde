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

use std::marker::PhantomData;

use crate::probe::BlockOps;
use crate::probe::Subfilter;
use crate::probe::base::for_each_position;

/// Classical block layout: all `K` marks land in a single `W`.
///
/// `W` is a word or an array of words whose bit width is a power of two, e.g. `u64` or
/// `[u64; 8]` for a full cache line.
pub struct Block<W, const K: usize> {
    _marker: PhantomData<W>,
}

impl<W: BlockOps, const K: usize> Block<W, K> {
    const VALID: () = {
        assert!(K > 0, "K must be at least 1");
        assert!(W::BITS.is_power_of_two(), "block width must be a power of two");
    };

    /// Sets the `K` bits selected by `hash` in `x`.
    #[inline]
    pub fn mark_value(x: &mut W, hash: u64) {
        let () = Self::VALID;
        for_each_position(W::BITS, K, hash, |n| x.set(n));
    }

    /// Returns whether all `K` bits selected by `hash` are set in `x`.
    #[inline]
    pub fn check_value(x: &W, hash: u64) -> bool {
        let () = Self::VALID;
        let mut fp = W::zero();
        for_each_position(W::BITS, K, hash, |n| fp.set(n));
        W::test_subset(x, &fp)
    }
}

impl<W: BlockOps, const K: usize> Subfilter for Block<W, K> {
    const K: usize = K;
    const BLOCK_SIZE: usize = W::BYTES;

    #[inline]
    fn mark(block: &mut [u8], hash: u64) {
        let mut x = W::load(block);
        Self::mark_value(&mut x, hash);
        x.store(block);
    }

    #[inline]
    fn check(block: &[u8], hash: u64) -> bool {
        Self::check_value(&W::load(block), hash)
    }

    fn fpr(i: usize, w: usize) -> f64 {
        let k = K as f64;
        (1.0 - (1.0 - 1.0 / w as f64).powf(k * i as f64)).powf(k)
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_marked_value_is_found() {
        let mut x = 0u64;
        let hash = 0x9E3779B97F4A7C15u64;
        assert!(!Block::<u64, 3>::check_value(&x, hash));
        Block::<u64, 3>::mark_value(&mut x, hash);
        assert!(Block::<u64, 3>::check_value(&x, hash));
        assert!(x.count_ones() >= 1 && x.count_ones() <= 3);
    }

    #[test]
    fn test_positions_match_probe_loop() {
        // 64-bit word: positions are consecutive 6-bit fields above the lowest one
        let hash = (5 << 6) | (17 << 12) | (40 << 18);
        let mut x = 0u64;
        Block::<u64, 3>::mark_value(&mut x, hash);
        assert_eq!(x, (1 << 5) | (1 << 17) | (1 << 40));
    }

    #[test]
    fn test_bytes_agree_with_value() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut bytes = [0u8; 32];
        let mut value = <[u64; 4]>::zero();
        for _ in 0..50 {
            let state = rng.random::<u64>();
            Block::<[u64; 4], 7>::mark(&mut bytes, state);
            Block::<[u64; 4], 7>::mark_value(&mut value, state);
            assert!(Block::<[u64; 4], 7>::check(&bytes, state));
        }
        assert_eq!(<[u64; 4]>::load(&bytes), value);
    }

    #[test]
    fn test_fpr_grows_with_load() {
        let w = 256;
        let empty = Block::<[u64; 4], 5>::fpr(0, w);
        let light = Block::<[u64; 4], 5>::fpr(10, w);
        let heavy = Block::<[u64; 4], 5>::fpr(100, w);
        assert_eq!(empty, 0.0);
        assert!(light > 0.0 && light < heavy && heavy < 1.0);
    }
}
