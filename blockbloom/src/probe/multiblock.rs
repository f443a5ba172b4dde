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
use crate::probe::base::all_positions;
use crate::probe::base::for_each_position;

/// Multiblock layout: the block is `[W; K]` and the i-th mark lands in the i-th word.
///
/// With `BRANCHLESS = true`, [`check`](Subfilter::check) inspects all `K` words and folds the
/// results with [`BlockOps::reduce`] instead of returning at the first unset bit. Both paths
/// give the same answer; which one is faster depends on the hit ratio of the workload.
pub struct Multiblock<W, const K: usize, const BRANCHLESS: bool = false> {
    _marker: PhantomData<W>,
}

impl<W: BlockOps, const K: usize, const BRANCHLESS: bool> Multiblock<W, K, BRANCHLESS> {
    const VALID: () = {
        assert!(K > 0, "K must be at least 1");
        assert!(W::BITS.is_power_of_two(), "word width must be a power of two");
    };

    /// Sets one bit in each word of `x`.
    #[inline]
    pub fn mark_value(x: &mut [W; K], hash: u64) {
        let () = Self::VALID;
        let mut i = 0;
        for_each_position(W::BITS, K, hash, |n| {
            x[i].set(n);
            i += 1;
        });
    }

    /// Returns whether the bit selected by `hash` in each word of `x` is set.
    #[inline]
    pub fn check_value(x: &[W; K], hash: u64) -> bool {
        let () = Self::VALID;
        let mut i = 0;
        if BRANCHLESS {
            let mut res = 1;
            for_each_position(W::BITS, K, hash, |n| {
                W::reduce(&mut res, &x[i], n);
                i += 1;
            });
            res & 1 != 0
        } else {
            all_positions(W::BITS, K, hash, |n| {
                let mut res = 1;
                W::reduce(&mut res, &x[i], n);
                i += 1;
                res & 1 != 0
            })
        }
    }
}

impl<W: BlockOps, const K: usize, const BRANCHLESS: bool> Subfilter
    for Multiblock<W, K, BRANCHLESS>
{
    const K: usize = K;
    const BLOCK_SIZE: usize = W::BYTES * K;

    #[inline]
    fn mark(block: &mut [u8], hash: u64) {
        let () = Self::VALID;
        let mut i = 0;
        for_each_position(W::BITS, K, hash, |n| {
            let bytes = &mut block[i * W::BYTES..];
            let mut x = W::load(bytes);
            x.set(n);
            x.store(bytes);
            i += 1;
        });
    }

    #[inline]
    fn check(block: &[u8], hash: u64) -> bool {
        let () = Self::VALID;
        let mut i = 0;
        if BRANCHLESS {
            let mut res = 1;
            for_each_position(W::BITS, K, hash, |n| {
                W::reduce(&mut res, &W::load(&block[i * W::BYTES..]), n);
                i += 1;
            });
            res & 1 != 0
        } else {
            all_positions(W::BITS, K, hash, |n| {
                let mut res = 1;
                W::reduce(&mut res, &W::load(&block[i * W::BYTES..]), n);
                i += 1;
                res & 1 != 0
            })
        }
    }

    fn fpr(i: usize, w: usize) -> f64 {
        let k = K as f64;
        (1.0 - (1.0 - k / w as f64).powf(i as f64)).powf(k)
    }
}
