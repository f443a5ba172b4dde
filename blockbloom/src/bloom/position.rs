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

use crate::hash::mulx64;

/// Maps a hash to bucket positions by multiply-and-take-high-word.
///
/// The hash is forced odd and then used as the state of a multiplicative congruential
/// generator modulo 2^64 whose multiplier is the bucket count. Each step yields the high
/// word of the 128-bit product as a position in `0..range` (Lemire's fast range) and keeps
/// the low word as the next state. The bucket count is bumped to be 3 or 5 modulo 8 so the
/// generator has full period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Positions {
    rng: usize,
}

impl Positions {
    pub fn new(m: usize) -> Self {
        let adjustment = match m % 8 {
            r @ 0..=3 => 3 - r,
            r @ 4..=5 => 5 - r,
            r => 8 - r + 3,
        };
        Self {
            rng: m + adjustment,
        }
    }

    pub fn range(&self) -> usize {
        self.rng
    }

    #[inline(always)]
    pub fn prepare_hash(&self, hash: &mut u64) {
        *hash |= 1;
    }

    #[inline(always)]
    pub fn next_position(&self, hash: &mut u64) -> usize {
        let (lo, hi) = mulx64(*hash, self.rng as u64);
        *hash = lo;
        hi as usize
    }
}
