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
use std::hash::Hasher;

/// Multiplier of the mixer: 2^64 divided by the golden ratio.
const PHI_64: u64 = 0x9E3779B97F4A7C15;

/// Full 64x64 -> 128 bit multiplication, returned as `(low, high)`.
#[inline(always)]
pub fn mulx64(x: u64, y: u64) -> (u64, u64) {
    let r = (x as u128) * (y as u128);
    (r as u64, (r >> 64) as u64)
}

/// Fast invertible-ish mixer: XOR of the two halves of `x * PHI_64`.
///
/// Used to derive fresh sub-hashes from a single digest and to repair digests of
/// non-avalanching hash functions.
#[inline(always)]
pub fn mulx64_mix(x: u64) -> u64 {
    let (lo, hi) = mulx64(x, PHI_64);
    hi ^ lo
}

/// Adapter post-mixing the digests of an inner [`BuildHasher`] with [`mulx64_mix`].
///
/// # Examples
///
/// ```
/// # use std::hash::BuildHasher;
/// # use std::hash::BuildHasherDefault;
/// # use std::collections::hash_map::DefaultHasher;
/// # use blockbloom::hash::Mixed;
/// # use blockbloom::hash::mulx64_mix;
/// let inner = BuildHasherDefault::<DefaultHasher>::default();
/// let mixed = Mixed::new(inner.clone());
/// assert_eq!(mixed.hash_one(7u32), mulx64_mix(inner.hash_one(7u32)));
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Mixed<S> {
    inner: S,
}

impl<S> Mixed<S> {
    /// Wraps `inner`.
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Returns the wrapped builder.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: BuildHasher> BuildHasher for Mixed<S> {
    type Hasher = MixedHasher<S::Hasher>;

    fn build_hasher(&self) -> Self::Hasher {
        MixedHasher {
            inner: self.inner.build_hasher(),
        }
    }
}

/// Hasher produced by [`Mixed`].
#[derive(Debug, Clone)]
pub struct MixedHasher<H> {
    inner: H,
}

impl<H: Hasher> Hasher for MixedHasher<H> {
    fn finish(&self) -> u64 {
        mulx64_mix(self.inner.finish())
    }

    fn write(&mut self, bytes: &[u8]) {
        self.inner.write(bytes);
    }

    fn write_u64(&mut self, i: u64) {
        self.inner.write_u64(i);
    }

    fn write_u32(&mut self, i: u32) {
        self.inner.write_u32(i);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::BuildHasherDefault;

    use super::*;

    #[test]
    fn test_mulx64() {
        assert_eq!(mulx64(0, u64::MAX), (0, 0));
        assert_eq!(mulx64(u64::MAX, 2), (u64::MAX - 1, 1));
        assert_eq!(mulx64(1 << 63, 4), (0, 2));
    }

    #[test]
    fn test_mix_spreads_small_inputs() {
        // consecutive integers must land far apart
        let a = mulx64_mix(1);
        let b = mulx64_mix(2);
        assert_eq!(a, PHI_64);
        assert!((a ^ b).count_ones() > 16);
        assert_eq!(mulx64_mix(0), 0);
    }

    #[test]
    fn test_mixed_hasher_matches_manual_mix() {
        let inner = BuildHasherDefault::<DefaultHasher>::default();
        let mixed = Mixed::new(inner.clone());
        for i in 0..100u64 {
            assert_eq!(mixed.hash_one(i), mulx64_mix(inner.hash_one(i)));
        }
    }
}
