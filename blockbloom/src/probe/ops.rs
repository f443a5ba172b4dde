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

//! Bit primitives shared by every probe scheme.
//!
//! The same four operations are defined for a single machine word and for a fixed-size
//! array of words, so a probe algorithm written against [`BlockOps`] runs unchanged over
//! either. Array positions are interleaved: bit `n` of `[W; N]` lives in word `n % N` at
//! bit `n / N`, which spreads consecutive positions across the words instead of filling
//! the first word before touching the next.

use std::mem::size_of;

use byteorder::ByteOrder;
use byteorder::NativeEndian;

/// Operations over a block of bits: a word or an array of words.
pub trait BlockOps: Copy {
    /// Total width of the block in bits.
    const BITS: u64;
    /// Size of the block in bytes.
    const BYTES: usize;

    /// Returns a block with all bits cleared.
    fn zero() -> Self;

    /// Sets bit `n`, taken modulo [`Self::BITS`].
    fn set(&mut self, n: u64);

    /// ANDs `acc` with bit `n` of `x` shifted down to bit 0.
    ///
    /// Starting from `acc = 1`, a run of `reduce` calls leaves `acc & 1` equal to the
    /// conjunction of the tested bits without branching on any of them.
    fn reduce(acc: &mut u32, x: &Self, n: u64);

    /// Returns whether every bit set in `y` is also set in `x`.
    fn test_subset(x: &Self, y: &Self) -> bool;

    /// Reads a block from the first [`Self::BYTES`] bytes of `bytes`, in native byte order.
    fn load(bytes: &[u8]) -> Self;

    /// Writes the block to the first [`Self::BYTES`] bytes of `bytes`, in native byte order.
    fn store(&self, bytes: &mut [u8]);
}

impl BlockOps for u8 {
    const BITS: u64 = u8::BITS as u64;
    const BYTES: usize = 1;

    #[inline(always)]
    fn zero() -> Self {
        0
    }

    #[inline(always)]
    fn set(&mut self, n: u64) {
        *self |= 1 << (n % <Self as BlockOps>::BITS);
    }

    #[inline(always)]
    fn reduce(acc: &mut u32, x: &Self, n: u64) {
        *acc &= u32::from(*x >> (n % <Self as BlockOps>::BITS));
    }

    #[inline(always)]
    fn test_subset(x: &Self, y: &Self) -> bool {
        x & y == *y
    }

    #[inline(always)]
    fn load(bytes: &[u8]) -> Self {
        bytes[0]
    }

    #[inline(always)]
    fn store(&self, bytes: &mut [u8]) {
        bytes[0] = *self;
    }
}

macro_rules! impl_block_ops_for_word {
    ($($ty:ty => $read:ident, $write:ident;)*) => {$(
        impl BlockOps for $ty {
            const BITS: u64 = <$ty>::BITS as u64;
            const BYTES: usize = size_of::<$ty>();

            #[inline(always)]
            fn zero() -> Self {
                0
            }

            #[inline(always)]
            fn set(&mut self, n: u64) {
                *self |= 1 << (n % <Self as BlockOps>::BITS);
            }

            #[inline(always)]
            fn reduce(acc: &mut u32, x: &Self, n: u64) {
                // truncation keeps bit 0, which is all `acc` cares about
                *acc &= (*x >> (n % <Self as BlockOps>::BITS)) as u32;
            }

            #[inline(always)]
            fn test_subset(x: &Self, y: &Self) -> bool {
                x & y == *y
            }

            #[inline(always)]
            fn load(bytes: &[u8]) -> Self {
                NativeEndian::$read(bytes)
            }

            #[inline(always)]
            fn store(&self, bytes: &mut [u8]) {
                NativeEndian::$write(bytes, *self)
            }
        }
    )*};
}

impl_block_ops_for_word! {
    u16 => read_u16, write_u16;
    u32 => read_u32, write_u32;
    u64 => read_u64, write_u64;
}

impl<W: BlockOps, const N: usize> BlockOps for [W; N] {
    const BITS: u64 = W::BITS * N as u64;
    const BYTES: usize = W::BYTES * N;

    #[inline(always)]
    fn zero() -> Self {
        [W::zero(); N]
    }

    #[inline(always)]
    fn set(&mut self, n: u64) {
        let n = n % <Self as BlockOps>::BITS;
        self[(n % N as u64) as usize].set(n / N as u64);
    }

    #[inline(always)]
    fn reduce(acc: &mut u32, x: &Self, n: u64) {
        let n = n % <Self as BlockOps>::BITS;
        W::reduce(acc, &x[(n % N as u64) as usize], n / N as u64);
    }

    #[inline(always)]
    fn test_subset(x: &Self, y: &Self) -> bool {
        // no short circuit: the whole array is compared as one unit
        x.iter()
            .zip(y.iter())
            .fold(true, |res, (a, b)| res & W::test_subset(a, b))
    }

    #[inline(always)]
    fn load(bytes: &[u8]) -> Self {
        let mut res = Self::zero();
        for (i, word) in res.iter_mut().enumerate() {
            *word = W::load(&bytes[i * W::BYTES..]);
        }
        res
    }

    #[inline(always)]
    fn store(&self, bytes: &mut [u8]) {
        for (i, word) in self.iter().enumerate() {
            word.store(&mut bytes[i * W::BYTES..]);
        }
    }
}
