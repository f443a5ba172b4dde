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

//! AVX2 group kernels.

use std::arch::x86_64::__m256i;
use std::arch::x86_64::_mm256_and_si256;
use std::arch::x86_64::_mm256_loadu_si256;
use std::arch::x86_64::_mm256_or_si256;
use std::arch::x86_64::_mm256_set_epi64x;
use std::arch::x86_64::_mm256_set1_epi64x;
use std::arch::x86_64::_mm256_sllv_epi32;
use std::arch::x86_64::_mm256_sllv_epi64;
use std::arch::x86_64::_mm256_srli_epi32;
use std::arch::x86_64::_mm256_srlv_epi64;
use std::arch::x86_64::_mm256_storeu_si256;
use std::arch::x86_64::_mm256_testc_si256;

use super::GROUP_SIZE_32;
use super::GROUP_SIZE_64;
use super::ONES_32;
use super::ONES_64;

pub(super) const NAME: &str = "avx2";

#[inline(always)]
fn pattern_32(hash: u64, kp: usize) -> __m256i {
    // SAFETY: avx2 is enabled for the whole build; `ONES_32[kp - 1]` is 32 bytes long.
    unsafe {
        let h = _mm256_set1_epi64x(hash as i64);
        let h = _mm256_sllv_epi64(h, _mm256_set_epi64x(15, 10, 5, 0));
        let h = _mm256_srli_epi32::<27>(h);
        let ones = _mm256_loadu_si256(ONES_32[kp - 1].as_ptr().cast());
        _mm256_sllv_epi32(ones, h)
    }
}

#[inline(always)]
fn pattern_64(hash: u64, kp: usize) -> [__m256i; 2] {
    // SAFETY: avx2 is enabled for the whole build; `ONES_64[kp - 1]` is 64 bytes long.
    unsafe {
        let h = _mm256_set1_epi64x(hash as i64);
        let mask = _mm256_set1_epi64x(63);
        let lo = _mm256_and_si256(_mm256_srlv_epi64(h, _mm256_set_epi64x(24, 18, 12, 6)), mask);
        let hi = _mm256_and_si256(_mm256_srlv_epi64(h, _mm256_set_epi64x(48, 42, 36, 30)), mask);
        let ones = ONES_64[kp - 1].as_ptr();
        [
            _mm256_sllv_epi64(_mm256_loadu_si256(ones.cast()), lo),
            _mm256_sllv_epi64(_mm256_loadu_si256(ones.add(4).cast()), hi),
        ]
    }
}

#[inline]
pub(super) fn mark_32(group: &mut [u8], hash: u64, kp: usize) {
    let group = &mut group[..GROUP_SIZE_32];
    let pattern = pattern_32(hash, kp);
    // SAFETY: `group` is 32 bytes long; unaligned loads and stores are used.
    unsafe {
        let p = group.as_mut_ptr().cast::<__m256i>();
        _mm256_storeu_si256(p, _mm256_or_si256(_mm256_loadu_si256(p), pattern));
    }
}

#[inline]
pub(super) fn check_32(group: &[u8], hash: u64, kp: usize) -> bool {
    let group = &group[..GROUP_SIZE_32];
    let pattern = pattern_32(hash, kp);
    // SAFETY: `group` is 32 bytes long.
    unsafe { _mm256_testc_si256(_mm256_loadu_si256(group.as_ptr().cast()), pattern) != 0 }
}

#[inline]
pub(super) fn mark_64(group: &mut [u8], hash: u64, kp: usize) {
    let group = &mut group[..GROUP_SIZE_64];
    let [lo, hi] = pattern_64(hash, kp);
    // SAFETY: `group` is 64 bytes long.
    unsafe {
        let p = group.as_mut_ptr().cast::<__m256i>();
        _mm256_storeu_si256(p, _mm256_or_si256(_mm256_loadu_si256(p), lo));
        let p = p.add(1);
        _mm256_storeu_si256(p, _mm256_or_si256(_mm256_loadu_si256(p), hi));
    }
}

#[inline]
pub(super) fn check_64(group: &[u8], hash: u64, kp: usize) -> bool {
    let group = &group[..GROUP_SIZE_64];
    let [lo, hi] = pattern_64(hash, kp);
    // SAFETY: `group` is 64 bytes long.
    unsafe {
        let p = group.as_ptr().cast::<__m256i>();
        let lo = _mm256_testc_si256(_mm256_loadu_si256(p), lo);
        let hi = _mm256_testc_si256(_mm256_loadu_si256(p.add(1)), hi);
        (lo & hi) != 0
    }
}
