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

//! NEON group kernels. A 256-bit group is handled as two (32-bit lanes) or four (64-bit
//! lanes) 128-bit registers.

use std::arch::aarch64::uint32x4_t;
use std::arch::aarch64::uint64x2_t;
use std::arch::aarch64::vandq_u32;
use std::arch::aarch64::vandq_u64;
use std::arch::aarch64::vceqzq_u32;
use std::arch::aarch64::vceqzq_u64;
use std::arch::aarch64::vdupq_n_u64;
use std::arch::aarch64::vld1q_s64;
use std::arch::aarch64::vld1q_u8;
use std::arch::aarch64::vld1q_u32;
use std::arch::aarch64::vld1q_u64;
use std::arch::aarch64::vminvq_u32;
use std::arch::aarch64::vorrq_u32;
use std::arch::aarch64::vorrq_u64;
use std::arch::aarch64::vreinterpretq_s32_u32;
use std::arch::aarch64::vreinterpretq_s64_u64;
use std::arch::aarch64::vreinterpretq_u8_u32;
use std::arch::aarch64::vreinterpretq_u8_u64;
use std::arch::aarch64::vreinterpretq_u32_u8;
use std::arch::aarch64::vreinterpretq_u32_u64;
use std::arch::aarch64::vreinterpretq_u64_u8;
use std::arch::aarch64::vshlq_u32;
use std::arch::aarch64::vshlq_u64;
use std::arch::aarch64::vshrq_n_u32;
use std::arch::aarch64::vst1q_u8;
use std::arch::aarch64::vtstq_u32;
use std::arch::aarch64::vtstq_u64;

use super::GROUP_SIZE_32;
use super::GROUP_SIZE_64;
use super::ONES_32;
use super::ONES_64;

pub(super) const NAME: &str = "neon";

const SHIFTS_32: [[i64; 2]; 2] = [[0, 5], [10, 15]];
const SHIFTS_64: [[i64; 2]; 4] = [[-6, -12], [-18, -24], [-30, -36], [-42, -48]];

#[inline(always)]
fn pattern_32(hash: u64, kp: usize) -> [uint32x4_t; 2] {
    let ones = ONES_32[kp - 1].as_ptr();
    // SAFETY: neon is enabled for the whole build; every load reads within a table.
    unsafe {
        let h = vdupq_n_u64(hash);
        let mut res = [vld1q_u32(ones), vld1q_u32(ones.add(4))];
        for (half, shifts) in res.iter_mut().zip(SHIFTS_32.iter()) {
            let s = vreinterpretq_u32_u64(vshlq_u64(h, vld1q_s64(shifts.as_ptr())));
            let s = vshrq_n_u32::<27>(s);
            *half = vshlq_u32(*half, vreinterpretq_s32_u32(s));
        }
        res
    }
}

#[inline(always)]
fn pattern_64(hash: u64, kp: usize) -> [uint64x2_t; 4] {
    let ones = ONES_64[kp - 1].as_ptr();
    // SAFETY: neon is enabled for the whole build; every load reads within a table.
    unsafe {
        let h = vdupq_n_u64(hash);
        let mask = vdupq_n_u64(63);
        let mut res = [
            vld1q_u64(ones),
            vld1q_u64(ones.add(2)),
            vld1q_u64(ones.add(4)),
            vld1q_u64(ones.add(6)),
        ];
        for (quarter, shifts) in res.iter_mut().zip(SHIFTS_64.iter()) {
            let s = vandq_u64(vshlq_u64(h, vld1q_s64(shifts.as_ptr())), mask);
            *quarter = vshlq_u64(*quarter, vreinterpretq_s64_u64(s));
        }
        res
    }
}

#[inline]
pub(super) fn mark_32(group: &mut [u8], hash: u64, kp: usize) {
    let group = &mut group[..GROUP_SIZE_32];
    let pattern = pattern_32(hash, kp);
    for (bytes, bits) in group.chunks_exact_mut(16).zip(pattern) {
        // SAFETY: `bytes` is 16 bytes long.
        unsafe {
            let x = vreinterpretq_u32_u8(vld1q_u8(bytes.as_ptr()));
            vst1q_u8(bytes.as_mut_ptr(), vreinterpretq_u8_u32(vorrq_u32(x, bits)));
        }
    }
}

#[inline]
pub(super) fn check_32(group: &[u8], hash: u64, kp: usize) -> bool {
    let group = &group[..GROUP_SIZE_32];
    let pattern = pattern_32(hash, kp);
    // SAFETY: both halves of `group` are 16 bytes long.
    unsafe {
        let mut res = vceqzq_u32(vreinterpretq_u32_u64(vdupq_n_u64(0)));
        for (bytes, bits) in group.chunks_exact(16).zip(pattern) {
            let x = vreinterpretq_u32_u8(vld1q_u8(bytes.as_ptr()));
            // unused lanes have no bit to find and are forced to pass
            let hit = vorrq_u32(vtstq_u32(x, bits), vceqzq_u32(bits));
            res = vandq_u32(res, hit);
        }
        vminvq_u32(res) == u32::MAX
    }
}

#[inline]
pub(super) fn mark_64(group: &mut [u8], hash: u64, kp: usize) {
    let group = &mut group[..GROUP_SIZE_64];
    let pattern = pattern_64(hash, kp);
    for (bytes, bits) in group.chunks_exact_mut(16).zip(pattern) {
        // SAFETY: `bytes` is 16 bytes long.
        unsafe {
            let x = vreinterpretq_u64_u8(vld1q_u8(bytes.as_ptr()));
            vst1q_u8(bytes.as_mut_ptr(), vreinterpretq_u8_u64(vorrq_u64(x, bits)));
        }
    }
}

#[inline]
pub(super) fn check_64(group: &[u8], hash: u64, kp: usize) -> bool {
    let group = &group[..GROUP_SIZE_64];
    let pattern = pattern_64(hash, kp);
    // SAFETY: all four quarters of `group` are 16 bytes long.
    unsafe {
        let mut res = vceqzq_u64(vdupq_n_u64(0));
        for (bytes, bits) in group.chunks_exact(16).zip(pattern) {
            let x = vreinterpretq_u64_u8(vld1q_u8(bytes.as_ptr()));
            let hit = vorrq_u64(vtstq_u64(x, bits), vceqzq_u64(bits));
            res = vandq_u64(res, hit);
        }
        vminvq_u32(vreinterpretq_u32_u64(res)) == u32::MAX
    }
}
