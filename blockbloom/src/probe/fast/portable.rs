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

//! Lane-by-lane emulation of the vector kernels.

use byteorder::ByteOrder;
use byteorder::NativeEndian;

use super::LANES;
use super::ONES_32;
use super::ONES_64;
use super::lane_shifts_32;
use super::lane_shifts_64;

pub(super) const NAME: &str = "portable";

#[inline(always)]
fn pattern_32(hash: u64, kp: usize) -> [u32; LANES] {
    let shifts = lane_shifts_32(hash);
    let mut res = ONES_32[kp - 1];
    for (lane, shift) in res.iter_mut().zip(shifts) {
        *lane <<= shift;
    }
    res
}

#[inline(always)]
fn pattern_64(hash: u64, kp: usize) -> [u64; LANES] {
    let shifts = lane_shifts_64(hash);
    let mut res = ONES_64[kp - 1];
    for (lane, shift) in res.iter_mut().zip(shifts) {
        *lane <<= shift;
    }
    res
}

#[inline]
pub(super) fn mark_32(group: &mut [u8], hash: u64, kp: usize) {
    let pattern = pattern_32(hash, kp);
    for (bytes, bits) in group.chunks_exact_mut(4).zip(pattern) {
        let x = NativeEndian::read_u32(bytes) | bits;
        NativeEndian::write_u32(bytes, x);
    }
}

#[inline]
pub(super) fn check_32(group: &[u8], hash: u64, kp: usize) -> bool {
    let pattern = pattern_32(hash, kp);
    group
        .chunks_exact(4)
        .zip(pattern)
        .fold(true, |res, (bytes, bits)| {
            res & (NativeEndian::read_u32(bytes) & bits == bits)
        })
}

#[inline]
pub(super) fn mark_64(group: &mut [u8], hash: u64, kp: usize) {
    let pattern = pattern_64(hash, kp);
    for (bytes, bits) in group.chunks_exact_mut(8).zip(pattern) {
        let x = NativeEndian::read_u64(bytes) | bits;
        NativeEndian::write_u64(bytes, x);
    }
}

#[inline]
pub(super) fn check_64(group: &[u8], hash: u64, kp: usize) -> bool {
    let pattern = pattern_64(hash, kp);
    group
        .chunks_exact(8)
        .zip(pattern)
        .fold(true, |res, (bytes, bits)| {
            res & (NativeEndian::read_u64(bytes) & bits == bits)
        })
}
