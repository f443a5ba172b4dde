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

//! False-positive model used to size filters.
//!
//! Elements spread over buckets following (approximately) a Poisson distribution, so the FPR
//! of the whole filter is the expected FPR of a single bucket weighted by the probability of
//! each bucket load, raised to the number of buckets probed.

/// Parameters of a filter configuration relevant to its false-positive rate.
#[derive(Clone, Copy)]
pub(crate) struct FprModel {
    /// Number of buckets probed per element.
    pub k: usize,
    /// Number of bits marked per element.
    pub k_total: usize,
    /// Bytes of a block that carry marks.
    pub used_size: usize,
    /// Distance in bytes between consecutive buckets.
    pub bucket_size: usize,
    /// FPR of one block of `w` bits holding `i` elements.
    pub subfilter_fpr: fn(usize, usize) -> f64,
}

/// Largest `f64` that converts back to `usize` without overflow.
const MAX_USIZE_AS_F64: f64 = if usize::BITS <= f64::MANTISSA_DIGITS {
    usize::MAX as f64
} else {
    // usize::MAX rounds up to 2^BITS; step down by one unit in the last place
    usize::MAX as f64 - (1u64 << (usize::BITS - f64::MANTISSA_DIGITS)) as f64
};

const EPS: f64 = 1.0 / usize::MAX as f64;

const MAX_POISSON_TERMS: usize = 1000;

impl FprModel {
    /// Expected FPR for `c` bits per element.
    pub fn fpr_for_c(&self, c: f64) -> f64 {
        let w = (2 * self.used_size - self.bucket_size) * 8;
        let lambda = w as f64 * self.k as f64 / c;
        let log_lambda = lambda.ln();

        let mut res = 0.0;
        let mut deltap = 0.0;
        let mut log_factorial = 0.0;
        for i in 0..MAX_POISSON_TERMS {
            if i > 1 {
                log_factorial += (i as f64).ln();
            }
            let poisson = (i as f64 * log_lambda - lambda - log_factorial).exp();
            let delta = poisson * (self.subfilter_fpr)(i, w);
            let resn = res + delta;
            // terms are unimodal in i: stop once past the peak and no longer contributing
            if delta < deltap && resn == res {
                break;
            }
            deltap = delta;
            res = resn;
        }

        // the classical Bloom filter formula is a floor no layout can beat
        let classical = (1.0 - (-(self.k_total as f64) / c).exp()).powf(self.k_total as f64);
        res.powf(self.k as f64).max(classical)
    }

    /// Smallest capacity in bits for which `n` elements stay within `fpr`.
    ///
    /// Saturates at the largest representable capacity when `fpr` is unreachable.
    pub fn capacity_for(&self, n: usize, fpr: f64) -> usize {
        debug_assert!((0.0..=1.0).contains(&fpr));
        if n == 0 {
            return 0;
        }

        let n_f64 = n as f64;
        let c_max = MAX_USIZE_AS_F64 / n_f64;
        let saturated = (c_max * n_f64) as usize;

        // classical Bloom filter as a lower bound: c = k / -ln(1 - fpr^(1/k))
        let d = 1.0 - fpr.powf(1.0 / self.k_total as f64);
        if d == 0.0 {
            return 0;
        }
        let l = d.ln();
        if l == 0.0 {
            return saturated;
        }
        let mut c0 = (self.k_total as f64 / -l).min(c_max);

        let mut c1 = c0;
        if self.fpr_for_c(c1) > fpr {
            loop {
                let cn = c1 * 1.5;
                if cn > c_max {
                    return saturated;
                }
                c0 = c1;
                c1 = cn;
                if self.fpr_for_c(c1) <= fpr {
                    break;
                }
            }
        } else {
            loop {
                let cn = c0 / 1.5;
                c1 = c0;
                c0 = cn;
                if self.fpr_for_c(c0) >= fpr {
                    break;
                }
            }
        }

        let mut cm;
        loop {
            cm = c0 + (c1 - c0) / 2.0;
            if !(cm > c0 && cm < c1 && c1 - c0 >= EPS) {
                break;
            }
            if self.fpr_for_c(cm) > fpr {
                c0 = cm;
            } else {
                c1 = cm;
            }
        }
        (cm * n_f64) as usize
    }

    /// Expected FPR of a filter with `m` bits after `n` insertions.
    pub fn fpr_for(&self, n: usize, m: usize) -> f64 {
        if m == 0 {
            1.0
        } else if n == 0 {
            0.0
        } else {
            self.fpr_for_c(m as f64 / n as f64)
        }
    }
}
