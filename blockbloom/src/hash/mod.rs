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

//! Hashing collaborators of the filter.
//!
//! A filter reduces every element to a single 64-bit digest through a
//! [`BuildHasher`](std::hash::BuildHasher). The probe schemes assume the digest is of good
//! quality (every bit equally likely to flip); hashers that do not avalanche should be
//! wrapped in [`Mixed`], which post-mixes the digest with [`mulx64_mix`].

mod mulx;

pub use self::mulx::Mixed;
pub use self::mulx::MixedHasher;
pub use self::mulx::mulx64;
pub use self::mulx::mulx64_mix;

use std::hash::BuildHasher;

use xxhash_rust::xxh3::Xxh3;

/// The default hasher builder: seeded XXH3-64.
///
/// # Examples
///
/// ```
/// # use std::hash::BuildHasher;
/// # use blockbloom::hash::DefaultHashBuilder;
/// let a = DefaultHashBuilder::default();
/// let b = DefaultHashBuilder::with_seed(42);
/// assert_eq!(a.hash_one("key"), a.hash_one("key"));
/// assert_ne!(a.hash_one("key"), b.hash_one("key"));
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DefaultHashBuilder {
    seed: u64,
}

impl DefaultHashBuilder {
    /// Creates a builder whose hashers start from `seed`.
    pub const fn with_seed(seed: u64) -> Self {
        Self { seed }
    }

    /// Returns the seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl BuildHasher for DefaultHashBuilder {
    type Hasher = Xxh3;

    fn build_hasher(&self) -> Xxh3 {
        Xxh3::with_seed(self.seed)
    }
}
