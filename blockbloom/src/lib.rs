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

//! # blockbloom
//!
//! Cache-friendly Bloom filters with compile-time configurable probe layouts.
//!
//! Every element is reduced to one 64-bit hash, which selects a handful of buckets in a
//! contiguous bit buffer and the bits to set within each of them. How those bits are laid out
//! (one bit per bucket, a whole word, one bit per word of a cache line, vector lanes) is a
//! type parameter of the filter, so the probe code is specialized at compile time.
//!
//! This library is divided into modules that constitute distinct groups of functionality:
//!
//! - [`bloom`]: the filter container and its builder
//! - [`probe`]: bit layouts and the scalar and SIMD code that marks and checks them
//! - [`hash`]: the default hasher and hash mixing utilities
//! - [`allocator`]: where bit buffers come from and how they follow filters around
//! - [`error`]: errors of the fallible operations

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]

pub mod allocator;
pub mod bloom;
pub mod error;
pub mod hash;
pub mod probe;
