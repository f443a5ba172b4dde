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

mod common;

use blockbloom::bloom::BloomFilter;
use blockbloom::bloom::BloomFilterBuilder;
use blockbloom::error::ErrorKind;
use blockbloom::probe::Block;
use blockbloom::probe::FastMultiblock32;
use blockbloom::probe::FastMultiblock64;
use blockbloom::probe::Multiblock;
use blockbloom::probe::Subfilter;
use common::distinct_values;

fn check_data<const K: usize, P: Subfilter, const B: usize>() {
    let filter = BloomFilter::<u64, K, P, B>::new();
    assert!(filter.as_bytes().is_empty());

    let mut f1 = BloomFilter::<u64, K, P, B>::with_capacity(1000);
    let mut f2 = BloomFilter::<u64, K, P, B>::with_capacity(1000);
    assert_eq!(f1.as_bytes().len(), f1.capacity() / 8);
    f1.insert_all(&distinct_values(0..10));
    assert_ne!(f1, f2);

    f2.as_bytes_mut().copy_from_slice(f1.as_bytes());
    assert_ne!(f1.as_bytes().as_ptr(), f2.as_bytes().as_ptr());
    assert_eq!(f1, f2);

    f1.clear();
    assert!(f1.as_bytes().iter().all(|&b| b == 0));
    assert_eq!(f1, BloomFilter::<u64, K, P, B>::with_capacity(1000));
}

fn check_bulk<const K: usize, P: Subfilter, const B: usize>() {
    let input = distinct_values(0..1000);

    let mut f1 = BloomFilter::<u64, K, P, B>::with_capacity(10_000);
    let mut f2 = f1.clone();
    f1.insert_all(&input);
    for x in &input {
        f2.insert(x);
    }
    assert_eq!(f1, f2);

    let mut f3 = BloomFilter::<u64, K, P, B>::with_capacity(10_000);
    f3.extend(&input);
    assert_eq!(f1, f3);

    let mut filter = BloomFilter::<u64, K, P, B>::with_capacity(10_000);
    filter.insert_all(&input[..input.len() / 2]);
    let mut visited = Vec::new();
    filter.may_contain_each(&input, |x, res| {
        assert_eq!(res, filter.may_contain(x));
        visited.push(*x);
    });
    assert_eq!(visited, input);
}

fn check_combine<const K: usize, P: Subfilter, const B: usize>() {
    let a = distinct_values(0..500);
    let b = distinct_values(500..1000);

    let mut fa = BloomFilter::<u64, K, P, B>::with_capacity(20_000);
    fa.insert_all(&a);
    let mut fb = BloomFilter::<u64, K, P, B>::with_capacity(20_000);
    fb.insert_all(&b);

    let mut both = fa.clone();
    both.union(&fb).unwrap();
    assert!(a.iter().chain(&b).all(|x| both.may_contain(x)));

    let mut expected = BloomFilter::<u64, K, P, B>::with_capacity(20_000);
    expected.insert_all(a.iter().chain(&b));
    assert_eq!(both, expected);

    // union then intersect with one side gives back that side
    both.intersect(&fa).unwrap();
    assert_eq!(both, fa);

    let other = BloomFilter::<u64, K, P, B>::with_capacity(40_000);
    let err = fa.union(&other).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(err.message(), "incompatible filters");
    let err = fa.intersect(&other).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

macro_rules! layout_tests {
    ($($name:ident => <$k:literal, $p:ty, $b:literal>;)*) => {$(
        mod $name {
            use super::*;

            #[test]
            fn test_data() {
                check_data::<$k, $p, $b>();
            }

            #[test]
            fn test_bulk() {
                check_bulk::<$k, $p, $b>();
            }

            #[test]
            fn test_combine() {
                check_combine::<$k, $p, $b>();
            }
        }
    )*};
}

layout_tests! {
    classic => <5, Block<u8, 1>, 0>;
    block => <1, Block<u64, 8>, 0>;
    block_overlapping => <2, Block<u32, 3>, 1>;
    multiblock => <1, Multiblock<u64, 8>, 0>;
    multiblock_branchless => <1, Multiblock<u16, 6, true>, 0>;
    multiblock_overlapping => <1, Multiblock<u32, 8>, 4>;
    fast_multiblock_32 => <1, FastMultiblock32<8>, 0>;
    fast_multiblock_32_wide => <1, FastMultiblock32<13>, 0>;
    fast_multiblock_64 => <1, FastMultiblock64<8>, 0>;
    fast_multiblock_64_overlapping => <2, FastMultiblock64<5>, 8>;
}

#[test]
fn test_save_and_restore() {
    type Filter = BloomFilter<str, 1, Multiblock<u64, 8>>;
    let words = ["apple", "banana", "cherry", "durian"];

    let mut original = Filter::with_accuracy(1000, 0.001);
    original.insert_all(words);
    let saved = original.as_bytes().to_vec();
    let capacity = original.capacity();
    drop(original);

    let mut restored = Filter::with_capacity(capacity);
    assert_eq!(restored.capacity(), capacity);
    restored.as_bytes_mut().copy_from_slice(&saved);
    assert!(words.iter().all(|w| restored.may_contain(w)));
}

#[test]
fn test_unsized_items() {
    let mut filter = BloomFilter::<[u8], 1, FastMultiblock32<8>>::with_accuracy(100, 0.01);
    filter.insert(b"hello");
    filter.insert(&[0u8; 0]);
    assert!(filter.may_contain(b"hello"));
    assert!(filter.may_contain(&[0u8; 0]));
}

#[test]
fn test_seed_changes_bits() {
    let input = distinct_values(0..100);
    let build = |seed| -> BloomFilter<u64, 1, Multiblock<u64, 8>> {
        BloomFilterBuilder::with_capacity(10_000)
            .seed(seed)
            .build_from(&input)
    };

    assert_eq!(build(7), build(7));
    assert_ne!(build(7), build(8));
    assert_eq!(build(8).hasher().seed(), 8);
}

#[test]
fn test_debug() {
    let filter = BloomFilter::<u64, 1, Multiblock<u64, 8>>::new();
    insta::assert_snapshot!(
        format!("{filter:?}"),
        @"BloomFilter { k: 1, marks_per_bucket: 8, bucket_size: 64, capacity: 0, .. }"
    );

    let filter = BloomFilter::<u64, 3, Block<u32, 2>, 1>::new();
    insta::assert_snapshot!(
        format!("{filter:?}"),
        @"BloomFilter { k: 3, marks_per_bucket: 2, bucket_size: 1, capacity: 0, .. }"
    );
}
