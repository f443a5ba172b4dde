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

use std::ptr;

use blockbloom::allocator::BufferAllocator;
use blockbloom::bloom::BloomFilter;
use blockbloom::bloom::BloomFilterBuilder;
use blockbloom::error::ErrorKind;
use blockbloom::probe::Block;
use blockbloom::probe::FastMultiblock32;
use blockbloom::probe::Multiblock;
use blockbloom::probe::Subfilter;
use common::FailingAllocator;
use common::StatefulAllocator;
use common::StatefulHasher;
use common::distinct_values;
use googletest::assert_that;
use googletest::prelude::ge;

type Filter<const K: usize, P, A = StatefulAllocator> =
    BloomFilter<u64, K, P, 0, StatefulHasher, A>;

fn may_contain_all<const K: usize, P: Subfilter, A: BufferAllocator>(
    filter: &Filter<K, P, A>,
    input: &[u64],
) -> bool {
    input.iter().all(|x| filter.may_contain(x))
}

fn check_construction<const K: usize, P: Subfilter>() {
    let input = distinct_values(0..10);

    let filter = Filter::<K, P>::default();
    assert_eq!(filter.capacity(), 0);
    assert_eq!(filter.hasher().state, 0);
    assert_eq!(filter.allocator().state, 0);

    let filter: Filter<K, P> = BloomFilterBuilder::with_capacity(1000)
        .hasher(StatefulHasher::default())
        .allocator(StatefulAllocator::default())
        .build();
    assert_that!(filter.capacity(), ge(1000));
    assert_eq!(filter.hasher().state, 0);
    assert_eq!(filter.allocator().state, 0);

    let filter = Filter::<K, P>::with_accuracy_and_hasher_in(
        100,
        0.01,
        StatefulHasher::new(42),
        StatefulAllocator::new(2025),
    );
    assert_that!(filter.capacity(), ge(Filter::<K, P>::capacity_for(100, 0.01)));
    assert_eq!(filter.hasher().state, 42);
    assert_eq!(filter.allocator().state, 2025);

    let filter: Filter<K, P> = BloomFilterBuilder::with_capacity(1000)
        .hasher(StatefulHasher::new(42))
        .allocator(StatefulAllocator::new(2025))
        .build_from(&input);
    assert_that!(filter.capacity(), ge(1000));
    assert_eq!(filter.hasher().state, 42);
    assert_eq!(filter.allocator().state, 2025);
    assert!(may_contain_all(&filter, &input));

    let filter: Filter<K, P> = BloomFilterBuilder::with_accuracy(100, 0.01)
        .hasher(StatefulHasher::new(42))
        .allocator(StatefulAllocator::new(2025))
        .build_from(&input);
    assert_eq!(filter.hasher().state, 42);
    assert_eq!(filter.allocator().state, 2025);
    assert!(may_contain_all(&filter, &input));

    // clone
    let mut f1 = Filter::<K, P>::with_capacity_and_hasher_in(
        1000,
        StatefulHasher::new(42),
        StatefulAllocator::new(2025),
    );
    f1.insert_all(&input);
    let f2 = f1.clone();
    assert_eq!(f2.capacity(), f1.capacity());
    assert_eq!(f2.hasher().state, 42);
    assert_eq!(f2.allocator().state, 2025);
    assert_ne!(f2.allocator().last_allocation(), f1.allocator().last_allocation());
    assert!(may_contain_all(&f2, &input));
    assert_eq!(f1, f2);

    // clone with another allocator
    let f2 = f1.clone_in(StatefulAllocator::new(1492));
    assert_eq!(f1.allocator().state, 2025);
    assert!(may_contain_all(&f1, &input));
    assert_eq!(f2.capacity(), f1.capacity());
    assert_eq!(f2.hasher().state, 42);
    assert_eq!(f2.allocator().state, 1492);
    assert!(may_contain_all(&f2, &input));

    // move into an unequal allocator: the contents are copied
    let p1 = f1.allocator().last_allocation();
    let f2 = f1.take_in(StatefulAllocator::new(1492));
    assert_eq!(f1.capacity(), 0);
    assert_eq!(f1.allocator().state, 2025);
    assert_that!(f2.capacity(), ge(1000));
    assert_eq!(f2.hasher().state, 42);
    assert_eq!(f2.allocator().state, 1492);
    assert!(!f2.allocator().last_allocation().is_null());
    assert_ne!(f2.allocator().last_allocation(), p1);
    assert!(may_contain_all(&f2, &input));

    // move into an equal allocator: the buffer changes hands
    let mut f3 = Filter::<K, P>::with_capacity_and_hasher_in(
        1000,
        StatefulHasher::new(42),
        StatefulAllocator::new(2025),
    );
    f3.insert_all(&input);
    let f4 = f3.take_in(StatefulAllocator::new(2025));
    assert_eq!(f3.capacity(), 0);
    assert_that!(f4.capacity(), ge(1000));
    assert_eq!(f4.hasher().state, 42);
    assert_eq!(f4.allocator().state, 2025);
    assert!(f4.allocator().last_allocation().is_null());
    assert!(may_contain_all(&f4, &input));

    // assign keeps the capacity and drops the previous contents
    let partial = &input[4..];
    let mut filter: Filter<K, P> = BloomFilterBuilder::with_capacity(1000)
        .hasher(StatefulHasher::default())
        .allocator(StatefulAllocator::default())
        .build_from(partial);
    let capacity = filter.capacity();
    filter.assign(&input[..4]);
    assert_eq!(filter.capacity(), capacity);
    assert!(may_contain_all(&filter, &input[..4]));
    let expected: Filter<K, P> = BloomFilterBuilder::with_capacity(1000)
        .hasher(StatefulHasher::default())
        .allocator(StatefulAllocator::default())
        .build_from(&input[..4]);
    assert_eq!(filter, expected);
}

fn check_propagation<
    const K: usize,
    P: Subfilter,
    const PROPAGATE: bool,
    const ALWAYS_EQUAL: bool,
>() {
    let input = distinct_values(0..10);
    let make = |capacity: usize, hasher: i32, alloc: i32| {
        let mut filter =
            Filter::<K, P, StatefulAllocator<PROPAGATE, ALWAYS_EQUAL>>::with_capacity_and_hasher_in(
                capacity,
                StatefulHasher::new(hasher),
                StatefulAllocator::new(alloc),
            );
        filter.insert_all(&input);
        filter
    };

    // copy assignment
    let f1 = make(1000, 42, 2025);
    let mut f2 = make(0, 0, 1492);
    f2.clone_from(&f1);
    assert_that!(f1.capacity(), ge(1000));
    assert_eq!(f1.hasher().state, 42);
    assert_eq!(f1.allocator().state, 2025);
    assert_eq!(f2.capacity(), f1.capacity());
    assert_eq!(f2.hasher().state, 42);
    assert_eq!(f2.allocator().state, if PROPAGATE { 2025 } else { 1492 });
    assert!(may_contain_all(&f2, &input));

    // move assignment
    let mut f1 = make(1000, 42, 2025);
    let p1 = f1.allocator().last_allocation();
    let mut f2 = make(0, 24, 1492);
    f2.move_from(&mut f1);
    assert_eq!(f1.capacity(), 0);
    assert_eq!(f1.allocator().state, 2025);
    assert_that!(f2.capacity(), ge(1000));
    assert_eq!(f2.hasher().state, 42);
    assert_eq!(f2.allocator().state, if PROPAGATE { 2025 } else { 1492 });
    if PROPAGATE {
        assert_eq!(f2.allocator().last_allocation(), p1);
    } else if ALWAYS_EQUAL {
        assert!(f2.allocator().last_allocation().is_null());
    } else {
        assert!(!f2.allocator().last_allocation().is_null());
        assert_ne!(f2.allocator().last_allocation(), p1);
    }
    assert!(may_contain_all(&f2, &input));

    // swap
    let mut f1 = make(1000, 42, 2025);
    let p1 = f1.allocator().last_allocation();
    let mut f2 = make(0, 24, 1492);
    f2.swap(&mut f1);
    assert_eq!(f1.capacity(), 0);
    assert_eq!(f1.hasher().state, 24);
    assert_that!(f2.capacity(), ge(1000));
    assert_eq!(f2.hasher().state, 42);
    assert!(may_contain_all(&f2, &input));
    if PROPAGATE {
        assert_eq!(f1.allocator().state, 1492);
        assert!(f1.allocator().last_allocation().is_null());
        assert_eq!(f2.allocator().state, 2025);
        assert_eq!(f2.allocator().last_allocation(), p1);
        assert_eq!(f2.as_bytes().as_ptr(), p1.cast_const());
    } else if ALWAYS_EQUAL {
        // allocators stay put and the buffer itself changes hands
        assert_eq!(f1.allocator().state, 2025);
        assert_eq!(f2.allocator().state, 1492);
        assert_eq!(f2.as_bytes().as_ptr(), p1.cast_const());
        assert!(f2.allocator().last_allocation().is_null());
    } else {
        // each side keeps its allocator and receives a copy
        assert_eq!(f1.allocator().state, 2025);
        assert_eq!(f2.allocator().state, 1492);
        assert!(!f2.allocator().last_allocation().is_null());
        assert_ne!(f2.allocator().last_allocation(), p1);
    }
}

#[test]
fn test_construction() {
    check_construction::<5, Block<u8, 1>>();
    check_construction::<1, Block<u64, 8>>();
    check_construction::<2, Multiblock<u32, 4>>();
    check_construction::<1, FastMultiblock32<8>>();
}

#[test]
fn test_allocator_propagation() {
    check_propagation::<3, Block<u64, 2>, false, false>();
    check_propagation::<3, Block<u64, 2>, false, true>();
    check_propagation::<3, Block<u64, 2>, true, false>();
    check_propagation::<3, Block<u64, 2>, true, true>();
    check_propagation::<1, FastMultiblock32<8>, false, false>();
    check_propagation::<1, FastMultiblock32<8>, true, true>();
}

#[test]
fn test_allocation_failure() {
    type Failing = Filter<1, Multiblock<u64, 8>, FailingAllocator>;

    let err = Failing::try_with_capacity_and_hasher_in(
        1000,
        StatefulHasher::default(),
        FailingAllocator,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AllocationFailed);

    let err = BloomFilterBuilder::with_accuracy(1000, 0.01)
        .hasher(StatefulHasher::default())
        .allocator(FailingAllocator)
        .try_build::<u64, 1, Multiblock<u64, 8>, 0>()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AllocationFailed);

    // capacity 0 needs no memory
    let mut filter =
        Failing::try_with_capacity_and_hasher_in(0, StatefulHasher::default(), FailingAllocator)
            .unwrap();
    assert_eq!(filter.capacity(), 0);
    let err = filter.try_reset(1000).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AllocationFailed);
    assert_eq!(filter.capacity(), 0);
    assert!(filter.try_reset(0).is_ok());
}

#[test]
fn test_swap_with_default_allocator_exchanges_buffers() {
    let input = distinct_values(0..100);
    let mut f1 = BloomFilter::<u64, 1, Multiblock<u64, 8>>::with_capacity(10_000);
    f1.insert_all(&input);
    let mut f2 = BloomFilter::<u64, 1, Multiblock<u64, 8>>::new();
    let bytes = f1.as_bytes().as_ptr();

    f1.swap(&mut f2);
    assert_eq!(f1.capacity(), 0);
    assert!(ptr::eq(f2.as_bytes().as_ptr(), bytes));
    assert!(input.iter().all(|x| f2.may_contain(x)));
}
