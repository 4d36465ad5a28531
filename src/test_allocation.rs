#![cfg(test)]
extern crate std;

use arbitrary::{Arbitrary, Unstructured};
use soroban_sdk::Env;

use crate::{allocate, pool_size_from_supply};

#[test]
fn zero_inputs_allocate_nothing() {
    let env = Env::default();
    assert_eq!(allocate(&env, 0, 100, 1_000), 0);
    assert_eq!(allocate(&env, 10, 0, 1_000), 0);
    assert_eq!(allocate(&env, 0, 0, 1_000), 0);
    assert_eq!(allocate(&env, 10, 100, 0), 0);
}

#[test]
fn allocation_rounds_down() {
    let env = Env::default();
    assert_eq!(allocate(&env, 1, 3, 100_000), 33_333);
    assert_eq!(allocate(&env, 2, 3, 100_000), 66_666);
    assert_eq!(allocate(&env, 3, 3, 100_000), 100_000);
    assert_eq!(allocate(&env, 1, 1_001, 10), 0);
}

#[test]
fn multiplies_before_dividing() {
    let env = Env::default();
    // Dividing first would give 7 / 10 * 9 = 0.
    assert_eq!(allocate(&env, 7, 10, 9), 6);
}

#[test]
fn wide_products_do_not_overflow() {
    let env = Env::default();
    let pool = 10_i128.pow(30);
    let contribution = 10_i128.pow(20);
    let total = 10_i128.pow(21);
    assert!(pool.checked_mul(contribution).is_none());
    assert_eq!(allocate(&env, contribution, total, pool), 10_i128.pow(29));

    let pool = i128::MAX / 3;
    assert_eq!(allocate(&env, i128::MAX, i128::MAX, pool), pool);
    assert_eq!(allocate(&env, 1, 2, i128::MAX), i128::MAX / 2);
}

#[test]
fn pool_size_from_supply_is_exact_floor() {
    assert_eq!(pool_size_from_supply(1_000_000, 10), 100_000);
    assert_eq!(pool_size_from_supply(999, 10), 99);
    assert_eq!(pool_size_from_supply(1_000_000, 100), 1_000_000);
    assert_eq!(pool_size_from_supply(9, 10), 0);
    assert_eq!(pool_size_from_supply(0, 50), 0);
    assert_eq!(pool_size_from_supply(i128::MAX, 100), i128::MAX);
    assert_eq!(pool_size_from_supply(i128::MAX, 1), i128::MAX / 100);
}

#[derive(Arbitrary, Debug)]
struct Stakes {
    pool: u64,
    amounts: [u32; 12],
}

#[test]
fn awarded_sum_never_exceeds_pool() {
    let env = Env::default();
    let seed: std::vec::Vec<u8> = (0..2_048_u32)
        .map(|i| (i.wrapping_mul(2_246_822_519).rotate_left(13) >> 3) as u8)
        .collect();
    let mut u = Unstructured::new(&seed);

    for _ in 0..20 {
        let stakes = Stakes::arbitrary(&mut u).unwrap();
        let pool = stakes.pool as i128;
        let total: i128 = stakes.amounts.iter().map(|a| *a as i128).sum();

        let mut awarded = 0_i128;
        for amount in stakes.amounts.iter() {
            let contribution = *amount as i128;
            let share = allocate(&env, contribution, total, pool);
            if total > 0 && contribution > 0 {
                assert_eq!(share, pool * contribution / total);
            } else {
                assert_eq!(share, 0);
            }
            awarded += share;
        }
        assert!(awarded <= pool);
        // Dust is below one token per participant.
        if total > 0 {
            assert!(pool - awarded < stakes.amounts.len() as i128);
        }
    }
}
