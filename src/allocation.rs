use soroban_sdk::{Bytes, Env, I256};

/// Denominator for `allocation_percent`.
pub const PERCENT_DENOMINATOR: i128 = 100;

/// Tokens owed for `contribution` out of `total_received`:
/// `floor(pool_size * contribution / total_received)`.
///
/// Returns 0 when either amount is zero. Each participant is rounded down
/// independently, so the sum over all participants may fall short of
/// `pool_size`; the remainder stays with the custodian.
pub fn allocate(env: &Env, contribution: i128, total_received: i128, pool_size: i128) -> i128 {
    if contribution <= 0 || total_received <= 0 || pool_size <= 0 {
        return 0;
    }
    let share = match pool_size.checked_mul(contribution) {
        Some(product) => product / total_received,
        None => wide_mul_div(env, pool_size, contribution, total_received),
    };
    core::cmp::min(share, pool_size)
}

/// `floor(total_supply * percent / 100)` without overflowing on large supplies.
pub fn pool_size_from_supply(total_supply: i128, percent: u32) -> i128 {
    if total_supply <= 0 {
        return 0;
    }
    let pct = percent as i128;
    let whole = total_supply / PERCENT_DENOMINATOR;
    let rest = total_supply % PERCENT_DENOMINATOR;
    whole * pct + rest * pct / PERCENT_DENOMINATOR
}

// 256-bit host arithmetic for products past i128. The quotient is bounded by
// the pool size, so its low 128 bits are the whole value.
fn wide_mul_div(env: &Env, a: i128, b: i128, divisor: i128) -> i128 {
    let product = I256::from_i128(env, a).mul(&I256::from_i128(env, b));
    let quotient = product.div(&I256::from_i128(env, divisor));
    low_i128(&quotient.to_be_bytes())
}

fn low_i128(bytes: &Bytes) -> i128 {
    let offset = bytes.len().saturating_sub(16);
    let mut buf = [0u8; 16];
    for (i, slot) in buf.iter_mut().enumerate() {
        *slot = bytes.get(offset + i as u32).unwrap_or(0);
    }
    i128::from_be_bytes(buf)
}
