// Copyright (c) 2024 Botho Foundation

//! Full-width integer helpers for pool pricing.
//!
//! Reserve products of an 18-decimal token overflow `u128`, so products are
//! carried in 256 bits as `(high, low)` halves.

use gfox_token::Amount;

/// Swap fee kept by the pool, as 997/1000 of the input.
pub const FEE_NUMERATOR: Amount = 997;
pub const FEE_DENOMINATOR: Amount = 1_000;

/// `a * b` as `(high, low)`.
pub fn widening_mul(a: u128, b: u128) -> (u128, u128) {
    let mask = u128::from(u64::MAX);
    let (a1, a0) = (a >> 64, a & mask);
    let (b1, b0) = (b >> 64, b & mask);

    let p00 = a0 * b0;
    let p01 = a0 * b1;
    let p10 = a1 * b0;
    let p11 = a1 * b1;

    let mid = (p00 >> 64) + (p01 & mask) + (p10 & mask);
    let low = (p00 & mask) | (mid << 64);
    let high = p11 + (p01 >> 64) + (p10 >> 64) + (mid >> 64);
    (high, low)
}

/// `a * b / d` rounding down, or `None` if `d` is zero or the quotient
/// does not fit.
pub fn mul_div(a: u128, b: u128, d: u128) -> Option<u128> {
    if d == 0 {
        return None;
    }
    let (high, low) = widening_mul(a, b);
    if high >= d {
        return None;
    }

    // Restoring division; `rem < d` holds between steps.
    let mut rem = high;
    let mut quotient = 0u128;
    for bit in (0..128).rev() {
        let carry = rem >> 127;
        rem = (rem << 1) | ((low >> bit) & 1);
        quotient <<= 1;
        if carry == 1 || rem >= d {
            rem = rem.wrapping_sub(d);
            quotient |= 1;
        }
    }
    Some(quotient)
}

/// `floor(sqrt(a * b))`.
pub fn sqrt_product(a: u128, b: u128) -> u128 {
    let target = widening_mul(a, b);
    let (mut lo, mut hi) = (0u128, u128::MAX);
    while lo < hi {
        let mid = lo + (hi - lo) / 2 + 1;
        if widening_mul(mid, mid) <= target {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    lo
}

/// Output of a constant-product swap after the pool fee. Zero when either
/// reserve is empty.
pub fn amount_out(amount_in: Amount, reserve_in: Amount, reserve_out: Amount) -> Amount {
    if reserve_in == 0 || reserve_out == 0 {
        return 0;
    }
    let with_fee = amount_in.saturating_mul(FEE_NUMERATOR);
    let denominator = reserve_in
        .saturating_mul(FEE_DENOMINATOR)
        .saturating_add(with_fee);
    mul_div(with_fee, reserve_out, denominator).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widening_mul() {
        assert_eq!(widening_mul(0, u128::MAX), (0, 0));
        assert_eq!(widening_mul(3, 7), (0, 21));
        assert_eq!(widening_mul(u128::MAX, 2), (1, u128::MAX - 1));
        assert_eq!(widening_mul(1 << 64, 1 << 64), (1, 0));
    }

    #[test]
    fn test_mul_div() {
        assert_eq!(mul_div(10, 10, 3), Some(33));
        assert_eq!(mul_div(u128::MAX, u128::MAX, u128::MAX), Some(u128::MAX));
        assert_eq!(mul_div(u128::MAX, 4, 8), Some(u128::MAX / 2));
        assert_eq!(mul_div(1, 1, 0), None);
        assert_eq!(mul_div(u128::MAX, 2, 1), None);
    }

    #[test]
    fn test_sqrt_product() {
        assert_eq!(sqrt_product(4, 9), 6);
        assert_eq!(sqrt_product(2, 3), 2);
        let e18 = 1_000_000_000_000_000_000u128;
        assert_eq!(sqrt_product(1_000_000_000 * e18, 1_000 * e18), 1_000_000 * e18);
    }

    #[test]
    fn test_amount_out() {
        // 1000 in against 1000/1000 loses the fee and slippage
        assert_eq!(amount_out(1_000, 1_000, 1_000), 499);
        assert_eq!(amount_out(1_000, 0, 1_000), 0);
        let e18 = 1_000_000_000_000_000_000u128;
        let out = amount_out(e18, 1_000_000 * e18, 100 * e18);
        assert!(out > 0 && out < 100 * e18 / 1_000_000);
    }
}
