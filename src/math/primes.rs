//! Primality checks for ring moduli.
//!
//! Ring construction needs to know that `Q` is prime (the inverse and the
//! generator search both rely on it) and that `2N | Q-1`. Primality uses
//! deterministic Miller-Rabin: `n - 1` is decomposed into `d * 2^r`, and each
//! fixed base must either hit `1` / `n - 1` directly or reach `n - 1` by
//! repeated squaring.
//!
//! Reference:
//! https://en.wikipedia.org/wiki/Miller%E2%80%93Rabin_primality_test

use super::modular::{mod_pow, mul_mod};

// Deterministic for all n < 3.3 * 10^24, which covers every u64.
const MILLER_RABIN_BASES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// Returns `(odd_part, power_of_two)` such that `n = odd_part * 2^power_of_two`.
fn decompose(n: u64) -> (u64, u32) {
    debug_assert!(n > 0);
    let r = n.trailing_zeros();
    (n >> r, r)
}

/// Returns `true` if `n` is prime.
pub fn is_prime(n: u64) -> bool {
    match n {
        0 | 1 => return false,
        2 | 3 => return true,
        _ if n & 1 == 0 => return false,
        _ => {}
    }

    let (d, r) = decompose(n - 1);
    'bases: for &a in MILLER_RABIN_BASES.iter() {
        if a >= n {
            continue;
        }
        let mut x = mod_pow(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..r {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'bases;
            }
        }
        return false;
    }
    true
}

/// Returns `true` when `p` is prime and `p ≡ 1 (mod 2n)`.
///
/// This is exactly the condition for `Z_p` to contain a primitive `2n`-th root
/// of unity. Returns `false` for `n == 0` or when `2n` overflows.
pub fn is_ntt_friendly_prime(p: u64, n: u64) -> bool {
    match n.checked_mul(2) {
        Some(order) if n > 0 => is_prime(p) && p % order == 1,
        _ => false,
    }
}

/// Smallest NTT-friendly prime `p > 2^logq` for ring degree `n`.
///
/// Walks candidates `p ≡ 1 (mod 2n)` upward. Returns `None` if `logq >= 63`,
/// `n == 0`, or the walk would leave the `u64` range.
pub fn first_ntt_prime_up(logq: u32, n: u64) -> Option<u64> {
    if logq >= 63 {
        return None;
    }
    let step = n.checked_mul(2).filter(|&s| s > 0)?;
    let start = (1u64 << logq) + 1;
    let remainder = start % step;
    let mut candidate = if remainder == 1 {
        start
    } else {
        start.checked_add((step + 1 - remainder) % step)?
    };
    loop {
        if is_prime(candidate) {
            return Some(candidate);
        }
        candidate = candidate.checked_add(step)?;
    }
}
