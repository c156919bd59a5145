//! Modular arithmetic kernel over `Z_q`.
//!
//! Everything here is a pure function of its arguments. Products go through a
//! `u128` intermediate so operands up to 64 bits never wrap; additions assume
//! both operands are already reduced and `q < 2^63`.

/// `(a + b) mod q` for `a, b < q`.
#[inline]
pub fn add_mod(a: u64, b: u64, q: u64) -> u64 {
    let s = a + b;
    if s >= q { s - q } else { s }
}

/// `(a - b) mod q` for `a, b < q`.
#[inline]
pub fn sub_mod(a: u64, b: u64, q: u64) -> u64 {
    if a >= b { a - b } else { a + q - b }
}

/// `(a * b) mod q` through a double-width product.
#[inline]
pub fn mul_mod(a: u64, b: u64, q: u64) -> u64 {
    ((a as u128 * b as u128) % q as u128) as u64
}

/// `base^exp mod q` by square-and-multiply. `exp = 0` yields `1 mod q`.
pub fn mod_pow(mut base: u64, mut exp: u64, q: u64) -> u64 {
    let mut acc = 1 % q;
    base %= q;
    while exp > 0 {
        if exp & 1 == 1 {
            acc = mul_mod(acc, base, q);
        }
        base = mul_mod(base, base, q);
        exp >>= 1;
    }
    acc
}

/// Inverse of `a` modulo the prime `q` via Fermat's little theorem.
///
/// Returns `0` for `a ≡ 0`, which has no inverse. Callers must not treat that
/// value as a valid inverse.
pub fn mod_inverse(a: u64, q: u64) -> u64 {
    if a % q == 0 {
        return 0;
    }
    mod_pow(a, q - 2, q)
}

/// Maps a signed integer to its residue in `[0, q)`.
#[inline]
pub fn center_to_mod(value: i64, q: u64) -> u64 {
    let magnitude = value.unsigned_abs() % q;
    if value < 0 && magnitude != 0 {
        q - magnitude
    } else {
        magnitude
    }
}

/// Distinct prime factors of `n`, ascending, by trial division.
pub fn prime_factors(mut n: u64) -> Vec<u64> {
    let mut factors = Vec::new();
    let mut p = 2u64;
    while p <= n / p {
        if n % p == 0 {
            factors.push(p);
            while n % p == 0 {
                n /= p;
            }
        }
        p += if p == 2 { 1 } else { 2 };
    }
    if n > 1 {
        factors.push(n);
    }
    factors
}

/// Smallest generator of the multiplicative group `Z_q^*` for prime `q`.
///
/// A candidate `g` is accepted iff `g^((q-1)/p) != 1` for every distinct prime
/// `p | q-1`. Returns `None` when no candidate qualifies, which only happens
/// when `q` is not prime.
pub fn find_generator(q: u64) -> Option<u64> {
    if q < 3 {
        return None;
    }
    let order = q - 1;
    let factors = prime_factors(order);
    (2..q).find(|&g| factors.iter().all(|&p| mod_pow(g, order / p, q) != 1))
}

/// Primitive `n`-th root of unity `g^((q-1)/n)` built from the group generator.
///
/// Requires `n | q-1`; returns `None` otherwise.
pub fn find_primitive_root(q: u64, n: u64) -> Option<u64> {
    if n == 0 || q < 3 || (q - 1) % n != 0 {
        return None;
    }
    let generator = find_generator(q)?;
    Some(mod_pow(generator, (q - 1) / n, q))
}

/// Reverses the low `bit_count` bits of `value`.
#[inline]
pub fn bit_reverse(value: usize, bit_count: u32) -> usize {
    value
        .reverse_bits()
        .checked_shr(usize::BITS - bit_count)
        .unwrap_or(0)
}

/// In-place bit-reversal permutation of a power-of-two-length slice.
pub fn bit_reverse_permute<T>(values: &mut [T]) {
    let bits = values.len().trailing_zeros();
    for i in 0..values.len() {
        let j = bit_reverse(i, bits);
        if i < j {
            values.swap(i, j);
        }
    }
}
