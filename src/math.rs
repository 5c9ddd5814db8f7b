//! Modular arithmetic helpers for integers modulo the group order

pub mod field;

use crate::error::{Error, Result};
use num_bigint::{BigInt, BigUint};
use num_traits::{Num, One, Signed, Zero};

/// Parses a hexadecimal string, with or without a `0x` prefix.
pub fn parse_hex(s: &str) -> Result<BigUint> {
    let trimmed = s.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() {
        return Err(Error::InvalidHex("empty string".to_string()));
    }
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidHex(s.to_string()));
    }
    BigUint::from_str_radix(digits, 16).map_err(|e| Error::InvalidHex(e.to_string()))
}

/// Modular inverse through Fermat's little theorem. `m` must be prime.
pub fn invmod(a: &BigUint, m: &BigUint) -> Result<BigUint> {
    let a = a % m;
    if a.is_zero() {
        return Err(Error::DivisionByZero);
    }
    Ok(a.modpow(&(m - 2u32), m))
}

/// Modular inverse by the extended Euclidean algorithm, valid for any modulus.
/// Returns `None` when `gcd(a, n) ≠ 1`.
pub fn modinv(a: &BigUint, n: &BigUint) -> Option<BigUint> {
    let mut t = BigInt::zero();
    let mut new_t = BigInt::one();
    let mut r = BigInt::from(n.clone());
    let mut new_r = BigInt::from(a % n);

    while !new_r.is_zero() {
        let quotient = &r / &new_r;
        let temp_t = &t - &quotient * &new_t;
        t = new_t;
        new_t = temp_t;
        let temp_r = &r - &quotient * &new_r;
        r = new_r;
        new_r = temp_r;
    }

    if !r.is_one() {
        return None;
    }
    if t.is_negative() {
        t += BigInt::from(n.clone());
    }
    t.to_biguint()
}

pub fn mod_mul(a: &BigUint, b: &BigUint, n: &BigUint) -> BigUint {
    (a * b) % n
}

pub fn mod_add(a: &BigUint, b: &BigUint, n: &BigUint) -> BigUint {
    (a + b) % n
}

/// Number of significant bits, zero for zero.
pub fn bit_length(n: &BigUint) -> u64 {
    n.bits()
}

/// `2^e` as a big integer.
pub fn pow2(e: u64) -> BigUint {
    BigUint::one() << e
}

/// Big-endian bytes left-padded to `len`. Returns `None` when the value does not fit.
pub fn to_be_bytes_padded(value: &BigUint, len: usize) -> Option<Vec<u8>> {
    let bytes = if value.is_zero() {
        Vec::new()
    } else {
        value.to_bytes_be()
    };
    if bytes.len() > len {
        return None;
    }
    let mut padded = vec![0u8; len];
    padded[len - bytes.len()..].copy_from_slice(&bytes);
    Some(padded)
}
