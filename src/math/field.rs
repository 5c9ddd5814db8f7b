//! Prime-field arithmetic over arbitrary-precision residues.
//!
//! A [`PrimeField`] is created once per curve and shared through an [`Arc`]. Every
//! [`FieldElement`] carries a handle to its field and always stores a canonical
//! residue in `[0, p)`.
//!
//! Mixing elements of different fields in the arithmetic operators is a programming
//! error and panics. The fallible operations (`invert`, `div`, negative `pow`)
//! report [`Error::DivisionByZero`] and [`Error::FieldMismatch`] instead.

use crate::error::{Error, Result};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::sync::Arc;

#[derive(Debug, PartialEq, Eq)]
pub struct PrimeField {
    p: BigUint,
}

impl PrimeField {
    /// Wraps a prime modulus. Primality is the caller's responsibility.
    pub fn new(p: BigUint) -> Arc<Self> {
        Arc::new(Self { p })
    }

    pub fn modulus(&self) -> &BigUint {
        &self.p
    }

    pub fn element(self: &Arc<Self>, value: impl Into<BigUint>) -> FieldElement {
        let value = value.into() % &self.p;
        FieldElement {
            value,
            field: Arc::clone(self),
        }
    }

    /// Element from a signed integer, reduced into `[0, p)`.
    pub fn from_signed(self: &Arc<Self>, value: &BigInt) -> FieldElement {
        let p = BigInt::from(self.p.clone());
        let reduced = ((value % &p) + &p) % &p;
        // reduced is non-negative here
        self.element(reduced.magnitude().clone())
    }

    pub fn zero(self: &Arc<Self>) -> FieldElement {
        self.element(BigUint::zero())
    }

    pub fn one(self: &Arc<Self>) -> FieldElement {
        self.element(BigUint::one())
    }
}

/// Quadratic character of a field element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Legendre {
    /// Nonzero square (`a^((p-1)/2) = 1`).
    Residue,
    Zero,
    /// `a^((p-1)/2) = p - 1`.
    NonResidue,
}

#[derive(Clone)]
pub struct FieldElement {
    value: BigUint,
    field: Arc<PrimeField>,
}

impl FieldElement {
    pub fn field(&self) -> &Arc<PrimeField> {
        &self.field
    }

    pub fn value(&self) -> &BigUint {
        &self.value
    }

    pub fn to_integer(&self) -> BigUint {
        self.value.clone()
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn is_one(&self) -> bool {
        self.value.is_one()
    }

    fn same_field(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.field, &other.field) || self.field.p == other.field.p
    }

    fn assert_same_field(&self, other: &Self) {
        assert!(
            self.same_field(other),
            "field mismatch: operands modulo {:#x} and {:#x}",
            self.field.p,
            other.field.p
        );
    }

    fn with_value(&self, value: BigUint) -> Self {
        self.field.element(value)
    }

    pub fn square(&self) -> Self {
        self * self
    }

    /// Exponentiation by a non-negative exponent. `a^0 = 1`, including `0^0`.
    pub fn pow_uint(&self, exp: &BigUint) -> Self {
        self.with_value(self.value.modpow(exp, &self.field.p))
    }

    /// Exponentiation by a signed exponent; negative exponents go through [`invert`](Self::invert).
    pub fn pow(&self, exp: &BigInt) -> Result<Self> {
        match exp.sign() {
            Sign::Minus => Ok(self.invert()?.pow_uint(exp.magnitude())),
            _ => Ok(self.pow_uint(exp.magnitude())),
        }
    }

    /// Multiplicative inverse `a^(p-2)`.
    pub fn invert(&self) -> Result<Self> {
        if self.is_zero() {
            return Err(Error::DivisionByZero);
        }
        let exp = &self.field.p - 2u32;
        Ok(self.pow_uint(&exp))
    }

    pub fn div(&self, other: &Self) -> Result<Self> {
        if !self.same_field(other) {
            return Err(Error::FieldMismatch);
        }
        Ok(self * &other.invert()?)
    }

    pub fn legendre_symbol(&self) -> Legendre {
        let exp = (&self.field.p - 1u32) >> 1;
        let ls = self.pow_uint(&exp);
        if ls.is_zero() {
            Legendre::Zero
        } else if ls.is_one() {
            Legendre::Residue
        } else {
            Legendre::NonResidue
        }
    }

    /// One square root of `self`, or `None` when `self` is not a square.
    ///
    /// Uses `a^((p+1)/4)` when `p ≡ 3 (mod 4)` and Tonelli–Shanks otherwise.
    /// The other root is the negation of the returned one.
    pub fn sqrt(&self) -> Option<Self> {
        if self.is_zero() {
            return Some(self.clone());
        }
        let p = &self.field.p;
        if *p == BigUint::from(2u32) {
            return Some(self.clone());
        }
        if self.legendre_symbol() != Legendre::Residue {
            return None;
        }
        if (p % 4u32) == BigUint::from(3u32) {
            let exp = (p + 1u32) >> 2;
            return Some(self.pow_uint(&exp));
        }
        Some(self.tonelli_shanks())
    }

    // Requires self to be a nonzero quadratic residue and p odd.
    fn tonelli_shanks(&self) -> Self {
        let p = &self.field.p;
        let one = self.field.one();

        // p - 1 = q * 2^s with q odd
        let mut q = p - 1u32;
        let mut s = 0u64;
        while !q.bit(0) {
            q >>= 1;
            s += 1;
        }

        let mut z = self.with_value(BigUint::from(2u32));
        while z.legendre_symbol() != Legendre::NonResidue {
            z = &z + &one;
        }

        let mut m = s;
        let mut c = z.pow_uint(&q);
        let mut t = self.pow_uint(&q);
        let mut r = self.pow_uint(&((&q + 1u32) >> 1));

        while !t.is_one() {
            // least i in (0, m) with t^(2^i) = 1
            let mut i = 0u64;
            let mut t2i = t.clone();
            while !t2i.is_one() {
                t2i = t2i.square();
                i += 1;
            }
            let mut b = c.clone();
            for _ in 0..(m - i - 1) {
                b = b.square();
            }
            m = i;
            c = b.square();
            t = &t * &c;
            r = &r * &b;
        }
        r
    }
}

impl PartialEq for FieldElement {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.same_field(other)
    }
}

impl Eq for FieldElement {}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({:#x})", self.value)
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl fmt::LowerHex for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.value, f)
    }
}

impl Add<&FieldElement> for &FieldElement {
    type Output = FieldElement;

    fn add(self, rhs: &FieldElement) -> FieldElement {
        self.assert_same_field(rhs);
        self.with_value(&self.value + &rhs.value)
    }
}

impl Sub<&FieldElement> for &FieldElement {
    type Output = FieldElement;

    fn sub(self, rhs: &FieldElement) -> FieldElement {
        self.assert_same_field(rhs);
        let p = &self.field.p;
        self.with_value(&self.value + p - &rhs.value)
    }
}

impl Mul<&FieldElement> for &FieldElement {
    type Output = FieldElement;

    fn mul(self, rhs: &FieldElement) -> FieldElement {
        self.assert_same_field(rhs);
        self.with_value(&self.value * &rhs.value)
    }
}

/// Field-with-integer multiplication, used for the small constants in the point formulas.
impl Mul<u64> for &FieldElement {
    type Output = FieldElement;

    fn mul(self, rhs: u64) -> FieldElement {
        self.with_value(&self.value * rhs)
    }
}

impl Neg for &FieldElement {
    type Output = FieldElement;

    fn neg(self) -> FieldElement {
        if self.is_zero() {
            return self.clone();
        }
        self.with_value(&self.field.p - &self.value)
    }
}

macro_rules! forward_owned_binop {
    ($($imp:ident, $method:ident);*) => {$(
        impl $imp<FieldElement> for FieldElement {
            type Output = FieldElement;
            fn $method(self, rhs: FieldElement) -> FieldElement {
                (&self).$method(&rhs)
            }
        }

        impl $imp<&FieldElement> for FieldElement {
            type Output = FieldElement;
            fn $method(self, rhs: &FieldElement) -> FieldElement {
                (&self).$method(rhs)
            }
        }

        impl $imp<FieldElement> for &FieldElement {
            type Output = FieldElement;
            fn $method(self, rhs: FieldElement) -> FieldElement {
                self.$method(&rhs)
            }
        }
    )*};
}

forward_owned_binop!(Add, add; Sub, sub; Mul, mul);

impl Mul<u64> for FieldElement {
    type Output = FieldElement;

    fn mul(self, rhs: u64) -> FieldElement {
        &self * rhs
    }
}

impl Neg for FieldElement {
    type Output = FieldElement;

    fn neg(self) -> FieldElement {
        -&self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::RandBigInt;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    const SECP256K1_P: &str = "fffffffffffffffffffffffffffffffffffffffffffffffffffffffefffffc2f";

    fn big_field() -> Arc<PrimeField> {
        PrimeField::new(crate::math::parse_hex(SECP256K1_P).unwrap())
    }

    fn random_element(field: &Arc<PrimeField>, rng: &mut ChaCha20Rng) -> FieldElement {
        field.element(rng.gen_biguint_below(field.modulus()))
    }

    #[test]
    fn test_field_laws() {
        let field = big_field();
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        for _ in 0..20 {
            let a = random_element(&field, &mut rng);
            let b = random_element(&field, &mut rng);
            let c = random_element(&field, &mut rng);
            assert_eq!(&(&a + &b) + &c, &a + &(&b + &c));
            assert_eq!(&a * &(&b + &c), &(&a * &b) + &(&a * &c));
            assert_eq!(&(&a - &b) + &b, a);
            if !a.is_zero() {
                assert!((&a * &a.invert().unwrap()).is_one());
            }
        }
    }

    #[test]
    fn test_values_stay_reduced() {
        let field = PrimeField::new(BigUint::from(101u32));
        let a = field.element(500u32);
        assert_eq!(a.value(), &BigUint::from(96u32));
        let b = field.from_signed(&BigInt::from(-3));
        assert_eq!(b.value(), &BigUint::from(98u32));
        assert_eq!((&a * 7).value(), &BigUint::from((96u32 * 7) % 101));
        assert!((-&field.zero()).is_zero());
    }

    #[test]
    fn test_invert_zero_is_division_by_zero() {
        let field = big_field();
        assert_eq!(field.zero().invert(), Err(Error::DivisionByZero));
        assert_eq!(field.one().div(&field.zero()), Err(Error::DivisionByZero));
    }

    #[test]
    fn test_pow_negative_and_zero_exponent() {
        let field = PrimeField::new(BigUint::from(101u32));
        let a = field.element(5u32);
        assert!(a.pow(&BigInt::from(0)).unwrap().is_one());
        let inv_cubed = a.pow(&BigInt::from(-3)).unwrap();
        assert!((&inv_cubed * &a.pow(&BigInt::from(3)).unwrap()).is_one());
        assert_eq!(field.zero().pow(&BigInt::from(-1)), Err(Error::DivisionByZero));
    }

    #[test]
    fn test_legendre_symbol() {
        let field = PrimeField::new(BigUint::from(103u32));
        assert_eq!(field.zero().legendre_symbol(), Legendre::Zero);
        assert_eq!(field.element(4u32).legendre_symbol(), Legendre::Residue);
        // -1 is a non-residue when p = 3 mod 4
        assert_eq!((-&field.one()).legendre_symbol(), Legendre::NonResidue);
    }

    #[test]
    fn test_sqrt_roundtrip_p_3_mod_4() {
        let field = big_field();
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let mut residues = 0;
        let mut non_residues = 0;
        for _ in 0..30 {
            let a = random_element(&field, &mut rng);
            match a.legendre_symbol() {
                Legendre::Residue => {
                    residues += 1;
                    assert_eq!(a.sqrt().unwrap().square(), a);
                }
                Legendre::NonResidue => {
                    non_residues += 1;
                    assert!(a.sqrt().is_none());
                }
                Legendre::Zero => unreachable!(),
            }
        }
        assert!(residues > 0 && non_residues > 0);
    }

    #[test]
    fn test_sqrt_tonelli_shanks_p_1_mod_4() {
        // 97 - 1 = 3 * 2^5 and 7681 - 1 = 15 * 2^9
        for p in [97u32, 7681u32] {
            let field = PrimeField::new(BigUint::from(p));
            for v in 0..p {
                let a = field.element(v);
                match a.sqrt() {
                    Some(root) => assert_eq!(root.square(), a, "sqrt({v}) mod {p}"),
                    None => assert_eq!(a.legendre_symbol(), Legendre::NonResidue),
                }
            }
        }
    }

    #[test]
    fn test_sqrt_of_zero() {
        let field = big_field();
        assert_eq!(field.zero().sqrt(), Some(field.zero()));
    }

    #[test]
    fn test_equality_requires_same_modulus() {
        let f1 = PrimeField::new(BigUint::from(101u32));
        let f2 = PrimeField::new(BigUint::from(103u32));
        let f3 = PrimeField::new(BigUint::from(101u32));
        assert_ne!(f1.element(5u32), f2.element(5u32));
        assert_eq!(f1.element(5u32), f3.element(5u32));
        assert_eq!(f1.element(5u32).div(&f2.element(1u32)), Err(Error::FieldMismatch));
    }

    #[test]
    #[should_panic(expected = "field mismatch")]
    fn test_mismatched_fields_panic() {
        let f1 = PrimeField::new(BigUint::from(101u32));
        let f2 = PrimeField::new(BigUint::from(103u32));
        let _ = &f1.element(5u32) + &f2.element(5u32);
    }
}
