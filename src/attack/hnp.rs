//! Hidden Number Problem hints from signatures with partially known nonces.
//!
//! A valid signature under the modeled fault tells us that the nonce `k` has a
//! run of `width` zero bits on one side. Writing `k = s⁻¹·(m + r·d)` and scaling
//! by `tmp` gives the congruence `u·d ≡ C - v + e (mod n)` with `|e| ≤ (B2 - B1)/2`,
//! emitted as the hint `(u, C - v, L)` with `L = n / (B2 - B1)`.
//!
//! The text form below is what the external lattice solver reads:
//!
//! ```text
//! secp256k1,0x<pubkey x>,0x<pubkey y>
//! <u hex>,<C - v hex, possibly negative>,<L decimal>
//! ```

use crate::curve::{AffinePoint, Curve};
use crate::error::{Error, Result};
use crate::math::{bit_length, mod_mul, modinv, pow2};
use crate::signature::Signature;
use num_bigint::{BigInt, BigUint};
use serde::Serialize;
use std::fmt;

/// Which end of the nonce the fault reveals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LeakSide {
    /// Least significant bits are known to be zero.
    Lsb,
    /// Most significant bits are known to be zero.
    Msb,
}

impl fmt::Display for LeakSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeakSide::Lsb => write!(f, "lsb"),
            LeakSide::Msb => write!(f, "msb"),
        }
    }
}

/// Leakage model: side, leak width `ℓ` and, for LSB leaks, whether the nonce
/// was padded to a fixed bit length before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LeakModel {
    pub side: LeakSide,
    pub padding: bool,
    pub width: u32,
}

impl LeakModel {
    pub fn new(side: LeakSide, padding: bool, width: u32) -> Self {
        Self {
            side,
            padding,
            width,
        }
    }

    /// Interval `[B1, B2)` the scaled nonce is known to lie in.
    pub fn bounds(&self, order: &BigUint) -> Result<(BigUint, BigUint)> {
        let bits = bit_length(order);
        let width = u64::from(self.width);
        if width >= bits {
            return Err(Error::OutOfRange(format!(
                "leak width {} must be below the {bits}-bit group order",
                self.width
            )));
        }
        let (b1, b2) = match (self.side, self.padding) {
            (LeakSide::Lsb, true) => (pow2(bits) >> width, (pow2(bits) + order) >> width),
            (LeakSide::Lsb, false) => (BigUint::default(), order >> width),
            (LeakSide::Msb, _) => (BigUint::default(), pow2(bits - width)),
        };
        if b2 <= b1 {
            return Err(Error::OutOfRange(format!(
                "leak width {} leaves an empty nonce interval",
                self.width
            )));
        }
        Ok((b1, b2))
    }

    /// The hint for one signature.
    pub fn hint(&self, order: &BigUint, msg: &BigUint, sig: &Signature) -> Result<Hint> {
        let (b1, b2) = self.bounds(order)?;
        let scaled_s = match self.side {
            LeakSide::Lsb => &sig.s * pow2(u64::from(self.width)),
            LeakSide::Msb => sig.s.clone(),
        };
        let tmp = modinv(&scaled_s, order).ok_or_else(|| {
            Error::OutOfRange(format!("s = {:#x} is not invertible modulo the order", sig.s))
        })?;

        let u = mod_mul(&sig.r, &tmp, order);
        let v = mod_mul(msg, &tmp, order);
        let c = (&b1 + &b2) >> 1;
        let l = order / (&b2 - &b1);

        Ok(Hint {
            u,
            v: BigInt::from(c) - BigInt::from(v),
            l,
        })
    }
}

/// One linear-congruence hint `(u, v, L)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    pub u: BigUint,
    /// `C - (m·tmp mod n)`; may be negative.
    pub v: BigInt,
    pub l: BigUint,
}

impl fmt::Display for Hint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x},{:x},{}", self.u, self.v, self.l)
    }
}

/// All hints of one analysis run, with the header identifying curve and key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HnpInstances {
    pub curve_name: String,
    pub pubkey_x: BigUint,
    pub pubkey_y: BigUint,
    pub hints: Vec<Hint>,
}

impl HnpInstances {
    pub fn len(&self) -> usize {
        self.hints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }
}

impl fmt::Display for HnpInstances {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{},{:#x},{:#x}",
            self.curve_name, self.pubkey_x, self.pubkey_y
        )?;
        for hint in &self.hints {
            writeln!(f, "{hint}")?;
        }
        Ok(())
    }
}

/// Builds one hint per signature, in input order.
pub fn build_hnp_instances(
    curve: &Curve,
    pubkey: &AffinePoint,
    valid_signatures: &[Signature],
    msg: &BigUint,
    model: &LeakModel,
) -> Result<HnpInstances> {
    let (Some(x), Some(y)) = (pubkey.x(), pubkey.y()) else {
        return Err(Error::MalformedPublicKey(
            "public key is the point at infinity".to_string(),
        ));
    };
    let hints = valid_signatures
        .iter()
        .map(|sig| model.hint(curve.order(), msg, sig))
        .collect::<Result<Vec<_>>>()?;

    Ok(HnpInstances {
        curve_name: curve.name().to_string(),
        pubkey_x: x.to_integer(),
        pubkey_y: y.to_integer(),
        hints,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(r: u32, s: u32) -> Signature {
        Signature::new(BigUint::from(r), BigUint::from(s))
    }

    #[test]
    fn test_lsb_hint_without_padding() {
        let order = BigUint::from(0xFFFFu32);
        let model = LeakModel::new(LeakSide::Lsb, false, 4);
        let (b1, b2) = model.bounds(&order).unwrap();
        assert_eq!(b1, BigUint::from(0u32));
        assert_eq!(b2, BigUint::from(0xFFFu32));

        let hint = model.hint(&order, &BigUint::from(42u32), &sig(100, 7)).unwrap();
        let tmp = modinv(&BigUint::from(7u32 * 16), &order).unwrap();
        assert_eq!(hint.u, (BigUint::from(100u32) * &tmp) % &order);
        assert_eq!(
            hint.v,
            BigInt::from(0xFFFu32 / 2) - BigInt::from((BigUint::from(42u32) * &tmp) % &order)
        );
        assert_eq!(hint.l, &order / BigUint::from(0xFFFu32));
        assert_eq!(hint.to_string(), "9b6e,-5801,16");
    }

    #[test]
    fn test_lsb_bounds_with_padding() {
        let order = BigUint::from(0xFFFFu32);
        let model = LeakModel::new(LeakSide::Lsb, true, 4);
        let (b1, b2) = model.bounds(&order).unwrap();
        assert_eq!(b1, BigUint::from(0x10000u32 >> 4));
        assert_eq!(b2, BigUint::from((0x10000u32 + 0xFFFF) >> 4));
    }

    #[test]
    fn test_msb_hint() {
        let order = BigUint::from(0xFFFFu32);
        let model = LeakModel::new(LeakSide::Msb, true, 4);
        let (b1, b2) = model.bounds(&order).unwrap();
        assert_eq!(b1, BigUint::from(0u32));
        assert_eq!(b2, BigUint::from(1u32 << 12));

        let hint = model.hint(&order, &BigUint::from(42u32), &sig(100, 7)).unwrap();
        let tmp = modinv(&BigUint::from(7u32), &order).unwrap();
        assert_eq!(hint.u, (BigUint::from(100u32) * &tmp) % &order);
        assert_eq!(hint.l, BigUint::from(0xFFFFu32 / 4096));
    }

    #[test]
    fn test_width_too_large() {
        let order = BigUint::from(0xFFFFu32);
        for side in [LeakSide::Lsb, LeakSide::Msb] {
            let model = LeakModel::new(side, false, 16);
            assert!(matches!(model.bounds(&order), Err(Error::OutOfRange(_))));
        }
    }

    #[test]
    fn test_output_format() {
        let curve = Curve::named("secp256k1").unwrap();
        let model = LeakModel::new(LeakSide::Lsb, false, 8);
        let sigs = vec![sig(100, 7), sig(200, 9)];
        let instances =
            build_hnp_instances(&curve, curve.base(), &sigs, &BigUint::from(42u32), &model)
                .unwrap();
        let text = instances.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "secp256k1,0x79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798,\
             0x483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8"
        );
        for line in &lines[1..] {
            let fields: Vec<&str> = line.split(',').collect();
            assert_eq!(fields.len(), 3);
            assert!(!fields[0].starts_with("0x"));
            assert!(fields[2].chars().all(|c| c.is_ascii_digit()));
        }
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_infinity_pubkey_rejected() {
        let curve = Curve::named("secp256k1").unwrap();
        let model = LeakModel::new(LeakSide::Msb, false, 8);
        let result = build_hnp_instances(
            &curve,
            &AffinePoint::Infinity,
            &[],
            &BigUint::from(1u32),
            &model,
        );
        assert!(matches!(result, Err(Error::MalformedPublicKey(_))));
    }
}
