//! ECDSA signing and verification on top of the Montgomery ladder.
//!
//! Signing takes its scalar multiplier as a [`ScalarMul`] so a faulted ladder can be
//! swapped in. The [`Fault`] it is handed is forwarded untouched; `sign` never looks
//! inside it.

use crate::curve::{AffinePoint, Curve};
use crate::math::{invmod, mod_add, mod_mul};
use crate::signature::Signature;
use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};

/// Fault configuration forwarded to a [`ScalarMul`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fault {
    /// Ladder step whose condition update is skipped.
    pub step: Option<u64>,
    /// Number of nonce bits the fault model is expected to leak.
    pub leak_width: u32,
}

impl Fault {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn at_step(step: u64, leak_width: u32) -> Self {
        Self {
            step: Some(step),
            leak_width,
        }
    }
}

/// Scalar multiplication used to derive the nonce point while signing.
pub trait ScalarMul {
    fn scalar_mul(&self, curve: &Curve, k: &BigUint, point: &AffinePoint, fault: &Fault)
        -> AffinePoint;
}

/// The curve's ladder, faulted at `fault.step` when set.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ladder;

impl ScalarMul for Ladder {
    fn scalar_mul(
        &self,
        curve: &Curve,
        k: &BigUint,
        point: &AffinePoint,
        fault: &Fault,
    ) -> AffinePoint {
        curve.ladder(k, point, fault.step)
    }
}

impl<F> ScalarMul for F
where
    F: Fn(&Curve, &BigUint, &AffinePoint, &Fault) -> AffinePoint,
{
    fn scalar_mul(
        &self,
        curve: &Curve,
        k: &BigUint,
        point: &AffinePoint,
        fault: &Fault,
    ) -> AffinePoint {
        self(curve, k, point, fault)
    }
}

#[derive(Debug, Clone)]
pub struct Keypair {
    pub privkey: BigUint,
    pub pubkey: AffinePoint,
}

fn random_scalar<R: RngCore + CryptoRng + ?Sized>(curve: &Curve, rng: &mut R) -> BigUint {
    rng.gen_biguint_range(&BigUint::one(), curve.order())
}

/// Private key uniform in `[1, order - 1]`, public key `privkey·base`.
pub fn generate_keypair<R: RngCore + CryptoRng + ?Sized>(curve: &Curve, rng: &mut R) -> Keypair {
    let privkey = random_scalar(curve, rng);
    let pubkey = curve.ladder(&privkey, curve.base(), None);
    Keypair { privkey, pubkey }
}

/// Signs `msg` (a digest as an integer) with a fresh nonce per attempt.
///
/// Draws are rejected and repeated while `r = 0` or `s = 0`, including when the
/// multiplier returns the point at infinity.
pub fn sign<M, R>(
    curve: &Curve,
    privkey: &BigUint,
    msg: &BigUint,
    mult: &M,
    fault: &Fault,
    rng: &mut R,
) -> Signature
where
    M: ScalarMul + ?Sized,
    R: RngCore + CryptoRng + ?Sized,
{
    let order = curve.order();
    loop {
        let k = random_scalar(curve, rng);
        let nonce_point = mult.scalar_mul(curve, &k, curve.base(), fault);
        let Some(x) = nonce_point.x() else {
            continue;
        };
        let r = x.value() % order;
        let Ok(k_inv) = invmod(&k, order) else {
            continue;
        };
        let s = mod_mul(&k_inv, &mod_add(msg, &mod_mul(privkey, &r, order), order), order);
        if !r.is_zero() && !s.is_zero() {
            return Signature { r, s };
        }
    }
}

/// Outcome of a verification, together with the recomputed point `u·G + v·Q`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub valid: bool,
    pub point: AffinePoint,
}

/// Standard ECDSA verification. Out-of-range `r` or `s` is reported as invalid
/// with the point at infinity.
pub fn verify(curve: &Curve, pubkey: &AffinePoint, msg: &BigUint, sig: &Signature) -> Verification {
    let order = curve.order();
    let rejected = || Verification {
        valid: false,
        point: AffinePoint::Infinity,
    };
    if !sig.in_range(order) {
        return rejected();
    }
    let Ok(s_inv) = invmod(&sig.s, order) else {
        return rejected();
    };

    let u = mod_mul(msg, &s_inv, order);
    let v = mod_mul(&sig.r, &s_inv, order);
    let u_point = curve.ladder(&u, curve.base(), None);
    let v_point = curve.ladder(&v, pubkey, None);
    let point = curve.add_aff(&u_point, &v_point);

    let valid = point
        .x()
        .map(|x| x.value() % order == sig.r)
        .unwrap_or(false);
    Verification { valid, point }
}

/// Verification result plus, for invalid signatures, every curve point whose
/// x-coordinate reduces to `r`.
#[derive(Debug, Clone)]
pub struct SignatureRecovery {
    pub valid: bool,
    pub point: AffinePoint,
    pub candidates: Vec<AffinePoint>,
}

pub fn points_from_sig(
    curve: &Curve,
    pubkey: &AffinePoint,
    msg: &BigUint,
    sig: &Signature,
) -> SignatureRecovery {
    let Verification { valid, point } = verify(curve, pubkey, msg, sig);
    let candidates = if valid {
        Vec::new()
    } else {
        // r outside [0, order) cannot come from any nonce point
        curve.lift_x(&sig.r).unwrap_or_default()
    };
    SignatureRecovery {
        valid,
        point,
        candidates,
    }
}
