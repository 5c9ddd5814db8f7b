//! Jacobian coordinates and the fault-injectable Montgomery ladder.
//!
//! A Jacobian point `(X, Y, Z)` stands for the affine point `(X/Z², Y/Z³)`;
//! `Z = 0` is the point at infinity. Scalar multiplication runs entirely in this
//! representation and converts back to affine once at the end.

use super::{AffinePoint, Curve};
use crate::math::field::FieldElement;
use num_bigint::BigUint;
use num_traits::{One, Zero};

#[derive(Debug, Clone)]
pub struct JacobianPoint {
    pub x: FieldElement,
    pub y: FieldElement,
    pub z: FieldElement,
}

impl JacobianPoint {
    pub fn is_infinity(&self) -> bool {
        self.z.is_zero()
    }
}

fn conditional_swap<T>(bit: bool, r0: T, r1: T) -> (T, T) {
    if bit {
        (r1, r0)
    } else {
        (r0, r1)
    }
}

impl Curve {
    pub fn jacobian_infinity(&self) -> JacobianPoint {
        JacobianPoint {
            x: self.field.one(),
            y: self.field.one(),
            z: self.field.zero(),
        }
    }

    pub fn to_jacobian(&self, point: &AffinePoint) -> JacobianPoint {
        match point {
            AffinePoint::Infinity => self.jacobian_infinity(),
            AffinePoint::Finite { x, y } => JacobianPoint {
                x: x.clone(),
                y: y.clone(),
                z: self.field.one(),
            },
        }
    }

    /// `(X·Z⁻², Y·Z⁻³)` with a single inversion.
    pub fn to_affine(&self, point: &JacobianPoint) -> AffinePoint {
        let Ok(z_inv) = point.z.invert() else {
            return AffinePoint::Infinity;
        };
        let z_inv2 = z_inv.square();
        let z_inv3 = &z_inv2 * &z_inv;
        AffinePoint::new(&point.x * &z_inv2, &point.y * &z_inv3)
    }

    /// EFD add-2007-bl. Falls back to doubling when both inputs are the same point.
    pub fn add_jac(&self, p1: &JacobianPoint, p2: &JacobianPoint) -> JacobianPoint {
        if p1.is_infinity() {
            return p2.clone();
        }
        if p2.is_infinity() {
            return p1.clone();
        }
        let JacobianPoint {
            x: x1,
            y: y1,
            z: z1,
        } = p1;
        let JacobianPoint {
            x: x2,
            y: y2,
            z: z2,
        } = p2;

        let z1z1 = z1.square();
        let z2z2 = z2.square();
        let u1 = x1 * &z2z2;
        let u2 = x2 * &z1z1;
        let s1 = y1 * &(z2 * &z2z2);
        let s2 = y2 * &(z1 * &z1z1);
        let h = &u2 - &u1;
        let t = &s2 - &s1;

        if h.is_zero() {
            if t.is_zero() {
                return self.dbl_jac(p1);
            }
            return self.jacobian_infinity();
        }

        let i = (&h * 2).square();
        let j = &h * &i;
        let r = &t * 2;
        let v = &u1 * &i;
        let x3 = &(&r.square() - &j) - &(&v * 2);
        let y3 = &(&r * &(&v - &x3)) - &(&(&s1 * &j) * 2);
        let z3 = &(&(&(z1 + z2).square() - &z1z1) - &z2z2) * &h;

        JacobianPoint {
            x: x3,
            y: y3,
            z: z3,
        }
    }

    /// EFD dbl-2007-bl.
    pub fn dbl_jac(&self, p1: &JacobianPoint) -> JacobianPoint {
        if p1.is_infinity() {
            return p1.clone();
        }
        let JacobianPoint {
            x: x1,
            y: y1,
            z: z1,
        } = p1;

        let xx = x1.square();
        let yy = y1.square();
        let yyyy = yy.square();
        let zz = z1.square();
        let s = &(&(&(x1 + &yy).square() - &xx) - &yyyy) * 2;
        let m = &(&xx * 3) + &(&self.a * &zz.square());
        let x3 = &m.square() - &(&s * 2);
        let y3 = &(&m * &(&s - &x3)) - &(&yyyy * 8);
        let z3 = &(&(y1 + z1).square() - &yy) - &zz;

        JacobianPoint {
            x: x3,
            y: y3,
            z: z3,
        }
    }

    /// Montgomery ladder computing `k·P`, optionally faulted at one bit position.
    ///
    /// Bits are processed from position `bitlen(k) - 2` down to `0`. Each step swaps
    /// the accumulators by `condition ⊕ bit`, then performs one addition and one
    /// doubling, and records the current bit as the new `condition`. When the step
    /// index equals `fault_step` that record is skipped, so `condition` keeps the
    /// XOR value for the next step.
    ///
    /// With a fault at step `i`, the output is unchanged when `i = 0`, when
    /// `i ≥ bitlen(k) - 2`, or when bit `i + 1` of `k` is clear. Otherwise every
    /// lower step runs on swapped accumulators and the result is
    /// `(k + 2^i - 2·(k mod 2^i))·P`, which is wrong unless `k mod 2^i = 2^(i-1)`.
    ///
    /// `k = 0` and `k = 1` return directly, without running any step.
    pub fn ladder_jac(
        &self,
        k: &BigUint,
        point: &AffinePoint,
        fault_step: Option<u64>,
    ) -> JacobianPoint {
        if k.is_zero() || point.is_infinity() {
            return self.jacobian_infinity();
        }
        if k.is_one() {
            return self.to_jacobian(point);
        }

        let r0 = self.to_jacobian(point);
        let r1 = self.dbl_jac(&r0);

        let (r0, r1, _) =
            (0..k.bits() - 1)
                .rev()
                .fold((r0, r1, false), |(r0, r1, condition), i| {
                    let bit = k.bit(i);
                    let swap = condition ^ bit;
                    let (r0, r1) = conditional_swap(swap, r0, r1);
                    let r1 = self.add_jac(&r0, &r1);
                    let r0 = self.dbl_jac(&r0);
                    let condition = if fault_step == Some(i) { swap } else { bit };
                    (r0, r1, condition)
                });

        let (r0, _) = conditional_swap(k.bit(0), r0, r1);
        r0
    }

    /// Affine wrapper around [`ladder_jac`](Self::ladder_jac).
    pub fn ladder(&self, k: &BigUint, point: &AffinePoint, fault_step: Option<u64>) -> AffinePoint {
        if k.is_one() {
            return point.clone();
        }
        self.to_affine(&self.ladder_jac(k, point, fault_step))
    }
}
