//! Affine point representation and affine group law.
//!
//! These formulas divide by a data-dependent denominator and branch on the
//! operands, so they are only used on public values (verification, lifting, I/O).

use super::Curve;
use crate::error::{Error, Result};
use crate::math::field::FieldElement;
use crate::math::to_be_bytes_padded;
use num_bigint::BigUint;

/// A point in affine coordinates, or the point at infinity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AffinePoint {
    Infinity,
    Finite { x: FieldElement, y: FieldElement },
}

impl AffinePoint {
    pub fn new(x: FieldElement, y: FieldElement) -> Self {
        AffinePoint::Finite { x, y }
    }

    pub fn is_infinity(&self) -> bool {
        matches!(self, AffinePoint::Infinity)
    }

    pub fn x(&self) -> Option<&FieldElement> {
        match self {
            AffinePoint::Finite { x, .. } => Some(x),
            AffinePoint::Infinity => None,
        }
    }

    pub fn y(&self) -> Option<&FieldElement> {
        match self {
            AffinePoint::Finite { y, .. } => Some(y),
            AffinePoint::Infinity => None,
        }
    }

    /// SEC1 uncompressed encoding `0x04 ∥ X ∥ Y` with `coord_len`-byte coordinates.
    pub fn to_uncompressed(&self, coord_len: usize) -> Option<Vec<u8>> {
        let AffinePoint::Finite { x, y } = self else {
            return None;
        };
        let mut out = Vec::with_capacity(1 + 2 * coord_len);
        out.push(0x04);
        out.extend(to_be_bytes_padded(x.value(), coord_len)?);
        out.extend(to_be_bytes_padded(y.value(), coord_len)?);
        Some(out)
    }
}

/// Normalizes a projective `(X : Y : Z)` triple; `Z = 0` is the point at infinity.
fn from_projective(x: FieldElement, y: FieldElement, z: &FieldElement) -> AffinePoint {
    match z.invert() {
        Ok(t) => AffinePoint::new(&x * &t, &y * &t),
        Err(_) => AffinePoint::Infinity,
    }
}

impl Curve {
    /// `x³ + Ax + B`
    fn rhs(&self, x: &FieldElement) -> FieldElement {
        &(&(&x.square() + &self.a) * x) + &self.b
    }

    /// Curve equation check. Infinity is on every curve.
    pub fn is_on_curve(&self, point: &AffinePoint) -> bool {
        match point {
            AffinePoint::Infinity => true,
            AffinePoint::Finite { x, y } => {
                x.field().modulus() == self.field.modulus()
                    && y.field().modulus() == self.field.modulus()
                    && y.square() == self.rhs(x)
            }
        }
    }

    pub fn neg(&self, point: &AffinePoint) -> AffinePoint {
        match point {
            AffinePoint::Infinity => AffinePoint::Infinity,
            AffinePoint::Finite { x, y } => AffinePoint::new(x.clone(), -y),
        }
    }

    /// Point doubling (EFD mdbl-2007-bl, projective with `Z1 = 1`).
    pub fn dbl_aff(&self, point: &AffinePoint) -> AffinePoint {
        let AffinePoint::Finite { x: x1, y: y1 } = point else {
            return AffinePoint::Infinity;
        };

        let xx = x1.square();
        let w = &self.a + &(&xx * 3);
        let r = &y1.square() * 2;
        let sss = &(y1 * &r) * 4;
        let rr = r.square();
        let b = &(&(x1 + &r).square() - &xx) - &rr;
        let h = &w.square() - &(&b * 2);
        let x3 = &(&h * y1) * 2;
        let y3 = &(&w * &(&b - &h)) - &(&rr * 2);

        // sss = 8·y1³ vanishes exactly for 2-torsion points
        from_projective(x3, y3, &sss)
    }

    /// Point addition (EFD mmadd-1998-cmo), dispatching to doubling for equal points.
    pub fn add_aff(&self, p: &AffinePoint, q: &AffinePoint) -> AffinePoint {
        let (x1, y1, x2, y2) = match (p, q) {
            (AffinePoint::Infinity, _) => return q.clone(),
            (_, AffinePoint::Infinity) => return p.clone(),
            (AffinePoint::Finite { x: x1, y: y1 }, AffinePoint::Finite { x: x2, y: y2 }) => {
                (x1, y1, x2, y2)
            }
        };

        if x1 == x2 {
            if y1 == y2 {
                return self.dbl_aff(p);
            }
            return AffinePoint::Infinity;
        }

        let u = y2 - y1;
        let v = x2 - x1;
        let vv = v.square();
        let vvv = &v * &vv;
        let r = &vv * x1;
        let a = &(&(&u.square() - &vvv) - &r) - &r;
        let x3 = &v * &a;
        let y3 = &(&u * &(&r - &a)) - &(&vvv * y1);

        from_projective(x3, y3, &vvv)
    }

    /// All curve points whose x-coordinate is congruent to `r` modulo the group order.
    ///
    /// Candidates are `x = r, r + n, r + 2n, …` below `p`. Each x with a square
    /// right-hand side contributes `(x, y)` and `(x, -y)`; x values with a
    /// non-residue right-hand side are skipped.
    pub fn lift_x(&self, r: &BigUint) -> Result<Vec<AffinePoint>> {
        if r >= &self.order {
            return Err(Error::OutOfRange(format!(
                "lift_x input {r:#x} is not below the group order"
            )));
        }

        let p = self.field.modulus();
        let mut lifted = Vec::new();
        let mut candidate = r.clone();
        while &candidate < p {
            let x = self.field.element(candidate.clone());
            if let Some(y) = self.rhs(&x).sqrt() {
                let neg_y = -&y;
                let distinct = neg_y != y;
                lifted.push(AffinePoint::new(x.clone(), y));
                if distinct {
                    lifted.push(AffinePoint::new(x, neg_y));
                }
            }
            candidate += &self.order;
        }
        Ok(lifted)
    }
}
