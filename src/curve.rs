//! Short Weierstrass curves `y² = x³ + Ax + B` over prime fields.
//!
//! [`Curve`] only holds the domain parameters. Two independent operation sets act
//! on it: the affine one in [`affine`] (public input/output form, uses inversions)
//! and the Jacobian one in [`jacobian`] (inversion-free, used by the ladder).

pub mod affine;
pub mod jacobian;
pub mod params;

pub use affine::AffinePoint;
pub use jacobian::JacobianPoint;
pub use params::{CurveParams, CURVES, SECP256K1, SECP256R1};

use crate::error::{Error, Result};
use crate::math::field::{FieldElement, PrimeField};
use crate::math::parse_hex;
use num_bigint::{BigInt, BigUint};
use num_traits::One;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Curve {
    name: String,
    field: Arc<PrimeField>,
    a: FieldElement,
    b: FieldElement,
    order: BigUint,
    base: AffinePoint,
}

impl Curve {
    /// Builds a curve and checks that the base point satisfies the curve equation.
    pub fn new(
        name: impl Into<String>,
        p: BigUint,
        a: &BigInt,
        b: &BigInt,
        order: BigUint,
        base: (BigUint, BigUint),
    ) -> Result<Self> {
        let name = name.into();
        if p <= BigUint::from(3u32) {
            return Err(Error::InvalidCurve(format!("{name}: field prime too small")));
        }
        if order <= BigUint::one() {
            return Err(Error::InvalidCurve(format!("{name}: group order too small")));
        }
        let field = PrimeField::new(p);
        let a = field.from_signed(a);
        let b = field.from_signed(b);
        let base = AffinePoint::new(field.element(base.0), field.element(base.1));
        let curve = Self {
            name,
            field,
            a,
            b,
            order,
            base,
        };
        if !curve.is_on_curve(&curve.base) {
            return Err(Error::InvalidCurve(format!(
                "{}: base point is not on the curve",
                curve.name
            )));
        }
        Ok(curve)
    }

    pub fn from_params(params: &CurveParams) -> Result<Self> {
        Self::new(
            params.name,
            parse_hex(params.p)?,
            &BigInt::from(parse_hex(params.a)?),
            &BigInt::from(parse_hex(params.b)?),
            parse_hex(params.order)?,
            (parse_hex(params.gx)?, parse_hex(params.gy)?),
        )
    }

    /// Looks a curve up in the built-in registry.
    pub fn named(name: &str) -> Result<Self> {
        let params = params::lookup(name).ok_or_else(|| Error::UnknownCurve(name.to_string()))?;
        Self::from_params(params)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self) -> &Arc<PrimeField> {
        &self.field
    }

    pub fn a(&self) -> &FieldElement {
        &self.a
    }

    pub fn b(&self) -> &FieldElement {
        &self.b
    }

    pub fn order(&self) -> &BigUint {
        &self.order
    }

    pub fn base(&self) -> &AffinePoint {
        &self.base
    }

    /// Byte length of an encoded coordinate.
    pub fn coordinate_len(&self) -> usize {
        self.field.modulus().bits().div_ceil(8) as usize
    }

    /// Affine point from integer coordinates. Membership is not checked.
    pub fn point(&self, x: BigUint, y: BigUint) -> AffinePoint {
        AffinePoint::new(self.field.element(x), self.field.element(y))
    }
}
