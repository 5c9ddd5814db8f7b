//! Error types for field, curve and signature-record handling

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("division by zero in field inversion")]
    DivisionByZero,

    #[error("operands belong to different fields")]
    FieldMismatch,

    #[error("value out of range: {0}")]
    OutOfRange(String),

    #[error("unknown curve: {0} (expected secp256r1 or secp256k1)")]
    UnknownCurve(String),

    #[error("invalid curve parameters: {0}")]
    InvalidCurve(String),

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("malformed signature record at byte {offset}: {reason}")]
    MalformedSignature { offset: usize, reason: String },

    #[error("malformed public key: {0}")]
    MalformedPublicKey(String),
}
