//! ECDSA signature values and the concatenated DER-style record format
//!
//! A signature file is a plain concatenation of records
//! `0x30 len 0x02 rlen r 0x02 slen s`, all lengths single bytes.

use crate::error::{Error, Result};
use num_bigint::BigUint;
use num_traits::Zero;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    pub r: BigUint,
    pub s: BigUint,
}

impl Signature {
    pub fn new(r: BigUint, s: BigUint) -> Self {
        Self { r, s }
    }

    /// Both components lie in `[1, order - 1]`.
    pub fn in_range(&self, order: &BigUint) -> bool {
        !self.r.is_zero() && !self.s.is_zero() && &self.r < order && &self.s < order
    }
}

fn malformed(offset: usize, reason: impl Into<String>) -> Error {
    Error::MalformedSignature {
        offset,
        reason: reason.into(),
    }
}

/// Splits a concatenation of signature records into `(r, s)` pairs, in file order.
///
/// The record length is read from its second byte, the length of `r` from the
/// second byte of the payload; `s` runs from after its own tag and length to the
/// end of the payload.
pub fn parse_signatures(raw: &[u8]) -> Result<Vec<Signature>> {
    let mut sigs = Vec::new();
    let mut i = 0;
    while i < raw.len() {
        if i + 2 > raw.len() {
            return Err(malformed(i, "truncated record header"));
        }
        let length = raw[i + 1] as usize;
        let end = i + 2 + length;
        if end > raw.len() {
            return Err(malformed(
                i,
                format!("record needs {length} bytes, {} left", raw.len() - i - 2),
            ));
        }
        let body = &raw[i + 2..end];
        if body.len() < 2 {
            return Err(malformed(i, "record too short for r"));
        }
        let rlen = body[1] as usize;
        if body.len() < 4 + rlen {
            return Err(malformed(i, format!("r length {rlen} overruns record")));
        }
        let r = BigUint::from_bytes_be(&body[2..2 + rlen]);
        let s = BigUint::from_bytes_be(&body[4 + rlen..]);
        sigs.push(Signature { r, s });
        i = end;
    }
    Ok(sigs)
}

/// Minimal DER INTEGER body: big-endian, with a leading zero when the top bit is set.
fn der_integer(value: &BigUint) -> Vec<u8> {
    let mut bytes = value.to_bytes_be();
    if bytes[0] & 0x80 != 0 {
        bytes.insert(0, 0);
    }
    bytes
}

pub fn encode_signature(sig: &Signature) -> Vec<u8> {
    let r = der_integer(&sig.r);
    let s = der_integer(&sig.s);
    let mut out = Vec::with_capacity(6 + r.len() + s.len());
    out.push(0x30);
    out.push((4 + r.len() + s.len()) as u8);
    out.push(0x02);
    out.push(r.len() as u8);
    out.extend(r);
    out.push(0x02);
    out.push(s.len() as u8);
    out.extend(s);
    out
}

pub fn encode_signatures(sigs: &[Signature]) -> Vec<u8> {
    sigs.iter().flat_map(encode_signature).collect()
}
