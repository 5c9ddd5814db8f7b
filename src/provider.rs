//! Input and output files of the analysis

use crate::attack::HnpInstances;
use crate::curve::{AffinePoint, Curve};
use crate::error::Error;
use crate::signature::{encode_signatures, parse_signatures, Signature};
use anyhow::{bail, Context, Result};
use num_bigint::BigUint;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

const PEM_BEGIN: &str = "-----BEGIN PUBLIC KEY-----";
const PEM_END: &str = "-----END PUBLIC KEY-----";

/// SubjectPublicKeyInfo DER prefix up to the BIT STRING holding the point.
fn spki_prefix(curve_name: &str) -> Option<&'static str> {
    match curve_name {
        "secp256k1" => Some("3056301006072a8648ce3d020106052b8104000a034200"),
        "secp256r1" => Some("3059301306072a8648ce3d020106082a8648ce3d030107034200"),
        _ => None,
    }
}

/// Reads the public key from a PEM-style file: lines 2 and 3, concatenated and
/// base64-decoded, end with the uncompressed point `0x04 ∥ X ∥ Y`.
pub fn parse_pubkey(curve: &Curve, text: &str) -> Result<AffinePoint> {
    let lines: Vec<&str> = text.split('\n').collect();
    if lines.len() < 3 {
        return Err(Error::MalformedPublicKey(format!(
            "expected at least 3 lines, found {}",
            lines.len()
        ))
        .into());
    }
    let encoded = format!("{}{}", lines[1].trim(), lines[2].trim());
    let der = base64::decode(&encoded)
        .map_err(|e| Error::MalformedPublicKey(format!("invalid base64: {e}")))?;

    let coord_len = curve.coordinate_len();
    let point_len = 1 + 2 * coord_len;
    if der.len() < point_len || der[der.len() - point_len] != 0x04 {
        return Err(Error::MalformedPublicKey(
            "no uncompressed point at the end of the key".to_string(),
        )
        .into());
    }
    let xy = &der[der.len() - 2 * coord_len..];
    let point = curve.point(
        BigUint::from_bytes_be(&xy[..coord_len]),
        BigUint::from_bytes_be(&xy[coord_len..]),
    );
    if !curve.is_on_curve(&point) {
        bail!("Public key is not a point on {}", curve.name());
    }
    Ok(point)
}

pub fn load_pubkey(curve: &Curve, path: &Path) -> Result<AffinePoint> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read public key {}", path.display()))?;
    parse_pubkey(curve, &text)
}

/// PEM SubjectPublicKeyInfo for the built-in curves.
pub fn encode_pubkey(curve: &Curve, pubkey: &AffinePoint) -> Result<String> {
    let Some(prefix) = spki_prefix(curve.name()) else {
        bail!("No public key encoding for curve {}", curve.name());
    };
    let Some(point) = pubkey.to_uncompressed(curve.coordinate_len()) else {
        bail!("Cannot encode the point at infinity");
    };
    let mut der = hex::decode(prefix)?;
    der.extend(point);

    let encoded = base64::encode(&der);
    let mut pem = String::new();
    pem.push_str(PEM_BEGIN);
    pem.push('\n');
    for chunk in encoded.as_bytes().chunks(64) {
        pem.push_str(std::str::from_utf8(chunk)?);
        pem.push('\n');
    }
    pem.push_str(PEM_END);
    pem.push('\n');
    Ok(pem)
}

pub fn write_pubkey(curve: &Curve, pubkey: &AffinePoint, path: &Path) -> Result<()> {
    let pem = encode_pubkey(curve, pubkey)?;
    fs::write(path, pem).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn load_signatures(path: &Path) -> Result<Vec<Signature>> {
    let raw = fs::read(path)
        .with_context(|| format!("Failed to read signatures {}", path.display()))?;
    Ok(parse_signatures(&raw)?)
}

pub fn write_signatures(sigs: &[Signature], path: &Path) -> Result<()> {
    fs::write(path, encode_signatures(sigs))
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// SHA-256 of the message, as a big-endian integer.
pub fn message_digest(message: &[u8]) -> BigUint {
    BigUint::from_bytes_be(&Sha256::digest(message))
}

pub fn load_message_digest(path: &Path) -> Result<BigUint> {
    let message =
        fs::read(path).with_context(|| format!("Failed to read message {}", path.display()))?;
    Ok(message_digest(&message))
}

pub fn write_instances(instances: &HnpInstances, path: &Path) -> Result<()> {
    fs::write(path, instances.to_string())
        .with_context(|| format!("Failed to write {}", path.display()))
}
