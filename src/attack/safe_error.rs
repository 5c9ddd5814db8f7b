//! Safe-error analysis of signatures produced under a faulted ladder.
//!
//! A signature still verifies exactly when the injected fault did not change the
//! nonce point, which happens when the targeted nonce bit has the "harmless"
//! value. Keeping only the valid signatures therefore keeps only nonces with known
//! bits, and each of them becomes one HNP hint.

use super::hnp::{build_hnp_instances, HnpInstances, LeakModel};
use crate::curve::{AffinePoint, Curve};
use crate::ecdsa::verify;
use crate::error::Result;
use crate::signature::Signature;
use num_bigint::BigUint;

/// Signatures that passed verification, in input order.
#[derive(Debug, Clone, Default)]
pub struct BatchVerification {
    pub total: usize,
    /// Zero-based positions of the valid signatures in the input.
    pub valid_indices: Vec<usize>,
    pub valid: Vec<Signature>,
}

impl BatchVerification {
    pub fn valid_count(&self) -> usize {
        self.valid.len()
    }

    /// One `Signature i/n valid` line per valid signature.
    pub fn report(&self) -> Vec<String> {
        self.valid_indices
            .iter()
            .map(|i| format!("Signature {}/{} valid", i + 1, self.total))
            .collect()
    }
}

pub fn batch_verify(
    curve: &Curve,
    pubkey: &AffinePoint,
    msg: &BigUint,
    signatures: &[Signature],
) -> BatchVerification {
    let (valid_indices, valid): (Vec<usize>, Vec<Signature>) = signatures
        .iter()
        .enumerate()
        .filter(|(_, sig)| verify(curve, pubkey, msg, sig).valid)
        .map(|(i, sig)| (i, sig.clone()))
        .unzip();

    BatchVerification {
        total: signatures.len(),
        valid_indices,
        valid,
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub verification: BatchVerification,
    pub instances: HnpInstances,
}

/// One analysis run: fixed curve, public key, message digest and leakage model.
pub struct SafeErrorAnalysis<'a> {
    curve: &'a Curve,
    pubkey: AffinePoint,
    msg: BigUint,
    model: LeakModel,
}

impl<'a> SafeErrorAnalysis<'a> {
    pub fn new(curve: &'a Curve, pubkey: AffinePoint, msg: BigUint, model: LeakModel) -> Self {
        Self {
            curve,
            pubkey,
            msg,
            model,
        }
    }

    pub fn model(&self) -> &LeakModel {
        &self.model
    }

    /// Verifies the batch and turns the surviving signatures into hints.
    pub fn run(&self, signatures: &[Signature]) -> Result<AnalysisOutcome> {
        let verification = batch_verify(self.curve, &self.pubkey, &self.msg, signatures);
        let instances = build_hnp_instances(
            self.curve,
            &self.pubkey,
            &verification.valid,
            &self.msg,
            &self.model,
        )?;
        Ok(AnalysisOutcome {
            verification,
            instances,
        })
    }
}
