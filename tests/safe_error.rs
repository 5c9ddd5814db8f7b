//! End-to-end run of the library: faulted signer, verification filter, HNP output

use num_bigint::BigUint;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use safe_error::attack::{batch_verify, build_hnp_instances};
use safe_error::ecdsa::{generate_keypair, sign, verify};
use safe_error::provider::{encode_pubkey, message_digest, parse_pubkey};
use safe_error::signature::{encode_signatures, parse_signatures};
use safe_error::{Curve, Fault, Ladder, LeakModel, LeakSide, SafeErrorAnalysis, Signature};

#[test]
fn test_faulted_batch_splits_into_valid_and_invalid() {
    let mut rng = ChaCha20Rng::seed_from_u64(2024);
    let curve = Curve::named("secp256k1").unwrap();
    let keys = generate_keypair(&curve, &mut rng);
    let msg = message_digest(b"safe-error");
    let fault = Fault::at_step(100, 20);

    let sigs: Vec<Signature> = (0..200)
        .map(|_| sign(&curve, &keys.privkey, &msg, &Ladder, &fault, &mut rng))
        .collect();

    let batch = batch_verify(&curve, &keys.pubkey, &msg, &sigs);
    assert_eq!(batch.total, 200);
    assert!(batch.valid_count() > 0, "some nonces leave the ladder unaffected");
    assert!(batch.valid_count() < 200, "some nonces are corrupted by the fault");

    for (i, sig) in sigs.iter().enumerate() {
        let expected = batch.valid_indices.contains(&i);
        assert_eq!(verify(&curve, &keys.pubkey, &msg, sig).valid, expected);
    }

    let model = LeakModel::new(LeakSide::Lsb, false, 20);
    let instances = build_hnp_instances(&curve, &keys.pubkey, &batch.valid, &msg, &model).unwrap();
    let text = instances.to_string();
    assert_eq!(text.lines().count(), batch.valid_count() + 1);
    assert!(text.lines().next().unwrap().starts_with("secp256k1,0x"));
}

#[test]
fn test_unfaulted_signer_is_always_valid() {
    let mut rng = ChaCha20Rng::seed_from_u64(99);
    let curve = Curve::named("secp256r1").unwrap();
    let keys = generate_keypair(&curve, &mut rng);
    let msg = message_digest(b"clean");

    let sigs: Vec<Signature> = (0..10)
        .map(|_| sign(&curve, &keys.privkey, &msg, &Ladder, &Fault::none(), &mut rng))
        .collect();

    let analysis = SafeErrorAnalysis::new(
        &curve,
        keys.pubkey.clone(),
        msg,
        LeakModel::new(LeakSide::Msb, false, 16),
    );
    let outcome = analysis.run(&sigs).unwrap();
    assert_eq!(outcome.verification.valid_count(), 10);
    assert_eq!(outcome.instances.len(), 10);
}

#[test]
fn test_files_survive_encoding() {
    let mut rng = ChaCha20Rng::seed_from_u64(5);
    let curve = Curve::named("secp256k1").unwrap();
    let keys = generate_keypair(&curve, &mut rng);
    let msg = message_digest(b"files");
    let sigs: Vec<Signature> = (0..8)
        .map(|_| sign(&curve, &keys.privkey, &msg, &Ladder, &Fault::at_step(3, 4), &mut rng))
        .collect();

    let pem = encode_pubkey(&curve, &keys.pubkey).unwrap();
    let pubkey = parse_pubkey(&curve, &pem).unwrap();
    let parsed = parse_signatures(&encode_signatures(&sigs)).unwrap();
    assert_eq!(parsed, sigs);

    let direct = batch_verify(&curve, &keys.pubkey, &msg, &sigs);
    let via_files = batch_verify(&curve, &pubkey, &msg, &parsed);
    assert_eq!(direct.valid_indices, via_files.valid_indices);
}

#[test]
fn test_leak_width_too_large_is_rejected() {
    let curve = Curve::named("secp256k1").unwrap();
    let model = LeakModel::new(LeakSide::Msb, false, 256);
    let sig = Signature::new(BigUint::from(1u32), BigUint::from(1u32));
    let result = build_hnp_instances(&curve, curve.base(), &[sig], &BigUint::from(1u32), &model);
    assert!(result.is_err());
}
