//! CLI for safe-error analysis of faulted ECDSA signatures

use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};
use num_bigint::BigUint;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use safe_error::attack::{LeakModel, LeakSide, SafeErrorAnalysis};
use safe_error::ecdsa::{generate_keypair, sign, Fault, Ladder};
use safe_error::provider::{
    load_message_digest, load_pubkey, load_signatures, write_instances, write_pubkey,
    write_signatures,
};
use safe_error::{AffinePoint, Curve, Signature};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "safe-error")]
#[command(about = "Safe-error fault analysis of ECDSA signatures")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(long, global = true, help = "Print the summary as JSON")]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Turn the valid signatures of a faulted signer into HNP instances
    #[command(group(ArgGroup::new("side").required(true).args(["lsb", "msb"])))]
    Analyze {
        #[arg(long, help = "Curve name: secp256r1 or secp256k1")]
        curve: String,

        #[arg(long, help = "Path to the signer's public key (PEM)")]
        pubkey: PathBuf,

        #[arg(long, help = "Path to the concatenated signature records")]
        sig: PathBuf,

        #[arg(long, help = "Path to the signed message")]
        msg: PathBuf,

        #[arg(long, help = "Nonces leak zero least significant bits")]
        lsb: bool,

        #[arg(long, help = "Nonces leak zero most significant bits")]
        msb: bool,

        #[arg(long, help = "Nonces are padded to the bit length of the order (lsb only)")]
        padding: bool,

        #[arg(long, help = "Number of nonce bits known to be zero")]
        ell: u32,

        #[arg(long, help = "File to store the HNP instances in")]
        out: PathBuf,
    },

    /// Sign a message repeatedly with a faulted ladder
    Sign {
        #[arg(long, help = "Curve name: secp256r1 or secp256k1")]
        curve: String,

        #[arg(long, help = "Path to the message to sign")]
        msg: PathBuf,

        #[arg(long, default_value = "100", help = "Number of signatures")]
        count: usize,

        #[arg(long, help = "Ladder step whose condition update is skipped")]
        fault_step: Option<u64>,

        #[arg(long, default_value = "20", help = "Leak width forwarded to the multiplier")]
        leak_width: u32,

        #[arg(long, help = "Seed for a reproducible run (default: OS randomness)")]
        seed: Option<u64>,

        #[arg(long, help = "Where to write the public key (PEM)")]
        pubkey_out: PathBuf,

        #[arg(long, help = "Where to write the signature records")]
        sig_out: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Analyze {
            curve,
            pubkey,
            sig,
            msg,
            lsb,
            msb: _,
            padding,
            ell,
            out,
        } => {
            let side = if lsb { LeakSide::Lsb } else { LeakSide::Msb };
            if padding && side == LeakSide::Msb {
                // stdout carries only the JSON document in --json mode
                if cli.json {
                    eprintln!("Argument `--padding` will be ignored");
                } else {
                    println!("Argument `--padding` will be ignored");
                }
            }
            let curve = Curve::named(&curve)?;
            let pubkey = load_pubkey(&curve, &pubkey)?;
            let signatures = load_signatures(&sig)?;
            let digest = load_message_digest(&msg)?;
            let model = LeakModel::new(side, padding && side == LeakSide::Lsb, ell);

            let analysis = SafeErrorAnalysis::new(&curve, pubkey.clone(), digest, model);
            let outcome = analysis.run(&signatures)?;
            write_instances(&outcome.instances, &out)?;

            if cli.json {
                let report = AnalysisReport {
                    curve: curve.name().to_string(),
                    pubkey: pubkey_hex(&curve, &pubkey),
                    leak: *analysis.model(),
                    total_signatures: outcome.verification.total,
                    valid_signatures: outcome.verification.valid_count(),
                    output: out.display().to_string(),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for line in outcome.verification.report() {
                    println!("{line}");
                }
                println!(
                    "Number of valid signatures: {}",
                    outcome.verification.valid_count()
                );
                println!(
                    "The results of the analysis are stored in {}",
                    out.display()
                );
            }
            Ok(())
        }
        Command::Sign {
            curve,
            msg,
            count,
            fault_step,
            leak_width,
            seed,
            pubkey_out,
            sig_out,
        } => {
            let curve = Curve::named(&curve)?;
            let digest = load_message_digest(&msg)?;
            let fault = Fault {
                step: fault_step,
                leak_width,
            };
            let (privkey, pubkey, signatures) = match seed {
                Some(seed) => {
                    sign_batch(&curve, &digest, &fault, count, &mut ChaCha20Rng::seed_from_u64(seed))
                }
                None => sign_batch(&curve, &digest, &fault, count, &mut OsRng),
            };

            write_pubkey(&curve, &pubkey, &pubkey_out)?;
            write_signatures(&signatures, &sig_out)?;

            if cli.json {
                let report = SignReport {
                    curve: curve.name().to_string(),
                    pubkey: pubkey_hex(&curve, &pubkey),
                    private_key_hex: format!("{privkey:064x}"),
                    fault_step,
                    signatures: signatures.len(),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Generated {} signatures on {}", signatures.len(), curve.name());
                match fault_step {
                    Some(step) => println!("Fault injected at ladder step {step}"),
                    None => println!("No fault injected"),
                }
                println!("Private key: {privkey:064x}");
                println!("Public key stored in {}", pubkey_out.display());
                println!("Signatures stored in {}", sig_out.display());
            }
            Ok(())
        }
    }
}

fn sign_batch<R: RngCore + CryptoRng>(
    curve: &Curve,
    digest: &BigUint,
    fault: &Fault,
    count: usize,
    rng: &mut R,
) -> (BigUint, AffinePoint, Vec<Signature>) {
    let keys = generate_keypair(curve, rng);
    let signatures = (0..count)
        .map(|_| sign(curve, &keys.privkey, digest, &Ladder, fault, rng))
        .collect();
    (keys.privkey, keys.pubkey, signatures)
}

fn pubkey_hex(curve: &Curve, pubkey: &AffinePoint) -> Option<String> {
    pubkey
        .to_uncompressed(curve.coordinate_len())
        .map(hex::encode)
}

#[derive(Serialize)]
struct AnalysisReport {
    curve: String,
    pubkey: Option<String>,
    leak: LeakModel,
    total_signatures: usize,
    valid_signatures: usize,
    output: String,
}

#[derive(Serialize)]
struct SignReport {
    curve: String,
    pubkey: Option<String>,
    private_key_hex: String,
    fault_step: Option<u64>,
    signatures: usize,
}
