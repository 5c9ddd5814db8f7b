//! Safe-error attack pipeline: faulted signatures in, HNP hints out

pub mod hnp;
pub mod safe_error;

pub use hnp::{build_hnp_instances, Hint, HnpInstances, LeakModel, LeakSide};
pub use safe_error::{batch_verify, AnalysisOutcome, BatchVerification, SafeErrorAnalysis};
