//! Value balance of confidential transactions
//!
//! Blinded amounts can only be shown to balance by the confidential proof
//! system, which callers provide as an [`AmountVerifier`]. Verifiers may defer
//! their work by pushing [`DeferredCheck`]s onto a [`CheckQueue`]; queued checks
//! capture everything they need and may run later on any thread, in any order,
//! but a block is only valid once all of them pass.

use std::collections::BTreeMap;

use crate::constants::MAX_MONEY;
use crate::economic::money_range;
use crate::types::*;

/// Work captured during validation to be verified later
pub trait DeferredCheck: Send + Sync {
    fn verify(&self) -> bool;
}

/// Deferred checks collected while validating a batch
pub type CheckQueue = Vec<Box<dyn DeferredCheck>>;

/// Verify every queued check
pub fn run_checks(checks: &[Box<dyn DeferredCheck>]) -> bool {
    checks.iter().all(|check| check.verify())
}

/// Confidential-amount balance verification supplied by the caller
pub trait AmountVerifier {
    /// Whether the values of `spent` (one per input, in input order) balance
    /// the outputs of `tx`. When `checks` is given, expensive proofs may be
    /// queued there instead of verified inline. `cache_store` asks the verifier
    /// to remember successful proofs.
    fn verify_amounts(
        &self,
        spent: &[TransactionOutput],
        tx: &Transaction,
        checks: Option<&mut CheckQueue>,
        cache_store: bool,
    ) -> bool;
}

/// Verifier for transactions without any blinding.
///
/// Accepts exactly when every input and output is explicit and in money
/// range, each asset's output total is in money range and, per asset, inputs
/// equal outputs (fee outputs included). Anything blinded is refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExplicitAmountVerifier;

impl AmountVerifier for ExplicitAmountVerifier {
    fn verify_amounts(
        &self,
        spent: &[TransactionOutput],
        tx: &Transaction,
        checks: Option<&mut CheckQueue>,
        _cache_store: bool,
    ) -> bool {
        let check = BalanceCheck {
            inputs: spent.to_vec(),
            outputs: tx.outputs.clone(),
        };
        match checks {
            Some(queue) => {
                queue.push(Box::new(check));
                true
            }
            None => check.verify(),
        }
    }
}

/// Per-asset balance of fully explicit inputs and outputs
#[derive(Debug, Clone)]
pub struct BalanceCheck {
    pub inputs: Vec<TransactionOutput>,
    pub outputs: Vec<TransactionOutput>,
}

impl DeferredCheck for BalanceCheck {
    fn verify(&self) -> bool {
        // i128 so that no sequence of in-range i64 amounts can overflow
        let mut balance: BTreeMap<AssetId, i128> = BTreeMap::new();
        let mut value_out: BTreeMap<AssetId, i128> = BTreeMap::new();
        for (outputs, sign) in [(&self.inputs, 1i128), (&self.outputs, -1i128)] {
            for output in outputs {
                let (Some(asset), Some(value)) = (output.asset.explicit(), output.value.explicit()) else {
                    return false;
                };
                if !money_range(value) {
                    return false;
                }
                *balance.entry(asset).or_insert(0) += sign * value as i128;
                if sign < 0 {
                    let total = value_out.entry(asset).or_insert(0);
                    *total += value as i128;
                    if *total > MAX_MONEY as i128 {
                        return false;
                    }
                }
            }
        }
        balance.values().all(|net| *net == 0)
    }
}
