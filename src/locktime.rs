//! Absolute lock-time finality

use crate::constants::*;
use crate::types::*;

/// IsFinalTx: 𝒯𝒳 × ℕ × ℕ → {true, false}
///
/// A transaction tx with lock time lt is final at height h and time t iff:
/// 1. lt = 0, or
/// 2. lt < (lt < LOCKTIME_THRESHOLD ? h : t), or
/// 3. ∀i ∈ tx.inputs: i.sequence = SEQUENCE_FINAL
///
/// Rule 3 lets a transaction carry an unsatisfied lock time and still be
/// included. CHECKLOCKTIMEVERIFY relies on this by requiring the spending
/// input's sequence to be non-final.
pub fn is_final_tx(tx: &Transaction, block_height: i32, block_time: i64) -> bool {
    if tx.lock_time == 0 {
        return true;
    }

    let lock_time = tx.lock_time as i64;
    let cutoff = if tx.lock_time < LOCKTIME_THRESHOLD {
        block_height as i64
    } else {
        block_time
    };
    if lock_time < cutoff {
        return true;
    }

    tx.inputs.iter().all(|input| input.sequence == SEQUENCE_FINAL)
}
