//! BIP68 relative lock times
//!
//! Computing the lock pair and evaluating it are separate steps so a pair can
//! be checked against several candidate blocks, or inspected to learn when a
//! transaction becomes valid.

use serde::{Deserialize, Serialize};

use crate::chain::{require_ancestor, BlockIndex, BlockRef};
use crate::constants::*;
use crate::error::{ConsensusError, Result};
use crate::types::*;

/// Last invalid height and time implied by a transaction's relative locks.
///
/// These follow nLockTime semantics: a value of -1 means any height or time
/// is acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceLocks {
    pub min_height: i32,
    pub min_time: i64,
}

impl SequenceLocks {
    pub const NONE: SequenceLocks = SequenceLocks { min_height: -1, min_time: -1 };
}

impl Default for SequenceLocks {
    fn default() -> Self {
        Self::NONE
    }
}

/// CalculateSequenceLocks: 𝒯𝒳 × ℕ × ℕ* × ℬ → ℤ × ℤ
///
/// For transaction tx with version v, flags f, previous-output heights ph and block b:
/// 1. If (v as u32) < 2 or LOCKTIME_VERIFY_SEQUENCE ∉ f: return (-1, -1)
/// 2. For each non-peg-in input i with sequence s:
///    - If s has the disable flag: ph[i] = 0, skip
///    - If s has the type flag: t = MTP(ancestor(b, max(ph[i] - 1, 0))) + ((s & mask) << 9) - 1
///    - Otherwise: h = ph[i] + (s & mask) - 1
/// 3. Return (max h, max t)
///
/// `prev_heights` must have one entry per input. Entries for inputs whose
/// sequence disables the relative lock are zeroed in place.
pub fn calculate_sequence_locks<B: BlockIndex + ?Sized>(
    tx: &Transaction,
    flags: u32,
    prev_heights: &mut [i32],
    chain: &B,
    block: &BlockRef,
) -> Result<SequenceLocks> {
    if prev_heights.len() != tx.inputs.len() {
        return Err(ConsensusError::TransactionValidation(format!(
            "prev_heights has {} entries for {} inputs",
            prev_heights.len(),
            tx.inputs.len()
        )));
    }

    let mut locks = SequenceLocks::NONE;

    // version is signed; compare unsigned so the upper half of the range also enforces BIP68
    let enforce_bip68 = (tx.version as u32) >= 2 && flags & LOCKTIME_VERIFY_SEQUENCE != 0;
    if !enforce_bip68 {
        return Ok(locks);
    }

    for (index, input) in tx.inputs.iter().enumerate() {
        // Peg-ins have no output height on this chain
        if input.is_pegin() {
            continue;
        }

        if input.sequence & SEQUENCE_LOCKTIME_DISABLE_FLAG != 0 {
            prev_heights[index] = 0;
            continue;
        }

        let coin_height = prev_heights[index];
        let masked = (input.sequence & SEQUENCE_LOCKTIME_MASK) as i64;

        if input.sequence & SEQUENCE_LOCKTIME_TYPE_FLAG != 0 {
            // Measured from the median time past of the block before the one holding the coin
            let ancestor = require_ancestor(chain, block, (coin_height - 1).max(0))?;
            let coin_time = chain.median_time_past(&ancestor);
            let min_time = coin_time + (masked << SEQUENCE_LOCKTIME_GRANULARITY) - 1;
            locks.min_time = locks.min_time.max(min_time);
        } else {
            let min_height = coin_height + masked as i32 - 1;
            locks.min_height = locks.min_height.max(min_height);
        }
    }

    tracing::trace!(
        min_height = locks.min_height,
        min_time = locks.min_time,
        "calculated sequence locks"
    );
    Ok(locks)
}

/// EvaluateSequenceLocks: ℬ × (ℤ × ℤ) → {true, false}
///
/// The locks hold iff min_height < b.height ∧ min_time < MTP(b.prev).
/// `block` must have a predecessor.
pub fn evaluate_sequence_locks<B: BlockIndex + ?Sized>(
    chain: &B,
    block: &BlockRef,
    locks: SequenceLocks,
) -> Result<bool> {
    let prev = chain
        .previous(block)
        .ok_or(ConsensusError::MissingAncestor(block.height - 1))?;
    let block_time = chain.median_time_past(&prev);

    Ok(locks.min_height < block.height && locks.min_time < block_time)
}

/// SequenceLocks: calculate then evaluate against the same block
pub fn sequence_locks<B: BlockIndex + ?Sized>(
    tx: &Transaction,
    flags: u32,
    prev_heights: &mut [i32],
    chain: &B,
    block: &BlockRef,
) -> Result<bool> {
    let locks = calculate_sequence_locks(tx, flags, prev_heights, chain, block)?;
    evaluate_sequence_locks(chain, block, locks)
}
