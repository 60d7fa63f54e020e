//! Transaction-level checks for all transactions of one block
//!
//! Runs every transaction of a block through finality, input validation,
//! relative lock times and sig-op accounting against one shared
//! [`ValidationBatch`]. The first failing transaction invalidates the block.

use crate::chain::{BlockIndex, BlockRef};
use crate::coins::{require_coin, CoinView};
use crate::confidential::CheckQueue;
use crate::config::ValidationConfig;
use crate::error::{RejectReason, Result};
use crate::locktime::is_final_tx;
use crate::script::SigOpCounter;
use crate::sequence_locks::sequence_locks;
use crate::sigop::transaction_sig_op_cost;
use crate::transaction::{is_coinbase, InputValidator, ValidationBatch};
use crate::types::*;
use crate::value_model::CheckOptions;

/// Outcome of validating a block's transactions
#[derive(Debug)]
pub struct BlockInputsResult {
    pub result: ValidationResult,
    /// Index of the transaction that failed, if any
    pub failed_tx: Option<usize>,
    /// Fees, spent coins and peg-ins accumulated up to the failure or end of the block
    pub batch: ValidationBatch,
    /// Total sig-op cost counted
    pub sig_op_cost: i64,
}

impl BlockInputsResult {
    fn fail(result: ValidationResult, index: usize, batch: ValidationBatch, sig_op_cost: i64) -> Self {
        tracing::debug!(tx = index, "block rejected");
        Self { result, failed_tx: Some(index), batch, sig_op_cost }
    }
}

/// ConnectBlock (transaction checks): 𝒯𝒳* × 𝒰𝒮 × ℬ → {valid, invalid}
///
/// For each transaction tx of `block`, in order:
/// 1. tx must be final at block.height and MTP(block.prev)
/// 2. Non-coinbase: inputs valid at block.height, sharing one batch
/// 3. Non-coinbase: relative lock times satisfied by `block`
/// 4. Σ sig-op cost ≤ config.max_block_sig_op_cost
///
/// `coins` is a snapshot taken before the block; it is not updated as
/// transactions are applied. When `checks` is given, balance proofs are
/// queued there and must pass before the block is accepted.
#[allow(clippy::too_many_arguments)]
pub fn check_block_inputs<V, B, S>(
    transactions: &[Transaction],
    coins: &V,
    chain: &B,
    block: &BlockRef,
    validator: &InputValidator,
    counter: &S,
    config: &ValidationConfig,
    mut checks: Option<&mut CheckQueue>,
) -> Result<BlockInputsResult>
where
    V: CoinView + ?Sized,
    B: BlockIndex + ?Sized,
    S: SigOpCounter + ?Sized,
{
    let mut batch = ValidationBatch::new();
    let mut sig_op_cost = 0i64;

    let lock_time_cutoff = chain
        .previous(block)
        .map(|prev| chain.median_time_past(&prev))
        .unwrap_or(0);
    let options = CheckOptions { script_checks: true, cache_store: checks.is_some() };

    for (index, tx) in transactions.iter().enumerate() {
        if !is_final_tx(tx, block.height, lock_time_cutoff) {
            let result = ValidationResult::invalid(
                RejectReason::NonFinalTransaction,
                format!("lock time {} not reached", tx.lock_time),
            );
            return Ok(BlockInputsResult::fail(result, index, batch, sig_op_cost));
        }

        if !is_coinbase(tx) {
            let result = validator.check_tx_inputs(
                tx,
                coins,
                block.height,
                &mut batch,
                checks.as_mut().map(|queue| &mut **queue),
                options,
                &config.fedpeg_scripts,
            )?;
            if !result.is_valid() {
                return Ok(BlockInputsResult::fail(result, index, batch, sig_op_cost));
            }

            let mut prev_heights = tx
                .inputs
                .iter()
                .map(|input| match &input.source {
                    InputSource::Regular(prevout) => Ok(require_coin(coins, prevout)?.height),
                    InputSource::PegIn(_) => Ok(0),
                })
                .collect::<Result<Vec<i32>>>()?;
            if !sequence_locks(tx, config.lock_time_flags(), &mut prev_heights, chain, block)? {
                let result = ValidationResult::invalid(
                    RejectReason::SequenceLocksNotSatisfied,
                    "contains a non-BIP68-final transaction",
                );
                return Ok(BlockInputsResult::fail(result, index, batch, sig_op_cost));
            }
        }

        sig_op_cost += transaction_sig_op_cost(tx, coins, counter, config.script_flags())?;
        if sig_op_cost > config.max_block_sig_op_cost {
            let result = ValidationResult::invalid(
                RejectReason::BlockSigOpCost,
                format!("sig-op cost {} exceeds {}", sig_op_cost, config.max_block_sig_op_cost),
            );
            return Ok(BlockInputsResult::fail(result, index, batch, sig_op_cost));
        }
    }

    tracing::trace!(
        height = block.height,
        transactions = transactions.len(),
        sig_op_cost,
        "block transactions valid"
    );
    Ok(BlockInputsResult {
        result: ValidationResult::Valid,
        failed_tx: None,
        batch,
        sig_op_cost,
    })
}
