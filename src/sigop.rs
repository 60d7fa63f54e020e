//! Signature-operation cost accounting for block resource limits

use crate::coins::{require_coin, CoinView};
use crate::constants::*;
use crate::error::Result;
use crate::script::{is_pay_to_script_hash, SigOpCounter};
use crate::transaction::is_coinbase;
use crate::types::*;

/// GetLegacySigOpCount: 𝒯𝒳 → ℕ
///
/// Σ inaccurate sig-ops over every input's script_sig and every output's script_pubkey
pub fn legacy_sig_op_count<S: SigOpCounter + ?Sized>(tx: &Transaction, counter: &S) -> u32 {
    let inputs: u32 = tx
        .inputs
        .iter()
        .map(|input| counter.sig_op_count(&input.script_sig, false))
        .sum();
    let outputs: u32 = tx
        .outputs
        .iter()
        .map(|output| counter.sig_op_count(&output.script_pubkey, false))
        .sum();
    inputs + outputs
}

/// GetP2SHSigOpCount: 𝒯𝒳 × 𝒰𝒮 → ℕ
///
/// Sig-ops of the redeem scripts spent by non-peg-in inputs whose previous
/// output is P2SH. Coinbases count zero. Every regular input must resolve in
/// `coins`.
pub fn p2sh_sig_op_count<S, V>(tx: &Transaction, coins: &V, counter: &S) -> Result<u32>
where
    S: SigOpCounter + ?Sized,
    V: CoinView + ?Sized,
{
    if is_coinbase(tx) {
        return Ok(0);
    }

    let mut count = 0u32;
    for input in &tx.inputs {
        // Peg-in inputs are witness-only
        let InputSource::Regular(prevout) = &input.source else {
            continue;
        };
        let coin = require_coin(coins, prevout)?;
        let script_pubkey = &coin.output.script_pubkey;
        if is_pay_to_script_hash(script_pubkey) {
            count += counter.p2sh_sig_op_count(script_pubkey, &input.script_sig);
        }
    }
    Ok(count)
}

/// GetTransactionSigOpCost: 𝒯𝒳 × 𝒰𝒮 × ℕ → ℕ
///
/// cost = 4 × legacy + 4 × p2sh (if SCRIPT_VERIFY_P2SH) + Σ witness sig-ops.
///
/// A coinbase is charged its legacy cost only. A peg-in input is charged
/// witness sig-ops against its claim script only when the transaction carries
/// a witness for every input and the peg-in witness has at least four
/// elements; otherwise it contributes nothing here and the malformed witness
/// is rejected by input validation.
pub fn transaction_sig_op_cost<S, V>(tx: &Transaction, coins: &V, counter: &S, flags: u32) -> Result<i64>
where
    S: SigOpCounter + ?Sized,
    V: CoinView + ?Sized,
{
    let mut cost = legacy_sig_op_count(tx, counter) as i64 * WITNESS_SCALE_FACTOR;

    if is_coinbase(tx) {
        return Ok(cost);
    }

    if flags & SCRIPT_VERIFY_P2SH != 0 {
        cost += p2sh_sig_op_count(tx, coins, counter)? as i64 * WITNESS_SCALE_FACTOR;
    }

    let witness_complete = tx.witness.len() == tx.inputs.len();
    for (index, input) in tx.inputs.iter().enumerate() {
        let script_pubkey: &[u8] = match &input.source {
            InputSource::PegIn(_) => {
                let claim_script = tx
                    .witness
                    .get(index)
                    .filter(|_| witness_complete)
                    .and_then(|w| w.pegin_witness.get(PEGIN_CLAIM_SCRIPT_INDEX));
                match claim_script {
                    Some(script) => script,
                    None => continue,
                }
            }
            InputSource::Regular(prevout) => &require_coin(coins, prevout)?.output.script_pubkey,
        };

        let script_witness = tx.input_witness(index).map(|w| &w.script_witness);
        cost += counter.witness_sig_op_count(&input.script_sig, script_pubkey, script_witness, flags) as i64;
    }

    tracing::trace!(cost, inputs = tx.inputs.len(), "computed transaction sig-op cost");
    Ok(cost)
}
