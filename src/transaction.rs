//! Transaction input validation
//!
//! [`InputValidator::check_tx_inputs`] resolves every input of a transaction,
//! enforces coinbase maturity and peg-in uniqueness, and hands the resolved
//! values to the chain's [`ValueModel`] for conservation and fee accounting.

use std::collections::HashSet;

use crate::coins::{require_coin, CoinView};
use crate::confidential::CheckQueue;
use crate::constants::*;
use crate::economic::{money_range, AmountMap};
use crate::error::{RejectReason, Result};
use crate::pegin::{pegin_id, PeginValidator};
use crate::types::*;
use crate::value_model::{CheckOptions, SpentInputs, ValueModel};

/// State shared by every transaction validated in one batch (typically one block).
///
/// Calls sharing a batch must be serialized: the batch is mutated in place.
/// On any rejection the caller discards the batch.
#[derive(Debug, Clone, Default)]
pub struct ValidationBatch {
    /// Fees collected so far, per asset
    pub fees: AmountMap,
    /// Peg-ins claimed so far in this batch
    pub pegins_spent: HashSet<PeginId>,
    /// Coins spent so far in this batch; the coin view is not updated until the batch is applied
    pub coins_spent: HashSet<OutPoint>,
}

impl ValidationBatch {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Validates transaction inputs for one chain configuration
pub struct InputValidator {
    value_model: Box<dyn ValueModel>,
    pegin_validator: Box<dyn PeginValidator + Send + Sync>,
    coinbase_maturity: i32,
}

impl InputValidator {
    pub fn new(
        value_model: Box<dyn ValueModel>,
        pegin_validator: Box<dyn PeginValidator + Send + Sync>,
    ) -> Self {
        Self {
            value_model,
            pegin_validator,
            coinbase_maturity: COINBASE_MATURITY,
        }
    }

    pub fn with_coinbase_maturity(mut self, depth: i32) -> Self {
        self.coinbase_maturity = depth;
        self
    }

    pub fn coinbase_maturity(&self) -> i32 {
        self.coinbase_maturity
    }

    /// CheckTxInputs: 𝒯𝒳 × 𝒰𝒮 × ℕ → {valid, invalid}
    ///
    /// For transaction tx spent at height h:
    /// 1. Every regular input must resolve to an unspent coin
    /// 2. For each input in order:
    ///    - peg-in: witness valid, not spent in the view, not spent in `batch`;
    ///      record it in `batch`; its explicit amount must be in money range
    ///    - regular: not spent earlier in `batch`; record it in `batch`;
    ///      coinbase coins need h − coin.height ≥ maturity
    ///    - the running explicit input total must stay in money range
    /// 3. The value model checks conservation and adds fees to `batch`
    ///
    /// The first failure is returned and nothing after it runs. A coinbase
    /// spends nothing and is accepted without contributing fees.
    #[allow(clippy::too_many_arguments)]
    pub fn check_tx_inputs<V: CoinView + ?Sized>(
        &self,
        tx: &Transaction,
        coins: &V,
        spend_height: i32,
        batch: &mut ValidationBatch,
        checks: Option<&mut CheckQueue>,
        options: CheckOptions,
        fedpeg_scripts: &[FedpegScript],
    ) -> Result<ValidationResult> {
        if is_coinbase(tx) {
            return Ok(ValidationResult::Valid);
        }

        if !coins.have_inputs(tx) {
            return Ok(ValidationResult::invalid(
                RejectReason::MissingOrSpentInputs,
                "inputs missing/spent",
            ));
        }

        let mut spent = SpentInputs {
            outputs: Vec::with_capacity(tx.inputs.len()),
            explicit_total: 0,
        };

        for (index, input) in tx.inputs.iter().enumerate() {
            let rejection = match &input.source {
                InputSource::PegIn(prevout) => {
                    self.spend_pegin(tx, index, prevout, coins, batch, &mut spent, fedpeg_scripts)?
                }
                InputSource::Regular(prevout) => {
                    self.spend_coin(prevout, coins, spend_height, batch, &mut spent)?
                }
            };
            if let Some(rejection) = rejection {
                tracing::debug!(input = index, "input rejected");
                return Ok(rejection);
            }
        }

        self.value_model
            .check_conservation(&spent, tx, &mut batch.fees, checks, options)
    }

    #[allow(clippy::too_many_arguments)]
    fn spend_pegin<V: CoinView + ?Sized>(
        &self,
        tx: &Transaction,
        index: usize,
        prevout: &OutPoint,
        coins: &V,
        batch: &mut ValidationBatch,
        spent: &mut SpentInputs,
        fedpeg_scripts: &[FedpegScript],
    ) -> Result<Option<ValidationResult>> {
        let Some(witness) = tx.input_witness(index).map(|w| &w.pegin_witness) else {
            return Ok(Some(ValidationResult::invalid(
                RejectReason::BadPeginWitness,
                "missing peg-in witness",
            )));
        };
        if let Err(reason) =
            self.pegin_validator
                .is_valid_pegin_witness(witness, fedpeg_scripts, prevout, true)
        {
            return Ok(Some(ValidationResult::invalid(RejectReason::BadPeginWitness, reason)));
        }

        let pegin = pegin_id(witness, prevout)?;
        if coins.is_pegin_spent(&pegin) {
            return Ok(Some(ValidationResult::invalid(
                RejectReason::DoublePegin,
                format!("Double-pegin of {}", prevout),
            )));
        }
        if !batch.pegins_spent.insert(pegin) {
            return Ok(Some(ValidationResult::invalid(
                RejectReason::DoublePeginInBatch,
                format!("Double-pegin of {} in single tx/block", prevout),
            )));
        }

        let output = self.pegin_validator.output_from_pegin_witness(witness)?;
        // Blinded peg-in amounts are left to the balance proof
        if let Some(value) = output.value.explicit() {
            if !money_range(value) {
                return Ok(Some(ValidationResult::invalid(
                    RejectReason::InputValueOutOfRange,
                    format!("peg-in value {} out of range", value),
                )));
            }
        }
        Ok(tally_input(spent, output))
    }

    fn spend_coin<V: CoinView + ?Sized>(
        &self,
        prevout: &OutPoint,
        coins: &V,
        spend_height: i32,
        batch: &mut ValidationBatch,
        spent: &mut SpentInputs,
    ) -> Result<Option<ValidationResult>> {
        let coin = require_coin(coins, prevout)?;

        if !batch.coins_spent.insert(*prevout) {
            return Ok(Some(ValidationResult::invalid(
                RejectReason::MissingOrSpentInputs,
                format!("{} already spent in single tx/block", prevout),
            )));
        }

        if coin.is_coinbase {
            let depth = spend_height - coin.height;
            if depth < self.coinbase_maturity {
                return Ok(Some(ValidationResult::invalid(
                    RejectReason::PrematureCoinbaseSpend,
                    format!("tried to spend coinbase at depth {}", depth),
                )));
            }
        }

        Ok(tally_input(spent, coin.output.clone()))
    }
}

/// Record a spent output, rejecting if the explicit input total leaves money range
fn tally_input(spent: &mut SpentInputs, output: TransactionOutput) -> Option<ValidationResult> {
    if let Some(value) = output.value.explicit() {
        match spent.explicit_total.checked_add(value).filter(|total| money_range(*total)) {
            Some(total) => spent.explicit_total = total,
            None => {
                return Some(ValidationResult::invalid(
                    RejectReason::InputValueOutOfRange,
                    format!("input total {} + {} out of range", spent.explicit_total, value),
                ))
            }
        }
    }
    spent.outputs.push(output);
    None
}

/// Check if transaction is coinbase
pub fn is_coinbase(tx: &Transaction) -> bool {
    matches!(
        tx.inputs.as_slice(),
        [TransactionInput { source: InputSource::Regular(prevout), .. }] if prevout.is_null()
    )
}
