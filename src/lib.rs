//! # Sidechain-Consensus
//!
//! Transaction-level consensus rules for a two-way-pegged sidechain.
//!
//! This crate implements the checks a node runs on every transaction before it
//! is connected to the chain: absolute and relative lock times, signature
//! operation cost, and input validation including peg-in claims, coinbase
//! maturity and value conservation under either a single explicit asset or
//! confidential multi-asset outputs.
//!
//! ## Architecture
//!
//! Functions are deterministic and side-effect-free over their inputs. Chain
//! state is reached through capability traits the caller implements:
//! - [`CoinView`](coins::CoinView): unspent outputs and spent peg-ins
//! - [`BlockIndex`](chain::BlockIndex): ancestors and median-time-past
//! - [`PeginValidator`](pegin::PeginValidator): parent-chain proof checks
//! - [`AmountVerifier`](confidential::AmountVerifier): confidential balance proofs
//! - [`SigOpCounter`](script::SigOpCounter): script sig-op counting
//!
//! In-memory implementations ([`UtxoSet`](coins::UtxoSet),
//! [`HeaderChain`](chain::HeaderChain), [`ScriptSigOps`](script::ScriptSigOps),
//! [`ExplicitAmountVerifier`](confidential::ExplicitAmountVerifier)) are provided.
//!
//! ## Usage
//!
//! ```rust
//! use sidechain_consensus::*;
//! use sidechain_consensus::coins::UtxoSet;
//! use sidechain_consensus::confidential::ExplicitAmountVerifier;
//! use sidechain_consensus::pegin::PeginValidator;
//!
//! struct NoPegins;
//!
//! impl PeginValidator for NoPegins {
//!     fn is_valid_pegin_witness(
//!         &self,
//!         _witness: &Witness,
//!         _fedpeg_scripts: &[FedpegScript],
//!         _prevout: &OutPoint,
//!         _check_depth: bool,
//!     ) -> std::result::Result<(), String> {
//!         Err("peg-ins disabled".into())
//!     }
//! }
//!
//! let consensus = TxConsensus::new(ValidationConfig::default(), ExplicitAmountVerifier, NoPegins);
//!
//! let prevout = OutPoint { hash: [1; 32], index: 0 };
//! let mut coins = UtxoSet::new();
//! coins.insert(prevout, Coin {
//!     output: TransactionOutput::explicit(1000, vec![0x51]),
//!     height: 1,
//!     is_coinbase: false,
//! });
//!
//! let tx = Transaction {
//!     version: 2,
//!     inputs: vec![TransactionInput {
//!         source: InputSource::Regular(prevout),
//!         script_sig: vec![],
//!         sequence: SEQUENCE_FINAL,
//!     }],
//!     outputs: vec![
//!         TransactionOutput::explicit(900, vec![0x51]),
//!         TransactionOutput::explicit(100, vec![]), // fee
//!     ],
//!     lock_time: 0,
//!     witness: vec![],
//! };
//!
//! let mut batch = ValidationBatch::new();
//! let result = consensus.check_tx_inputs(&tx, &coins, 10, &mut batch, None).unwrap();
//! assert_eq!(result, ValidationResult::Valid);
//! assert_eq!(batch.fees.get(&AssetId::DEFAULT), 100);
//! ```

pub mod types;
pub mod constants;
pub mod error;
pub mod economic;
pub mod locktime;
pub mod chain;
pub mod sequence_locks;
pub mod script;
pub mod sigop;
pub mod coins;
pub mod pegin;
pub mod confidential;
pub mod value_model;
pub mod transaction;
pub mod block;
pub mod config;

// Re-export commonly used types
pub use types::*;
pub use constants::*;
pub use error::{ConsensusError, RejectReason, Result, TxRejection};
pub use chain::{BlockIndex, BlockRef};
pub use config::ValidationConfig;
pub use sequence_locks::SequenceLocks;
pub use transaction::{InputValidator, ValidationBatch};

use block::BlockInputsResult;
use coins::CoinView;
use confidential::{AmountVerifier, CheckQueue};
use pegin::PeginValidator;
use script::ScriptSigOps;
use value_model::CheckOptions;

/// Consensus checks for one chain configuration
///
/// Bundles a [`ValidationConfig`] with the input validator and sig-op counter
/// built from it. Shareable across threads; per-block state lives in the
/// [`ValidationBatch`] passed to each call.
pub struct TxConsensus {
    config: ValidationConfig,
    validator: InputValidator,
    counter: ScriptSigOps,
}

impl TxConsensus {
    /// Build the checks for `config`, with the caller's confidential-balance
    /// and peg-in proof verifiers
    pub fn new<A, P>(config: ValidationConfig, verifier: A, pegin_validator: P) -> Self
    where
        A: AmountVerifier + Send + Sync + 'static,
        P: PeginValidator + Send + Sync + 'static,
    {
        let validator = config.input_validator(verifier, pegin_validator);
        Self { config, validator, counter: ScriptSigOps }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Whether `tx` may be included in a block at `block_height` whose
    /// lock-time cutoff is `block_time`
    pub fn is_final_tx(&self, tx: &Transaction, block_height: i32, block_time: i64) -> bool {
        locktime::is_final_tx(tx, block_height, block_time)
    }

    /// Relative lock times of `tx` under this chain's lock-time flags
    pub fn calculate_sequence_locks<B: BlockIndex + ?Sized>(
        &self,
        tx: &Transaction,
        prev_heights: &mut [i32],
        chain: &B,
        block: &BlockRef,
    ) -> Result<SequenceLocks> {
        sequence_locks::calculate_sequence_locks(tx, self.config.lock_time_flags(), prev_heights, chain, block)
    }

    /// Whether the relative lock times of `tx` are satisfied by `block`
    pub fn check_sequence_locks<B: BlockIndex + ?Sized>(
        &self,
        tx: &Transaction,
        prev_heights: &mut [i32],
        chain: &B,
        block: &BlockRef,
    ) -> Result<bool> {
        sequence_locks::sequence_locks(tx, self.config.lock_time_flags(), prev_heights, chain, block)
    }

    /// Sig-op cost of `tx`; every regular input must resolve in `coins`
    pub fn sig_op_cost<V: CoinView + ?Sized>(&self, tx: &Transaction, coins: &V) -> Result<i64> {
        sigop::transaction_sig_op_cost(tx, coins, &self.counter, self.config.script_flags())
    }

    /// Validate the inputs of `tx` spent at `spend_height`, accumulating fees
    /// and peg-ins into `batch`
    pub fn check_tx_inputs<V: CoinView + ?Sized>(
        &self,
        tx: &Transaction,
        coins: &V,
        spend_height: i32,
        batch: &mut ValidationBatch,
        checks: Option<&mut CheckQueue>,
    ) -> Result<ValidationResult> {
        let options = CheckOptions { script_checks: true, cache_store: checks.is_some() };
        self.validator.check_tx_inputs(
            tx,
            coins,
            spend_height,
            batch,
            checks,
            options,
            &self.config.fedpeg_scripts,
        )
    }

    /// Run every transaction of `block` through the transaction-level checks
    pub fn check_block_inputs<V, B>(
        &self,
        transactions: &[Transaction],
        coins: &V,
        chain: &B,
        block: &BlockRef,
        checks: Option<&mut CheckQueue>,
    ) -> Result<BlockInputsResult>
    where
        V: CoinView + ?Sized,
        B: BlockIndex + ?Sized,
    {
        block::check_block_inputs(
            transactions,
            coins,
            chain,
            block,
            &self.validator,
            &self.counter,
            &self.config,
            checks,
        )
    }
}
