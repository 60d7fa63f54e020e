//! Error types for consensus validation
//!
//! `ConsensusError` covers conditions that cannot happen once the caller's
//! preconditions hold. Expected rejections are reported through
//! [`ValidationResult::Invalid`](crate::types::ValidationResult) carrying a
//! [`TxRejection`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsensusError {
    #[error("Transaction validation failed: {0}")]
    TransactionValidation(String),

    #[error("UTXO not found: {0}")]
    UtxoNotFound(String),

    #[error("Block index has no ancestor at height {0}")]
    MissingAncestor(i32),

    #[error("Malformed peg-in witness: {0}")]
    PeginWitness(String),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConsensusError>;

/// Machine-stable rejection reasons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    MissingOrSpentInputs,
    PrematureCoinbaseSpend,
    BadPeginWitness,
    DoublePegin,
    DoublePeginInBatch,
    InputValueOutOfRange,
    NegativeOutput,
    OutputTooLarge,
    OutputTotalTooLarge,
    ValueInBelowValueOut,
    FeeOutOfRange,
    TotalFeeOutOfRange,
    ValueConservationFailed,
    NonFinalTransaction,
    SequenceLocksNotSatisfied,
    BlockSigOpCost,
}

impl RejectReason {
    /// Short code used for protocol-level decisions
    pub fn code(&self) -> &'static str {
        match self {
            RejectReason::MissingOrSpentInputs => "bad-txns-inputs-missingorspent",
            RejectReason::PrematureCoinbaseSpend => "bad-txns-premature-spend-of-coinbase",
            RejectReason::BadPeginWitness => "bad-pegin-witness",
            RejectReason::DoublePegin => "bad-txns-double-pegin",
            RejectReason::DoublePeginInBatch => "bad-txns-double-pegin-in-obj",
            RejectReason::InputValueOutOfRange => "bad-txns-inputvalues-outofrange",
            RejectReason::NegativeOutput => "bad-txns-vout-negative",
            RejectReason::OutputTooLarge => "bad-txns-vout-toolarge",
            RejectReason::OutputTotalTooLarge => "bad-txns-txouttotal-toolarge",
            RejectReason::ValueInBelowValueOut => "bad-txns-in-belowout",
            RejectReason::FeeOutOfRange => "bad-txns-fee-outofrange",
            RejectReason::TotalFeeOutOfRange => "bad-block-total-fee-outofrange",
            RejectReason::ValueConservationFailed => "bad-txns-in-ne-out",
            RejectReason::NonFinalTransaction => "bad-txns-nonfinal",
            RejectReason::SequenceLocksNotSatisfied => "bad-txns-nonfinal-sequence",
            RejectReason::BlockSigOpCost => "bad-blk-sigops",
        }
    }
}

/// A rejection: stable reason plus a human-readable detail for logs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} ({})", .reason.code(), .detail)]
pub struct TxRejection {
    pub reason: RejectReason,
    pub detail: String,
}

impl TxRejection {
    pub fn new(reason: RejectReason, detail: impl Into<String>) -> Self {
        Self { reason, detail: detail.into() }
    }
}
