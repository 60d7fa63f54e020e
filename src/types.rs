//! Core transaction and chain-state types for consensus validation

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RejectReason, TxRejection};

/// Hash type: 256-bit hash
pub type Hash = [u8; 32];

/// Byte string type
pub type ByteString = Vec<u8>;

/// Signed amount in base units
pub type Amount = i64;

/// Witness data: stack of witness elements
pub type Witness = Vec<ByteString>;

/// Reference to an output of a previous transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutPoint {
    pub hash: Hash,
    pub index: u32,
}

impl OutPoint {
    /// The null outpoint spent by coinbase inputs
    pub const NULL: OutPoint = OutPoint { hash: [0u8; 32], index: u32::MAX };

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", display_hash(&self.hash), self.index)
    }
}

/// Render a 32-byte identifier in the conventional byte-reversed hex form
pub fn display_hash(hash: &Hash) -> String {
    use bitcoin_hashes::{sha256d, Hash as _};
    sha256d::Hash::from_inner(*hash).to_string()
}

/// Asset identifier. The all-zero asset is the chain's default (policy) asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub Hash);

impl AssetId {
    pub const DEFAULT: AssetId = AssetId([0u8; 32]);
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&display_hash(&self.0))
    }
}

/// Asset tag of an output: either public or a blinded generator commitment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidentialAsset {
    Explicit(AssetId),
    Blinded(ByteString),
}

impl ConfidentialAsset {
    pub fn explicit(&self) -> Option<AssetId> {
        match self {
            ConfidentialAsset::Explicit(asset) => Some(*asset),
            ConfidentialAsset::Blinded(_) => None,
        }
    }
}

/// Amount of an output: either public or a blinded value commitment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidentialValue {
    Explicit(Amount),
    Blinded(ByteString),
}

impl ConfidentialValue {
    pub fn explicit(&self) -> Option<Amount> {
        match self {
            ConfidentialValue::Explicit(amount) => Some(*amount),
            ConfidentialValue::Blinded(_) => None,
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, ConfidentialValue::Explicit(_))
    }
}

/// Where an input's funds come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputSource {
    /// Spends an unspent output tracked by the coin view
    Regular(OutPoint),
    /// Claims a deposit made on the parent chain; the outpoint refers to the parent chain
    PegIn(OutPoint),
}

/// Transaction input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub source: InputSource,
    pub script_sig: ByteString,
    pub sequence: u32,
}

impl TransactionInput {
    pub fn prevout(&self) -> &OutPoint {
        match &self.source {
            InputSource::Regular(prevout) | InputSource::PegIn(prevout) => prevout,
        }
    }

    pub fn is_pegin(&self) -> bool {
        matches!(self.source, InputSource::PegIn(_))
    }
}

/// Transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub asset: ConfidentialAsset,
    pub value: ConfidentialValue,
    pub script_pubkey: ByteString,
}

impl TransactionOutput {
    /// Explicit output of the default asset
    pub fn explicit(value: Amount, script_pubkey: ByteString) -> Self {
        Self {
            asset: ConfidentialAsset::Explicit(AssetId::DEFAULT),
            value: ConfidentialValue::Explicit(value),
            script_pubkey,
        }
    }

    /// Fee outputs are fully explicit and carry an empty locking script
    pub fn is_fee(&self) -> bool {
        self.script_pubkey.is_empty()
            && self.value.is_explicit()
            && self.asset.explicit().is_some()
    }
}

/// Witness data attached to one input
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputWitness {
    pub script_witness: Witness,
    pub pegin_witness: Witness,
}

/// Transaction: version, inputs, outputs, lock time and the out-of-line witness
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u32,
    /// One entry per input when present; may be empty for transactions without witness data
    pub witness: Vec<InputWitness>,
}

impl Transaction {
    pub fn input_witness(&self, index: usize) -> Option<&InputWitness> {
        self.witness.get(index)
    }
}

/// Block header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: i32,
    pub prev_block_hash: Hash,
    pub merkle_root: Hash,
    pub timestamp: u32,
    pub bits: u32,
    pub nonce: u32,
}

/// The chain's record of an unspent output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub output: TransactionOutput,
    pub height: i32,
    pub is_coinbase: bool,
}

/// Unique identity of a peg-in: parent chain genesis hash plus the parent-chain outpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeginId {
    pub parent_genesis: Hash,
    pub prevout: OutPoint,
}

impl fmt::Display for PeginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prevout)
    }
}

/// A federation peg script pair accepted for peg-in claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FedpegScript {
    /// Parent-chain locking script deposits are sent to
    pub script_pubkey: ByteString,
    /// Federation script the claim tweak is applied to
    pub fedpeg_script: ByteString,
}

/// Validation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(TxRejection),
}

impl ValidationResult {
    /// Build a rejection, logging it at debug level
    pub fn invalid(reason: RejectReason, detail: impl Into<String>) -> Self {
        Self::rejected(TxRejection::new(reason, detail))
    }

    /// Wrap an existing rejection, logging it at debug level
    pub fn rejected(rejection: TxRejection) -> Self {
        tracing::debug!(
            code = rejection.reason.code(),
            detail = %rejection.detail,
            "transaction rejected"
        );
        ValidationResult::Invalid(rejection)
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn rejection(&self) -> Option<&TxRejection> {
        match self {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(rejection) => Some(rejection),
        }
    }
}
