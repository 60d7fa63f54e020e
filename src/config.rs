//! Validation configuration for a chain

use serde::{Deserialize, Serialize};

use crate::confidential::AmountVerifier;
use crate::constants::*;
use crate::error::Result;
use crate::pegin::PeginValidator;
use crate::transaction::InputValidator;
use crate::types::FedpegScript;
use crate::value_model::{ConfidentialValueModel, LegacyValueModel, ValueModel};

/// Consensus parameters that vary between chains and deployments
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ValidationConfig {
    /// Confidential multi-asset outputs (true) or a single explicit asset (false)
    pub confidential_assets: bool,

    /// Depth a coinbase output must reach before it can be spent
    pub coinbase_maturity: i32,

    /// Enforce BIP68 relative lock times
    pub enforce_sequence_locks: bool,

    /// Count P2SH redeem-script sig-ops
    pub verify_p2sh: bool,

    /// Count witness sig-ops
    pub verify_witness: bool,

    /// Federation scripts peg-ins may pay to
    pub fedpeg_scripts: Vec<FedpegScript>,

    /// Sig-op cost budget for one block
    pub max_block_sig_op_cost: i64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            confidential_assets: true,
            coinbase_maturity: COINBASE_MATURITY,
            enforce_sequence_locks: true,
            verify_p2sh: true,
            verify_witness: true,
            fedpeg_scripts: Vec::new(),
            max_block_sig_op_cost: MAX_BLOCK_SIGOPS_COST,
        }
    }
}

impl ValidationConfig {
    /// Parse a JSON config; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Flags for [`calculate_sequence_locks`](crate::sequence_locks::calculate_sequence_locks)
    pub fn lock_time_flags(&self) -> u32 {
        if self.enforce_sequence_locks {
            LOCKTIME_VERIFY_SEQUENCE
        } else {
            0
        }
    }

    /// Flags for sig-op cost accounting
    pub fn script_flags(&self) -> u32 {
        let mut flags = 0;
        if self.verify_p2sh {
            flags |= SCRIPT_VERIFY_P2SH;
        }
        if self.verify_witness {
            flags |= SCRIPT_VERIFY_WITNESS;
        }
        flags
    }

    /// The value model this chain validates with
    pub fn value_model<A>(&self, verifier: A) -> Box<dyn ValueModel>
    where
        A: AmountVerifier + Send + Sync + 'static,
    {
        if self.confidential_assets {
            Box::new(ConfidentialValueModel::new(verifier))
        } else {
            Box::new(LegacyValueModel)
        }
    }

    /// Build an input validator for this chain
    pub fn input_validator<A, P>(&self, verifier: A, pegin_validator: P) -> InputValidator
    where
        A: AmountVerifier + Send + Sync + 'static,
        P: PeginValidator + Send + Sync + 'static,
    {
        InputValidator::new(self.value_model(verifier), Box::new(pegin_validator))
            .with_coinbase_maturity(self.coinbase_maturity)
    }
}
