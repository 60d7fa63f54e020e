//! Peg-in claims: witness layout and the proof-validation capability
//!
//! A peg-in witness is a stack of six elements:
//!
//! | index | content |
//! |---|---|
//! | 0 | claimed amount, 8-byte little-endian |
//! | 1 | asset identifier, 32 bytes |
//! | 2 | parent chain genesis hash, 32 bytes |
//! | 3 | claim script |
//! | 4 | serialized parent chain transaction |
//! | 5 | merkle proof of that transaction |
//!
//! Validating the parent-chain proof is outside this crate; callers supply a
//! [`PeginValidator`].

use crate::constants::*;
use crate::error::{ConsensusError, Result};
use crate::types::*;

/// The consensus-relevant fields of a peg-in witness
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeginClaim {
    pub value: Amount,
    pub asset: AssetId,
    pub parent_genesis: Hash,
    pub claim_script: ByteString,
}

/// Peg-in proof validation supplied by the caller
pub trait PeginValidator {
    /// Check that `witness` proves a genuine deposit to one of `fedpeg_scripts`
    /// spent by `prevout` on the parent chain. On failure returns the reason.
    fn is_valid_pegin_witness(
        &self,
        witness: &Witness,
        fedpeg_scripts: &[FedpegScript],
        prevout: &OutPoint,
        check_depth: bool,
    ) -> std::result::Result<(), String>;

    /// The output a valid peg-in witness brings into existence
    fn output_from_pegin_witness(&self, witness: &Witness) -> Result<TransactionOutput> {
        output_from_pegin_witness(witness)
    }
}

/// Decode the fixed-layout fields of a peg-in witness
pub fn parse_pegin_witness(witness: &Witness) -> std::result::Result<PeginClaim, String> {
    if witness.len() != PEGIN_WITNESS_ITEMS {
        return Err(format!(
            "Peg-in witness has {} elements, expected {}",
            witness.len(),
            PEGIN_WITNESS_ITEMS
        ));
    }

    let value_bytes: [u8; 8] = witness[0]
        .as_slice()
        .try_into()
        .map_err(|_| "Peg-in amount must be 8 bytes".to_string())?;
    let asset: Hash = witness[1]
        .as_slice()
        .try_into()
        .map_err(|_| "Peg-in asset must be 32 bytes".to_string())?;
    let parent_genesis: Hash = witness[2]
        .as_slice()
        .try_into()
        .map_err(|_| "Peg-in genesis hash must be 32 bytes".to_string())?;

    Ok(PeginClaim {
        value: i64::from_le_bytes(value_bytes),
        asset: AssetId(asset),
        parent_genesis,
        claim_script: witness[PEGIN_CLAIM_SCRIPT_INDEX].clone(),
    })
}

/// GetPeginOutputFromWitness: 𝒲 → 𝒯
///
/// The claimed output: explicit asset and amount locked by the claim script
pub fn output_from_pegin_witness(witness: &Witness) -> Result<TransactionOutput> {
    let claim = parse_pegin_witness(witness).map_err(ConsensusError::PeginWitness)?;
    Ok(TransactionOutput {
        asset: ConfidentialAsset::Explicit(claim.asset),
        value: ConfidentialValue::Explicit(claim.value),
        script_pubkey: claim.claim_script,
    })
}

/// Identity of the peg-in claimed by `witness` at parent-chain outpoint `prevout`
pub fn pegin_id(witness: &Witness, prevout: &OutPoint) -> Result<PeginId> {
    let parent_genesis: Hash = witness
        .get(2)
        .and_then(|item| item.as_slice().try_into().ok())
        .ok_or_else(|| ConsensusError::PeginWitness("missing parent genesis hash".to_string()))?;
    Ok(PeginId { parent_genesis, prevout: *prevout })
}
