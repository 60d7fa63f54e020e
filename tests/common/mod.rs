//! Shared fixtures for integration tests

#![allow(dead_code)]

use sidechain_consensus::chain::HeaderChain;
use sidechain_consensus::confidential::ExplicitAmountVerifier;
use sidechain_consensus::pegin::PeginValidator;
use sidechain_consensus::*;

/// Accepts every peg-in proof
pub struct AcceptPegins;

impl PeginValidator for AcceptPegins {
    fn is_valid_pegin_witness(
        &self,
        _witness: &Witness,
        _fedpeg_scripts: &[FedpegScript],
        _prevout: &OutPoint,
        _check_depth: bool,
    ) -> std::result::Result<(), String> {
        Ok(())
    }
}

/// Rejects every peg-in proof
pub struct RejectPegins;

impl PeginValidator for RejectPegins {
    fn is_valid_pegin_witness(
        &self,
        _witness: &Witness,
        _fedpeg_scripts: &[FedpegScript],
        _prevout: &OutPoint,
        _check_depth: bool,
    ) -> std::result::Result<(), String> {
        Err("merkle proof does not match".to_string())
    }
}

pub fn confidential() -> TxConsensus {
    TxConsensus::new(ValidationConfig::default(), ExplicitAmountVerifier, AcceptPegins)
}

pub fn legacy() -> TxConsensus {
    let config = ValidationConfig { confidential_assets: false, ..Default::default() };
    TxConsensus::new(config, ExplicitAmountVerifier, AcceptPegins)
}

pub fn outpoint(n: u8) -> OutPoint {
    OutPoint { hash: [n; 32], index: 0 }
}

pub fn coin(value: Amount, height: i32, is_coinbase: bool) -> Coin {
    Coin {
        output: TransactionOutput::explicit(value, vec![0x51]),
        height,
        is_coinbase,
    }
}

pub fn regular(prevout: OutPoint, sequence: u32) -> TransactionInput {
    TransactionInput { source: InputSource::Regular(prevout), script_sig: vec![], sequence }
}

pub fn pegin(prevout: OutPoint) -> TransactionInput {
    TransactionInput { source: InputSource::PegIn(prevout), script_sig: vec![], sequence: SEQUENCE_FINAL }
}

/// Six-element peg-in witness of the default asset
pub fn pegin_witness(value: Amount, parent_genesis: u8, claim_script: ByteString) -> Witness {
    vec![
        value.to_le_bytes().to_vec(),
        AssetId::DEFAULT.0.to_vec(),
        vec![parent_genesis; 32],
        claim_script,
        vec![0x02; 60],
        vec![0x03; 40],
    ]
}

pub fn pegin_only(witness: Witness) -> InputWitness {
    InputWitness { script_witness: vec![], pegin_witness: witness }
}

pub fn tx(inputs: Vec<TransactionInput>, outputs: Vec<TransactionOutput>) -> Transaction {
    Transaction { version: 2, inputs, outputs, lock_time: 0, witness: vec![] }
}

pub fn pay(value: Amount) -> TransactionOutput {
    TransactionOutput::explicit(value, vec![0x51])
}

pub fn fee(value: Amount) -> TransactionOutput {
    TransactionOutput::explicit(value, vec![])
}

/// Chain where the block at height h has timestamp 1_000 + 600 * h
pub fn test_chain(len: u32) -> HeaderChain {
    let mut chain = HeaderChain::new();
    let mut prev = [0u8; 32];
    for h in 0..len {
        prev = chain
            .push(BlockHeader {
                version: 1,
                prev_block_hash: prev,
                merkle_root: [h as u8; 32],
                timestamp: 1_000 + 600 * h,
                bits: 0x207fffff,
                nonce: h,
            })
            .hash;
    }
    chain
}

pub fn reason(result: &ValidationResult) -> Option<RejectReason> {
    result.rejection().map(|r| r.reason)
}
