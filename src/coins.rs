//! Coin view: lookup of unspent outputs and persistently spent peg-ins

use std::collections::{HashMap, HashSet};

use crate::error::{ConsensusError, Result};
use crate::transaction::is_coinbase;
use crate::types::*;

/// Read access to the unspent-output set.
///
/// Implementations must be safe to share across threads validating
/// independent transactions; nothing here mutates the view.
pub trait CoinView {
    /// The unspent coin at `outpoint`, if any
    fn access_coin(&self, outpoint: &OutPoint) -> Option<&Coin>;

    /// Whether a peg-in was already claimed in a connected block
    fn is_pegin_spent(&self, pegin: &PeginId) -> bool;

    /// Whether every regular input of `tx` refers to an unspent coin.
    /// Peg-in inputs are not tracked by the view and coinbases spend nothing.
    fn have_inputs(&self, tx: &Transaction) -> bool {
        if is_coinbase(tx) {
            return true;
        }
        tx.inputs.iter().all(|input| match &input.source {
            InputSource::Regular(prevout) => self.access_coin(prevout).is_some(),
            InputSource::PegIn(_) => true,
        })
    }
}

/// Fetch a coin the caller already established to exist
pub fn require_coin<'a, V: CoinView + ?Sized>(view: &'a V, outpoint: &OutPoint) -> Result<&'a Coin> {
    view.access_coin(outpoint)
        .ok_or_else(|| ConsensusError::UtxoNotFound(outpoint.to_string()))
}

/// In-memory coin view
#[derive(Debug, Clone, Default)]
pub struct UtxoSet {
    coins: HashMap<OutPoint, Coin>,
    spent_pegins: HashSet<PeginId>,
}

impl UtxoSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, outpoint: OutPoint, coin: Coin) -> Option<Coin> {
        self.coins.insert(outpoint, coin)
    }

    /// Remove a coin, returning it if it was unspent
    pub fn spend(&mut self, outpoint: &OutPoint) -> Option<Coin> {
        self.coins.remove(outpoint)
    }

    /// Record peg-ins claimed by a connected block
    pub fn mark_pegins_spent<I: IntoIterator<Item = PeginId>>(&mut self, pegins: I) {
        self.spent_pegins.extend(pegins);
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }
}

impl CoinView for UtxoSet {
    fn access_coin(&self, outpoint: &OutPoint) -> Option<&Coin> {
        self.coins.get(outpoint)
    }

    fn is_pegin_spent(&self, pegin: &PeginId) -> bool {
        self.spent_pegins.contains(pegin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin(value: Amount) -> Coin {
        Coin {
            output: TransactionOutput::explicit(value, vec![0x51]),
            height: 1,
            is_coinbase: false,
        }
    }

    fn spending(sources: Vec<InputSource>) -> Transaction {
        Transaction {
            version: 2,
            inputs: sources
                .into_iter()
                .map(|source| TransactionInput { source, script_sig: vec![], sequence: 0 })
                .collect(),
            outputs: vec![],
            lock_time: 0,
            witness: vec![],
        }
    }

    #[test]
    fn test_have_inputs() {
        let mut view = UtxoSet::new();
        let a = OutPoint { hash: [1; 32], index: 0 };
        let b = OutPoint { hash: [2; 32], index: 0 };
        view.insert(a, coin(5));

        assert!(view.have_inputs(&spending(vec![InputSource::Regular(a)])));
        assert!(!view.have_inputs(&spending(vec![InputSource::Regular(a), InputSource::Regular(b)])));
        // peg-ins are not looked up in the view
        assert!(view.have_inputs(&spending(vec![InputSource::Regular(a), InputSource::PegIn(b)])));
    }

    #[test]
    fn test_spent_coin_is_missing() {
        let mut view = UtxoSet::new();
        let a = OutPoint { hash: [1; 32], index: 0 };
        view.insert(a, coin(5));
        assert!(view.spend(&a).is_some());
        assert!(!view.have_inputs(&spending(vec![InputSource::Regular(a)])));
        assert!(matches!(require_coin(&view, &a), Err(ConsensusError::UtxoNotFound(_))));
    }

    #[test]
    fn test_pegin_spent_tracking() {
        let mut view = UtxoSet::new();
        let pegin = PeginId { parent_genesis: [3; 32], prevout: OutPoint { hash: [4; 32], index: 1 } };
        assert!(!view.is_pegin_spent(&pegin));
        view.mark_pegins_spent([pegin]);
        assert!(view.is_pegin_spent(&pegin));
    }

    #[test]
    fn test_coinbase_has_inputs() {
        let view = UtxoSet::new();
        let coinbase = spending(vec![InputSource::Regular(OutPoint::NULL)]);
        assert!(view.have_inputs(&coinbase));
    }
}
