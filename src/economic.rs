//! Money range and per-asset fee accounting

use std::collections::BTreeMap;

use crate::constants::*;
use crate::error::{RejectReason, TxRejection};
use crate::types::*;

/// MoneyRange: ℤ → {true, false}
///
/// An amount is valid iff 0 ≤ a ≤ MAX_MONEY
pub fn money_range(amount: Amount) -> bool {
    (0..=MAX_MONEY).contains(&amount)
}

/// Per-asset amounts, e.g. the fees collected while validating one block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmountMap(BTreeMap<AssetId, Amount>);

impl AmountMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, asset: &AssetId) -> Amount {
        self.0.get(asset).copied().unwrap_or(0)
    }

    /// Add `amount` to the entry for `asset`.
    ///
    /// Saturates instead of wrapping; every caller range-checks afterwards and a
    /// saturated total is never in money range.
    pub fn add(&mut self, asset: AssetId, amount: Amount) {
        let entry = self.0.entry(asset).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    /// Add every entry of `other` into `self`
    pub fn add_all(&mut self, other: &AmountMap) {
        for (asset, amount) in other.iter() {
            self.add(*asset, amount);
        }
    }

    /// True iff every asset's amount is within money range
    pub fn in_money_range(&self) -> bool {
        self.0.values().all(|amount| money_range(*amount))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AssetId, Amount)> {
        self.0.iter().map(|(asset, amount)| (asset, *amount))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<(AssetId, Amount)> for AmountMap {
    fn from_iter<I: IntoIterator<Item = (AssetId, Amount)>>(iter: I) -> Self {
        let mut map = AmountMap::new();
        for (asset, amount) in iter {
            map.add(asset, amount);
        }
        map
    }
}

/// HasValidFee: 𝒯𝒳 → {true, false}
///
/// Every fee output must carry a non-zero amount in money range, and the
/// running fee total of each asset must stay in money range.
pub fn has_valid_fee(tx: &Transaction) -> bool {
    let mut total = AmountMap::new();
    for output in tx.outputs.iter().filter(|o| o.is_fee()) {
        let (Some(asset), Some(fee)) = (output.asset.explicit(), output.value.explicit()) else {
            continue;
        };
        if fee == 0 || !money_range(fee) {
            return false;
        }
        total.add(asset, fee);
        if !money_range(total.get(&asset)) {
            return false;
        }
    }
    true
}

/// GetFeeMap: 𝒯𝒳 → (𝒜 → ℤ)
///
/// Sum of the explicit fee outputs of `tx`, per asset. Only meaningful after
/// [`has_valid_fee`] accepted the transaction.
pub fn fee_map(tx: &Transaction) -> AmountMap {
    tx.outputs
        .iter()
        .filter(|o| o.is_fee())
        .filter_map(|o| Some((o.asset.explicit()?, o.value.explicit()?)))
        .collect()
}

/// GetValueOutMap: 𝒯𝒳 → (𝒜 → ℤ)
///
/// Sum of all fully explicit outputs per asset. Blinded outputs contribute nothing.
///
/// Every explicit output amount must be in money range, whatever its asset,
/// and so must each asset's running total. The first violation is returned.
pub fn value_out_map(tx: &Transaction) -> std::result::Result<AmountMap, TxRejection> {
    let mut totals = AmountMap::new();
    for (i, output) in tx.outputs.iter().enumerate() {
        let Some(value) = output.value.explicit() else {
            continue;
        };
        if value < 0 {
            return Err(TxRejection::new(
                RejectReason::NegativeOutput,
                format!("output {} value {} is negative", i, value),
            ));
        }
        if value > MAX_MONEY {
            return Err(TxRejection::new(
                RejectReason::OutputTooLarge,
                format!("output {} value {} exceeds {}", i, value, MAX_MONEY),
            ));
        }

        let Some(asset) = output.asset.explicit() else {
            continue;
        };
        // Both terms are in range, so the sum cannot overflow
        totals.add(asset, value);
        if !money_range(totals.get(&asset)) {
            return Err(TxRejection::new(
                RejectReason::OutputTotalTooLarge,
                format!("output total of asset {} exceeds {} at output {}", asset, MAX_MONEY, i),
            ));
        }
    }
    Ok(totals)
}

/// Format an amount as a decimal coin value, e.g. `1.50000000`
pub fn format_money(amount: Amount) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    let coin = COIN as u64;
    format!("{}{}.{:08}", sign, abs / coin, abs % coin)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fee_output(asset: AssetId, value: Amount) -> TransactionOutput {
        TransactionOutput {
            asset: ConfidentialAsset::Explicit(asset),
            value: ConfidentialValue::Explicit(value),
            script_pubkey: vec![],
        }
    }

    fn tx_with_outputs(outputs: Vec<TransactionOutput>) -> Transaction {
        Transaction {
            version: 2,
            inputs: vec![],
            outputs,
            lock_time: 0,
            witness: vec![],
        }
    }

    #[test]
    fn test_money_range_bounds() {
        assert!(money_range(0));
        assert!(money_range(MAX_MONEY));
        assert!(!money_range(-1));
        assert!(!money_range(MAX_MONEY + 1));
        assert!(!money_range(i64::MIN));
    }

    #[test]
    fn test_amount_map_add_and_range() {
        let mut map = AmountMap::new();
        map.add(AssetId::DEFAULT, 10);
        map.add(AssetId::DEFAULT, 5);
        map.add(AssetId([1; 32]), MAX_MONEY);
        assert_eq!(map.get(&AssetId::DEFAULT), 15);
        assert!(map.in_money_range());

        map.add(AssetId([1; 32]), 1);
        assert!(!map.in_money_range());
    }

    #[test]
    fn test_amount_map_saturates() {
        let mut map = AmountMap::new();
        map.add(AssetId::DEFAULT, i64::MAX);
        map.add(AssetId::DEFAULT, i64::MAX);
        assert_eq!(map.get(&AssetId::DEFAULT), i64::MAX);
        assert!(!map.in_money_range());
    }

    #[test]
    fn test_has_valid_fee_accepts_positive_fees() {
        let tx = tx_with_outputs(vec![
            TransactionOutput::explicit(1000, vec![0x51]),
            fee_output(AssetId::DEFAULT, 100),
            fee_output(AssetId([2; 32]), 7),
        ]);
        assert!(has_valid_fee(&tx));

        let fees = fee_map(&tx);
        assert_eq!(fees.get(&AssetId::DEFAULT), 100);
        assert_eq!(fees.get(&AssetId([2; 32])), 7);
        assert_eq!(fees.len(), 2);
    }

    #[test]
    fn test_has_valid_fee_rejects_zero_fee() {
        let tx = tx_with_outputs(vec![fee_output(AssetId::DEFAULT, 0)]);
        assert!(!has_valid_fee(&tx));
    }

    #[test]
    fn test_has_valid_fee_rejects_negative_fee() {
        let tx = tx_with_outputs(vec![fee_output(AssetId::DEFAULT, -5)]);
        assert!(!has_valid_fee(&tx));
    }

    #[test]
    fn test_has_valid_fee_rejects_total_over_max() {
        let tx = tx_with_outputs(vec![
            fee_output(AssetId::DEFAULT, MAX_MONEY),
            fee_output(AssetId::DEFAULT, 1),
        ]);
        assert!(!has_valid_fee(&tx));
    }

    #[test]
    fn test_blinded_outputs_are_not_fees() {
        let blinded = TransactionOutput {
            asset: ConfidentialAsset::Explicit(AssetId::DEFAULT),
            value: ConfidentialValue::Blinded(vec![0x08; 33]),
            script_pubkey: vec![],
        };
        let tx = tx_with_outputs(vec![blinded]);
        assert!(has_valid_fee(&tx));
        assert!(fee_map(&tx).is_empty());
        assert!(value_out_map(&tx).unwrap().is_empty());
    }

    #[test]
    fn test_value_out_map_sums_per_asset() {
        let tx = tx_with_outputs(vec![
            TransactionOutput::explicit(600, vec![0x51]),
            TransactionOutput::explicit(400, vec![0x52]),
            fee_output(AssetId([3; 32]), 9),
        ]);
        let out = value_out_map(&tx).unwrap();
        assert_eq!(out.get(&AssetId::DEFAULT), 1000);
        assert_eq!(out.get(&AssetId([3; 32])), 9);
    }

    #[test]
    fn test_value_out_map_rejects_negative_output() {
        let tx = tx_with_outputs(vec![
            TransactionOutput::explicit(200, vec![0x51]),
            TransactionOutput::explicit(-100, vec![0x51]),
        ]);
        let rejection = value_out_map(&tx).unwrap_err();
        assert_eq!(rejection.reason, RejectReason::NegativeOutput);
        assert!(rejection.detail.contains("output 1"));
    }

    #[test]
    fn test_value_out_map_rejects_large_output() {
        let tx = tx_with_outputs(vec![TransactionOutput::explicit(MAX_MONEY + 1, vec![0x51])]);
        assert_eq!(value_out_map(&tx).unwrap_err().reason, RejectReason::OutputTooLarge);

        let tx = tx_with_outputs(vec![
            TransactionOutput::explicit(i64::MAX, vec![]),
            TransactionOutput::explicit(i64::MAX, vec![]),
        ]);
        assert_eq!(value_out_map(&tx).unwrap_err().reason, RejectReason::OutputTooLarge);
    }

    #[test]
    fn test_value_out_map_rejects_large_total() {
        let tx = tx_with_outputs(vec![
            TransactionOutput::explicit(MAX_MONEY, vec![0x51]),
            fee_output(AssetId([3; 32]), MAX_MONEY),
            TransactionOutput::explicit(1, vec![0x51]),
        ]);
        assert_eq!(value_out_map(&tx).unwrap_err().reason, RejectReason::OutputTotalTooLarge);
    }

    #[test]
    fn test_value_out_map_checks_explicit_value_under_blinded_asset() {
        let output = TransactionOutput {
            asset: ConfidentialAsset::Blinded(vec![0x0a; 33]),
            value: ConfidentialValue::Explicit(-1),
            script_pubkey: vec![0x51],
        };
        assert_eq!(
            value_out_map(&tx_with_outputs(vec![output])).unwrap_err().reason,
            RejectReason::NegativeOutput
        );
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(150_000_000), "1.50000000");
        assert_eq!(format_money(1), "0.00000001");
        assert_eq!(format_money(-COIN), "-1.00000000");
    }
}
