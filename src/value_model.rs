//! Value conservation strategies
//!
//! A chain either runs with confidential multi-asset outputs or with a single
//! explicit asset. The choice is made once, when the [`InputValidator`] is
//! built, by picking one of the [`ValueModel`] implementations below.
//!
//! [`InputValidator`]: crate::transaction::InputValidator

use crate::confidential::{AmountVerifier, CheckQueue};
use crate::economic::*;
use crate::error::{RejectReason, Result};
use crate::types::*;

/// The resolved outputs spent by a transaction's inputs
#[derive(Debug, Clone, Default)]
pub struct SpentInputs {
    /// One output per input, in input order
    pub outputs: Vec<TransactionOutput>,
    /// Sum of the explicit amounts among `outputs`
    pub explicit_total: Amount,
}

/// Per-call switches for conservation checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOptions {
    /// Run balance proofs at all
    pub script_checks: bool,
    /// Ask the verifier to cache successful proofs
    pub cache_store: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self { script_checks: true, cache_store: false }
    }
}

/// Checks that a transaction creates no value and accumulates its fees
pub trait ValueModel: Send + Sync {
    fn check_conservation(
        &self,
        spent: &SpentInputs,
        tx: &Transaction,
        fees: &mut AmountMap,
        checks: Option<&mut CheckQueue>,
        options: CheckOptions,
    ) -> Result<ValidationResult>;
}

/// Single explicit asset: fee = Σ inputs − Σ outputs under the default asset
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyValueModel;

impl ValueModel for LegacyValueModel {
    fn check_conservation(
        &self,
        spent: &SpentInputs,
        tx: &Transaction,
        fees: &mut AmountMap,
        _checks: Option<&mut CheckQueue>,
        _options: CheckOptions,
    ) -> Result<ValidationResult> {
        let value_in = spent.explicit_total;
        let value_out = match value_out_map(tx) {
            Ok(totals) => totals.get(&AssetId::DEFAULT),
            Err(rejection) => return Ok(ValidationResult::rejected(rejection)),
        };
        if value_in < value_out {
            return Ok(ValidationResult::invalid(
                RejectReason::ValueInBelowValueOut,
                format!(
                    "value in ({}) < value out ({})",
                    format_money(value_in),
                    format_money(value_out)
                ),
            ));
        }

        let Some(fee) = value_in.checked_sub(value_out).filter(|fee| money_range(*fee)) else {
            return Ok(ValidationResult::invalid(
                RejectReason::FeeOutOfRange,
                format!(
                    "fee {} - {} out of range",
                    format_money(value_in),
                    format_money(value_out)
                ),
            ));
        };

        fees.add(AssetId::DEFAULT, fee);
        Ok(ValidationResult::Valid)
    }
}

/// Confidential multi-asset outputs balanced by an [`AmountVerifier`];
/// fees are the explicit fee outputs
#[derive(Debug, Clone, Default)]
pub struct ConfidentialValueModel<V> {
    verifier: V,
}

impl<V: AmountVerifier> ConfidentialValueModel<V> {
    pub fn new(verifier: V) -> Self {
        Self { verifier }
    }
}

impl<V: AmountVerifier + Send + Sync> ValueModel for ConfidentialValueModel<V> {
    fn check_conservation(
        &self,
        spent: &SpentInputs,
        tx: &Transaction,
        fees: &mut AmountMap,
        checks: Option<&mut CheckQueue>,
        options: CheckOptions,
    ) -> Result<ValidationResult> {
        if !has_valid_fee(tx) {
            return Ok(ValidationResult::invalid(
                RejectReason::FeeOutOfRange,
                "fee outputs out of range",
            ));
        }

        if let Err(rejection) = value_out_map(tx) {
            return Ok(ValidationResult::rejected(rejection));
        }

        if options.script_checks
            && !self
                .verifier
                .verify_amounts(&spent.outputs, tx, checks, options.cache_store)
        {
            return Ok(ValidationResult::invalid(
                RejectReason::ValueConservationFailed,
                "value in != value out",
            ));
        }

        fees.add_all(&fee_map(tx));
        if !fees.in_money_range() {
            return Ok(ValidationResult::invalid(
                RejectReason::TotalFeeOutOfRange,
                "accumulated fees out of range",
            ));
        }

        Ok(ValidationResult::Valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confidential::ExplicitAmountVerifier;
    use crate::constants::*;

    fn fee(value: Amount) -> TransactionOutput {
        TransactionOutput::explicit(value, vec![])
    }

    fn tx(outputs: Vec<TransactionOutput>) -> Transaction {
        Transaction { version: 2, inputs: vec![], outputs, lock_time: 0, witness: vec![] }
    }

    fn spent(values: &[Amount]) -> SpentInputs {
        SpentInputs {
            outputs: values.iter().map(|v| TransactionOutput::explicit(*v, vec![0x51])).collect(),
            explicit_total: values.iter().sum(),
        }
    }

    fn reason(result: &ValidationResult) -> Option<RejectReason> {
        result.rejection().map(|r| r.reason)
    }

    #[test]
    fn test_legacy_exact_balance_zero_fee() {
        let mut fees = AmountMap::new();
        let result = LegacyValueModel
            .check_conservation(&spent(&[100]), &tx(vec![TransactionOutput::explicit(100, vec![0x51])]), &mut fees, None, CheckOptions::default())
            .unwrap();
        assert_eq!(result, ValidationResult::Valid);
        assert_eq!(fees.get(&AssetId::DEFAULT), 0);
    }

    #[test]
    fn test_legacy_value_in_below_value_out() {
        let mut fees = AmountMap::new();
        let result = LegacyValueModel
            .check_conservation(&spent(&[99]), &tx(vec![TransactionOutput::explicit(100, vec![0x51])]), &mut fees, None, CheckOptions::default())
            .unwrap();
        assert_eq!(reason(&result), Some(RejectReason::ValueInBelowValueOut));
        let detail = &result.rejection().unwrap().detail;
        assert!(detail.contains("0.00000099") && detail.contains("0.00000100"));
        assert!(fees.is_empty());
    }

    #[test]
    fn test_legacy_fee_out_of_range() {
        let mut fees = AmountMap::new();
        let inputs = SpentInputs { outputs: vec![], explicit_total: MAX_MONEY + 1 };
        let result = LegacyValueModel
            .check_conservation(&inputs, &tx(vec![]), &mut fees, None, CheckOptions::default())
            .unwrap();
        assert_eq!(reason(&result), Some(RejectReason::FeeOutOfRange));
    }

    #[test]
    fn test_legacy_accumulates_fee() {
        let mut fees = AmountMap::new();
        fees.add(AssetId::DEFAULT, 5);
        LegacyValueModel
            .check_conservation(&spent(&[100]), &tx(vec![TransactionOutput::explicit(90, vec![0x51])]), &mut fees, None, CheckOptions::default())
            .unwrap();
        assert_eq!(fees.get(&AssetId::DEFAULT), 15);
    }

    #[test]
    fn test_legacy_negative_output_cannot_offset() {
        let mut fees = AmountMap::new();
        let tx = tx(vec![
            TransactionOutput::explicit(200, vec![0x51]),
            TransactionOutput::explicit(-100, vec![0x51]),
        ]);
        let result = LegacyValueModel
            .check_conservation(&spent(&[100]), &tx, &mut fees, None, CheckOptions::default())
            .unwrap();
        assert_eq!(reason(&result), Some(RejectReason::NegativeOutput));
        assert!(fees.is_empty());
    }

    #[test]
    fn test_legacy_extreme_outputs_rejected_without_panic() {
        for outputs in [
            vec![TransactionOutput::explicit(i64::MIN, vec![0x51])],
            vec![TransactionOutput::explicit(MAX_MONEY + 1, vec![0x51])],
            vec![
                TransactionOutput::explicit(i64::MAX, vec![0x51]),
                TransactionOutput::explicit(i64::MAX, vec![0x51]),
            ],
        ] {
            let mut fees = AmountMap::new();
            let result = LegacyValueModel
                .check_conservation(&spent(&[100]), &tx(outputs), &mut fees, None, CheckOptions::default())
                .unwrap();
            assert!(matches!(
                reason(&result),
                Some(RejectReason::NegativeOutput | RejectReason::OutputTooLarge)
            ));
        }
    }

    #[test]
    fn test_legacy_output_total_too_large() {
        let mut fees = AmountMap::new();
        let tx = tx(vec![
            TransactionOutput::explicit(MAX_MONEY, vec![0x51]),
            TransactionOutput::explicit(MAX_MONEY, vec![0x51]),
        ]);
        let inputs = SpentInputs { outputs: vec![], explicit_total: MAX_MONEY };
        let result = LegacyValueModel
            .check_conservation(&inputs, &tx, &mut fees, None, CheckOptions::default())
            .unwrap();
        assert_eq!(reason(&result), Some(RejectReason::OutputTotalTooLarge));
    }

    #[test]
    fn test_confidential_negative_output_rejected() {
        let model = ConfidentialValueModel::new(ExplicitAmountVerifier);
        let mut fees = AmountMap::new();
        let tx = tx(vec![
            TransactionOutput::explicit(200, vec![0x51]),
            TransactionOutput::explicit(-110, vec![0x51]),
            fee(10),
        ]);
        // Skipping balance proofs must not skip the range check
        let options = CheckOptions { script_checks: false, cache_store: false };
        let result = model.check_conservation(&spent(&[100]), &tx, &mut fees, None, options).unwrap();
        assert_eq!(reason(&result), Some(RejectReason::NegativeOutput));
        assert!(fees.is_empty());
    }

    #[test]
    fn test_confidential_output_too_large_rejected() {
        let model = ConfidentialValueModel::new(ExplicitAmountVerifier);
        let mut fees = AmountMap::new();
        let tx = tx(vec![TransactionOutput::explicit(MAX_MONEY + 1, vec![0x51]), fee(10)]);
        let result = model
            .check_conservation(&spent(&[100]), &tx, &mut fees, None, CheckOptions::default())
            .unwrap();
        assert_eq!(reason(&result), Some(RejectReason::OutputTooLarge));
    }

    #[test]
    fn test_confidential_accepts_balanced_with_fee() {
        let model = ConfidentialValueModel::new(ExplicitAmountVerifier);
        let mut fees = AmountMap::new();
        let tx = tx(vec![TransactionOutput::explicit(90, vec![0x51]), fee(10)]);
        let result = model
            .check_conservation(&spent(&[100]), &tx, &mut fees, None, CheckOptions::default())
            .unwrap();
        assert_eq!(result, ValidationResult::Valid);
        assert_eq!(fees.get(&AssetId::DEFAULT), 10);
    }

    #[test]
    fn test_confidential_zero_fee_output_rejected() {
        let model = ConfidentialValueModel::new(ExplicitAmountVerifier);
        let mut fees = AmountMap::new();
        let tx = tx(vec![TransactionOutput::explicit(100, vec![0x51]), fee(0)]);
        let result = model
            .check_conservation(&spent(&[100]), &tx, &mut fees, None, CheckOptions::default())
            .unwrap();
        assert_eq!(reason(&result), Some(RejectReason::FeeOutOfRange));
    }

    #[test]
    fn test_confidential_unbalanced_rejected() {
        let model = ConfidentialValueModel::new(ExplicitAmountVerifier);
        let mut fees = AmountMap::new();
        let tx = tx(vec![TransactionOutput::explicit(95, vec![0x51]), fee(10)]);
        let result = model
            .check_conservation(&spent(&[100]), &tx, &mut fees, None, CheckOptions::default())
            .unwrap();
        assert_eq!(reason(&result), Some(RejectReason::ValueConservationFailed));
        assert!(fees.is_empty());
    }

    #[test]
    fn test_confidential_skips_balance_without_script_checks() {
        let model = ConfidentialValueModel::new(ExplicitAmountVerifier);
        let mut fees = AmountMap::new();
        let tx = tx(vec![TransactionOutput::explicit(95, vec![0x51]), fee(10)]);
        let options = CheckOptions { script_checks: false, cache_store: false };
        let result = model.check_conservation(&spent(&[100]), &tx, &mut fees, None, options).unwrap();
        assert_eq!(result, ValidationResult::Valid);
        assert_eq!(fees.get(&AssetId::DEFAULT), 10);
    }

    #[test]
    fn test_confidential_total_fee_out_of_range() {
        let model = ConfidentialValueModel::new(ExplicitAmountVerifier);
        let mut fees = AmountMap::new();
        fees.add(AssetId::DEFAULT, MAX_MONEY);
        let tx = tx(vec![TransactionOutput::explicit(90, vec![0x51]), fee(10)]);
        let result = model
            .check_conservation(&spent(&[100]), &tx, &mut fees, None, CheckOptions::default())
            .unwrap();
        assert_eq!(reason(&result), Some(RejectReason::TotalFeeOutOfRange));
    }
}
