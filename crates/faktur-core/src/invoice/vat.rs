//! VAT/DPP back-calculation for VAT-inclusive amounts.
//!
//! An amount `A` that already contains VAT at rate `r` decomposes into the
//! tax base `dpp = A * 100 / (100 + r)` and the tax `dpp * r / 100`. Both
//! values are rounded to two decimals independently, so `dpp + vat` may be
//! off from `A` by a cent or two.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Indonesian PPN rate, in percent.
pub const DEFAULT_VAT_RATE_PERCENT: u32 = 11;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// VAT rule applied to VAT-inclusive subtotals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VatRule {
    rate_percent: u32,
}

/// Result of decomposing a subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatCalculation {
    /// Amount the calculation started from.
    pub subtotal: Decimal,
    /// Tax base (Dasar Pengenaan Pajak).
    pub dpp: Decimal,
    /// VAT on the tax base.
    pub vat_calculated: Decimal,
}

impl VatRule {
    /// Create a rule for the given rate in whole percent.
    pub fn new(rate_percent: u32) -> Self {
        Self { rate_percent }
    }

    /// Split a VAT-inclusive amount into tax base and tax.
    pub fn decompose(&self, subtotal: Decimal) -> VatCalculation {
        let rate = Decimal::from(self.rate_percent);
        // 100 + rate is never zero for an unsigned rate
        let dpp = scale(subtotal, HUNDRED, HUNDRED + rate).round_dp(2);
        let vat_calculated = scale(dpp, rate, HUNDRED).round_dp(2);

        VatCalculation {
            subtotal,
            dpp,
            vat_calculated,
        }
    }
}

/// `amount * num / den` without overflowing. Near the top of the decimal
/// range the division runs first and the product saturates.
fn scale(amount: Decimal, num: Decimal, den: Decimal) -> Decimal {
    match amount.checked_mul(num) {
        Some(product) => product / den,
        None => (amount / den).saturating_mul(num),
    }
}

impl Default for VatRule {
    fn default() -> Self {
        Self::new(DEFAULT_VAT_RATE_PERCENT)
    }
}

/// Decompose with the default 11% rule.
pub fn calculate_dpp(subtotal: Decimal) -> VatCalculation {
    VatRule::default().decompose(subtotal)
}
