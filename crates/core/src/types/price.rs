//! Type-safe price representation using decimal arithmetic.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// A price with currency information.
///
/// Amounts are stored in the currency's standard unit (e.g., naira, not
/// kobo). The hosted payment provider takes integer minor units, so
/// [`Price::minor_units`] converts with banker's rounding at the currency's
/// exponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Amount in integer minor units (e.g., kobo for NGN), rounded.
    ///
    /// Saturates at `i64::MAX` for absurdly large amounts rather than
    /// wrapping; the catalog never holds values anywhere near that range.
    #[must_use]
    pub fn minor_units(&self) -> i64 {
        let scaled = self.amount * Decimal::from(self.currency_code.minor_units_per_unit());
        scaled.round().to_i64().unwrap_or(i64::MAX)
    }

    /// Format for display (e.g., "₦5,000" renders client-side; this is "₦5000.00").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency_code.symbol(), self.amount)
    }
}

/// ISO 4217 currency codes for the markets the store ships to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    NGN,
    GHS,
    KES,
    ZAR,
    USD,
}

impl CurrencyCode {
    /// Currency symbol for display.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::NGN => "₦",
            Self::GHS => "₵",
            Self::KES => "KSh",
            Self::ZAR => "R",
            Self::USD => "$",
        }
    }

    /// ISO 4217 code as sent to the payment provider.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NGN => "NGN",
            Self::GHS => "GHS",
            Self::KES => "KES",
            Self::ZAR => "ZAR",
            Self::USD => "USD",
        }
    }

    /// Minor units per standard unit (all supported currencies use 2 decimals).
    #[must_use]
    pub const fn minor_units_per_unit(self) -> i64 {
        100
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_units_whole_amount() {
        let price = Price::new(Decimal::from(5000), CurrencyCode::NGN);
        assert_eq!(price.minor_units(), 500_000);
    }

    #[test]
    fn test_minor_units_rounds_fractions() {
        let amount: Decimal = "19.995".parse().expect("valid decimal");
        let price = Price::new(amount, CurrencyCode::USD);
        assert_eq!(price.minor_units(), 2000);
    }

    #[test]
    fn test_display() {
        let price = Price::new(Decimal::from(2000), CurrencyCode::NGN);
        assert_eq!(price.display(), "₦2000.00");
    }
}
