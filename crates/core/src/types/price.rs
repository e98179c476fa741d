//! Type-safe price representation in integer minor units.
//!
//! Currency arithmetic must not drift, so a [`Price`] stores its amount as
//! an `i64` count of the currency's minor unit (cents for USD). Decimal
//! amounts exist only at the boundaries: [`Price::from_decimal`] on the way
//! in, [`Price::to_decimal`] and `Display` on the way out.

use core::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`] from a decimal amount.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is finer-grained than the currency's minor unit.
    #[error("amount {amount} has fractions below one minor unit of {currency}")]
    FractionalMinorUnits {
        /// The rejected amount.
        amount: Decimal,
        /// The currency whose minor unit was undershot.
        currency: CurrencyCode,
    },
    /// The amount does not fit in an `i64` of minor units.
    #[error("amount {0} is out of range")]
    OutOfRange(Decimal),
}

/// A monetary amount in a single currency.
///
/// ## Invariants
///
/// - The amount is an exact integer count of minor units; no fractional
///   cents can be represented, so repeated aggregation cannot drift.
/// - Arithmetic across currencies is refused (`checked_*` return `None`).
///
/// ## Examples
///
/// ```
/// use cartwheel_core::{CurrencyCode, Price};
///
/// let unit = Price::from_minor_units(80_900, CurrencyCode::USD);
/// let line = unit.checked_mul(2).unwrap();
/// assert_eq!(line.minor_units(), 161_800);
/// assert_eq!(line.to_string(), "$1,618.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the smallest currency unit (e.g., cents for USD).
    minor_units: i64,
    /// ISO 4217 currency code.
    currency: CurrencyCode,
}

impl Price {
    /// Create a price from a count of minor units.
    #[must_use]
    pub const fn from_minor_units(minor_units: i64, currency: CurrencyCode) -> Self {
        Self {
            minor_units,
            currency,
        }
    }

    /// The zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency: CurrencyCode) -> Self {
        Self::from_minor_units(0, currency)
    }

    /// Create a price from an amount in standard units (e.g., dollars).
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::FractionalMinorUnits`] if the amount is finer
    /// than the currency's minor unit (e.g., `$0.005`), and
    /// [`PriceError::OutOfRange`] if the scaled amount does not fit in an
    /// `i64`.
    pub fn from_decimal(amount: Decimal, currency: CurrencyCode) -> Result<Self, PriceError> {
        let factor = Decimal::from(10_i64.pow(currency.minor_unit_exponent()));
        let scaled = amount
            .checked_mul(factor)
            .ok_or(PriceError::OutOfRange(amount))?;

        if !scaled.fract().is_zero() {
            return Err(PriceError::FractionalMinorUnits { amount, currency });
        }

        let minor_units = scaled.trunc().to_i64().ok_or(PriceError::OutOfRange(amount))?;

        Ok(Self {
            minor_units,
            currency,
        })
    }

    /// Get the amount as a count of minor units.
    #[must_use]
    pub const fn minor_units(&self) -> i64 {
        self.minor_units
    }

    /// Get the currency.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Get the amount in standard units as a decimal.
    #[must_use]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.minor_units, self.currency.minor_unit_exponent())
    }

    /// Add two prices of the same currency.
    ///
    /// Returns `None` on currency mismatch or `i64` overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        if self.currency != other.currency {
            return None;
        }
        let minor_units = self.minor_units.checked_add(other.minor_units)?;
        Some(Self {
            minor_units,
            currency: self.currency,
        })
    }

    /// Multiply a price by a quantity.
    ///
    /// Returns `None` on `i64` overflow.
    #[must_use]
    pub fn checked_mul(self, quantity: u32) -> Option<Self> {
        let minor_units = self.minor_units.checked_mul(i64::from(quantity))?;
        Some(Self {
            minor_units,
            currency: self.currency,
        })
    }
}

impl fmt::Display for Price {
    /// Format for display (e.g., `$1,251.00`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let exponent = self.currency.minor_unit_exponent();
        let divisor = 10_u64.pow(exponent);
        let magnitude = self.minor_units.unsigned_abs();
        let whole = magnitude / divisor;
        let fraction = magnitude % divisor;

        if self.minor_units < 0 {
            write!(f, "-")?;
        }
        write!(f, "{}{}", self.currency.symbol(), group_thousands(whole))?;
        if exponent > 0 {
            write!(f, ".{fraction:0width$}", width = exponent as usize)?;
        }
        Ok(())
    }
}

/// Render an unsigned integer with `,` thousands separators.
fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
    KRW,
}

impl CurrencyCode {
    /// The display symbol prefixed to formatted amounts.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "\u{20ac}",
            Self::GBP => "\u{a3}",
            Self::KRW => "\u{20a9}",
        }
    }

    /// The ISO 4217 alphabetic code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
            Self::KRW => "KRW",
        }
    }

    /// Decimal digits in one standard unit (2 for cents, 0 for won).
    #[must_use]
    pub const fn minor_unit_exponent(&self) -> u32 {
        match self {
            Self::USD | Self::EUR | Self::GBP | Self::CAD | Self::AUD => 2,
            Self::KRW => 0,
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
