//! Currency-tagged amounts in integer minor units.
//!
//! Amounts are stored as `i64` minor units (pence, cents) so no floating
//! point ever touches a balance. A `Money` is never negative: every
//! constructor and every derived value goes through [`Money::new`].

use std::{cmp::Ordering, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::models::error::DomainError;

/// ISO-4217 style currency code, e.g. `GBP`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Parse a three letter code, normalizing it to upper case.
    pub fn new(code: &str) -> Result<Self, DomainError> {
        let code = code.trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DomainError::InvalidCurrency(code.to_string()));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    pub fn code(&self) -> &str {
        &self.0
    }

    /// Number of decimal digits in the minor unit (ISO 4217 exponent).
    ///
    /// Two unless the code is one of the common zero or three digit
    /// currencies.
    pub fn minor_digits(&self) -> u32 {
        match self.code() {
            "BIF" | "CLP" | "DJF" | "GNF" | "ISK" | "JPY" | "KMF" | "KRW" | "PYG" | "RWF"
            | "UGX" | "VND" | "VUV" | "XAF" | "XOF" | "XPF" => 0,
            "BHD" | "IQD" | "JOD" | "KWD" | "LYD" | "OMR" | "TND" => 3,
            _ => 2,
        }
    }
}

impl FromStr for Currency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-negative amount of a single currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Money {
    amount: i64,
    currency: Currency,
}

impl Money {
    /// Build a money value.
    ///
    /// # Errors
    ///
    /// - `NegativeAmount`: `amount` is below zero
    pub fn new(amount: i64, currency: Currency) -> Result<Self, DomainError> {
        if amount < 0 {
            return Err(DomainError::NegativeAmount);
        }
        Ok(Self { amount, currency })
    }

    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: 0,
            currency,
        }
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Sum of two amounts in the same currency.
    pub fn add(&self, other: &Money) -> Result<Money, DomainError> {
        self.ensure_same_currency(other)?;
        let sum = self
            .amount
            .checked_add(other.amount)
            .ok_or(DomainError::AmountOverflow)?;
        Money::new(sum, self.currency.clone())
    }

    /// Difference of two amounts in the same currency.
    ///
    /// Goes back through [`Money::new`], so a result below zero fails with
    /// `NegativeAmount`.
    pub fn deduct(&self, other: &Money) -> Result<Money, DomainError> {
        self.ensure_same_currency(other)?;
        Money::new(self.amount - other.amount, self.currency.clone())
    }

    pub fn is_more_than(&self, other: &Money) -> Result<bool, DomainError> {
        Ok(self.compare(other)? == Ordering::Greater)
    }

    pub fn is_less_than(&self, other: &Money) -> Result<bool, DomainError> {
        Ok(self.compare(other)? == Ordering::Less)
    }

    pub fn is_equal(&self, other: &Money) -> Result<bool, DomainError> {
        Ok(self.compare(other)? == Ordering::Equal)
    }

    fn compare(&self, other: &Money) -> Result<Ordering, DomainError> {
        self.ensure_same_currency(other)?;
        Ok(self.amount.cmp(&other.amount))
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), DomainError> {
        if self.currency != other.currency {
            return Err(DomainError::CurrencyMismatch {
                expected: self.currency.clone(),
                found: other.currency.clone(),
            });
        }
        Ok(())
    }
}

/// Renders in major units using the currency's exponent: `GBP 1.05` for
/// 105 pence, `JPY 105` for 105 yen.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.currency.minor_digits();
        if digits == 0 {
            return write!(f, "{} {}", self.currency, self.amount);
        }

        let scale = 10i64.pow(digits);
        write!(
            f,
            "{} {}.{:0width$}",
            self.currency,
            self.amount / scale,
            self.amount % scale,
            width = digits as usize
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gbp(amount: i64) -> Money {
        Money::new(amount, Currency::new("GBP").unwrap()).unwrap()
    }

    fn eur(amount: i64) -> Money {
        Money::new(amount, Currency::new("EUR").unwrap()).unwrap()
    }

    #[test]
    fn rejects_negative_amount() {
        let result = Money::new(-1, Currency::new("GBP").unwrap());
        assert_eq!(result, Err(DomainError::NegativeAmount));
    }

    #[test]
    fn deduct_below_zero_fails() {
        assert_eq!(gbp(10).deduct(&gbp(11)), Err(DomainError::NegativeAmount));
    }

    #[test]
    fn currency_codes_are_normalized() {
        assert_eq!(Currency::new("gbp").unwrap().code(), "GBP");
        assert!(Currency::new("GB").is_err());
        assert!(Currency::new("G8P").is_err());
    }

    #[test]
    fn mixed_currencies_fail_everywhere() {
        let mismatch = DomainError::CurrencyMismatch {
            expected: Currency::new("GBP").unwrap(),
            found: Currency::new("EUR").unwrap(),
        };
        assert_eq!(gbp(1).add(&eur(1)), Err(mismatch.clone()));
        assert_eq!(gbp(1).deduct(&eur(1)), Err(mismatch.clone()));
        assert_eq!(gbp(1).is_more_than(&eur(1)), Err(mismatch.clone()));
        assert_eq!(gbp(1).is_less_than(&eur(1)), Err(mismatch.clone()));
        assert_eq!(gbp(1).is_equal(&eur(1)), Err(mismatch));
    }

    #[test]
    fn add_overflow_is_reported() {
        assert_eq!(gbp(i64::MAX).add(&gbp(1)), Err(DomainError::AmountOverflow));
    }

    #[test]
    fn comparisons() {
        assert!(gbp(2).is_more_than(&gbp(1)).unwrap());
        assert!(gbp(1).is_less_than(&gbp(2)).unwrap());
        assert!(gbp(2).is_equal(&gbp(2)).unwrap());
        assert!(!gbp(2).is_less_than(&gbp(2)).unwrap());
    }

    #[test]
    fn displays_major_and_minor_units() {
        assert_eq!(gbp(105).to_string(), "GBP 1.05");
        assert_eq!(gbp(0).to_string(), "GBP 0.00");
    }

    #[test]
    fn display_follows_currency_exponent() {
        let yen = Money::new(105, Currency::new("jpy").unwrap()).unwrap();
        let dinar = Money::new(1_005, Currency::new("KWD").unwrap()).unwrap();
        assert_eq!(yen.to_string(), "JPY 105");
        assert_eq!(dinar.to_string(), "KWD 1.005");
    }
}
