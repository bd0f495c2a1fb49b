//! Card and transaction status tags.
//!
//! These carry no transition rules; the aggregate decides which moves are
//! valid. The lowercase string forms are what gets stored and returned to
//! clients.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Lock state of a prepaid card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    Active,
    Locked,
}

impl CardStatus {
    pub fn active() -> Self {
        CardStatus::Active
    }

    pub fn locked() -> Self {
        CardStatus::Locked
    }

    pub fn is_active(&self) -> bool {
        matches!(self, CardStatus::Active)
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, CardStatus::Locked)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CardStatus::Active => "active",
            CardStatus::Locked => "locked",
        }
    }
}

/// Settlement state of an authorization hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Authorized,
    Captured,
    Declined,
}

impl TransactionStatus {
    pub fn pending() -> Self {
        TransactionStatus::Pending
    }

    pub fn authorized() -> Self {
        TransactionStatus::Authorized
    }

    pub fn captured() -> Self {
        TransactionStatus::Captured
    }

    pub fn declined() -> Self {
        TransactionStatus::Declined
    }

    pub fn is_captured(&self) -> bool {
        matches!(self, TransactionStatus::Captured)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Authorized => "authorized",
            TransactionStatus::Captured => "captured",
            TransactionStatus::Declined => "declined",
        }
    }
}

/// Returned when a stored status string is not one we know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for CardStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(CardStatus::Active),
            "locked" => Ok(CardStatus::Locked),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl FromStr for TransactionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "authorized" => Ok(TransactionStatus::Authorized),
            "captured" => Ok(TransactionStatus::Captured),
            "declined" => Ok(TransactionStatus::Declined),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_forms_parse_back() {
        for status in [CardStatus::Active, CardStatus::Locked] {
            assert_eq!(status.as_str().parse::<CardStatus>(), Ok(status));
        }
        for status in [
            TransactionStatus::Pending,
            TransactionStatus::Authorized,
            TransactionStatus::Captured,
            TransactionStatus::Declined,
        ] {
            assert_eq!(status.as_str().parse::<TransactionStatus>(), Ok(status));
        }
    }

    #[test]
    fn unknown_strings_are_rejected() {
        assert!("closed".parse::<CardStatus>().is_err());
        assert!("Captured".parse::<TransactionStatus>().is_err());
    }

    #[test]
    fn predicates() {
        assert!(CardStatus::locked().is_locked());
        assert!(!CardStatus::locked().is_active());
        assert!(CardStatus::active().is_active());
        assert!(TransactionStatus::captured().is_captured());
        assert!(!TransactionStatus::authorized().is_captured());
    }
}
