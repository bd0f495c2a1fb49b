//! Prepaid card aggregate.
//!
//! The card owns its balances and every authorization hold made against it.
//! All balance rules live here:
//!
//! - `balance` is the money on the card; it only drops on capture
//! - `available_balance` is `balance` minus the outstanding holds, where a
//!   hold's outstanding part is `authorized - captured`; it never exceeds
//!   `balance`
//! - a locked card accepts no loads and no new authorizations, but existing
//!   holds can still be settled
//!
//! Each operation computes every fallible value first and only then assigns,
//! so a failed call leaves the card exactly as it was.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::models::{
    error::{DomainError, TransactionFailure},
    identifiers::{CardNumber, TransactionId},
    money::{Currency, Money},
    status::CardStatus,
    transaction::Transaction,
};

/// Aggregate root for a single prepaid card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepaidCard {
    number: CardNumber,
    status: CardStatus,
    balance: Money,
    available_balance: Money,
    currency: Currency,
    transactions: HashMap<TransactionId, Transaction>,

    /// Persisted revision this card was loaded at; 0 when never saved.
    version: u64,
}

impl PrepaidCard {
    /// Issue a new active card with zero balances.
    pub fn emit(currency: Currency) -> Self {
        Self::emit_with_number(CardNumber::generate(), currency)
    }

    pub fn emit_with_number(number: CardNumber, currency: Currency) -> Self {
        Self {
            number,
            status: CardStatus::active(),
            balance: Money::zero(currency.clone()),
            available_balance: Money::zero(currency.clone()),
            currency,
            transactions: HashMap::new(),
            version: 0,
        }
    }

    /// Rebuild a card from storage.
    ///
    /// # Errors
    ///
    /// - `CorruptState`: an amount is not in the card's currency, or the
    ///   available balance is not `balance` minus the outstanding holds
    pub fn restore(
        number: CardNumber,
        status: CardStatus,
        balance: Money,
        available_balance: Money,
        currency: Currency,
        transactions: Vec<Transaction>,
        version: u64,
    ) -> Result<Self, DomainError> {
        let corrupt = |e: DomainError| DomainError::CorruptState(format!("card {number}: {e}"));

        ensure_currency(&currency, &balance).map_err(corrupt)?;
        ensure_currency(&currency, &available_balance).map_err(corrupt)?;
        for transaction in &transactions {
            ensure_currency(&currency, transaction.authorized_amount()).map_err(corrupt)?;
            ensure_currency(&currency, transaction.captured_amount()).map_err(corrupt)?;
        }

        let expected_available = balance
            .deduct(&outstanding_holds(&currency, transactions.iter()).map_err(corrupt)?)
            .map_err(corrupt)?;
        if expected_available != available_balance {
            return Err(DomainError::CorruptState(format!(
                "card {number}: available balance {available_balance} should be {expected_available}"
            )));
        }

        Ok(Self {
            number,
            status,
            balance,
            available_balance,
            currency,
            transactions: transactions
                .into_iter()
                .map(|transaction| (transaction.id(), transaction))
                .collect(),
            version,
        })
    }

    pub fn number(&self) -> CardNumber {
        self.number
    }

    pub fn status(&self) -> CardStatus {
        self.status
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Record the version a repository stored this copy under.
    pub(crate) fn mark_persisted(&mut self, version: u64) {
        self.version = version;
    }

    /// Balance in minor units.
    pub fn balance(&self) -> i64 {
        self.balance.amount()
    }

    /// Balance minus outstanding holds, in minor units.
    pub fn available_balance(&self) -> i64 {
        self.available_balance.amount()
    }

    pub fn transaction(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.get(&id)
    }

    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.values()
    }

    /// Human readable balance line, e.g.
    /// `Balance: GBP 1.00 Available balance: GBP 0.40`.
    pub fn balance_summary(&self) -> String {
        format!(
            "Balance: {} Available balance: {}",
            self.balance, self.available_balance
        )
    }

    pub fn lock(&mut self) -> Result<(), DomainError> {
        if self.status.is_locked() {
            return Err(DomainError::CardLocked);
        }
        self.status = CardStatus::locked();
        Ok(())
    }

    pub fn unlock(&mut self) -> Result<(), DomainError> {
        if self.status.is_active() {
            return Err(DomainError::CardLocked);
        }
        self.status = CardStatus::active();
        Ok(())
    }

    /// Add funds to the card.
    pub fn load(&mut self, money: &Money) -> Result<(), DomainError> {
        self.ensure_active()?;
        ensure_currency(&self.currency, money)?;

        let balance = self.balance.add(money)?;
        let available_balance = self.available_balance.add(money)?;

        self.balance = balance;
        self.available_balance = available_balance;
        Ok(())
    }

    /// Place a hold for `amount` and return the id of the new transaction.
    ///
    /// # Errors
    ///
    /// - `CardLocked`: the card is locked
    /// - `CurrencyMismatch`: `amount` is not in the card's currency
    /// - `InsufficientFunds`: `amount` exceeds the available balance; the
    ///   declined transaction is dropped
    pub fn authorization_request(
        &mut self,
        merchant: impl Into<String>,
        amount: Money,
        date: NaiveDateTime,
    ) -> Result<TransactionId, DomainError> {
        self.ensure_active()?;
        ensure_currency(&self.currency, &amount)?;

        let mut transaction = Transaction::new(merchant, amount, date);
        if transaction
            .authorized_amount()
            .is_more_than(&self.available_balance)?
        {
            transaction.decline();
            return Err(DomainError::InsufficientFunds);
        }

        let available_balance = self
            .available_balance
            .deduct(transaction.authorized_amount())?;
        transaction.authorize();

        let id = transaction.id();
        self.available_balance = available_balance;
        self.transactions.insert(id, transaction);
        Ok(id)
    }

    /// Settle `money` of a hold. The available balance already excludes the
    /// hold, so only `balance` moves.
    pub fn capture(&mut self, id: TransactionId, money: &Money) -> Result<(), DomainError> {
        ensure_currency(&self.currency, money)?;
        let mut transaction = self.find_transaction(id)?.clone();

        transaction.capture(money)?;
        let balance = self.balance.deduct(money)?;

        self.balance = balance;
        self.transactions.insert(id, transaction);
        Ok(())
    }

    /// Release `money` of an uncaptured hold back to the available balance.
    pub fn reverse(&mut self, id: TransactionId, money: &Money) -> Result<(), DomainError> {
        ensure_currency(&self.currency, money)?;
        let mut transaction = self.find_transaction(id)?.clone();
        if transaction.is_captured() {
            return Err(DomainError::Transaction(TransactionFailure::Captured));
        }

        transaction.reverse(money)?;
        let available_balance = self.available_balance.add(money)?;

        self.available_balance = available_balance;
        self.transactions.insert(id, transaction);
        Ok(())
    }

    /// Return captured money to the card.
    pub fn refund(&mut self, id: TransactionId, money: &Money) -> Result<(), DomainError> {
        ensure_currency(&self.currency, money)?;
        let mut transaction = self.find_transaction(id)?.clone();

        transaction.refund(money)?;
        let available_balance = self.available_balance.add(money)?;
        let balance = self.balance.add(money)?;

        self.available_balance = available_balance;
        self.balance = balance;
        self.transactions.insert(id, transaction);
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), DomainError> {
        if self.status.is_locked() {
            return Err(DomainError::CardLocked);
        }
        Ok(())
    }

    fn find_transaction(&self, id: TransactionId) -> Result<&Transaction, DomainError> {
        self.transactions
            .get(&id)
            .ok_or(DomainError::Transaction(TransactionFailure::NotFound))
    }
}

/// Sum of `authorized - captured` over the given holds.
fn outstanding_holds<'a>(
    currency: &Currency,
    mut transactions: impl Iterator<Item = &'a Transaction>,
) -> Result<Money, DomainError> {
    transactions.try_fold(Money::zero(currency.clone()), |total, transaction| {
        total.add(&transaction.remaining()?)
    })
}

fn ensure_currency(expected: &Currency, money: &Money) -> Result<(), DomainError> {
    if money.currency() != expected {
        return Err(DomainError::CurrencyMismatch {
            expected: expected.clone(),
            found: money.currency().clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::status::TransactionStatus;
    use chrono::NaiveDate;

    fn gbp() -> Currency {
        Currency::new("GBP").unwrap()
    }

    fn money(amount: i64) -> Money {
        Money::new(amount, gbp()).unwrap()
    }

    fn new_year() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2018, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn loaded_card(amount: i64) -> PrepaidCard {
        let mut card = PrepaidCard::emit(gbp());
        card.load(&money(amount)).unwrap();
        card
    }

    #[test]
    fn emitted_card_is_active_and_empty() {
        let card = PrepaidCard::emit(gbp());
        assert!(card.status().is_active());
        assert_eq!(card.balance(), 0);
        assert_eq!(card.available_balance(), 0);
        assert_eq!(card.version(), 0);
    }

    #[test]
    fn lock_twice_fails() {
        let mut card = PrepaidCard::emit(gbp());
        card.lock().unwrap();
        assert_eq!(card.lock(), Err(DomainError::CardLocked));
    }

    #[test]
    fn unlock_active_card_fails() {
        let mut card = PrepaidCard::emit(gbp());
        assert_eq!(card.unlock(), Err(DomainError::CardLocked));
    }

    #[test]
    fn lock_then_unlock_keeps_balances() {
        let mut card = loaded_card(100);
        card.lock().unwrap();
        card.unlock().unwrap();
        assert!(card.status().is_active());
        assert_eq!(card.balance(), 100);
        assert_eq!(card.available_balance(), 100);
    }

    #[test]
    fn load_on_locked_card_fails() {
        let mut card = loaded_card(50);
        card.lock().unwrap();
        assert_eq!(card.load(&money(100)), Err(DomainError::CardLocked));
        assert_eq!(card.balance(), 50);
        assert_eq!(card.available_balance(), 50);
    }

    #[test]
    fn load_in_foreign_currency_fails() {
        let mut card = PrepaidCard::emit(gbp());
        let euros = Money::new(100, Currency::new("EUR").unwrap()).unwrap();
        assert!(matches!(
            card.load(&euros),
            Err(DomainError::CurrencyMismatch { .. })
        ));
        assert_eq!(card.balance(), 0);
    }

    #[test]
    fn authorization_on_locked_card_fails() {
        let mut card = loaded_card(100);
        card.lock().unwrap();
        assert_eq!(
            card.authorization_request("Coffee shop", money(100), new_year()),
            Err(DomainError::CardLocked)
        );
    }

    #[test]
    fn authorization_above_available_is_declined() {
        let mut card = loaded_card(100);
        let before = card.clone();
        assert_eq!(
            card.authorization_request("Coffee shop", money(200), new_year()),
            Err(DomainError::InsufficientFunds)
        );
        assert_eq!(card, before);
        assert_eq!(card.transactions().count(), 0);
    }

    #[test]
    fn authorization_holds_funds() {
        let mut card = loaded_card(100);
        let id = card
            .authorization_request("Coffee shop", money(60), new_year())
            .unwrap();

        assert_eq!(card.balance(), 100);
        assert_eq!(card.available_balance(), 40);
        let transaction = card.transaction(id).unwrap();
        assert_eq!(transaction.merchant(), "Coffee shop");
        assert!(!transaction.is_captured());
    }

    #[test]
    fn capture_allowed_while_locked() {
        let mut card = loaded_card(100);
        let id = card
            .authorization_request("Coffee shop", money(100), new_year())
            .unwrap();
        card.lock().unwrap();
        card.capture(id, &money(100)).unwrap();
        assert_eq!(card.balance(), 0);
    }

    #[test]
    fn partial_captures_settle_the_hold() {
        let mut card = loaded_card(100);
        let id = card
            .authorization_request("Coffee shop", money(100), new_year())
            .unwrap();
        assert_eq!(card.available_balance(), 0);

        card.capture(id, &money(70)).unwrap();
        card.capture(id, &money(30)).unwrap();

        assert_eq!(card.balance(), 0);
        assert!(card.transaction(id).unwrap().is_captured());
    }

    #[test]
    fn capture_above_authorized_fails_without_side_effects() {
        let mut card = loaded_card(100);
        let id = card
            .authorization_request("Coffee shop", money(100), new_year())
            .unwrap();
        card.capture(id, &money(100)).unwrap();

        let before = card.clone();
        assert_eq!(
            card.capture(id, &money(100)),
            Err(DomainError::InsufficientFunds)
        );
        assert_eq!(card, before);
    }

    #[test]
    fn capture_unknown_transaction_fails() {
        let mut card = loaded_card(100);
        assert_eq!(
            card.capture(TransactionId::new(), &money(10)),
            Err(DomainError::Transaction(TransactionFailure::NotFound))
        );
    }

    #[test]
    fn reverse_captured_transaction_fails() {
        let mut card = loaded_card(100);
        let id = card
            .authorization_request("Coffee shop", money(100), new_year())
            .unwrap();
        card.capture(id, &money(100)).unwrap();
        assert_eq!(
            card.reverse(id, &money(100)),
            Err(DomainError::Transaction(TransactionFailure::Captured))
        );
    }

    #[test]
    fn reverse_more_than_authorized_fails() {
        let mut card = loaded_card(100);
        let id = card
            .authorization_request("Coffee shop", money(100), new_year())
            .unwrap();
        assert_eq!(
            card.reverse(id, &money(200)),
            Err(DomainError::Transaction(TransactionFailure::Captured))
        );
        assert_eq!(card.available_balance(), 0);
    }

    #[test]
    fn reverse_unknown_transaction_fails() {
        let mut card = loaded_card(100);
        assert_eq!(
            card.reverse(TransactionId::new(), &money(100)),
            Err(DomainError::Transaction(TransactionFailure::NotFound))
        );
    }

    #[test]
    fn reverse_can_be_repeated() {
        let mut card = loaded_card(100);
        let id = card
            .authorization_request("Coffee shop", money(100), new_year())
            .unwrap();
        card.reverse(id, &money(20)).unwrap();
        card.reverse(id, &money(20)).unwrap();
        assert_eq!(card.available_balance(), 40);
        assert_eq!(card.balance(), 100);
    }

    #[test]
    fn refund_more_than_captured_fails() {
        let mut card = loaded_card(100);
        let id = card
            .authorization_request("Coffee shop", money(100), new_year())
            .unwrap();
        card.capture(id, &money(50)).unwrap();
        assert_eq!(
            card.refund(id, &money(60)),
            Err(DomainError::Transaction(TransactionFailure::CannotRefund))
        );
        assert_eq!(card.balance(), 50);
    }

    #[test]
    fn refund_restores_both_balances() {
        let mut card = loaded_card(100);
        let id = card
            .authorization_request("Coffee shop", money(100), new_year())
            .unwrap();
        card.capture(id, &money(100)).unwrap();
        card.refund(id, &money(40)).unwrap();
        assert_eq!(card.balance(), 40);
        assert_eq!(card.available_balance(), 40);
    }

    fn assert_holds_add_up(card: &PrepaidCard) {
        let outstanding: i64 = card
            .transactions()
            .map(|t| t.remaining().unwrap().amount())
            .sum();
        assert_eq!(card.available_balance(), card.balance() - outstanding);
        assert!(card.available_balance() <= card.balance());
    }

    #[test]
    fn refunded_money_cannot_be_captured_again() {
        let mut card = loaded_card(100);
        let id = card
            .authorization_request("Coffee shop", money(100), new_year())
            .unwrap();
        card.capture(id, &money(100)).unwrap();
        card.refund(id, &money(100)).unwrap();
        assert_holds_add_up(&card);

        let before = card.clone();
        assert_eq!(
            card.capture(id, &money(100)),
            Err(DomainError::InsufficientFunds)
        );
        assert_eq!(card, before);
        assert_eq!(card.balance(), 100);
        assert_eq!(card.available_balance(), 100);
    }

    #[test]
    fn partial_refund_keeps_the_rest_of_the_hold() {
        let mut card = loaded_card(100);
        let id = card
            .authorization_request("Coffee shop", money(100), new_year())
            .unwrap();
        card.capture(id, &money(50)).unwrap();
        card.refund(id, &money(50)).unwrap();
        assert_eq!(card.balance(), 100);
        assert_eq!(card.available_balance(), 50);
        assert_holds_add_up(&card);

        assert_eq!(
            card.capture(id, &money(100)),
            Err(DomainError::InsufficientFunds)
        );
        card.capture(id, &money(50)).unwrap();
        assert_eq!(card.balance(), 50);
        assert_eq!(card.available_balance(), 50);
        assert_holds_add_up(&card);
    }

    #[test]
    fn restore_accepts_consistent_state() {
        let mut card = loaded_card(100);
        let id = card
            .authorization_request("Coffee shop", money(80), new_year())
            .unwrap();
        card.capture(id, &money(30)).unwrap();

        let restored = PrepaidCard::restore(
            card.number(),
            card.status(),
            money(card.balance()),
            money(card.available_balance()),
            gbp(),
            card.transactions().cloned().collect(),
            3,
        )
        .unwrap();
        assert_eq!(restored.available_balance(), 20);
        assert_eq!(restored.version(), 3);
    }

    #[test]
    fn restore_rejects_available_above_balance() {
        let result = PrepaidCard::restore(
            CardNumber::from_u32(123_456),
            CardStatus::active(),
            money(0),
            money(100),
            gbp(),
            Vec::new(),
            1,
        );
        assert!(matches!(result, Err(DomainError::CorruptState(_))));
    }

    #[test]
    fn restore_rejects_transactions_in_another_currency() {
        let euros = |amount| Money::new(amount, Currency::new("EUR").unwrap()).unwrap();
        let transaction = Transaction::restore(
            TransactionId::new(),
            "Shop".to_string(),
            euros(10),
            euros(5),
            new_year(),
            TransactionStatus::authorized(),
        )
        .unwrap();

        let result = PrepaidCard::restore(
            CardNumber::from_u32(123_456),
            CardStatus::active(),
            money(10),
            money(5),
            gbp(),
            vec![transaction],
            1,
        );
        assert!(matches!(result, Err(DomainError::CorruptState(_))));
    }

    #[test]
    fn balance_summary_uses_major_units() {
        let card = loaded_card(250);
        assert_eq!(
            card.balance_summary(),
            "Balance: GBP 2.50 Available balance: GBP 2.50"
        );
    }
}
