//! Property tests for money arithmetic.

use prepaid_card_server::models::{Currency, DomainError, Money};
use proptest::prelude::*;

fn gbp() -> Currency {
    Currency::new("GBP").unwrap()
}

fn usd() -> Currency {
    Currency::new("USD").unwrap()
}

proptest! {
    #[test]
    fn add_and_deduct_match_integer_arithmetic(a in 0i64..1_000_000_000, b in 0i64..1_000_000_000) {
        let (big, small) = if a >= b { (a, b) } else { (b, a) };
        let big_money = Money::new(big, gbp()).unwrap();
        let small_money = Money::new(small, gbp()).unwrap();

        prop_assert_eq!(big_money.deduct(&small_money).unwrap().amount(), big - small);
        prop_assert_eq!(big_money.add(&small_money).unwrap().amount(), big + small);
    }

    #[test]
    fn negative_amounts_never_construct(amount in i64::MIN..0) {
        prop_assert_eq!(Money::new(amount, gbp()), Err(DomainError::NegativeAmount));
    }

    #[test]
    fn deducting_more_than_held_fails(a in 0i64..1_000_000, extra in 1i64..1_000_000) {
        let held = Money::new(a, gbp()).unwrap();
        let wanted = Money::new(a + extra, gbp()).unwrap();
        prop_assert_eq!(held.deduct(&wanted), Err(DomainError::NegativeAmount));
    }

    #[test]
    fn mixed_currencies_always_fail(a in 0i64..1_000_000, b in 0i64..1_000_000) {
        let pounds = Money::new(a, gbp()).unwrap();
        let dollars = Money::new(b, usd()).unwrap();

        let is_mismatch = |result: Result<_, DomainError>| {
            matches!(result, Err(DomainError::CurrencyMismatch { .. }))
        };
        prop_assert!(is_mismatch(pounds.add(&dollars).map(|_| ())));
        prop_assert!(is_mismatch(pounds.deduct(&dollars).map(|_| ())));
        prop_assert!(is_mismatch(pounds.is_more_than(&dollars).map(|_| ())));
        prop_assert!(is_mismatch(pounds.is_less_than(&dollars).map(|_| ())));
        prop_assert!(is_mismatch(pounds.is_equal(&dollars).map(|_| ())));
    }

    #[test]
    fn comparisons_agree_with_integers(a in 0i64..1_000_000, b in 0i64..1_000_000) {
        let left = Money::new(a, gbp()).unwrap();
        let right = Money::new(b, gbp()).unwrap();

        prop_assert_eq!(left.is_more_than(&right).unwrap(), a > b);
        prop_assert_eq!(left.is_less_than(&right).unwrap(), a < b);
        prop_assert_eq!(left.is_equal(&right).unwrap(), a == b);
    }
}
