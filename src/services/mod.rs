//! Business logic services.
//!
//! Services sit between the HTTP handlers and the domain model. They turn
//! request values into domain values, load the card, apply one operation
//! and persist the result.

pub mod card_service;

pub use card_service::CardService;
