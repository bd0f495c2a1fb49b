//! Prepaid card service.
//!
//! Models a prepaid card's lifecycle: emission, lock/unlock, loading funds,
//! and two-phase payments (authorization hold, then capture, reverse or
//! refund) with integer, currency-checked money.
//!
//! # Layers
//!
//! - [`models`]: money, statuses, transactions and the card aggregate
//! - [`repositories`]: card storage (in-memory or PostgreSQL)
//! - [`services`]: load, apply one operation, save
//! - [`handlers`]: axum HTTP handlers over the service

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod services;
