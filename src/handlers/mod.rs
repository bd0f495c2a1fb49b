//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params)
//! 2. Calls one `CardService` operation
//! 3. Returns a JSON response, or an `AppError` rendered as one

use crate::services::CardService;

/// Card lifecycle and payment endpoints
pub mod cards;
/// Service health endpoint
pub mod health;

/// State shared with every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: CardService,

    /// Currency for cards emitted without one.
    pub default_currency: String,
}
