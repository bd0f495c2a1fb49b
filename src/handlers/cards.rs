//! Prepaid card HTTP handlers.
//!
//! This module implements the card API endpoints:
//! - POST /api/v1/cards - Emit a new card
//! - GET /api/v1/cards/{card_number} - Balance of a card
//! - GET /api/v1/cards/{card_number}/transactions - Transactions of a card
//! - PATCH /api/v1/cards/deposit - Load funds
//! - PATCH /api/v1/cards/lock - Lock a card
//! - PATCH /api/v1/cards/unlock - Unlock a card
//! - POST /api/v1/cards/authorize - Place an authorization hold
//! - POST /api/v1/cards/capture - Capture a hold
//! - POST /api/v1/cards/reverse - Release part of a hold
//! - POST /api/v1/cards/refund - Refund captured money

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    error::AppError,
    handlers::AppState,
    models::{
        CardNumber, CardStatus, TransactionId,
        requests::{
            AuthorizeRequest, AuthorizeResponse, CardNumberRequest, CardResponse,
            CardStatusResponse, DepositRequest, DepositResponse, EmitCardRequest,
            SettlementRequest, SettlementResponse, TransactionResponse,
        },
    },
};

/// Emit a new card.
///
/// # Request Body
///
/// Optional. When present:
///
/// ```json
/// { "currency": "EUR" }
/// ```
///
/// # Response (201 Created)
///
/// ```json
/// {
///   "card_number": 123456,
///   "currency": "GBP",
///   "status": "active",
///   "balance": 0,
///   "available_balance": 0,
///   "summary": "Balance: GBP 0.00 Available balance: GBP 0.00"
/// }
/// ```
pub async fn emit_card(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<CardResponse>), AppError> {
    // An empty body is allowed and means "use the default currency"
    let request: EmitCardRequest = if body.is_empty() {
        EmitCardRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::InvalidRequest(format!("Invalid request body: {e}")))?
    };

    let currency = request
        .currency
        .as_deref()
        .unwrap_or(&state.default_currency);
    let card = state.service.emit_card(currency).await?;

    Ok((StatusCode::CREATED, Json(CardResponse::from(&card))))
}

/// Show a card's balance and available balance.
///
/// # Response
///
/// - **Success (200 OK)**: card balance view
/// - **Error (404)**: no such card
pub async fn display_balance(
    State(state): State<AppState>,
    Path(card_number): Path<u32>,
) -> Result<Json<CardResponse>, AppError> {
    let card = state.service.display_balance(card_number).await?;
    Ok(Json(CardResponse::from(&card)))
}

/// List every transaction on a card, oldest first.
pub async fn list_transactions(
    State(state): State<AppState>,
    Path(card_number): Path<u32>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let transactions = state.service.list_transactions(card_number).await?;
    Ok(Json(transactions.iter().map(TransactionResponse::from).collect()))
}

/// Load funds onto a card.
///
/// # Request Body
///
/// ```json
/// { "card_number": 123456, "amount": 10000 }
/// ```
///
/// # Errors
///
/// - **422**: the card is locked
/// - **400**: negative amount
pub async fn deposit(
    State(state): State<AppState>,
    Json(request): Json<DepositRequest>,
) -> Result<Json<DepositResponse>, AppError> {
    state
        .service
        .make_deposit(request.card_number, request.amount)
        .await?;

    Ok(Json(DepositResponse {
        card_number: CardNumber::from_u32(request.card_number),
        amount: request.amount,
    }))
}

/// Lock a card. Locking a locked card fails with `card_locked`.
pub async fn lock(
    State(state): State<AppState>,
    Json(request): Json<CardNumberRequest>,
) -> Result<Json<CardStatusResponse>, AppError> {
    state.service.lock_card(request.card_number).await?;

    Ok(Json(CardStatusResponse {
        card_number: CardNumber::from_u32(request.card_number),
        status: CardStatus::Locked,
    }))
}

/// Unlock a card. Unlocking an active card fails with `card_locked`.
pub async fn unlock(
    State(state): State<AppState>,
    Json(request): Json<CardNumberRequest>,
) -> Result<Json<CardStatusResponse>, AppError> {
    state.service.unlock_card(request.card_number).await?;

    Ok(Json(CardStatusResponse {
        card_number: CardNumber::from_u32(request.card_number),
        status: CardStatus::Active,
    }))
}

/// Place an authorization hold.
///
/// # Request Body
///
/// ```json
/// {
///   "card_number": 123456,
///   "merchant": "Coffee shop",
///   "amount": 350,
///   "date": "2018-01-01"
/// }
/// ```
///
/// # Response (200)
///
/// ```json
/// {
///   "card_number": 123456,
///   "merchant": "Coffee shop",
///   "transaction_amount": 350,
///   "transaction_id": "550e8400-e29b-41d4-a716-446655440000"
/// }
/// ```
pub async fn authorize(
    State(state): State<AppState>,
    Json(request): Json<AuthorizeRequest>,
) -> Result<Json<AuthorizeResponse>, AppError> {
    let transaction_id = state
        .service
        .make_authorization_request(
            &request.merchant,
            request.card_number,
            request.amount,
            &request.date,
        )
        .await?;

    Ok(Json(AuthorizeResponse {
        card_number: CardNumber::from_u32(request.card_number),
        merchant: request.merchant,
        transaction_amount: request.amount,
        transaction_id,
    }))
}

/// Capture all or part of a hold.
pub async fn capture(
    State(state): State<AppState>,
    Json(request): Json<SettlementRequest>,
) -> Result<Json<SettlementResponse>, AppError> {
    state
        .service
        .make_capture(request.card_number, &request.transaction_id, request.amount)
        .await?;
    settlement_response(request)
}

/// Release part of an uncaptured hold.
pub async fn reverse(
    State(state): State<AppState>,
    Json(request): Json<SettlementRequest>,
) -> Result<Json<SettlementResponse>, AppError> {
    state
        .service
        .make_reverse(request.card_number, &request.transaction_id, request.amount)
        .await?;
    settlement_response(request)
}

/// Refund captured money.
pub async fn refund(
    State(state): State<AppState>,
    Json(request): Json<SettlementRequest>,
) -> Result<Json<SettlementResponse>, AppError> {
    state
        .service
        .make_refund(request.card_number, &request.transaction_id, request.amount)
        .await?;
    settlement_response(request)
}

fn settlement_response(request: SettlementRequest) -> Result<Json<SettlementResponse>, AppError> {
    // The service already accepted this id, so it parses
    let transaction_id: TransactionId = request
        .transaction_id
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidRequest("Invalid transaction id".to_string()))?;

    Ok(Json(SettlementResponse {
        card_number: CardNumber::from_u32(request.card_number),
        transaction_id,
        transaction_amount: request.amount,
    }))
}
