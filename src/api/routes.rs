//! API Routes
//!
//! HTTP endpoint definitions.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::middleware::{context_middleware, logging_middleware};

use crate::domain::{Cancellation, OperationContext};
use crate::error::AppError;
use crate::events::EventDispatcher;
use crate::handlers::{
    CreateAccountHandler, CreateAccountInput, CreateAccountOutput, CreateClientHandler,
    CreateClientInput, CreateClientOutput, CreateTransactionHandler, CreateTransactionInput,
    CreateTransactionOutput,
};
use crate::store::TransactionalStore;
use crate::uow::UnitOfWork;

// =========================================================================
// Application state
// =========================================================================

/// Use-case handlers shared by every request
pub struct AppState<S: TransactionalStore> {
    pub clients: Arc<CreateClientHandler<S>>,
    pub accounts: Arc<CreateAccountHandler<S>>,
    pub transactions: Arc<CreateTransactionHandler<S>>,
    /// Cancelled when the server starts shutting down
    pub shutdown: Cancellation,
}

impl<S: TransactionalStore> AppState<S> {
    pub fn new(uow: Arc<UnitOfWork<S>>, dispatcher: Arc<EventDispatcher>) -> Self {
        Self {
            clients: Arc::new(CreateClientHandler::new(Arc::clone(&uow))),
            accounts: Arc::new(CreateAccountHandler::new(Arc::clone(&uow))),
            transactions: Arc::new(CreateTransactionHandler::new(uow, dispatcher)),
            shutdown: Cancellation::new(),
        }
    }
}

impl<S: TransactionalStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            clients: Arc::clone(&self.clients),
            accounts: Arc::clone(&self.accounts),
            transactions: Arc::clone(&self.transactions),
            shutdown: self.shutdown.clone(),
        }
    }
}

// =========================================================================
// Router
// =========================================================================

/// Build the application router with its middleware stack
pub fn create_router<S: TransactionalStore>(state: AppState<S>) -> Router {
    // Context must be attached before the logging middleware reads it
    let api = Router::new()
        .route("/clients", post(create_client::<S>))
        .route("/accounts", post(create_account::<S>))
        .route("/transactions", post(create_transaction::<S>))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn_with_state(
                    state.shutdown.clone(),
                    context_middleware,
                ))
                .layer(middleware::from_fn(logging_middleware)),
        );

    Router::new()
        .route("/health", get(health_check))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))
}

// =========================================================================
// POST /clients
// =========================================================================

async fn create_client<S: TransactionalStore>(
    State(state): State<AppState<S>>,
    Extension(context): Extension<OperationContext>,
    payload: Result<Json<CreateClientInput>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateClientOutput>), AppError> {
    let input = json_body(payload)?;
    let output = state.clients.execute(input, &context).await?;
    Ok((StatusCode::CREATED, Json(output)))
}

// =========================================================================
// POST /accounts
// =========================================================================

async fn create_account<S: TransactionalStore>(
    State(state): State<AppState<S>>,
    Extension(context): Extension<OperationContext>,
    payload: Result<Json<CreateAccountInput>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateAccountOutput>), AppError> {
    let input = json_body(payload)?;
    let output = state.accounts.execute(input, &context).await?;
    Ok((StatusCode::CREATED, Json(output)))
}

// =========================================================================
// POST /transactions
// =========================================================================

async fn create_transaction<S: TransactionalStore>(
    State(state): State<AppState<S>>,
    Extension(context): Extension<OperationContext>,
    payload: Result<Json<CreateTransactionInput>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateTransactionOutput>), AppError> {
    let input = json_body(payload)?;
    let output = state.transactions.execute(input, &context).await?;
    Ok((StatusCode::CREATED, Json(output)))
}
