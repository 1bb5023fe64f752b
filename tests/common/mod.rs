//! Common test utilities
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::Mutex;
use uuid::Uuid;

use wallet_core::events::{EventDispatcher, EventHandler};
use wallet_core::handlers::{
    CreateAccountHandler, CreateAccountInput, CreateClientHandler, CreateClientInput,
};
use wallet_core::{Amount, Event, EventName, OperationContext, UnitOfWork, UowError};
use wallet_core::{MemoryStore, TransactionalStore};

/// Keeps every event it sees
#[derive(Default)]
pub struct RecordingHandler {
    events: Mutex<Vec<Event>>,
}

impl RecordingHandler {
    pub async fn events(&self) -> Vec<Event> {
        self.events.lock().await.clone()
    }

    pub async fn names(&self) -> Vec<EventName> {
        self.events.lock().await.iter().map(|e| e.name()).collect()
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    fn name(&self) -> &str {
        "recording"
    }

    async fn handle(&self, event: &Event) -> anyhow::Result<()> {
        self.events.lock().await.push(event.clone());
        Ok(())
    }
}

/// Dispatcher with a recording handler on every event name
pub fn recording_dispatcher() -> (Arc<EventDispatcher>, Arc<RecordingHandler>) {
    let dispatcher = Arc::new(EventDispatcher::new());
    let recorder = Arc::new(RecordingHandler::default());
    for name in EventName::ALL {
        dispatcher
            .register(name, recorder.clone())
            .expect("fresh dispatcher");
    }
    (dispatcher, recorder)
}

pub fn memory_uow() -> (MemoryStore, Arc<UnitOfWork<MemoryStore>>) {
    let store = MemoryStore::new();
    let uow = Arc::new(store.clone().unit_of_work());
    (store, uow)
}

/// Create a client plus an account funded with `balance`
pub async fn seed_account<S: TransactionalStore>(
    uow: &Arc<UnitOfWork<S>>,
    balance: Decimal,
) -> Uuid {
    let ctx = OperationContext::new();
    let client = CreateClientHandler::new(uow.clone())
        .execute(CreateClientInput::new("Test Client", "client@example.com"), &ctx)
        .await
        .expect("create client");
    let account_id = CreateAccountHandler::new(uow.clone())
        .execute(
            CreateAccountInput {
                client_id: client.id,
            },
            &ctx,
        )
        .await
        .expect("create account")
        .account_id;

    if balance > Decimal::ZERO {
        let amount = Amount::new(balance).expect("valid seed balance");
        uow.run(&ctx, |scope| async move {
            let accounts = scope.accounts()?;
            let mut account = accounts.find_by_id(account_id).await?;
            account.credit(&amount).expect("credit seed balance");
            accounts.update_balance(&account).await?;
            Ok::<_, UowError>(())
        })
        .await
        .expect("fund account");
    }

    account_id
}

/// Setup test database - truncate wallet tables
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::query("TRUNCATE TABLE transactions, accounts, clients CASCADE")
        .execute(&pool)
        .await
        .expect("Failed to clean up DB");

    pool
}
