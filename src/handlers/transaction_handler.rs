//! Create Transaction Handler
//!
//! Moves funds between two accounts inside one unit of work, then notifies
//! the dispatcher once the unit of work has committed.

use std::sync::Arc;

use crate::domain::{
    Amount, BalanceUpdated, DomainError, Event, OperationContext, Transaction, TransactionCreated,
};
use crate::error::AppError;
use crate::events::EventDispatcher;
use crate::store::TransactionalStore;
use crate::uow::UnitOfWork;

use super::{CreateTransactionInput, CreateTransactionOutput};

/// Handler for transfers between accounts
pub struct CreateTransactionHandler<S: TransactionalStore> {
    uow: Arc<UnitOfWork<S>>,
    dispatcher: Arc<EventDispatcher>,
}

impl<S: TransactionalStore> CreateTransactionHandler<S> {
    pub fn new(uow: Arc<UnitOfWork<S>>, dispatcher: Arc<EventDispatcher>) -> Self {
        Self { uow, dispatcher }
    }

    /// Execute the transfer.
    ///
    /// On error nothing is written and no event is dispatched. Dispatch
    /// failures after commit are logged only; the transfer stands. Once the
    /// unit of work has committed, dropping the returned future no longer
    /// stops the events from being dispatched.
    pub async fn execute(
        &self,
        input: CreateTransactionInput,
        context: &OperationContext,
    ) -> Result<CreateTransactionOutput, AppError> {
        let CreateTransactionInput {
            account_id_from,
            account_id_to,
            amount,
        } = input;

        // Invalid amounts fail before any account is touched
        Amount::new(amount).map_err(DomainError::from)?;

        let (transaction, balance_from, balance_to) = self
            .uow
            .run(context, |scope| async move {
                let accounts = scope.accounts()?;

                // Lock rows in id order so opposite transfers cannot deadlock
                let (mut from, mut to) = if account_id_from <= account_id_to {
                    let from = accounts.find_by_id(account_id_from).await?;
                    let to = accounts.find_by_id(account_id_to).await?;
                    (from, to)
                } else {
                    let to = accounts.find_by_id(account_id_to).await?;
                    let from = accounts.find_by_id(account_id_from).await?;
                    (from, to)
                };

                let transaction = Transaction::new(&mut from, &mut to, amount)?;

                accounts.update_balance(&from).await?;
                accounts.update_balance(&to).await?;
                scope.transactions()?.create(&transaction).await?;

                Ok::<_, AppError>((transaction, from.balance().value(), to.balance().value()))
            })
            .await?;

        tracing::info!(
            correlation_id = ?context.correlation_id,
            transaction_id = %transaction.id(),
            from = %account_id_from,
            to = %account_id_to,
            amount = %transaction.amount(),
            "Transfer committed"
        );

        let output = CreateTransactionOutput::from(&transaction);

        let events = [
            Event::transaction_created(TransactionCreated {
                id: output.id,
                account_id_from: output.account_id_from,
                account_id_to: output.account_id_to,
                amount: output.amount,
            }),
            Event::balance_updated(BalanceUpdated {
                account_id_from: output.account_id_from,
                account_id_to: output.account_id_to,
                balance_account_id_from: balance_from,
                balance_account_id_to: balance_to,
            }),
        ];

        // Both events are delivered in order even if this future is dropped
        let dispatcher = Arc::clone(&self.dispatcher);
        let correlation_id = context.correlation_id;
        let transaction_id = output.id;
        let delivery = tokio::spawn(async move {
            for event in events {
                let name = event.name();
                let report = dispatcher.dispatch(event).await;
                if !report.is_clean() {
                    tracing::warn!(
                        correlation_id = ?correlation_id,
                        transaction_id = %transaction_id,
                        event = %name,
                        failed = report.failed,
                        "Event dispatch incomplete"
                    );
                }
            }
        });

        if let Err(err) = delivery.await {
            tracing::error!(
                correlation_id = ?context.correlation_id,
                transaction_id = %output.id,
                error = %err,
                "Event dispatch task failed"
            );
        }

        Ok(output)
    }
}
