//! Create Client Handler

use std::sync::Arc;

use crate::domain::{Client, OperationContext};
use crate::error::AppError;
use crate::store::TransactionalStore;
use crate::uow::UnitOfWork;

use super::{CreateClientInput, CreateClientOutput};

/// Handler for client registration
pub struct CreateClientHandler<S: TransactionalStore> {
    uow: Arc<UnitOfWork<S>>,
}

impl<S: TransactionalStore> CreateClientHandler<S> {
    pub fn new(uow: Arc<UnitOfWork<S>>) -> Self {
        Self { uow }
    }

    pub async fn execute(
        &self,
        input: CreateClientInput,
        context: &OperationContext,
    ) -> Result<CreateClientOutput, AppError> {
        let client = Client::new(input.name, input.email)?;

        let saved = client.clone();
        self.uow
            .run(context, |scope| async move {
                scope.clients()?.save(&saved).await?;
                Ok::<_, AppError>(())
            })
            .await?;

        Ok(client.into())
    }
}
