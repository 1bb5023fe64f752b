//! Create Account Handler

use std::sync::Arc;

use crate::domain::{Account, OperationContext};
use crate::error::AppError;
use crate::store::TransactionalStore;
use crate::uow::UnitOfWork;

use super::{CreateAccountInput, CreateAccountOutput};

/// Opens a zero-balance account for an existing client
pub struct CreateAccountHandler<S: TransactionalStore> {
    uow: Arc<UnitOfWork<S>>,
}

impl<S: TransactionalStore> CreateAccountHandler<S> {
    pub fn new(uow: Arc<UnitOfWork<S>>) -> Self {
        Self { uow }
    }

    pub async fn execute(
        &self,
        input: CreateAccountInput,
        context: &OperationContext,
    ) -> Result<CreateAccountOutput, AppError> {
        let account_id = self
            .uow
            .run(context, |scope| async move {
                let client = scope.clients()?.get(input.client_id).await?;
                let account = Account::new(Arc::new(client));
                scope.accounts()?.save(&account).await?;
                Ok::<_, AppError>(account.id())
            })
            .await?;

        Ok(CreateAccountOutput { account_id })
    }
}
