//! Account entity
//!
//! An account belongs to a client and holds a non-negative balance.
//! The balance only changes through `credit` and `debit`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Amount, Balance, Client, DomainError};

/// Wallet account.
///
/// The owning client is shared: an account never controls the client's
/// lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    id: Uuid,
    client: Arc<Client>,
    balance: Balance,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Account {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Open a new account with a zero balance.
    pub fn new(client: Arc<Client>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            client,
            balance: Balance::zero(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild an account from stored state.
    pub fn from_db_state(
        id: Uuid,
        client: Arc<Client>,
        balance: Balance,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            client,
            balance,
            created_at,
            updated_at,
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Credit (deposit) money to the account
    pub fn credit(&mut self, amount: &Amount) -> Result<(), DomainError> {
        let balance = self.balance.credit(amount)?;
        self.set_balance(balance);
        Ok(())
    }

    /// Debit (withdraw) money from the account
    ///
    /// Fails without touching the balance if it does not cover `amount`.
    pub fn debit(&mut self, amount: &Amount) -> Result<(), DomainError> {
        if !self.balance.is_sufficient_for(amount) {
            return Err(DomainError::insufficient_funds(
                amount.value(),
                self.balance.value(),
            ));
        }
        let balance = self.balance.debit(amount)?;
        self.set_balance(balance);
        Ok(())
    }

    pub(crate) fn set_balance(&mut self, balance: Balance) {
        self.balance = balance;
        self.updated_at = Utc::now();
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    pub fn balance(&self) -> Balance {
        self.balance
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn account() -> Account {
        let client = Client::new("John", "j@j.com").unwrap();
        Account::new(Arc::new(client))
    }

    #[test]
    fn test_new_account_is_empty() {
        let account = account();
        assert_eq!(account.balance().value(), dec!(0));
        assert_eq!(account.client().name, "John");
    }

    #[test]
    fn test_account_credit() {
        let mut account = account();
        account.credit(&Amount::from_integer(100).unwrap()).unwrap();
        assert_eq!(account.balance().value(), dec!(100));
    }

    #[test]
    fn test_account_debit() {
        let mut account = account();
        account.credit(&Amount::from_integer(100).unwrap()).unwrap();
        account.debit(&Amount::from_integer(30).unwrap()).unwrap();
        assert_eq!(account.balance().value(), dec!(70));
    }

    #[test]
    fn test_account_exact_balance_debit() {
        let mut account = account();
        account.credit(&Amount::from_integer(100).unwrap()).unwrap();
        account.debit(&Amount::from_integer(100).unwrap()).unwrap();
        assert_eq!(account.balance().value(), dec!(0));
    }

    #[test]
    fn test_account_insufficient_funds() {
        let mut account = account();
        account.credit(&Amount::from_integer(50).unwrap()).unwrap();

        let result = account.debit(&Amount::from_integer(100).unwrap());

        assert_eq!(
            result,
            Err(DomainError::insufficient_funds(dec!(100), dec!(50)))
        );
        assert_eq!(account.balance().value(), dec!(50));
    }

    #[test]
    fn test_account_credit_overflow() {
        let mut account = account();
        account
            .credit(&Amount::new(dec!(1000000000000)).unwrap())
            .unwrap();

        let result = account.credit(&Amount::from_integer(1).unwrap());

        assert_eq!(result, Err(DomainError::BalanceOverflow));
        assert_eq!(account.balance().value(), dec!(1000000000000));
    }

    #[test]
    fn test_clients_are_shared() {
        let client = Arc::new(Client::new("Jane", "jane@example.com").unwrap());
        let first = Account::new(Arc::clone(&client));
        let second = Account::new(Arc::clone(&client));

        assert!(Arc::ptr_eq(first.client(), second.client()));
        assert_ne!(first.id(), second.id());
    }
}
