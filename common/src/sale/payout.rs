use indexmap::IndexMap;
use log::trace;

use crate::{crypto::Address, error::PaymentError};

/// Destination of every native-value payment the controller makes.
///
/// The controller decrements its own bookkeeping before calling `pay` and
/// restores it if `pay` fails, so a sink that calls back into the
/// controller can never collect the same entry twice.
pub trait PaymentSink {
    fn pay(&mut self, to: &Address, amount: u64) -> Result<(), PaymentError>;
}

/// In-memory native value balances.
#[derive(Debug, Clone, Default)]
pub struct NativeVault {
    balances: IndexMap<Address, u64>,
}

impl NativeVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, account: &Address) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn credit(&mut self, account: &Address, amount: u64) -> Result<(), PaymentError> {
        let balance = self
            .balance_of(account)
            .checked_add(amount)
            .ok_or(PaymentError::Overflow)?;
        self.balances.insert(*account, balance);
        Ok(())
    }

    pub fn debit(&mut self, account: &Address, amount: u64) -> Result<(), PaymentError> {
        let have = self.balance_of(account);
        let balance = have
            .checked_sub(amount)
            .ok_or(PaymentError::InsufficientFunds {
                account: *account,
                need: amount,
                have,
            })?;
        self.balances.insert(*account, balance);
        Ok(())
    }

    pub fn balances(&self) -> &IndexMap<Address, u64> {
        &self.balances
    }
}

impl PaymentSink for NativeVault {
    fn pay(&mut self, to: &Address, amount: u64) -> Result<(), PaymentError> {
        trace!("Paying {} to {}", amount, to);
        self.credit(to, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vault_credit_debit() {
        let alice = Address::new([1; 32]);
        let mut vault = NativeVault::new();

        vault.credit(&alice, 100).unwrap();
        vault.debit(&alice, 40).unwrap();
        assert_eq!(vault.balance_of(&alice), 60);

        assert_eq!(
            vault.debit(&alice, 61),
            Err(PaymentError::InsufficientFunds {
                account: alice,
                need: 61,
                have: 60
            })
        );
        assert_eq!(vault.balance_of(&alice), 60);

        vault.credit(&alice, u64::MAX - 60).unwrap();
        assert_eq!(vault.pay(&alice, 1), Err(PaymentError::Overflow));
    }
}
