//! Sale Token Ledger
//!
//! Fungible balance store for the token issued by the sale, with the
//! ERC20-like surface (transfer, approve, transferFrom, burn) and a global
//! transferability gate.
//!
//! # Gate
//!
//! While `locked` is set, `transfer` and `transfer_from` are rejected with
//! `TransfersLocked` unless the caller is the current owner. The sale
//! controller owns the ledger during the sale, so it can still move supply
//! out of custody while every other holder is frozen.
//!
//! All arithmetic is checked; an overflow rejects the call.

mod types;


pub use types::*;

use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, trace};

use crate::{
    config::TokenConfig,
    crypto::Address,
    error::LedgerError,
    events::{EventLog, LedgerEvent},
};

#[derive(Debug, Clone)]
pub struct Ledger {
    name: String,
    symbol: String,
    decimals: u8,
    total_supply: u64,
    balances: IndexMap<Address, u64>,
    // (owner, spender) -> remaining allowance
    allowances: HashMap<(Address, Address), u64>,
    owner: Address,
    locked: bool,
    events: EventLog<LedgerEvent>,
}

impl Ledger {
    /// Create the ledger with the whole supply credited to `owner`.
    /// Starts locked.
    pub fn new(owner: Address, token: TokenConfig) -> Result<Self, LedgerError> {
        token.validate().map_err(LedgerError::InvalidMetadata)?;

        let mut balances = IndexMap::new();
        balances.insert(owner, token.total_supply);

        debug!(
            "Created ledger {} ({}) with supply {} owned by {}",
            token.name, token.symbol, token.total_supply, owner
        );

        Ok(Self {
            name: token.name,
            symbol: token.symbol,
            decimals: token.decimals,
            total_supply: token.total_supply,
            balances,
            allowances: HashMap::new(),
            owner,
            locked: true,
            events: EventLog::default(),
        })
    }

    // ===== Queries =====

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    pub fn balance_of(&self, account: &Address) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u64 {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn locked(&self) -> bool {
        self.locked
    }

    /// Accounts holding a non-zero balance, in first-credit order.
    pub fn holders(&self) -> impl Iterator<Item = (&Address, u64)> {
        self.balances
            .iter()
            .filter(|(_, balance)| **balance > 0)
            .map(|(account, balance)| (account, *balance))
    }

    pub fn events(&self) -> &[LedgerEvent] {
        self.events.as_slice()
    }

    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        self.events.drain()
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            decimals: self.decimals,
            total_supply: self.total_supply,
            owner: self.owner,
            locked: self.locked,
            balances: self
                .holders()
                .map(|(account, balance)| (*account, balance))
                .collect(),
        }
    }

    // ===== Transfer family =====

    pub fn transfer(
        &mut self,
        caller: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<(), LedgerError> {
        self.require_transferable(caller)?;
        self.move_balance(caller, to, amount)
    }

    /// Move `amount` from `from` to `to`, spending the caller's allowance.
    pub fn transfer_from(
        &mut self,
        caller: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<(), LedgerError> {
        self.require_transferable(caller)?;

        let allowance = self.allowance(from, caller);
        if allowance < amount {
            return Err(LedgerError::InsufficientAllowance {
                need: amount,
                have: allowance,
            });
        }

        self.move_balance(from, to, amount)?;
        self.allowances.insert((*from, *caller), allowance - amount);
        Ok(())
    }

    /// Set the allowance of `spender` over the caller's balance.
    /// Not gated: approvals may be prepared while the ledger is locked.
    pub fn approve(
        &mut self,
        caller: &Address,
        spender: &Address,
        amount: u64,
    ) -> Result<(), LedgerError> {
        self.allowances.insert((*caller, *spender), amount);
        trace!("{} approved {} for {}", caller, spender, amount);
        self.events.emit(LedgerEvent::Approval {
            owner: *caller,
            spender: *spender,
            amount,
        });
        Ok(())
    }

    /// Destroy `amount` of the owner's own balance.
    pub fn burn(&mut self, caller: &Address, amount: u64) -> Result<(), LedgerError> {
        self.require_owner(caller)?;

        let balance = self.balance_of(caller);
        let remaining = balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                need: amount,
                have: balance,
            })?;
        let supply = self
            .total_supply
            .checked_sub(amount)
            .ok_or(LedgerError::Overflow)?;

        self.balances.insert(*caller, remaining);
        self.total_supply = supply;

        debug!("Burned {} from {}, supply now {}", amount, caller, supply);
        self.events.emit(LedgerEvent::Burn {
            account: *caller,
            amount,
        });
        Ok(())
    }

    // ===== Owner operations =====

    pub fn lock(&mut self, caller: &Address) -> Result<(), LedgerError> {
        self.require_owner(caller)?;
        if !self.locked {
            self.locked = true;
            debug!("Ledger {} locked", self.symbol);
            self.events.emit(LedgerEvent::Locked);
        }
        Ok(())
    }

    pub fn unlock(&mut self, caller: &Address) -> Result<(), LedgerError> {
        self.require_owner(caller)?;
        if self.locked {
            self.locked = false;
            debug!("Ledger {} unlocked", self.symbol);
            self.events.emit(LedgerEvent::Unlocked);
        }
        Ok(())
    }

    pub fn set_owner(&mut self, caller: &Address, new_owner: &Address) -> Result<(), LedgerError> {
        self.require_owner(caller)?;

        let previous = std::mem::replace(&mut self.owner, *new_owner);
        debug!("Ledger ownership moved from {} to {}", previous, new_owner);
        self.events.emit(LedgerEvent::OwnershipTransferred {
            previous,
            new: *new_owner,
        });
        Ok(())
    }

    // ===== Helpers =====

    fn require_owner(&self, caller: &Address) -> Result<(), LedgerError> {
        if *caller != self.owner {
            return Err(LedgerError::NotOwner);
        }
        Ok(())
    }

    fn require_transferable(&self, caller: &Address) -> Result<(), LedgerError> {
        if self.locked && *caller != self.owner {
            trace!("Transfer by {} rejected: ledger locked", caller);
            return Err(LedgerError::TransfersLocked);
        }
        Ok(())
    }

    // Both sides are computed before either is written
    fn move_balance(&mut self, from: &Address, to: &Address, amount: u64) -> Result<(), LedgerError> {
        let from_balance = self.balance_of(from);
        let new_from = from_balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                need: amount,
                have: from_balance,
            })?;

        if from != to {
            let new_to = self
                .balance_of(to)
                .checked_add(amount)
                .ok_or(LedgerError::Overflow)?;
            self.balances.insert(*from, new_from);
            self.balances.insert(*to, new_to);
        }

        trace!("Transfer {} from {} to {}", amount, from, to);
        self.events.emit(LedgerEvent::Transfer {
            from: *from,
            to: *to,
            amount,
        });
        Ok(())
    }
}
