use serde::{Deserialize, Serialize};

use crate::{crypto::Address, time::TimestampSeconds};

/// Event emitted by the ledger on a committed state change.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum LedgerEvent {
    Transfer {
        from: Address,
        to: Address,
        amount: u64,
    },
    Approval {
        owner: Address,
        spender: Address,
        amount: u64,
    },
    Burn {
        account: Address,
        amount: u64,
    },
    Locked,
    Unlocked,
    OwnershipTransferred {
        previous: Address,
        new: Address,
    },
}

/// Event emitted by the sale controller on a committed state change.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum SaleEvent {
    Started {
        at: TimestampSeconds,
    },
    Contributed {
        contributor: Address,
        value: u64,
        units: u64,
    },
    Finished {
        success: bool,
        raised: u64,
    },
    Aborted {
        by: Address,
    },
    Withdrawn {
        beneficiary: Address,
        amount: u64,
        // unsold token units destroyed on the first withdrawal
        burned: u64,
    },
    Refunded {
        contributor: Address,
        amount: u64,
    },
    BeneficiaryChanged {
        previous: Address,
        new: Address,
    },
}

/// Append-only event buffer owned by a component.
#[derive(Clone, Debug)]
pub struct EventLog<E> {
    events: Vec<E>,
}

impl<E> Default for EventLog<E> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

impl<E> EventLog<E> {
    pub fn emit(&mut self, event: E) {
        self.events.push(event);
    }

    pub fn as_slice(&self) -> &[E] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<E> {
        std::mem::take(&mut self.events)
    }
}
