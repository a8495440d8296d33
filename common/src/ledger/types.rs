use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::crypto::Address;

/// Read-only view of the ledger state.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: u64,
    pub owner: Address,
    pub locked: bool,
    /// Non-zero balances only
    pub balances: IndexMap<Address, u64>,
}

impl LedgerSnapshot {
    /// Sum of all balances; equals `total_supply` on a consistent ledger.
    pub fn balance_sum(&self) -> Option<u64> {
        self.balances
            .values()
            .try_fold(0u64, |acc, balance| acc.checked_add(*balance))
    }
}
