use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{crypto::Address, ledger::LedgerSnapshot, time::TimestampSeconds};

/// Sale lifecycle phase, derived from the started/finished/aborted flags.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SalePhase {
    /// Deployed, not started
    Pending,
    /// Started and not finished
    Active,
    /// Finished with the minimum raise reached
    Succeeded,
    /// Finished below the minimum raise
    Failed,
    /// Aborted by the emergency authority, whatever the recorded outcome
    Aborted,
}

impl SalePhase {
    /// Whether contributors may reclaim their value in this phase.
    pub fn refunds_enabled(&self) -> bool {
        matches!(self, Self::Failed | Self::Aborted)
    }
}

/// Read-only view of every controller field.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleSnapshot {
    pub address: Address,
    pub owner: Address,
    pub beneficiary: Address,
    pub emergency_authority: Address,
    pub unit_price: u64,
    pub sale_cap: u64,
    pub min_raise: u64,
    pub start_time: TimestampSeconds,
    pub end_time: TimestampSeconds,
    pub started: bool,
    pub finished: bool,
    pub aborted: bool,
    pub withdrawn: bool,
    pub phase: SalePhase,
    pub sold: u64,
    pub raised: u64,
    /// Native value currently held
    pub custody: u64,
    pub contributions: IndexMap<Address, u64>,
    pub ledger: LedgerSnapshot,
}
