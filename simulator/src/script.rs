//! Sale scripts and their replay.
//!
//! A script lists timestamped calls made by accounts against a freshly
//! deployed sale. Native value lives in a `NativeVault` funded up front;
//! a contribution is debited from the caller only once the controller
//! accepted it.

use std::sync::Arc;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use ico_common::{
    config::DeployConfig,
    crypto::Address,
    deploy::deploy,
    error::{ErrorKind, PaymentError, SaleError},
    events::{LedgerEvent, SaleEvent},
    sale::{NativeVault, SaleController, SaleSnapshot},
    time::{Clock, ManualClock, TimestampSeconds},
};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    pub genesis_time: TimestampSeconds,
    /// Initial native balances
    #[serde(default)]
    pub funding: IndexMap<Address, u64>,
    pub steps: Vec<Step>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Move the clock here before the call. Must not go backwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at: Option<TimestampSeconds>,
    /// Ignored by `start` and `finish`, which anyone may call
    #[serde(default = "Address::zero")]
    pub caller: Address,
    #[serde(flatten)]
    pub op: Op,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Op {
    Start,
    Contribute { value: u64 },
    Finish,
    Abort,
    Withdraw,
    Refund,
    SetBeneficiary { account: Address },
    Transfer { to: Address, amount: u64 },
    Approve { spender: Address, amount: u64 },
    TransferFrom { from: Address, to: Address, amount: u64 },
    Burn { amount: u64 },
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Contribute { .. } => "contribute",
            Self::Finish => "finish",
            Self::Abort => "abort",
            Self::Withdraw => "withdraw",
            Self::Refund => "refund",
            Self::SetBeneficiary { .. } => "setBeneficiary",
            Self::Transfer { .. } => "transfer",
            Self::Approve { .. } => "approve",
            Self::TransferFrom { .. } => "transferFrom",
            Self::Burn { .. } => "burn",
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Outcome {
    Ok {
        /// Units issued, value paid or phase reached, depending on the op
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<serde_json::Value>,
    },
    Error {
        name: &'static str,
        kind: ErrorKind,
        code: u64,
        message: String,
    },
}

impl From<SaleError> for Outcome {
    fn from(e: SaleError) -> Self {
        Self::Error {
            name: e.name(),
            kind: e.kind(),
            code: e.code(),
            message: e.to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub index: usize,
    pub at: TimestampSeconds,
    pub caller: Address,
    pub op: &'static str,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Events {
    pub sale: Vec<SaleEvent>,
    pub ledger: Vec<LedgerEvent>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub steps: Vec<StepReport>,
    pub sale: SaleSnapshot,
    pub vault: IndexMap<Address, u64>,
    pub events: Events,
}

impl Report {
    pub fn failed_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| matches!(step.outcome, Outcome::Error { .. }))
            .count()
    }
}

struct Simulation {
    clock: Arc<ManualClock>,
    sale: SaleController,
    vault: NativeVault,
}

impl Simulation {
    fn execute(&mut self, caller: &Address, op: &Op) -> Result<Option<serde_json::Value>, SaleError> {
        let result = match op {
            Op::Start => {
                self.sale.start()?;
                None
            }
            Op::Contribute { value } => {
                let have = self.vault.balance_of(caller);
                if have < *value {
                    return Err(PaymentError::InsufficientFunds {
                        account: *caller,
                        need: *value,
                        have,
                    }
                    .into());
                }
                let units = self.sale.contribute(caller, *value)?;
                self.vault.debit(caller, *value)?;
                Some(units.into())
            }
            Op::Finish => {
                let phase = self.sale.finish()?;
                Some(serde_json::json!(phase))
            }
            Op::Abort => {
                self.sale.abort(caller)?;
                None
            }
            Op::Withdraw => Some(self.sale.withdraw(caller, &mut self.vault)?.into()),
            Op::Refund => Some(self.sale.refund(caller, &mut self.vault)?.into()),
            Op::SetBeneficiary { account } => {
                self.sale.set_beneficiary(caller, account)?;
                None
            }
            Op::Transfer { to, amount } => {
                self.sale.ledger_mut().transfer(caller, to, *amount)?;
                None
            }
            Op::Approve { spender, amount } => {
                self.sale.ledger_mut().approve(caller, spender, *amount)?;
                None
            }
            Op::TransferFrom { from, to, amount } => {
                self.sale
                    .ledger_mut()
                    .transfer_from(caller, from, to, *amount)?;
                None
            }
            Op::Burn { amount } => {
                self.sale.ledger_mut().burn(caller, *amount)?;
                None
            }
        };
        Ok(result)
    }
}

/// Deploy `config` and replay `script` against it.
///
/// Rejected calls are recorded in the report and do not stop the replay.
/// Only a malformed script (clock going backwards) aborts it.
pub fn run(config: &DeployConfig, script: &Script) -> Result<Report> {
    let clock = Arc::new(ManualClock::new(script.genesis_time));
    let sale = deploy(config, clock.clone()).context("Deployment failed")?;

    let mut vault = NativeVault::new();
    for (account, amount) in &script.funding {
        vault
            .credit(account, *amount)
            .with_context(|| format!("Cannot fund {}", account))?;
    }

    let mut simulation = Simulation { clock, sale, vault };
    let mut steps = Vec::with_capacity(script.steps.len());
    for (index, step) in script.steps.iter().enumerate() {
        if let Some(at) = step.at {
            simulation
                .clock
                .set(at)
                .with_context(|| format!("Step {} ({})", index, step.op.name()))?;
        }

        let outcome = match simulation.execute(&step.caller, &step.op) {
            Ok(result) => Outcome::Ok { result },
            Err(e) => {
                debug!("Step {} {} rejected: {}", index, step.op.name(), e);
                e.into()
            }
        };
        steps.push(StepReport {
            index,
            at: simulation.clock.now(),
            caller: step.caller,
            op: step.op.name(),
            outcome,
        });
    }

    let Simulation {
        mut sale, vault, ..
    } = simulation;
    let report = Report {
        steps,
        sale: sale.snapshot(),
        vault: vault.balances().clone(),
        events: Events {
            sale: sale.drain_events(),
            ledger: sale.ledger_mut().drain_events(),
        },
    };
    info!(
        "Replayed {} steps ({} rejected), sale ended {:?}",
        report.steps.len(),
        report.failed_steps(),
        report.sale.phase
    );
    Ok(report)
}
