//! Sale Controller
//!
//! Crowdsale state machine: time window, pricing, cap enforcement and
//! custody of the native value collected until the outcome is known.
//!
//! ```text
//! Pending --start--> Active --finish--> Succeeded | Failed
//!    \                  \                    |
//!     +------------------+---- abort ---> Aborted
//! ```
//!
//! The controller drives the ledger through the ledger's own API, acting as
//! its owner: `start` locks it, a successful `finish` unlocks it and every
//! contribution is paid out of the controller's token custody.
//!
//! Every operation validates and computes all of its effects before the
//! first write, so a rejected call leaves no trace.

mod payout;
mod state;


pub use payout::*;
pub use state::*;

use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, info, warn};

use crate::{
    config::SaleParams,
    crypto::Address,
    error::{LedgerError, SaleError},
    events::{EventLog, SaleEvent},
    ledger::Ledger,
    time::{Clock, TimestampSeconds},
};

#[derive(Debug)]
pub struct SaleController {
    address: Address,
    ledger: Ledger,
    clock: Arc<dyn Clock>,

    // Roles
    owner: Address,
    beneficiary: Address,
    emergency_authority: Address,

    // Immutable parameters
    unit_price: u64,
    sale_cap: u64,
    min_raise: u64,
    start_time: TimestampSeconds,
    end_time: TimestampSeconds,

    // Phase flags
    started: bool,
    finished: bool,
    aborted: bool,
    withdrawn: bool,

    // Accounting
    sold: u64,
    raised: u64,
    custody: u64,
    contributions: IndexMap<Address, u64>,

    events: EventLog<SaleEvent>,
}

impl SaleController {
    /// Bind a controller living at `address` to `ledger`.
    ///
    /// The beneficiary starts out as `owner`. The controller can only operate
    /// once it owns the ledger and holds the supply it sells.
    pub fn new(
        address: Address,
        owner: Address,
        ledger: Ledger,
        params: SaleParams,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SaleError> {
        params.validate().map_err(SaleError::InvalidParams)?;

        debug!(
            "Sale controller {} bound to ledger {}: price {}, cap {}, min raise {}, window [{}, {})",
            address,
            ledger.symbol(),
            params.unit_price,
            params.sale_cap,
            params.min_raise,
            params.start_time,
            params.end_time
        );

        Ok(Self {
            address,
            ledger,
            clock,
            owner,
            beneficiary: owner,
            emergency_authority: params.emergency_authority,
            unit_price: params.unit_price,
            sale_cap: params.sale_cap,
            min_raise: params.min_raise,
            start_time: params.start_time,
            end_time: params.end_time,
            started: false,
            finished: false,
            aborted: false,
            withdrawn: false,
            sold: 0,
            raised: 0,
            custody: 0,
            contributions: IndexMap::new(),
            events: EventLog::default(),
        })
    }

    // ===== Transitions =====

    /// Pending -> Active. Locks the ledger for the duration of the sale.
    pub fn start(&mut self) -> Result<(), SaleError> {
        if self.started {
            return Err(SaleError::AlreadyStarted);
        }
        let now = self.clock.now();
        if now >= self.end_time {
            return Err(SaleError::SaleWindowClosed);
        }
        if now < self.start_time {
            return Err(SaleError::TooEarly);
        }

        let address = self.address;
        self.ledger.lock(&address)?;
        self.started = true;

        info!("Sale {} started at {}", self.address, now);
        self.events.emit(SaleEvent::Started { at: now });
        Ok(())
    }

    /// Accept `value` from `caller` and deliver `value / unit_price` token
    /// units out of custody. Returns the number of units issued.
    ///
    /// The remainder of a value that is not a multiple of the unit price
    /// stays part of the contribution.
    pub fn contribute(&mut self, caller: &Address, value: u64) -> Result<u64, SaleError> {
        if !self.started {
            return Err(SaleError::NotStarted);
        }
        let now = self.clock.now();
        if now < self.start_time || now >= self.end_time {
            return Err(SaleError::OutsideWindow);
        }
        if self.finished {
            return Err(SaleError::AlreadyFinished);
        }
        if self.aborted {
            return Err(SaleError::SaleAborted);
        }
        // Units sent to the controller would never leave its custody
        if *caller == self.address {
            return Err(SaleError::SelfContribution);
        }

        let units = value / self.unit_price;
        if units == 0 {
            return Err(SaleError::ContributionTooSmall {
                value,
                unit_price: self.unit_price,
            });
        }

        let sold = self.sold.checked_add(units).ok_or(SaleError::Overflow)?;
        if sold > self.sale_cap {
            return Err(SaleError::CapExceeded {
                requested: units,
                remaining: self.sale_cap - self.sold,
            });
        }
        let raised = self.raised.checked_add(value).ok_or(SaleError::Overflow)?;
        let contribution = self
            .contribution_of(caller)
            .checked_add(value)
            .ok_or(SaleError::Overflow)?;
        let custody = self.custody.checked_add(value).ok_or(SaleError::Overflow)?;

        let address = self.address;
        self.ledger.transfer(&address, caller, units)?;

        self.sold = sold;
        self.raised = raised;
        self.custody = custody;
        self.contributions.insert(*caller, contribution);

        debug!(
            "{} contributed {} for {} units (sold {}/{}, raised {})",
            caller, value, units, self.sold, self.sale_cap, self.raised
        );
        self.events.emit(SaleEvent::Contributed {
            contributor: *caller,
            value,
            units,
        });
        Ok(units)
    }

    /// Active -> Succeeded | Failed, once the window has closed.
    /// On success the ledger is unlocked for every holder.
    pub fn finish(&mut self) -> Result<SalePhase, SaleError> {
        if !self.started {
            return Err(SaleError::NotStarted);
        }
        if self.clock.now() < self.end_time {
            return Err(SaleError::TooEarly);
        }
        if self.finished {
            return Err(SaleError::AlreadyFinished);
        }

        let success = self.raised >= self.min_raise;
        if success {
            let address = self.address;
            self.ledger.unlock(&address)?;
        }
        self.finished = true;

        let outcome = if success {
            SalePhase::Succeeded
        } else {
            SalePhase::Failed
        };
        info!(
            "Sale {} finished: {:?} with {} raised (minimum {})",
            self.address, outcome, self.raised, self.min_raise
        );
        self.events.emit(SaleEvent::Finished {
            success,
            raised: self.raised,
        });
        Ok(outcome)
    }

    /// Emergency stop. Allowed in every phase, including after a successful
    /// finish, and turns the value disposition into refunds.
    pub fn abort(&mut self, caller: &Address) -> Result<(), SaleError> {
        if *caller != self.emergency_authority {
            return Err(SaleError::NotAuthorized);
        }

        if !self.aborted {
            warn!(
                "Sale {} aborted by {} (custody {}, raised {})",
                self.address, caller, self.custody, self.raised
            );
        }
        self.aborted = true;
        self.events.emit(SaleEvent::Aborted { by: *caller });
        Ok(())
    }

    /// Pay the whole custody to the beneficiary after a success.
    ///
    /// Token units left unsold in custody are burned at the same time, so
    /// the final supply equals the units sold. The first eligible call
    /// succeeds even with nothing raised; later calls fail with
    /// `NothingToWithdraw`.
    pub fn withdraw<S: PaymentSink + ?Sized>(
        &mut self,
        caller: &Address,
        sink: &mut S,
    ) -> Result<u64, SaleError> {
        if *caller != self.beneficiary {
            return Err(SaleError::NotBeneficiary);
        }
        if !self.withdraw_enabled() {
            return Err(SaleError::NotEligible);
        }
        if self.withdrawn {
            return Err(SaleError::NothingToWithdraw);
        }
        // The burn below must not fail once the payment went out
        if *self.ledger.owner() != self.address {
            return Err(LedgerError::NotOwner.into());
        }

        let address = self.address;
        let unsold = self.ledger.balance_of(&address);
        let amount = self.custody;

        self.custody = 0;
        self.withdrawn = true;
        if amount > 0 {
            if let Err(e) = sink.pay(&self.beneficiary, amount) {
                self.custody = amount;
                self.withdrawn = false;
                return Err(e.into());
            }
        }
        if unsold > 0 {
            self.ledger.burn(&address, unsold)?;
        }

        info!(
            "Withdrew {} to beneficiary {}, burned {} unsold units",
            amount, self.beneficiary, unsold
        );
        self.events.emit(SaleEvent::Withdrawn {
            beneficiary: self.beneficiary,
            amount,
            burned: unsold,
        });
        Ok(amount)
    }

    /// Pay back the caller's whole contribution after a failure or abort.
    /// Issued tokens are not reclaimed.
    pub fn refund<S: PaymentSink + ?Sized>(
        &mut self,
        caller: &Address,
        sink: &mut S,
    ) -> Result<u64, SaleError> {
        if !self.refund_enabled() {
            return Err(SaleError::NotEligible);
        }
        let amount = self.contribution_of(caller);
        if amount == 0 {
            return Err(SaleError::NothingToRefund);
        }
        let custody = self
            .custody
            .checked_sub(amount)
            .ok_or(SaleError::InsufficientCustody {
                need: amount,
                have: self.custody,
            })?;

        let previous_custody = std::mem::replace(&mut self.custody, custody);
        self.contributions.insert(*caller, 0);
        if let Err(e) = sink.pay(caller, amount) {
            self.contributions.insert(*caller, amount);
            self.custody = previous_custody;
            return Err(e.into());
        }

        debug!("Refunded {} to {}", amount, caller);
        self.events.emit(SaleEvent::Refunded {
            contributor: *caller,
            amount,
        });
        Ok(amount)
    }

    pub fn set_beneficiary(
        &mut self,
        caller: &Address,
        beneficiary: &Address,
    ) -> Result<(), SaleError> {
        if *caller != self.owner {
            return Err(SaleError::NotOwner);
        }

        let previous = std::mem::replace(&mut self.beneficiary, *beneficiary);
        debug!("Beneficiary changed from {} to {}", previous, beneficiary);
        self.events.emit(SaleEvent::BeneficiaryChanged {
            previous,
            new: *beneficiary,
        });
        Ok(())
    }

    // ===== Eligibility =====

    fn success_recorded(&self) -> bool {
        self.finished && self.raised >= self.min_raise
    }

    pub fn withdraw_enabled(&self) -> bool {
        self.success_recorded() && !self.aborted
    }

    pub fn refund_enabled(&self) -> bool {
        self.phase().refunds_enabled()
    }

    pub fn phase(&self) -> SalePhase {
        if self.aborted {
            SalePhase::Aborted
        } else if self.finished {
            if self.success_recorded() {
                SalePhase::Succeeded
            } else {
                SalePhase::Failed
            }
        } else if self.started {
            SalePhase::Active
        } else {
            SalePhase::Pending
        }
    }

    // ===== Queries =====

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Direct ledger access for holders. The ledger's own authorization and
    /// gate still apply to every call made through it.
    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn beneficiary(&self) -> &Address {
        &self.beneficiary
    }

    pub fn emergency_authority(&self) -> &Address {
        &self.emergency_authority
    }

    pub fn unit_price(&self) -> u64 {
        self.unit_price
    }

    pub fn sale_cap(&self) -> u64 {
        self.sale_cap
    }

    pub fn min_raise(&self) -> u64 {
        self.min_raise
    }

    pub fn start_time(&self) -> TimestampSeconds {
        self.start_time
    }

    pub fn end_time(&self) -> TimestampSeconds {
        self.end_time
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn is_withdrawn(&self) -> bool {
        self.withdrawn
    }

    pub fn sold(&self) -> u64 {
        self.sold
    }

    pub fn raised(&self) -> u64 {
        self.raised
    }

    /// Native value currently held by the controller.
    pub fn custody(&self) -> u64 {
        self.custody
    }

    /// Token units still held by the controller.
    pub fn token_custody(&self) -> u64 {
        self.ledger.balance_of(&self.address)
    }

    pub fn remaining_units(&self) -> u64 {
        self.sale_cap - self.sold
    }

    pub fn contribution_of(&self, account: &Address) -> u64 {
        self.contributions.get(account).copied().unwrap_or(0)
    }

    /// Accounts with an outstanding contribution, in first-contribution order.
    pub fn contributors(&self) -> impl Iterator<Item = (&Address, u64)> {
        self.contributions
            .iter()
            .filter(|(_, value)| **value > 0)
            .map(|(account, value)| (account, *value))
    }

    pub fn events(&self) -> &[SaleEvent] {
        self.events.as_slice()
    }

    pub fn drain_events(&mut self) -> Vec<SaleEvent> {
        self.events.drain()
    }

    pub fn snapshot(&self) -> SaleSnapshot {
        SaleSnapshot {
            address: self.address,
            owner: self.owner,
            beneficiary: self.beneficiary,
            emergency_authority: self.emergency_authority,
            unit_price: self.unit_price,
            sale_cap: self.sale_cap,
            min_raise: self.min_raise,
            start_time: self.start_time,
            end_time: self.end_time,
            started: self.started,
            finished: self.finished,
            aborted: self.aborted,
            withdrawn: self.withdrawn,
            phase: self.phase(),
            sold: self.sold,
            raised: self.raised,
            custody: self.custody,
            contributions: self.contributions.clone(),
            ledger: self.ledger.snapshot(),
        }
    }
}
