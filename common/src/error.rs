//! Error taxonomy for the ledger and the sale controller.
//!
//! Code ranges:
//! - 0x0300 - 0x03FF: ledger
//! - 0x0400 - 0x04FF: sale controller
//! - 0x0500 - 0x05FF: payout sink

use serde::Serialize;
use thiserror::Error;

use crate::crypto::Address;

/// Category an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// Caller lacks the required role
    Authorization,
    /// Operation invalid for the current phase or time
    Phase,
    /// Requested quantity violates a balance or cap invariant
    Accounting,
    /// Transfer attempted while the ledger is frozen
    Gate,
    /// Invalid construction parameters
    Config,
    /// The outward payment could not be made
    Payment,
}

// ===== Ledger Errors (0x0300 - 0x03FF) =====

pub const LEDGER_ERROR_NOT_OWNER: u64 = 0x0300;
pub const LEDGER_ERROR_INSUFFICIENT_BALANCE: u64 = 0x0301;
pub const LEDGER_ERROR_INSUFFICIENT_ALLOWANCE: u64 = 0x0302;
pub const LEDGER_ERROR_TRANSFERS_LOCKED: u64 = 0x0303;
pub const LEDGER_ERROR_OVERFLOW: u64 = 0x0304;
pub const LEDGER_ERROR_INVALID_METADATA: u64 = 0x0305;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Caller is not the ledger owner")]
    NotOwner,

    #[error("Insufficient balance: need {need}, have {have}")]
    InsufficientBalance { need: u64, have: u64 },

    #[error("Insufficient allowance: need {need}, have {have}")]
    InsufficientAllowance { need: u64, have: u64 },

    #[error("Transfers are locked")]
    TransfersLocked,

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Invalid token metadata: {0}")]
    InvalidMetadata(&'static str),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotOwner => ErrorKind::Authorization,
            Self::InsufficientBalance { .. }
            | Self::InsufficientAllowance { .. }
            | Self::Overflow => ErrorKind::Accounting,
            Self::TransfersLocked => ErrorKind::Gate,
            Self::InvalidMetadata(_) => ErrorKind::Config,
        }
    }

    pub fn code(&self) -> u64 {
        match self {
            Self::NotOwner => LEDGER_ERROR_NOT_OWNER,
            Self::InsufficientBalance { .. } => LEDGER_ERROR_INSUFFICIENT_BALANCE,
            Self::InsufficientAllowance { .. } => LEDGER_ERROR_INSUFFICIENT_ALLOWANCE,
            Self::TransfersLocked => LEDGER_ERROR_TRANSFERS_LOCKED,
            Self::Overflow => LEDGER_ERROR_OVERFLOW,
            Self::InvalidMetadata(_) => LEDGER_ERROR_INVALID_METADATA,
        }
    }

    /// Short stable name, as reported by the simulator.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotOwner => "NotOwner",
            Self::InsufficientBalance { .. } => "InsufficientBalance",
            Self::InsufficientAllowance { .. } => "InsufficientAllowance",
            Self::TransfersLocked => "TransfersLocked",
            Self::Overflow => "Overflow",
            Self::InvalidMetadata(_) => "InvalidMetadata",
        }
    }
}

// ===== Payout Errors (0x0500 - 0x05FF) =====

pub const PAYMENT_ERROR_INSUFFICIENT_FUNDS: u64 = 0x0500;
pub const PAYMENT_ERROR_OVERFLOW: u64 = 0x0501;
pub const PAYMENT_ERROR_REJECTED: u64 = 0x0502;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    #[error("Insufficient funds in {account}: need {need}, have {have}")]
    InsufficientFunds {
        account: Address,
        need: u64,
        have: u64,
    },

    #[error("Balance overflow")]
    Overflow,

    #[error("Payment to {0} rejected")]
    Rejected(Address),
}

impl PaymentError {
    pub fn code(&self) -> u64 {
        match self {
            Self::InsufficientFunds { .. } => PAYMENT_ERROR_INSUFFICIENT_FUNDS,
            Self::Overflow => PAYMENT_ERROR_OVERFLOW,
            Self::Rejected(_) => PAYMENT_ERROR_REJECTED,
        }
    }
}

// ===== Sale Errors (0x0400 - 0x04FF) =====

pub const SALE_ERROR_NOT_OWNER: u64 = 0x0400;
pub const SALE_ERROR_NOT_BENEFICIARY: u64 = 0x0401;
pub const SALE_ERROR_NOT_AUTHORIZED: u64 = 0x0402;
pub const SALE_ERROR_SELF_CONTRIBUTION: u64 = 0x0403;
pub const SALE_ERROR_NOT_STARTED: u64 = 0x0410;
pub const SALE_ERROR_ALREADY_STARTED: u64 = 0x0411;
pub const SALE_ERROR_ALREADY_FINISHED: u64 = 0x0412;
pub const SALE_ERROR_TOO_EARLY: u64 = 0x0413;
pub const SALE_ERROR_WINDOW_CLOSED: u64 = 0x0414;
pub const SALE_ERROR_OUTSIDE_WINDOW: u64 = 0x0415;
pub const SALE_ERROR_NOT_ELIGIBLE: u64 = 0x0416;
pub const SALE_ERROR_ABORTED: u64 = 0x0417;
pub const SALE_ERROR_CAP_EXCEEDED: u64 = 0x0420;
pub const SALE_ERROR_NOTHING_TO_REFUND: u64 = 0x0421;
pub const SALE_ERROR_NOTHING_TO_WITHDRAW: u64 = 0x0422;
pub const SALE_ERROR_CONTRIBUTION_TOO_SMALL: u64 = 0x0423;
pub const SALE_ERROR_INSUFFICIENT_CUSTODY: u64 = 0x0424;
pub const SALE_ERROR_OVERFLOW: u64 = 0x0425;
pub const SALE_ERROR_INVALID_PARAMS: u64 = 0x0430;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaleError {
    // Authorization
    #[error("Caller is not the sale owner")]
    NotOwner,

    #[error("Caller is not the beneficiary")]
    NotBeneficiary,

    #[error("Caller is not the emergency authority")]
    NotAuthorized,

    #[error("The sale controller cannot contribute to itself")]
    SelfContribution,

    // Phase
    #[error("Sale has not been started")]
    NotStarted,

    #[error("Sale already started")]
    AlreadyStarted,

    #[error("Sale already finished")]
    AlreadyFinished,

    #[error("Too early for this operation")]
    TooEarly,

    #[error("Sale window is closed")]
    SaleWindowClosed,

    #[error("Outside of the sale window")]
    OutsideWindow,

    #[error("Not eligible in the current sale outcome")]
    NotEligible,

    #[error("Sale was aborted")]
    SaleAborted,

    // Accounting
    #[error("Sale cap exceeded: requested {requested} units, {remaining} remaining")]
    CapExceeded { requested: u64, remaining: u64 },

    #[error("Nothing to refund")]
    NothingToRefund,

    #[error("Nothing to withdraw")]
    NothingToWithdraw,

    #[error("Contribution of {value} is below the unit price {unit_price}")]
    ContributionTooSmall { value: u64, unit_price: u64 },

    #[error("Insufficient custody: need {need}, have {have}")]
    InsufficientCustody { need: u64, have: u64 },

    #[error("Arithmetic overflow")]
    Overflow,

    // Config
    #[error("Invalid sale parameters: {0}")]
    InvalidParams(&'static str),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Payment(#[from] PaymentError),
}

impl SaleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotOwner
            | Self::NotBeneficiary
            | Self::NotAuthorized
            | Self::SelfContribution => ErrorKind::Authorization,
            Self::NotStarted
            | Self::AlreadyStarted
            | Self::AlreadyFinished
            | Self::TooEarly
            | Self::SaleWindowClosed
            | Self::OutsideWindow
            | Self::NotEligible
            | Self::SaleAborted => ErrorKind::Phase,
            Self::CapExceeded { .. }
            | Self::NothingToRefund
            | Self::NothingToWithdraw
            | Self::ContributionTooSmall { .. }
            | Self::InsufficientCustody { .. }
            | Self::Overflow => ErrorKind::Accounting,
            Self::InvalidParams(_) => ErrorKind::Config,
            Self::Ledger(e) => e.kind(),
            Self::Payment(_) => ErrorKind::Payment,
        }
    }

    pub fn code(&self) -> u64 {
        match self {
            Self::NotOwner => SALE_ERROR_NOT_OWNER,
            Self::NotBeneficiary => SALE_ERROR_NOT_BENEFICIARY,
            Self::NotAuthorized => SALE_ERROR_NOT_AUTHORIZED,
            Self::SelfContribution => SALE_ERROR_SELF_CONTRIBUTION,
            Self::NotStarted => SALE_ERROR_NOT_STARTED,
            Self::AlreadyStarted => SALE_ERROR_ALREADY_STARTED,
            Self::AlreadyFinished => SALE_ERROR_ALREADY_FINISHED,
            Self::TooEarly => SALE_ERROR_TOO_EARLY,
            Self::SaleWindowClosed => SALE_ERROR_WINDOW_CLOSED,
            Self::OutsideWindow => SALE_ERROR_OUTSIDE_WINDOW,
            Self::NotEligible => SALE_ERROR_NOT_ELIGIBLE,
            Self::SaleAborted => SALE_ERROR_ABORTED,
            Self::CapExceeded { .. } => SALE_ERROR_CAP_EXCEEDED,
            Self::NothingToRefund => SALE_ERROR_NOTHING_TO_REFUND,
            Self::NothingToWithdraw => SALE_ERROR_NOTHING_TO_WITHDRAW,
            Self::ContributionTooSmall { .. } => SALE_ERROR_CONTRIBUTION_TOO_SMALL,
            Self::InsufficientCustody { .. } => SALE_ERROR_INSUFFICIENT_CUSTODY,
            Self::Overflow => SALE_ERROR_OVERFLOW,
            Self::InvalidParams(_) => SALE_ERROR_INVALID_PARAMS,
            Self::Ledger(e) => e.code(),
            Self::Payment(e) => e.code(),
        }
    }

    /// Short stable name, as reported by the simulator.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotOwner => "NotOwner",
            Self::NotBeneficiary => "NotBeneficiary",
            Self::NotAuthorized => "NotAuthorized",
            Self::SelfContribution => "SelfContribution",
            Self::NotStarted => "NotStarted",
            Self::AlreadyStarted => "AlreadyStarted",
            Self::AlreadyFinished => "AlreadyFinished",
            Self::TooEarly => "TooEarly",
            Self::SaleWindowClosed => "SaleWindowClosed",
            Self::OutsideWindow => "OutsideWindow",
            Self::NotEligible => "NotEligible",
            Self::SaleAborted => "SaleAborted",
            Self::CapExceeded { .. } => "CapExceeded",
            Self::NothingToRefund => "NothingToRefund",
            Self::NothingToWithdraw => "NothingToWithdraw",
            Self::ContributionTooSmall { .. } => "ContributionTooSmall",
            Self::InsufficientCustody { .. } => "InsufficientCustody",
            Self::Overflow => "Overflow",
            Self::InvalidParams(_) => "InvalidParams",
            Self::Ledger(e) => e.name(),
            Self::Payment(_) => "PaymentFailed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_errors_are_categorised() {
        assert_eq!(LedgerError::NotOwner.kind(), ErrorKind::Authorization);
        assert_eq!(LedgerError::TransfersLocked.kind(), ErrorKind::Gate);
        assert_eq!(
            LedgerError::InsufficientAllowance { need: 2, have: 1 }.kind(),
            ErrorKind::Accounting
        );
    }

    #[test]
    fn wrapped_ledger_error_keeps_identity() {
        let err: SaleError = LedgerError::TransfersLocked.into();
        assert_eq!(err.kind(), ErrorKind::Gate);
        assert_eq!(err.code(), LEDGER_ERROR_TRANSFERS_LOCKED);
        assert_eq!(err.name(), "TransfersLocked");
        assert_eq!(err.to_string(), "Transfers are locked");
    }

    #[test]
    fn sale_error_codes_are_unique() {
        let errors = [
            SaleError::NotOwner,
            SaleError::NotBeneficiary,
            SaleError::NotAuthorized,
            SaleError::SelfContribution,
            SaleError::NotStarted,
            SaleError::AlreadyStarted,
            SaleError::AlreadyFinished,
            SaleError::TooEarly,
            SaleError::SaleWindowClosed,
            SaleError::OutsideWindow,
            SaleError::NotEligible,
            SaleError::SaleAborted,
            SaleError::CapExceeded {
                requested: 0,
                remaining: 0,
            },
            SaleError::NothingToRefund,
            SaleError::NothingToWithdraw,
            SaleError::ContributionTooSmall {
                value: 0,
                unit_price: 0,
            },
            SaleError::InsufficientCustody { need: 0, have: 0 },
            SaleError::Overflow,
            SaleError::InvalidParams(""),
        ];
        let mut codes: Vec<u64> = errors.iter().map(SaleError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }
}
