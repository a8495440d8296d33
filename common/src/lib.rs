pub mod config;
pub mod crypto;
pub mod deploy;
pub mod error;
pub mod events;
pub mod ledger;
pub mod sale;
pub mod time;
