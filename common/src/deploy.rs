//! Deployment routine wiring the ledger and the sale controller together.
//!
//! 1. Create the ledger with the full supply owned by the deployer
//! 2. Create the controller bound to that ledger
//! 3. Move the full supply into the controller's custody
//! 4. Hand ledger ownership to the controller

use std::sync::Arc;

use log::info;
use thiserror::Error;

use crate::{
    config::{DeployConfig, SALE_CONTROLLER_LABEL},
    crypto::compute_deterministic_contract_address,
    error::{LedgerError, SaleError},
    ledger::Ledger,
    sale::SaleController,
    time::Clock,
};

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Ledger setup failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Sale setup failed: {0}")]
    Sale(#[from] SaleError),
}

pub fn deploy(config: &DeployConfig, clock: Arc<dyn Clock>) -> Result<SaleController, DeployError> {
    let deployer = config.deployer;
    // Every unit within the cap must be deliverable out of custody
    if config.sale.sale_cap > config.token.total_supply {
        return Err(SaleError::InvalidParams("sale cap exceeds supply").into());
    }
    let ledger = Ledger::new(deployer, config.token.clone())?;

    let address = compute_deterministic_contract_address(&deployer, SALE_CONTROLLER_LABEL);
    let mut controller =
        SaleController::new(address, deployer, ledger, config.sale.clone(), clock)?;

    let ledger = controller.ledger_mut();
    let supply = ledger.total_supply();
    ledger.transfer(&deployer, &address, supply)?;
    ledger.set_owner(&deployer, &address)?;

    info!(
        "Deployed sale {} for {} {} (deployer {})",
        address, supply, config.token.symbol, deployer
    );
    Ok(controller)
}
