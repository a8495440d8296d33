//! Sample deployment and script, sized like the reference test suite:
//! 1000 units of supply, 999 for sale at 10 each, 900 minimum raise.

use indexmap::IndexMap;

use ico_common::{
    config::{DeployConfig, SaleParams, TokenConfig},
    crypto::Address,
    time::TimestampSeconds,
};

use crate::script::{Op, Script, Step};

const START_TIME: TimestampSeconds = 1_700_000_000;
const DURATION: TimestampSeconds = 1000;

pub fn deployer() -> Address {
    Address::new([1; 32])
}

pub fn emergency_authority() -> Address {
    Address::new([2; 32])
}

fn buyer(n: u8) -> Address {
    Address::new([0x10 + n; 32])
}

pub fn config() -> DeployConfig {
    DeployConfig {
        deployer: deployer(),
        token: TokenConfig {
            total_supply: 1000,
            ..TokenConfig::default()
        },
        sale: SaleParams {
            emergency_authority: emergency_authority(),
            unit_price: 10,
            sale_cap: 999,
            min_raise: 900,
            start_time: START_TIME,
            end_time: START_TIME + DURATION,
        },
    }
}

fn step(at: Option<TimestampSeconds>, caller: Address, op: Op) -> Step {
    Step { at, caller, op }
}

/// Two buyers reach the minimum, one oversized order is rejected, the
/// deployer collects the raise and holders start trading.
pub fn script() -> Script {
    Script {
        genesis_time: START_TIME - 60,
        funding: IndexMap::from([(buyer(0), 600), (buyer(1), 20_000)]),
        steps: vec![
            step(Some(START_TIME), Address::zero(), Op::Start),
            step(Some(START_TIME + 10), buyer(0), Op::Contribute { value: 500 }),
            step(None, buyer(1), Op::Contribute { value: 10_000 }),
            step(Some(START_TIME + 20), buyer(1), Op::Contribute { value: 450 }),
            step(Some(START_TIME + DURATION), Address::zero(), Op::Finish),
            step(None, deployer(), Op::Withdraw),
            step(
                None,
                buyer(0),
                Op::Transfer {
                    to: buyer(1),
                    amount: 10,
                },
            ),
        ],
    }
}
