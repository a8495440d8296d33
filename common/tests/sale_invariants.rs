//! Property tests for the sale accounting invariants
//!
//! Random contribution sequences are replayed against a freshly deployed
//! sale. After every step the accounting must stay consistent, and a
//! rejected call must leave the whole state untouched.

use std::sync::Arc;

use ico_common::{
    config::{DeployConfig, SaleParams, TokenConfig},
    crypto::Address,
    deploy::deploy,
    sale::{NativeVault, SaleController, SalePhase},
    time::{Clock, ManualClock},
};
use proptest::prelude::*;

const SUPPLY: u64 = 1000;
const PRICE: u64 = 10;
const CAP: u64 = 999;
const MIN_RAISE: u64 = 900;
const START: u64 = 10_000;
const END: u64 = START + 1000;

#[derive(Clone, Debug)]
enum Op {
    Contribute { who: u8, value: u64 },
    Advance(u64),
    Abort,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (0u8..6, 0u64..2_500).prop_map(|(who, value)| Op::Contribute { who, value }),
        1 => (0u64..200).prop_map(Op::Advance),
        1 => Just(Op::Abort),
    ]
}

fn account(n: u8) -> Address {
    Address::new([n + 10; 32])
}

fn emergency() -> Address {
    Address::new([0xee; 32])
}

fn deployed() -> (Arc<ManualClock>, SaleController) {
    let clock = Arc::new(ManualClock::new(START));
    let config = DeployConfig {
        deployer: Address::new([1; 32]),
        token: TokenConfig {
            total_supply: SUPPLY,
            name: "MyAwesomeToken".to_string(),
            symbol: "MAT".to_string(),
            decimals: 2,
        },
        sale: SaleParams {
            emergency_authority: emergency(),
            unit_price: PRICE,
            sale_cap: CAP,
            min_raise: MIN_RAISE,
            start_time: START,
            end_time: END,
        },
    };
    let mut sale = deploy(&config, clock.clone()).expect("valid deployment");
    sale.start().expect("start at window opening");
    (clock, sale)
}

fn state_of(sale: &SaleController) -> serde_json::Value {
    serde_json::to_value(sale.snapshot()).expect("snapshot serializes")
}

fn check_accounting(sale: &SaleController, accepted: &[(Address, u64)]) {
    let units: u64 = accepted.iter().map(|(_, value)| value / PRICE).sum();
    let value: u64 = accepted.iter().map(|(_, value)| value).sum();

    assert!(sale.sold() <= sale.sale_cap());
    assert_eq!(sale.sold(), units);
    assert_eq!(sale.raised(), value);
    assert_eq!(sale.custody(), value);
    assert_eq!(sale.contributors().map(|(_, v)| v).sum::<u64>(), value);
    assert_eq!(sale.token_custody(), SUPPLY - sale.sold());
    assert_eq!(
        sale.ledger().snapshot().balance_sum(),
        Some(sale.ledger().total_supply())
    );
}

proptest! {
    #[test]
    fn test_accounting_holds_under_random_contributions(ops in prop::collection::vec(arb_op(), 1..40)) {
        let (clock, mut sale) = deployed();
        let mut accepted = Vec::new();

        for op in ops {
            let before = state_of(&sale);
            let result = match op {
                Op::Contribute { who, value } => sale
                    .contribute(&account(who), value)
                    .map(|_| accepted.push((account(who), value))),
                Op::Advance(seconds) => {
                    clock.advance(seconds).expect("no overflow");
                    Ok(())
                }
                Op::Abort => sale.abort(&emergency()),
            };

            if result.is_err() {
                prop_assert_eq!(state_of(&sale), before);
            }
            check_accounting(&sale, &accepted);
        }
    }

    #[test]
    fn test_settlement_empties_custody(ops in prop::collection::vec(arb_op(), 1..40)) {
        let (clock, mut sale) = deployed();
        let mut vault = NativeVault::new();

        for op in ops {
            match op {
                Op::Contribute { who, value } => {
                    let _ = sale.contribute(&account(who), value);
                }
                Op::Advance(seconds) => {
                    clock.advance(seconds).expect("no overflow");
                }
                Op::Abort => {}
            }
        }

        clock.set(END.max(clock.now())).expect("forward");
        let _ = sale.finish();
        let raised = sale.raised();
        let sold = sale.sold();

        match sale.phase() {
            SalePhase::Succeeded => {
                let beneficiary = *sale.beneficiary();
                prop_assert_eq!(sale.withdraw(&beneficiary, &mut vault), Ok(raised));
                prop_assert_eq!(vault.balance_of(&beneficiary), raised);
                prop_assert_eq!(sale.ledger().total_supply(), sold);
                prop_assert!(!sale.ledger().locked());
            }
            SalePhase::Failed => {
                let contributors: Vec<(Address, u64)> =
                    sale.contributors().map(|(a, v)| (*a, v)).collect();
                for (contributor, value) in contributors {
                    prop_assert_eq!(sale.refund(&contributor, &mut vault), Ok(value));
                    prop_assert_eq!(vault.balance_of(&contributor), value);
                }
                prop_assert!(sale.ledger().locked());
                prop_assert_eq!(sale.ledger().total_supply(), SUPPLY);
            }
            phase => prop_assert!(false, "unexpected phase {:?}", phase),
        }

        prop_assert_eq!(sale.custody(), 0);
        prop_assert_eq!(vault.balances().values().sum::<u64>(), raised);
    }
}
