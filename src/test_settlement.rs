#![cfg(test)]
extern crate std;

use soroban_sdk::{
    testutils::Address as _, testutils::Events as _, Address, Env, Symbol, TryFromVal,
};

use crate::events::{EVENT_BATCH_DISTRIBUTED, EVENT_FINALIZED, EVENT_SETTLEMENT_STARTED};
use crate::test::{
    contribute_new, contribution_balance, count_events, fund, set_time,
    setup, setup_with, Sale, DEADLINE, PERCENT, SUPPLY, TENTH,
};
use crate::test_token::{TestToken, TestTokenClient};
use crate::{ErrorClass, Phase, SaleError, BATCH_SIZE};

/// Data of the most recent `finalized` event as (total_received, pool_size).
fn finalized_payload(env: &Env) -> Option<(i128, i128)> {
    let mut payload = None;
    for (_contract, topics, data) in env.events().all().iter() {
        let Some(first) = topics.get(0) else { continue };
        if Symbol::try_from_val(env, &first) == Ok(EVENT_FINALIZED) {
            payload = <(i128, i128)>::try_from_val(env, &data).ok();
        }
    }
    payload
}

fn close_and_begin(sale: &Sale) {
    set_time(&sale.env, DEADLINE);
    sale.client.begin_settlement();
}

/// Advance until the sale reports completion; returns the per-call counts.
fn drain(sale: &Sale) -> std::vec::Vec<u32> {
    let mut steps = std::vec::Vec::new();
    loop {
        match sale.client.try_advance_settlement() {
            Ok(Ok(processed)) => steps.push(processed),
            Err(Ok(SaleError::SettlementComplete)) => break,
            other => panic!("unexpected settlement result: {:?}", other),
        }
    }
    steps
}

// ── phase gating ──────────────────────────────────────────────

#[test]
fn out_of_phase_settlement_calls() {
    let sale = setup();
    contribute_new(&sale, 10);

    assert_eq!(
        sale.client.try_advance_settlement(),
        Err(Ok(SaleError::SettlementNotStarted))
    );
    assert_eq!(
        sale.client.try_begin_settlement(),
        Err(Ok(SaleError::SaleStillOpen))
    );
    assert_eq!(SaleError::SaleStillOpen.class(), ErrorClass::PhaseViolation);

    set_time(&sale.env, DEADLINE);
    assert_eq!(
        sale.client.try_advance_settlement(),
        Err(Ok(SaleError::SettlementNotStarted))
    );
    assert!(!sale.client.is_settlement_started());
}

#[test]
fn begin_settlement_succeeds_once() {
    let sale = setup();
    contribute_new(&sale, 10);
    close_and_begin(&sale);

    assert!(sale.client.is_settlement_started());
    assert_eq!(sale.client.get_phase(), Phase::Settling);
    assert_eq!(
        sale.client.try_begin_settlement(),
        Err(Ok(SaleError::SettlementAlreadyStarted))
    );
    assert_eq!(count_events(&sale.env, EVENT_SETTLEMENT_STARTED), 1);

    drain(&sale);
    assert_eq!(
        sale.client.try_begin_settlement(),
        Err(Ok(SaleError::SettlementAlreadyStarted))
    );
}

#[test]
fn begin_settlement_forwards_value_and_freezes_total() {
    let sale = setup();
    let a = contribute_new(&sale, 300);
    contribute_new(&sale, 700);
    assert_eq!(contribution_balance(&sale, &sale.id), 1_000);

    close_and_begin(&sale);

    assert_eq!(contribution_balance(&sale, &sale.id), 0);
    assert_eq!(contribution_balance(&sale, &sale.custodian), 1_000);
    assert_eq!(sale.client.get_total_received(), 1_000);

    fund(&sale, &a, 50);
    assert_eq!(
        sale.client.try_contribute(&a, &50),
        Err(Ok(SaleError::SaleClosed))
    );
    assert_eq!(sale.client.get_total_received(), 1_000);
    assert_eq!(sale.client.get_contribution(&a), 300);
}

#[test]
fn begin_settlement_requires_custodian_allowance() {
    let sale = setup();
    contribute_new(&sale, 10);
    sale.payout
        .approve(&sale.custodian, &sale.id, &(sale.client.get_pool_size() - 1), &1_000_000);
    set_time(&sale.env, DEADLINE);

    assert_eq!(
        sale.client.try_begin_settlement(),
        Err(Ok(SaleError::InsufficientAuthorization))
    );
    assert!(!sale.client.is_settlement_started());
    assert_eq!(sale.client.get_phase(), Phase::ReadyToSettle);
    assert_eq!(contribution_balance(&sale, &sale.id), 10);

    sale.payout
        .approve(&sale.custodian, &sale.id, &sale.client.get_pool_size(), &1_000_000);
    sale.client.begin_settlement();
    assert!(sale.client.is_settlement_started());
}

#[test]
fn failed_value_forwarding_commits_nothing() {
    // Contribution asset whose transfers can be switched off.
    let (sale, contribution) = setup_with_mock_contribution();

    let participant = Address::generate(&sale.env);
    contribution.mint(&participant, &500);
    sale.client.contribute(&participant, &500);

    set_time(&sale.env, DEADLINE);
    contribution.set_failing(&true);
    assert_eq!(
        sale.client.try_begin_settlement(),
        Err(Ok(SaleError::ExternalTransferFailed))
    );
    assert!(!sale.client.is_settlement_started());
    assert_eq!(sale.client.get_phase(), Phase::ReadyToSettle);
    assert_eq!(contribution.balance(&sale.id), 500);

    contribution.set_failing(&false);
    sale.client.begin_settlement();
    assert_eq!(contribution.balance(&sale.custodian), 500);
}

fn setup_with_mock_contribution() -> (Sale, TestTokenClient<'static>) {
    let base = setup();
    let id = base.env.register_contract(None, TestToken);
    let contribution = TestTokenClient::new(&base.env, &id);
    (rebuild_with_contribution(base, id), contribution)
}

/// Fresh sale on `sale.env` using `contribution` as the contribution asset.
fn rebuild_with_contribution(sale: Sale, contribution: Address) -> Sale {
    let env = sale.env.clone();
    let id = env.register_contract(None, crate::TokenSale);
    let client = crate::TokenSaleClient::new(&env, &id);
    client.initialize(
        &sale.payout.address,
        &contribution,
        &PERCENT,
        &DEADLINE,
        &sale.custodian,
    );
    sale.payout
        .approve(&sale.custodian, &id, &client.get_pool_size(), &1_000_000);
    Sale {
        env,
        client,
        id,
        payout: sale.payout,
        contribution,
        custodian: sale.custodian,
    }
}

// ── batched payout ────────────────────────────────────────────

#[test]
fn two_batches_for_150_participants() {
    let sale = setup();
    sale.env.budget().reset_unlimited();
    for _ in 0..150 {
        contribute_new(&sale, TENTH);
    }
    close_and_begin(&sale);
    assert_eq!(sale.client.get_progress(), (0, 150));

    assert_eq!(sale.client.advance_settlement(), BATCH_SIZE);
    assert_eq!(sale.client.get_progress(), (100, 150));
    assert!(!sale.client.is_finalized());
    assert_eq!(count_events(&sale.env, EVENT_BATCH_DISTRIBUTED), 100);

    assert_eq!(sale.client.advance_settlement(), 50);
    assert_eq!(sale.client.get_progress(), (150, 150));
    assert!(sale.client.is_finalized());
    assert_eq!(sale.client.get_phase(), Phase::Finalized);
    assert_eq!(
        finalized_payload(&sale.env),
        Some((150 * TENTH, sale.client.get_pool_size()))
    );

    // floor(100_000 / 150) each.
    for participant in sale.client.get_participants().iter() {
        assert!(sale.client.has_received_payout(&participant));
        assert_eq!(sale.payout.balance(&participant), 666);
    }
    assert_eq!(sale.client.get_total_distributed(), 150 * 666);
}

#[test]
fn settlement_visits_every_participant_in_list_order() {
    let sale = setup();
    sale.env.budget().reset_unlimited();
    for _ in 0..205 {
        contribute_new(&sale, 7);
    }
    close_and_begin(&sale);

    let participants = sale.client.get_participants();
    assert_eq!(sale.client.advance_settlement(), 100);
    for (i, participant) in participants.iter().enumerate() {
        assert_eq!(sale.client.has_received_payout(&participant), i < 100);
    }

    assert_eq!(sale.client.advance_settlement(), 100);
    assert_eq!(sale.client.get_progress(), (200, 205));
    assert!(!sale.client.has_received_payout(&participants.get(200).unwrap()));

    assert_eq!(drain(&sale), std::vec![5]);
    assert!(sale.client.is_finalized());
    for participant in participants.iter() {
        assert!(sale.client.has_received_payout(&participant));
    }
}

#[test]
fn single_short_batch_finalizes() {
    let sale = setup();
    for _ in 0..3 {
        contribute_new(&sale, 1);
    }
    close_and_begin(&sale);
    assert_eq!(sale.client.advance_settlement(), 3);
    assert!(sale.client.is_finalized());
    assert_eq!(sale.client.get_progress(), (3, 3));
}

#[test]
fn advance_after_completion_changes_nothing() {
    let sale = setup();
    let a = contribute_new(&sale, 1);
    let b = contribute_new(&sale, 2);
    close_and_begin(&sale);
    sale.client.advance_settlement();

    let balance_a = sale.payout.balance(&a);
    let balance_b = sale.payout.balance(&b);
    for _ in 0..3 {
        assert_eq!(
            sale.client.try_advance_settlement(),
            Err(Ok(SaleError::SettlementComplete))
        );
    }
    assert_eq!(sale.payout.balance(&a), balance_a);
    assert_eq!(sale.payout.balance(&b), balance_b);
    assert!(sale.client.has_received_payout(&a));
    assert!(sale.client.has_received_payout(&b));
    assert_eq!(sale.client.get_progress(), (2, 2));
    assert_eq!(
        SaleError::SettlementComplete.class(),
        ErrorClass::SettlementComplete
    );
}

#[test]
fn payouts_are_floor_of_proportional_share() {
    let sale = setup();
    let a = contribute_new(&sale, 1);
    let b = contribute_new(&sale, 2);
    let c = contribute_new(&sale, 3);
    close_and_begin(&sale);
    sale.client.advance_settlement();

    let pool = sale.client.get_pool_size();
    assert_eq!(sale.payout.balance(&a), 16_666);
    assert_eq!(sale.payout.balance(&b), 33_333);
    assert_eq!(sale.payout.balance(&c), 50_000);

    // Dust stays with the custodian.
    let distributed = sale.client.get_total_distributed();
    assert_eq!(distributed, 99_999);
    assert!(distributed <= pool);
    assert_eq!(sale.payout.balance(&sale.custodian), SUPPLY - distributed);
}

#[test]
fn estimate_matches_payout() {
    let sale = setup();
    let a = contribute_new(&sale, 17);
    let b = contribute_new(&sale, 29);
    let estimate_a = sale.client.get_estimated_allocation(&a);
    let estimate_b = sale.client.get_estimated_allocation(&b);

    close_and_begin(&sale);
    sale.client.advance_settlement();

    assert_eq!(sale.payout.balance(&a), estimate_a);
    assert_eq!(sale.payout.balance(&b), estimate_b);
    assert_eq!(sale.client.get_estimated_allocation(&a), estimate_a);
}

#[test]
fn zero_allocation_is_still_marked_paid() {
    // Pool of 10 tokens.
    let sale = setup_with(10, 100, None);
    let small = contribute_new(&sale, 1);
    let large = contribute_new(&sale, 1_000);
    assert_eq!(sale.client.get_estimated_allocation(&small), 0);
    close_and_begin(&sale);

    assert_eq!(sale.client.advance_settlement(), 2);
    assert!(sale.client.is_finalized());
    assert_eq!(sale.client.get_contribution(&small), 1);
    assert_eq!(sale.payout.balance(&small), 0);
    assert!(sale.client.has_received_payout(&small));
    assert_eq!(sale.payout.balance(&large), 9);
    assert!(sale.client.has_received_payout(&large));
    assert_eq!(count_events(&sale.env, EVENT_BATCH_DISTRIBUTED), 2);
    assert_eq!(sale.client.get_total_distributed(), 9);
}

#[test]
fn contributions_rejected_after_finalization() {
    let sale = setup();
    let a = contribute_new(&sale, 4);
    contribute_new(&sale, 6);
    close_and_begin(&sale);
    sale.client.advance_settlement();
    assert_eq!(sale.client.get_phase(), Phase::Finalized);

    fund(&sale, &a, 25);
    assert_eq!(
        sale.client.try_contribute(&a, &25),
        Err(Ok(SaleError::SaleClosed))
    );
    let stranger = Address::generate(&sale.env);
    fund(&sale, &stranger, 25);
    assert_eq!(
        sale.client.try_contribute(&stranger, &25),
        Err(Ok(SaleError::SaleClosed))
    );

    assert_eq!(sale.client.get_contribution(&a), 4);
    assert_eq!(sale.client.get_contribution(&stranger), 0);
    assert_eq!(sale.client.get_total_received(), 10);
    assert_eq!(sale.client.get_participant_count(), 2);
    assert_eq!(contribution_balance(&sale, &a), 25);
}

#[test]
fn failed_payout_rolls_back_whole_batch() {
    let sale = setup();
    let a = contribute_new(&sale, 5);
    let b = contribute_new(&sale, 5);
    close_and_begin(&sale);

    sale.payout.set_failing(&true);
    assert_eq!(
        sale.client.try_advance_settlement(),
        Err(Ok(SaleError::ExternalTransferFailed))
    );
    assert_eq!(sale.client.get_progress(), (0, 2));
    assert!(!sale.client.has_received_payout(&a));
    assert!(!sale.client.has_received_payout(&b));
    assert_eq!(sale.client.get_total_distributed(), 0);
    assert_eq!(sale.client.get_phase(), Phase::Settling);

    sale.payout.set_failing(&false);
    assert_eq!(sale.client.advance_settlement(), 2);
    assert_eq!(sale.payout.balance(&a), 50_000);
    assert_eq!(sale.payout.balance(&b), 50_000);
    assert!(sale.client.is_finalized());
}

#[test]
fn revoked_allowance_mid_settlement_fails_step() {
    let sale = setup();
    sale.env.budget().reset_unlimited();
    for _ in 0..120 {
        contribute_new(&sale, 1);
    }
    close_and_begin(&sale);
    assert_eq!(sale.client.advance_settlement(), 100);

    sale.payout.approve(&sale.custodian, &sale.id, &0, &1_000_000);
    assert_eq!(
        sale.client.try_advance_settlement(),
        Err(Ok(SaleError::ExternalTransferFailed))
    );
    assert_eq!(sale.client.get_progress(), (100, 120));

    sale.payout
        .approve(&sale.custodian, &sale.id, &sale.client.get_pool_size(), &1_000_000);
    assert_eq!(sale.client.advance_settlement(), 20);
    assert!(sale.client.is_finalized());
}

#[test]
fn empty_sale_finalizes_on_begin() {
    let sale = setup();
    close_and_begin(&sale);

    assert!(sale.client.is_finalized());
    assert_eq!(sale.client.get_phase(), Phase::Finalized);
    assert_eq!(
        finalized_payload(&sale.env),
        Some((0, sale.client.get_pool_size()))
    );
    assert_eq!(
        sale.client.try_advance_settlement(),
        Err(Ok(SaleError::SettlementComplete))
    );
    assert_eq!(sale.client.get_total_distributed(), 0);
}
