use soroban_sdk::{log, token, Env};

use crate::{allocate, events, phase, storage, SaleConfig, SaleError, BATCH_SIZE};

/// Flip to settling, forward the collected contribution balance to the
/// custodian, and reset the cursor. Any failure rolls the whole call back.
pub fn begin(env: &Env) -> Result<(), SaleError> {
    let config = storage::get_config(env).ok_or(SaleError::NotInitialized)?;
    phase::require_ready_to_settle(env, &config)?;

    let this = env.current_contract_address();
    let payout = token::Client::new(env, &config.payout_token);
    let allowance = match payout.try_allowance(&config.custodian, &this) {
        Ok(Ok(allowance)) => allowance,
        _ => return Err(SaleError::InsufficientAuthorization),
    };
    if allowance < config.pool_size {
        return Err(SaleError::InsufficientAuthorization);
    }

    storage::set_settlement_started(env);
    storage::set_cursor(env, 0);

    let contribution = token::Client::new(env, &config.contribution_token);
    let forwarded = match contribution.try_balance(&this) {
        Ok(Ok(balance)) => balance,
        _ => return Err(SaleError::ExternalTransferFailed),
    };
    if forwarded > 0 {
        match contribution.try_transfer(&this, &config.custodian, &forwarded) {
            Ok(Ok(())) => {}
            _ => return Err(SaleError::ExternalTransferFailed),
        }
    }

    events::settlement_started(env, forwarded, config.pool_size);
    log!(env, "settlement started: forwarded {}", forwarded);

    if storage::get_participant_count(env) == 0 {
        finalize(env, &config);
    }
    Ok(())
}

/// Pay participants `[cursor, min(cursor + BATCH_SIZE, len))` and move the
/// cursor to the end of that range. Returns the number of entries consumed.
///
/// A failed transfer fails the whole step; nothing in the range is marked and
/// the cursor stays put, so calling again retries the same range.
pub fn advance(env: &Env) -> Result<u32, SaleError> {
    let config = storage::get_config(env).ok_or(SaleError::NotInitialized)?;
    phase::require_settling(env, &config)?;

    let start = storage::get_cursor(env);
    let count = storage::get_participant_count(env);
    if start >= count {
        return Err(SaleError::SettlementComplete);
    }
    let end = core::cmp::min(start.saturating_add(BATCH_SIZE), count);

    let this = env.current_contract_address();
    let payout = token::Client::new(env, &config.payout_token);
    let total_received = storage::get_total_received(env);
    let mut distributed = storage::get_total_distributed(env);

    for participant in storage::get_participant_range(env, start, end).iter() {
        if storage::has_received_payout(env, &participant) {
            continue;
        }
        let contribution = storage::get_contribution(env, &participant);
        let amount = allocate(env, contribution, total_received, config.pool_size);

        // Stakes that floor to zero still get a zero-amount transfer and a mark.
        match payout.try_transfer_from(&this, &config.custodian, &participant, &amount) {
            Ok(Ok(())) => {}
            _ => return Err(SaleError::ExternalTransferFailed),
        }
        storage::mark_paid_out(env, &participant);
        distributed = distributed.saturating_add(amount);
        events::batch_distributed(env, &participant, amount);
    }

    storage::set_total_distributed(env, distributed);
    storage::set_cursor(env, end);
    log!(env, "settlement batch {}..{} of {}", start, end, count);

    if end == count {
        finalize(env, &config);
    }
    Ok(end - start)
}

fn finalize(env: &Env, config: &SaleConfig) {
    storage::set_finalized(env);
    events::finalized(env, storage::get_total_received(env), config.pool_size);
}
