use soroban_sdk::{token, Address, Env};

use crate::{events, phase, storage, SaleError};

/// Record `amount` from `participant` and pull it into the sale contract.
///
/// A participant is appended to the list on their first contribution only;
/// later contributions add to the same record.
pub fn record_contribution(env: &Env, participant: &Address, amount: i128) -> Result<(), SaleError> {
    let config = storage::get_config(env).ok_or(SaleError::NotInitialized)?;
    if amount <= 0 {
        return Err(SaleError::InvalidContribution);
    }
    phase::require_open(env, &config)?;

    let previous = storage::get_contribution(env, participant);
    let updated = previous
        .checked_add(amount)
        .ok_or(SaleError::InvalidContribution)?;
    let total = storage::get_total_received(env)
        .checked_add(amount)
        .ok_or(SaleError::InvalidContribution)?;

    if !storage::is_participant(env, participant) {
        storage::push_participant(env, participant);
    }
    storage::set_contribution(env, participant, updated);
    storage::set_total_received(env, total);

    let this = env.current_contract_address();
    match token::Client::new(env, &config.contribution_token).try_transfer(
        participant,
        &this,
        &amount,
    ) {
        Ok(Ok(())) => {}
        _ => return Err(SaleError::ExternalTransferFailed),
    }

    events::participated(env, participant, amount);
    Ok(())
}
