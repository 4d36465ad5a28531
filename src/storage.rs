use soroban_sdk::{Address, Env, Vec};

use crate::{DataKey, SaleConfig, SaleError};

pub fn has_config(env: &Env) -> bool {
    env.storage().persistent().has(&DataKey::Config)
}

pub fn get_config(env: &Env) -> Option<SaleConfig> {
    env.storage().persistent().get(&DataKey::Config)
}

pub fn set_config(env: &Env, config: &SaleConfig) {
    env.storage().persistent().set(&DataKey::Config, config);
}

pub fn get_total_received(env: &Env) -> i128 {
    env.storage()
        .persistent()
        .get(&DataKey::TotalReceived)
        .unwrap_or(0)
}

pub fn set_total_received(env: &Env, total: i128) {
    env.storage()
        .persistent()
        .set(&DataKey::TotalReceived, &total);
}

pub fn get_total_distributed(env: &Env) -> i128 {
    env.storage()
        .persistent()
        .get(&DataKey::TotalDistributed)
        .unwrap_or(0)
}

pub fn set_total_distributed(env: &Env, total: i128) {
    env.storage()
        .persistent()
        .set(&DataKey::TotalDistributed, &total);
}

pub fn is_settlement_started(env: &Env) -> bool {
    env.storage()
        .persistent()
        .get::<DataKey, bool>(&DataKey::SettlementStarted)
        .unwrap_or(false)
}

pub fn set_settlement_started(env: &Env) {
    env.storage()
        .persistent()
        .set(&DataKey::SettlementStarted, &true);
}

pub fn is_finalized(env: &Env) -> bool {
    env.storage()
        .persistent()
        .get::<DataKey, bool>(&DataKey::Finalized)
        .unwrap_or(false)
}

pub fn set_finalized(env: &Env) {
    env.storage().persistent().set(&DataKey::Finalized, &true);
}

pub fn get_cursor(env: &Env) -> u32 {
    env.storage()
        .persistent()
        .get(&DataKey::Cursor)
        .unwrap_or(0)
}

pub fn set_cursor(env: &Env, cursor: u32) {
    env.storage().persistent().set(&DataKey::Cursor, &cursor);
}

// ── Participant list ──────────────────────────────────────────

pub fn get_participant_count(env: &Env) -> u32 {
    env.storage()
        .persistent()
        .get(&DataKey::ParticipantCount)
        .unwrap_or(0)
}

/// Append `participant` at the end of the list. Callers check membership first.
pub fn push_participant(env: &Env, participant: &Address) {
    let count = get_participant_count(env);
    env.storage()
        .persistent()
        .set(&DataKey::ParticipantItem(count), participant);
    env.storage()
        .persistent()
        .set(&DataKey::ParticipantCount, &(count + 1));
}

/// Participants at indices `start..end`, in insertion order.
pub fn get_participant_range(env: &Env, start: u32, end: u32) -> Vec<Address> {
    let mut participants = Vec::new(env);
    for i in start..end {
        if let Some(participant) = env
            .storage()
            .persistent()
            .get::<DataKey, Address>(&DataKey::ParticipantItem(i))
        {
            participants.push_back(participant);
        }
    }
    participants
}

// ── Per-participant records ───────────────────────────────────

/// Membership in the participant list is implied by a stored contribution.
pub fn is_participant(env: &Env, participant: &Address) -> bool {
    env.storage()
        .persistent()
        .has(&DataKey::Contribution(participant.clone()))
}

pub fn get_contribution(env: &Env, participant: &Address) -> i128 {
    env.storage()
        .persistent()
        .get(&DataKey::Contribution(participant.clone()))
        .unwrap_or(0)
}

pub fn set_contribution(env: &Env, participant: &Address, amount: i128) {
    env.storage()
        .persistent()
        .set(&DataKey::Contribution(participant.clone()), &amount);
}

pub fn has_received_payout(env: &Env, participant: &Address) -> bool {
    env.storage()
        .persistent()
        .get::<DataKey, bool>(&DataKey::PaidOut(participant.clone()))
        .unwrap_or(false)
}

pub fn mark_paid_out(env: &Env, participant: &Address) {
    env.storage()
        .persistent()
        .set(&DataKey::PaidOut(participant.clone()), &true);
}

// ── Re-entrancy lock ──────────────────────────────────────────

/// Fails with `OperationInProgress` if another mutating call holds the lock.
pub fn acquire_lock(env: &Env) -> Result<(), SaleError> {
    if is_locked(env) {
        return Err(SaleError::OperationInProgress);
    }
    env.storage().instance().set(&DataKey::Locked, &true);
    Ok(())
}

pub fn release_lock(env: &Env) {
    env.storage().instance().set(&DataKey::Locked, &false);
}

pub fn is_locked(env: &Env) -> bool {
    env.storage()
        .instance()
        .get::<DataKey, bool>(&DataKey::Locked)
        .unwrap_or(false)
}
