use soroban_sdk::{symbol_short, Address, Env, Symbol};

use crate::SaleConfig;

// ── Event symbols ────────────────────────────────────────────
pub const EVENT_INIT: Symbol = symbol_short!("init");
pub const EVENT_PARTICIPATED: Symbol = symbol_short!("particip");
pub const EVENT_SETTLEMENT_STARTED: Symbol = symbol_short!("settle_st");
pub const EVENT_BATCH_DISTRIBUTED: Symbol = symbol_short!("batch_dst");
pub const EVENT_FINALIZED: Symbol = symbol_short!("finalized");

pub fn initialized(env: &Env, config: &SaleConfig) {
    env.events().publish(
        (EVENT_INIT, config.custodian.clone()),
        (
            config.payout_token.clone(),
            config.pool_size,
            config.deadline,
        ),
    );
}

pub fn participated(env: &Env, participant: &Address, amount: i128) {
    env.events()
        .publish((EVENT_PARTICIPATED, participant.clone()), amount);
}

/// `forwarded` is the contribution balance sent to the custodian.
pub fn settlement_started(env: &Env, forwarded: i128, pool_size: i128) {
    env.events()
        .publish((EVENT_SETTLEMENT_STARTED,), (forwarded, pool_size));
}

pub fn batch_distributed(env: &Env, participant: &Address, amount: i128) {
    env.events()
        .publish((EVENT_BATCH_DISTRIBUTED, participant.clone()), amount);
}

pub fn finalized(env: &Env, total_received: i128, pool_size: i128) {
    env.events()
        .publish((EVENT_FINALIZED,), (total_received, pool_size));
}
