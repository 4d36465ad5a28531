use soroban_sdk::{Address, Env};

use crate::allocation::pool_size_from_supply;
use crate::{storage, Phase, SaleConfig, SaleError, SupplyClient};

/// Check constructor arguments and fix the pool size from the payout asset's
/// current supply.
pub fn validate_config(
    env: &Env,
    payout_token: Address,
    contribution_token: Address,
    allocation_percent: u32,
    deadline: u64,
    custodian: Address,
) -> Result<SaleConfig, SaleError> {
    let this = env.current_contract_address();
    if payout_token == this {
        return Err(SaleError::InvalidPayoutAsset);
    }
    if allocation_percent == 0 || allocation_percent > 100 {
        return Err(SaleError::InvalidAllocationPercent);
    }
    if deadline <= env.ledger().timestamp() {
        return Err(SaleError::InvalidDeadline);
    }
    if custodian == this {
        return Err(SaleError::InvalidCustodian);
    }
    if contribution_token == this || contribution_token == payout_token {
        return Err(SaleError::InvalidContributionAsset);
    }

    let total_supply = match SupplyClient::new(env, &payout_token).try_total_supply() {
        Ok(Ok(supply)) => supply,
        _ => return Err(SaleError::InvalidPayoutAsset),
    };
    let pool_size = pool_size_from_supply(total_supply, allocation_percent);
    if pool_size <= 0 {
        return Err(SaleError::InvalidPayoutAsset);
    }

    Ok(SaleConfig {
        payout_token,
        contribution_token,
        allocation_percent,
        pool_size,
        deadline,
        custodian,
    })
}

/// Derive the phase from the stored flags and the ledger clock.
pub fn current(env: &Env, config: &SaleConfig) -> Phase {
    if storage::is_finalized(env) {
        Phase::Finalized
    } else if storage::is_settlement_started(env) {
        Phase::Settling
    } else if env.ledger().timestamp() >= config.deadline {
        Phase::ReadyToSettle
    } else {
        Phase::Open
    }
}

pub fn require_open(env: &Env, config: &SaleConfig) -> Result<(), SaleError> {
    match current(env, config) {
        Phase::Open => Ok(()),
        _ => Err(SaleError::SaleClosed),
    }
}

pub fn require_ready_to_settle(env: &Env, config: &SaleConfig) -> Result<(), SaleError> {
    match current(env, config) {
        Phase::ReadyToSettle => Ok(()),
        Phase::Open => Err(SaleError::SaleStillOpen),
        Phase::Settling | Phase::Finalized => Err(SaleError::SettlementAlreadyStarted),
    }
}

pub fn require_settling(env: &Env, config: &SaleConfig) -> Result<(), SaleError> {
    match current(env, config) {
        Phase::Settling => Ok(()),
        Phase::Finalized => Err(SaleError::SettlementComplete),
        Phase::Open | Phase::ReadyToSettle => Err(SaleError::SettlementNotStarted),
    }
}
