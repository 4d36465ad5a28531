#![no_std]
#![deny(unsafe_code)]
#![deny(clippy::dbg_macro, clippy::todo, clippy::unimplemented)]
use soroban_sdk::{
    contract, contractclient, contracterror, contractimpl, contracttype, Address, Env, Vec,
};

mod allocation;
mod events;
mod ledger;
mod phase;
mod settlement;
mod storage;

pub use allocation::{allocate, pool_size_from_supply};

/// Errors returned by sale entrypoints. Codes are stable across versions; a
/// missing signature aborts through `require_auth` instead.
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
#[repr(u32)]
pub enum SaleError {
    /// Payout asset is the sale contract itself or reports a non-positive total supply.
    InvalidPayoutAsset = 1,
    /// Allocation percentage outside 1..=100.
    InvalidAllocationPercent = 2,
    /// Settlement deadline is not strictly after the ledger time at initialization.
    InvalidDeadline = 3,
    /// Custodian is the sale contract itself.
    InvalidCustodian = 4,
    /// Contribution asset is the payout asset or the sale contract itself.
    InvalidContributionAsset = 5,
    /// `initialize` was already called.
    AlreadyInitialized = 6,
    /// Sale parameters not set yet.
    NotInitialized = 7,
    /// Contribution after the deadline or after settlement began.
    SaleClosed = 8,
    /// Settlement requested before the deadline.
    SaleStillOpen = 9,
    /// `begin_settlement` called a second time.
    SettlementAlreadyStarted = 10,
    /// `advance_settlement` called before `begin_settlement`.
    SettlementNotStarted = 11,
    /// Contribution amount must be positive.
    InvalidContribution = 12,
    /// Custodian allowance for the sale contract is below the pool size.
    InsufficientAuthorization = 13,
    /// A value-forwarding or payout transfer reported failure.
    ExternalTransferFailed = 14,
    /// Every participant has already been processed.
    SettlementComplete = 15,
    /// A mutating call is already executing on this sale.
    OperationInProgress = 16,
}

/// Coarse grouping of [`SaleError`] variants for integrators.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    InvalidConfiguration,
    PhaseViolation,
    InvalidContribution,
    InsufficientAuthorization,
    ExternalTransferFailed,
    SettlementComplete,
    Concurrency,
}

impl SaleError {
    pub fn class(&self) -> ErrorClass {
        match self {
            SaleError::InvalidPayoutAsset
            | SaleError::InvalidAllocationPercent
            | SaleError::InvalidDeadline
            | SaleError::InvalidCustodian
            | SaleError::InvalidContributionAsset
            | SaleError::AlreadyInitialized => ErrorClass::InvalidConfiguration,
            SaleError::NotInitialized
            | SaleError::SaleClosed
            | SaleError::SaleStillOpen
            | SaleError::SettlementAlreadyStarted
            | SaleError::SettlementNotStarted => ErrorClass::PhaseViolation,
            SaleError::InvalidContribution => ErrorClass::InvalidContribution,
            SaleError::InsufficientAuthorization => ErrorClass::InsufficientAuthorization,
            SaleError::ExternalTransferFailed => ErrorClass::ExternalTransferFailed,
            SaleError::SettlementComplete => ErrorClass::SettlementComplete,
            SaleError::OperationInProgress => ErrorClass::Concurrency,
        }
    }
}

// ── Data structures ──────────────────────────────────────────
/// Contract version identifier. Bumped when storage or semantics change.
pub const CONTRACT_VERSION: u32 = 1;

/// Maximum number of participants paid in one `advance_settlement` call.
pub const BATCH_SIZE: u32 = 100;

/// Maximum number of participants returned in a single page.
pub const MAX_PAGE_LIMIT: u32 = 50;

/// Sale lifecycle. `Open` and `ReadyToSettle` are derived from the ledger
/// clock; `Settling` and `Finalized` are stored flags.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Open = 0,
    ReadyToSettle = 1,
    Settling = 2,
    Finalized = 3,
}

/// Parameters fixed at initialization. `pool_size` is computed once from the
/// payout asset's supply and never recomputed.
#[contracttype]
#[derive(Clone, Debug, PartialEq)]
pub struct SaleConfig {
    pub payout_token: Address,
    pub contribution_token: Address,
    pub allocation_percent: u32,
    pub pool_size: i128,
    pub deadline: u64,
    pub custodian: Address,
}

/// Storage keys. The participant list uses ParticipantCount/ParticipantItem so
/// settlement can read a bounded slice without loading the whole list.
#[contracttype]
pub enum DataKey {
    Config,
    /// Sum of all contributions; frozen once settlement starts.
    TotalReceived,
    /// Sum of all payout-token transfers made by settlement.
    TotalDistributed,
    SettlementStarted,
    Finalized,
    /// Next unprocessed index into the participant list.
    Cursor,
    ParticipantCount,
    /// Participant at insertion index.
    ParticipantItem(u32),
    /// Cumulative contribution per participant.
    Contribution(Address),
    /// Set once a participant's payout transfer succeeded.
    PaidOut(Address),
    /// Held for the duration of a mutating entrypoint.
    Locked,
}

/// Total-supply query on the payout asset. The rest of the asset interface is
/// reached through `soroban_sdk::token::Client`.
#[contractclient(name = "SupplyClient")]
pub trait SupplyInterface {
    fn total_supply(env: Env) -> i128;
}

// ── Contract ─────────────────────────────────────────────────
#[contract]
pub struct TokenSale;

#[contractimpl]
impl TokenSale {
    /// Fix the sale parameters. Can only be called once.
    ///
    /// `pool_size = total_supply(payout_token) * allocation_percent / 100`,
    /// evaluated now and stored.
    pub fn initialize(
        env: Env,
        payout_token: Address,
        contribution_token: Address,
        allocation_percent: u32,
        deadline: u64,
        custodian: Address,
    ) -> Result<(), SaleError> {
        if storage::has_config(&env) {
            return Err(SaleError::AlreadyInitialized);
        }

        let config = phase::validate_config(
            &env,
            payout_token,
            contribution_token,
            allocation_percent,
            deadline,
            custodian,
        )?;
        config.custodian.require_auth();
        storage::set_config(&env, &config);
        storage::set_total_received(&env, 0);
        storage::set_cursor(&env, 0);

        events::initialized(&env, &config);
        Ok(())
    }

    // ── Participation ─────────────────────────────────────────

    /// Deposit `amount` of the contribution asset. Only accepted strictly
    /// before the deadline. Repeat contributions accumulate.
    pub fn contribute(env: Env, participant: Address, amount: i128) -> Result<(), SaleError> {
        participant.require_auth();
        storage::acquire_lock(&env)?;
        let result = ledger::record_contribution(&env, &participant, amount);
        storage::release_lock(&env);
        result
    }

    // ── Settlement ────────────────────────────────────────────

    /// Start settlement once the deadline has passed. Forwards the collected
    /// contribution balance to the custodian. Permissionless.
    pub fn begin_settlement(env: Env) -> Result<(), SaleError> {
        storage::acquire_lock(&env)?;
        let result = settlement::begin(&env);
        storage::release_lock(&env);
        result
    }

    /// Pay the next batch of up to BATCH_SIZE participants. Returns how many
    /// list entries the step consumed. Permissionless and resumable.
    pub fn advance_settlement(env: Env) -> Result<u32, SaleError> {
        storage::acquire_lock(&env)?;
        let result = settlement::advance(&env);
        storage::release_lock(&env);
        result
    }

    /// (cursor, participant count).
    pub fn get_progress(env: Env) -> (u32, u32) {
        (
            storage::get_cursor(&env),
            storage::get_participant_count(&env),
        )
    }

    /// Tokens `participant` would receive if settlement froze the ledger now.
    pub fn get_estimated_allocation(env: Env, participant: Address) -> i128 {
        let pool_size = match storage::get_config(&env) {
            Some(config) => config.pool_size,
            None => return 0,
        };
        allocate(
            &env,
            storage::get_contribution(&env, &participant),
            storage::get_total_received(&env),
            pool_size,
        )
    }

    // ── Views ─────────────────────────────────────────────────

    pub fn get_phase(env: Env) -> Result<Phase, SaleError> {
        let config = storage::get_config(&env).ok_or(SaleError::NotInitialized)?;
        Ok(phase::current(&env, &config))
    }

    pub fn get_sale_config(env: Env) -> Result<SaleConfig, SaleError> {
        storage::get_config(&env).ok_or(SaleError::NotInitialized)
    }

    /// All participants in first-contribution order.
    pub fn get_participants(env: Env) -> Vec<Address> {
        let count = storage::get_participant_count(&env);
        storage::get_participant_range(&env, 0, count)
    }

    /// Return a page of participants. Limit capped at MAX_PAGE_LIMIT; 0 means the cap.
    /// Ordering: first-contribution order, same as settlement.
    pub fn get_participants_page(env: Env, start: u32, limit: u32) -> (Vec<Address>, Option<u32>) {
        let count = storage::get_participant_count(&env);
        let effective_limit = if limit == 0 || limit > MAX_PAGE_LIMIT {
            MAX_PAGE_LIMIT
        } else {
            limit
        };
        if start >= count {
            return (Vec::new(&env), None);
        }

        let end = core::cmp::min(start.saturating_add(effective_limit), count);
        let page = storage::get_participant_range(&env, start, end);
        let next_cursor = if end < count { Some(end) } else { None };
        (page, next_cursor)
    }

    pub fn get_participant_count(env: Env) -> u32 {
        storage::get_participant_count(&env)
    }

    pub fn get_payout_token(env: Env) -> Result<Address, SaleError> {
        Ok(Self::get_sale_config(env)?.payout_token)
    }

    pub fn get_contribution_token(env: Env) -> Result<Address, SaleError> {
        Ok(Self::get_sale_config(env)?.contribution_token)
    }

    pub fn get_allocation_percent(env: Env) -> Result<u32, SaleError> {
        Ok(Self::get_sale_config(env)?.allocation_percent)
    }

    pub fn get_pool_size(env: Env) -> Result<i128, SaleError> {
        Ok(Self::get_sale_config(env)?.pool_size)
    }

    pub fn get_deadline(env: Env) -> Result<u64, SaleError> {
        Ok(Self::get_sale_config(env)?.deadline)
    }

    pub fn get_custodian(env: Env) -> Result<Address, SaleError> {
        Ok(Self::get_sale_config(env)?.custodian)
    }

    pub fn get_total_received(env: Env) -> i128 {
        storage::get_total_received(&env)
    }

    /// Payout tokens transferred so far. After finalization the gap to the
    /// pool size is rounding dust left with the custodian.
    pub fn get_total_distributed(env: Env) -> i128 {
        storage::get_total_distributed(&env)
    }

    pub fn is_finalized(env: Env) -> bool {
        storage::is_finalized(&env)
    }

    pub fn is_settlement_started(env: Env) -> bool {
        storage::is_settlement_started(&env)
    }

    /// Cumulative contribution of `participant` (0 if none).
    pub fn get_contribution(env: Env, participant: Address) -> i128 {
        storage::get_contribution(&env, &participant)
    }

    pub fn has_received_payout(env: Env, participant: Address) -> bool {
        storage::has_received_payout(&env, &participant)
    }

    /// Return the current contract version.
    pub fn get_version(env: Env) -> u32 {
        let _ = env;
        CONTRACT_VERSION
    }
}

#[cfg(test)]
mod test_token;

mod test_allocation;
mod test_settlement;
