//! Minimal payout token for tests: the token subset the sale uses, plus
//! `total_supply` and a switch that makes every transfer fail.
use soroban_sdk::{contract, contractimpl, contracttype, Address, Env};

#[contracttype]
enum TokenKey {
    Balance(Address),
    Allowance(Address, Address),
    Supply,
    Failing,
}

#[contract]
pub struct TestToken;

#[contractimpl]
impl TestToken {
    pub fn mint(env: Env, to: Address, amount: i128) {
        let balance = Self::balance(env.clone(), to.clone());
        env.storage()
            .persistent()
            .set(&TokenKey::Balance(to), &(balance + amount));
        let supply = Self::total_supply(env.clone());
        env.storage()
            .persistent()
            .set(&TokenKey::Supply, &(supply + amount));
    }

    pub fn total_supply(env: Env) -> i128 {
        env.storage()
            .persistent()
            .get(&TokenKey::Supply)
            .unwrap_or(0)
    }

    pub fn balance(env: Env, id: Address) -> i128 {
        env.storage()
            .persistent()
            .get(&TokenKey::Balance(id))
            .unwrap_or(0)
    }

    pub fn allowance(env: Env, from: Address, spender: Address) -> i128 {
        env.storage()
            .persistent()
            .get(&TokenKey::Allowance(from, spender))
            .unwrap_or(0)
    }

    pub fn approve(env: Env, from: Address, spender: Address, amount: i128, _expiration_ledger: u32) {
        from.require_auth();
        env.storage()
            .persistent()
            .set(&TokenKey::Allowance(from, spender), &amount);
    }

    pub fn transfer(env: Env, from: Address, to: Address, amount: i128) {
        from.require_auth();
        Self::require_enabled(&env);
        Self::move_balance(&env, from, to, amount);
    }

    pub fn transfer_from(env: Env, spender: Address, from: Address, to: Address, amount: i128) {
        spender.require_auth();
        Self::require_enabled(&env);
        let allowance = Self::allowance(env.clone(), from.clone(), spender.clone());
        if allowance < amount {
            panic!("insufficient allowance");
        }
        env.storage()
            .persistent()
            .set(&TokenKey::Allowance(from.clone(), spender), &(allowance - amount));
        Self::move_balance(&env, from, to, amount);
    }

    pub fn set_failing(env: Env, failing: bool) {
        env.storage().persistent().set(&TokenKey::Failing, &failing);
    }
}

impl TestToken {
    fn require_enabled(env: &Env) {
        if env
            .storage()
            .persistent()
            .get::<TokenKey, bool>(&TokenKey::Failing)
            .unwrap_or(false)
        {
            panic!("transfers disabled");
        }
    }

    fn move_balance(env: &Env, from: Address, to: Address, amount: i128) {
        let from_balance = Self::balance(env.clone(), from.clone());
        if from_balance < amount {
            panic!("insufficient balance");
        }
        env.storage()
            .persistent()
            .set(&TokenKey::Balance(from), &(from_balance - amount));
        let to_balance = Self::balance(env.clone(), to.clone());
        env.storage()
            .persistent()
            .set(&TokenKey::Balance(to), &(to_balance + amount));
    }
}
