// src/ledger.rs - Collaborators of the sale: the token ledger and the clock
// The on-chain versions live in `ico`, the in-memory ones here serve simulation and tests

use alloc::collections::BTreeMap;
use core::cell::Cell;

use stylus_sdk::alloy_primitives::{Address, U256};

use crate::errors::{IcoError, TokenCallFailed};

/// The three ERC-20 operations the sale relies on.
///
/// The sale never assumes anything about how the ledger stores balances;
/// a failed call surfaces as an [`IcoError`] and aborts the operation.
pub trait TokenLedger {
    /// Balance of `account`, in token smallest units.
    fn balance_of(&mut self, account: Address) -> Result<U256, IcoError>;

    /// How much `spender` may still move on behalf of `owner`.
    fn allowance(&mut self, owner: Address, spender: Address) -> Result<U256, IcoError>;

    /// Moves `amount` from `from` to `to`, consuming the allowance `from`
    /// granted to `spender`.
    fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), IcoError>;
}

/// Source of the current time, in seconds.
pub trait Clock {
    fn now(&self) -> u64;
}

/// Clock frozen at a single instant.
///
/// Block timestamps do not move during a transaction, so the contract
/// snapshots the block time once per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn starting_at(now: u64) -> Self {
        Self { now: Cell::new(now) }
    }

    pub fn set(&self, now: u64) {
        self.now.set(now);
    }

    /// Moves the clock forward by `seconds`, saturating at `u64::MAX`.
    pub fn advance(&self, seconds: u64) {
        self.now.set(self.now.get().saturating_add(seconds));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.get()
    }
}

/// In-memory ERC-20 book with the same allowance and balance rules as the
/// on-chain token.
#[derive(Debug, Default, Clone)]
pub struct MemoryLedger {
    address: Address,
    balances: BTreeMap<Address, U256>,
    allowances: BTreeMap<(Address, Address), U256>,
}

impl MemoryLedger {
    /// An empty ledger living at `address`.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            ..Self::default()
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Credits `amount` to `account` out of thin air.
    pub fn mint(&mut self, account: Address, amount: U256) -> Result<(), IcoError> {
        let balance = self.balance(account);
        let balance = balance.checked_add(amount).ok_or(self.rejected())?;
        self.balances.insert(account, balance);
        Ok(())
    }

    /// Sets the allowance of `spender` over `owner`'s tokens.
    pub fn approve(&mut self, owner: Address, spender: Address, amount: U256) {
        self.allowances.insert((owner, spender), amount);
    }

    /// Plain transfer signed by `from`.
    pub fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<(), IcoError> {
        self.move_balance(from, to, amount)
    }

    pub fn balance(&self, account: Address) -> U256 {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    fn allowed(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    fn move_balance(&mut self, from: Address, to: Address, amount: U256) -> Result<(), IcoError> {
        let from_balance = self.balance(from);
        let new_from_balance = from_balance.checked_sub(amount).ok_or(self.rejected())?;
        self.balances.insert(from, new_from_balance);

        let to_balance = self.balance(to);
        let new_to_balance = to_balance.checked_add(amount).ok_or(self.rejected())?;
        self.balances.insert(to, new_to_balance);

        Ok(())
    }

    fn rejected(&self) -> IcoError {
        IcoError::TokenCallFailed(TokenCallFailed {
            token: self.address,
        })
    }
}

impl TokenLedger for MemoryLedger {
    fn balance_of(&mut self, account: Address) -> Result<U256, IcoError> {
        Ok(self.balance(account))
    }

    fn allowance(&mut self, owner: Address, spender: Address) -> Result<U256, IcoError> {
        Ok(self.allowed(owner, spender))
    }

    fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), IcoError> {
        let current_allowance = self.allowed(from, spender);
        let new_allowance = current_allowance
            .checked_sub(amount)
            .ok_or(self.rejected())?;

        // Balance is checked before the allowance is consumed
        if self.balance(from) < amount {
            return Err(self.rejected());
        }

        self.allowances.insert((from, spender), new_allowance);
        self.move_balance(from, to, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::from([n; 20])
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::starting_at(100);
        clock.advance(50);
        assert_eq!(clock.now(), 150);

        clock.set(10);
        assert_eq!(clock.now(), 10);

        clock.advance(u64::MAX);
        assert_eq!(clock.now(), u64::MAX);
    }

    #[test]
    fn transfer_from_consumes_allowance() {
        let mut ledger = MemoryLedger::new(addr(9));
        ledger.mint(addr(1), U256::from(100)).unwrap();
        ledger.approve(addr(1), addr(2), U256::from(60));

        ledger
            .transfer_from(addr(2), addr(1), addr(3), U256::from(40))
            .unwrap();

        assert_eq!(ledger.balance(addr(1)), U256::from(60));
        assert_eq!(ledger.balance(addr(3)), U256::from(40));
        assert_eq!(ledger.allowance(addr(1), addr(2)).unwrap(), U256::from(20));
    }

    #[test]
    fn transfer_from_rejects_over_allowance() {
        let mut ledger = MemoryLedger::new(addr(9));
        ledger.mint(addr(1), U256::from(100)).unwrap();
        ledger.approve(addr(1), addr(2), U256::from(10));

        let err = ledger
            .transfer_from(addr(2), addr(1), addr(3), U256::from(11))
            .unwrap_err();
        assert!(matches!(err, IcoError::TokenCallFailed(e) if e.token == addr(9)));
        assert_eq!(ledger.balance(addr(1)), U256::from(100));
    }

    #[test]
    fn transfer_from_rejects_over_balance_and_keeps_allowance() {
        let mut ledger = MemoryLedger::new(addr(9));
        ledger.mint(addr(1), U256::from(5)).unwrap();
        ledger.approve(addr(1), addr(2), U256::from(50));

        assert!(ledger
            .transfer_from(addr(2), addr(1), addr(3), U256::from(6))
            .is_err());
        assert_eq!(ledger.allowance(addr(1), addr(2)).unwrap(), U256::from(50));
        assert_eq!(ledger.balance(addr(3)), U256::ZERO);
    }

    #[test]
    fn plain_transfer_moves_balance() {
        let mut ledger = MemoryLedger::new(addr(9));
        ledger.mint(addr(1), U256::from(7)).unwrap();
        ledger.transfer(addr(1), addr(2), U256::from(7)).unwrap();

        assert_eq!(ledger.balance(addr(1)), U256::ZERO);
        assert_eq!(ledger.balance(addr(2)), U256::from(7));
        assert!(ledger.transfer(addr(1), addr(2), U256::from(1)).is_err());
    }
}
