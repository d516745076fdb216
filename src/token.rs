// src/token.rs - Fixed-supply ERC-20 sold by the ICO
// The whole supply is minted once to the owner; no mint, burn or pause afterwards

use alloc::string::String;
use stylus_sdk::{
    alloy_primitives::{Address, U256},
    alloy_sol_types::sol,
    prelude::*,
    stylus_core::log,
};

// ============================================================================
// TOKEN PARAMETERS
// ============================================================================

pub const NAME: &str = "TokenTest";
pub const SYMBOL: &str = "TKT";
pub const DECIMALS: u8 = 18;

/// 1,000,000 whole tokens.
pub const INITIAL_SUPPLY: u128 = 1_000_000 * 10u128.pow(DECIMALS as u32);

// ============================================================================
// ERROR DEFINITIONS
// ============================================================================

sol! {
    #[derive(Debug)]
    error InsufficientBalance(uint256 balance, uint256 required);
    #[derive(Debug)]
    error InsufficientAllowance(uint256 allowance, uint256 required);
    #[derive(Debug)]
    error ZeroAddress();
    #[derive(Debug)]
    error NotOwner(address caller, address owner);
    #[derive(Debug)]
    error AlreadyInitialized();
}

#[derive(SolidityError, Debug)]
pub enum TokenError {
    InsufficientBalance(InsufficientBalance),
    InsufficientAllowance(InsufficientAllowance),
    ZeroAddress(ZeroAddress),
    NotOwner(NotOwner),
    AlreadyInitialized(AlreadyInitialized),
}

// ============================================================================
// EVENT DEFINITIONS (EVM Compatible)
// ============================================================================

sol! {
    #[derive(Debug)]
    event Transfer(address indexed from, address indexed to, uint256 amount);
    #[derive(Debug)]
    event Approval(address indexed owner, address indexed spender, uint256 amount);
    #[derive(Debug)]
    event OwnershipTransferred(address indexed previous_owner, address indexed new_owner);
}

// ============================================================================
// STORAGE LAYOUT
// ============================================================================

sol_storage! {
    #[cfg_attr(feature = "token", entrypoint)]
    pub struct Token {
        uint256 total_supply;
        mapping(address => uint256) balances;
        mapping(address => mapping(address => uint256)) allowances;

        bool initialized;
        address owner;
    }
}

// ============================================================================
// IMPLEMENTATION
// ============================================================================

#[public]
impl Token {
    /// Mints the whole supply to `initial_owner`, who also owns the contract.
    /// Can only be called once.
    pub fn initialize(&mut self, initial_owner: Address) -> Result<(), TokenError> {
        if self.initialized.get() {
            return Err(TokenError::AlreadyInitialized(AlreadyInitialized {}));
        }

        if initial_owner == Address::ZERO {
            return Err(TokenError::ZeroAddress(ZeroAddress {}));
        }

        let supply = U256::from(INITIAL_SUPPLY);
        self.owner.set(initial_owner);
        self.balances.setter(initial_owner).set(supply);
        self.total_supply.set(supply);
        self.initialized.set(true);

        log(
            self.vm(),
            Transfer {
                from: Address::ZERO,
                to: initial_owner,
                amount: supply,
            },
        );
        log(
            self.vm(),
            OwnershipTransferred {
                previous_owner: Address::ZERO,
                new_owner: initial_owner,
            },
        );

        Ok(())
    }

    pub fn name(&self) -> Result<String, TokenError> {
        Ok(String::from(NAME))
    }

    pub fn symbol(&self) -> Result<String, TokenError> {
        Ok(String::from(SYMBOL))
    }

    pub fn decimals(&self) -> Result<u8, TokenError> {
        Ok(DECIMALS)
    }

    pub fn total_supply(&self) -> Result<U256, TokenError> {
        Ok(self.total_supply.get())
    }

    pub fn balance_of(&self, owner: Address) -> Result<U256, TokenError> {
        Ok(self.balances.get(owner))
    }

    /// Transfers `amount` tokens from the caller to `to`
    pub fn transfer(&mut self, to: Address, amount: U256) -> Result<bool, TokenError> {
        let from = self.vm().msg_sender();
        self.move_tokens(from, to, amount)?;
        Ok(true)
    }

    /// Lets `spender` move up to `amount` of the caller's tokens
    pub fn approve(&mut self, spender: Address, amount: U256) -> Result<bool, TokenError> {
        let owner = self.vm().msg_sender();
        self.set_allowance(owner, spender, amount)?;
        Ok(true)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> Result<U256, TokenError> {
        Ok(self.allowances.getter(owner).get(spender))
    }

    /// Moves `amount` from `from` to `to` out of the allowance `from` gave the caller
    pub fn transfer_from(
        &mut self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<bool, TokenError> {
        let spender = self.vm().msg_sender();

        let current_allowance = self.allowances.getter(from).get(spender);
        let new_allowance = current_allowance.checked_sub(amount).ok_or(
            TokenError::InsufficientAllowance(InsufficientAllowance {
                allowance: current_allowance,
                required: amount,
            }),
        )?;

        self.move_tokens(from, to, amount)?;
        self.allowances.setter(from).setter(spender).set(new_allowance);

        Ok(true)
    }

    /// Raises the caller's allowance to `spender` by `delta`
    pub fn increase_allowance(
        &mut self,
        spender: Address,
        delta: U256,
    ) -> Result<bool, TokenError> {
        let owner = self.vm().msg_sender();
        let current_allowance = self.allowances.getter(owner).get(spender);

        // Saturate: an allowance at the ceiling is already unlimited
        let new_allowance = current_allowance.saturating_add(delta);
        self.set_allowance(owner, spender, new_allowance)?;

        Ok(true)
    }

    /// Lowers the caller's allowance to `spender` by `delta`
    pub fn decrease_allowance(
        &mut self,
        spender: Address,
        delta: U256,
    ) -> Result<bool, TokenError> {
        let owner = self.vm().msg_sender();
        let current_allowance = self.allowances.getter(owner).get(spender);

        let new_allowance = current_allowance.checked_sub(delta).ok_or(
            TokenError::InsufficientAllowance(InsufficientAllowance {
                allowance: current_allowance,
                required: delta,
            }),
        )?;
        self.set_allowance(owner, spender, new_allowance)?;

        Ok(true)
    }

    // ========================================================================
    // OWNERSHIP MANAGEMENT
    // ========================================================================

    pub fn owner(&self) -> Result<Address, TokenError> {
        Ok(self.owner.get())
    }

    pub fn transfer_ownership(&mut self, new_owner: Address) -> Result<bool, TokenError> {
        self.only_owner()?;

        if new_owner == Address::ZERO {
            return Err(TokenError::ZeroAddress(ZeroAddress {}));
        }

        let previous_owner = self.owner.get();
        self.owner.set(new_owner);

        log(
            self.vm(),
            OwnershipTransferred {
                previous_owner,
                new_owner,
            },
        );

        Ok(true)
    }

    /// Leaves the contract without an owner
    pub fn renounce_ownership(&mut self) -> Result<bool, TokenError> {
        self.only_owner()?;

        let previous_owner = self.owner.get();
        self.owner.set(Address::ZERO);

        log(
            self.vm(),
            OwnershipTransferred {
                previous_owner,
                new_owner: Address::ZERO,
            },
        );

        Ok(true)
    }
}

impl Token {
    fn move_tokens(&mut self, from: Address, to: Address, amount: U256) -> Result<(), TokenError> {
        if to == Address::ZERO {
            return Err(TokenError::ZeroAddress(ZeroAddress {}));
        }

        let from_balance = self.balances.get(from);
        let new_from_balance =
            from_balance
                .checked_sub(amount)
                .ok_or(TokenError::InsufficientBalance(InsufficientBalance {
                    balance: from_balance,
                    required: amount,
                }))?;
        self.balances.setter(from).set(new_from_balance);

        // Cannot overflow: the sum of all balances is the fixed supply
        let to_balance = self.balances.get(to);
        self.balances.setter(to).set(to_balance + amount);

        log(self.vm(), Transfer { from, to, amount });

        Ok(())
    }

    fn set_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        if spender == Address::ZERO {
            return Err(TokenError::ZeroAddress(ZeroAddress {}));
        }

        self.allowances.setter(owner).setter(spender).set(amount);

        log(
            self.vm(),
            Approval {
                owner,
                spender,
                amount,
            },
        );

        Ok(())
    }

    fn only_owner(&self) -> Result<(), TokenError> {
        let caller = self.vm().msg_sender();
        let owner = self.owner.get();

        if caller != owner {
            return Err(TokenError::NotOwner(NotOwner { caller, owner }));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stylus_sdk::testing::*;

    fn addr(n: u8) -> Address {
        Address::from([n; 20])
    }

    const DEV: u8 = 1;
    const OWNER: u8 = 2;
    const HENRI: u8 = 3;
    const ICO: u8 = 4;

    fn deployed() -> (TestVM, Token) {
        let vm = TestVM::default();
        let mut token = Token::from(&vm);
        vm.set_sender(addr(DEV));
        token.initialize(addr(OWNER)).unwrap();
        (vm, token)
    }

    #[test]
    fn metadata() {
        let (_vm, token) = deployed();
        assert_eq!(token.name().unwrap(), "TokenTest");
        assert_eq!(token.symbol().unwrap(), "TKT");
        assert_eq!(token.decimals().unwrap(), 18);
    }

    #[test]
    fn whole_supply_goes_to_owner() {
        let (_vm, token) = deployed();
        let supply = U256::from(1_000_000_000_000_000_000_000_000u128);

        assert_eq!(token.owner().unwrap(), addr(OWNER));
        assert_eq!(token.total_supply().unwrap(), supply);
        assert_eq!(token.balance_of(addr(OWNER)).unwrap(), supply);
        assert_eq!(token.balance_of(addr(DEV)).unwrap(), U256::ZERO);
    }

    #[test]
    fn initialize_only_once() {
        let (_vm, mut token) = deployed();
        let err = token.initialize(addr(HENRI)).unwrap_err();
        assert!(matches!(err, TokenError::AlreadyInitialized(_)));
    }

    #[test]
    fn initialize_rejects_zero_owner() {
        let vm = TestVM::default();
        let mut token = Token::from(&vm);
        let err = token.initialize(Address::ZERO).unwrap_err();
        assert!(matches!(err, TokenError::ZeroAddress(_)));
    }

    #[test]
    fn transfer_moves_balance() {
        let (vm, mut token) = deployed();
        vm.set_sender(addr(OWNER));

        assert!(token.transfer(addr(HENRI), U256::from(500)).unwrap());
        assert_eq!(token.balance_of(addr(HENRI)).unwrap(), U256::from(500));
        assert_eq!(
            token.balance_of(addr(OWNER)).unwrap(),
            U256::from(INITIAL_SUPPLY - 500)
        );
    }

    #[test]
    fn transfer_rejects_overdraft() {
        let (vm, mut token) = deployed();
        vm.set_sender(addr(HENRI));

        let err = token.transfer(addr(OWNER), U256::from(1)).unwrap_err();
        assert!(matches!(
            err,
            TokenError::InsufficientBalance(e) if e.balance == U256::ZERO && e.required == U256::from(1)
        ));
    }

    #[test]
    fn transfer_from_spends_allowance() {
        let (vm, mut token) = deployed();
        vm.set_sender(addr(OWNER));
        token.approve(addr(ICO), U256::from(1_000)).unwrap();

        vm.set_sender(addr(ICO));
        token
            .transfer_from(addr(OWNER), addr(HENRI), U256::from(400))
            .unwrap();

        assert_eq!(token.balance_of(addr(HENRI)).unwrap(), U256::from(400));
        assert_eq!(
            token.allowance(addr(OWNER), addr(ICO)).unwrap(),
            U256::from(600)
        );
    }

    #[test]
    fn transfer_from_rejects_missing_allowance() {
        let (vm, mut token) = deployed();
        vm.set_sender(addr(ICO));

        let err = token
            .transfer_from(addr(OWNER), addr(HENRI), U256::from(1))
            .unwrap_err();
        assert!(matches!(err, TokenError::InsufficientAllowance(_)));
        assert_eq!(token.balance_of(addr(HENRI)).unwrap(), U256::ZERO);
    }

    #[test]
    fn allowance_adjustments() {
        let (vm, mut token) = deployed();
        vm.set_sender(addr(OWNER));

        token.increase_allowance(addr(ICO), U256::from(10)).unwrap();
        token.increase_allowance(addr(ICO), U256::from(5)).unwrap();
        token.decrease_allowance(addr(ICO), U256::from(3)).unwrap();
        assert_eq!(
            token.allowance(addr(OWNER), addr(ICO)).unwrap(),
            U256::from(12)
        );

        let err = token
            .decrease_allowance(addr(ICO), U256::from(13))
            .unwrap_err();
        assert!(matches!(err, TokenError::InsufficientAllowance(_)));
        assert!(matches!(
            token.approve(Address::ZERO, U256::from(1)).unwrap_err(),
            TokenError::ZeroAddress(_)
        ));
    }

    #[test]
    fn ownership_is_guarded() {
        let (vm, mut token) = deployed();

        vm.set_sender(addr(HENRI));
        let err = token.transfer_ownership(addr(HENRI)).unwrap_err();
        assert!(matches!(err, TokenError::NotOwner(e) if e.caller == addr(HENRI)));

        vm.set_sender(addr(OWNER));
        token.transfer_ownership(addr(HENRI)).unwrap();
        assert_eq!(token.owner().unwrap(), addr(HENRI));

        vm.set_sender(addr(HENRI));
        token.renounce_ownership().unwrap();
        assert_eq!(token.owner().unwrap(), Address::ZERO);
    }
}
