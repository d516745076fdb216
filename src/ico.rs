// src/ico.rs - ICO sale contract for Arbitrum Stylus
// Sells the beneficiary's ERC-20 for ETH at a fixed rate during two weeks

use alloc::vec::Vec;
use stylus_sdk::{
    alloy_primitives::{Address, U256, U64},
    alloy_sol_types::{sol, SolCall},
    prelude::*,
    stylus_core::{
        calls::{context::Call, CallAccess},
        log, Host,
    },
};

use crate::{
    errors::{AlreadyInitialized, IcoError, NativeTransferFailed, TokenCallFailed},
    ledger::{FixedClock, TokenLedger},
    sale::{self, Sale},
};

// ============================================================================
// EVENT DEFINITIONS (EVM Compatible)
// ============================================================================

sol! {
    /// `amount` is the wei kept by the sale, refunds excluded.
    #[derive(Debug)]
    event Bought(address indexed buyer, uint256 amount);

    #[derive(Debug)]
    event Withdrew(address indexed beneficiary, uint256 amount);

    /// ETH sent back to `buyer` when supply could not cover the whole order.
    #[derive(Debug)]
    event Refunded(address indexed buyer, uint256 amount);
}

// ============================================================================
// TOKEN INTERFACE
// ============================================================================

sol! {
    interface IErc20 {
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function transferFrom(address from, address to, uint256 value) external returns (bool);
    }
}

// ============================================================================
// STORAGE LAYOUT
// ============================================================================

sol_storage! {
    #[cfg_attr(not(feature = "token"), entrypoint)]
    pub struct Ico {
        bool initialized;

        // Fixed at initialization
        address beneficiary;
        address token;
        uint64 deadline;

        // Counters
        uint256 total_raised;
        uint256 tokens_sold;
    }
}

// ============================================================================
// IMPLEMENTATION
// ============================================================================

#[public]
impl Ico {
    /// Opens the sale of `token`. The caller becomes the beneficiary and
    /// must hold some of the token.
    pub fn initialize(&mut self, token: Address) -> Result<(), IcoError> {
        if self.initialized.get() {
            return Err(IcoError::AlreadyInitialized(AlreadyInitialized {}));
        }

        let beneficiary = self.vm().msg_sender();
        let contract = self.vm().contract_address();
        let clock = self.clock();

        let sale = {
            let mut ledger = Erc20Ledger::new(self.vm(), token);
            Sale::open(&mut ledger, &clock, token, contract, beneficiary)?
        };

        self.beneficiary.set(sale.beneficiary);
        self.token.set(sale.token);
        self.deadline.set(U64::from(sale.deadline));
        self.store_sale(&sale);
        self.initialized.set(true);

        Ok(())
    }

    /// Buys tokens with the attached ETH.
    #[payable]
    pub fn buy_tokens(&mut self) -> Result<(), IcoError> {
        self.purchase()
    }

    /// A plain ETH transfer is a purchase.
    #[receive]
    #[payable]
    pub fn receive(&mut self) -> Result<(), Vec<u8>> {
        self.purchase().map_err(Into::into)
    }

    /// Sends everything raised to the beneficiary, once the sale is over.
    ///
    /// Only the wei counted in `total_raised` leaves the contract. ETH forced
    /// in without a purchase (selfdestruct, coinbase) is never swept.
    pub fn withdraw(&mut self) -> Result<(), IcoError> {
        let caller = self.vm().msg_sender();
        let clock = self.clock();
        let mut sale = self.load_sale();

        let withdrawal = sale.withdraw(&clock, caller)?;
        self.store_sale(&sale);

        if withdrawal.amount > U256::ZERO {
            self.send(withdrawal.beneficiary, withdrawal.amount)?;
        }

        log(self.vm(), Withdrew::from(&withdrawal));

        Ok(())
    }

    // ========================================================================
    // VIEW METHODS
    // ========================================================================

    /// Tokens (smallest units) bought by `amount` wei.
    pub fn conversion(&self, amount: U256) -> Result<U256, IcoError> {
        sale::conversion(amount)
    }

    /// Whole tokens sold so far.
    pub fn token_sold(&self) -> Result<U256, IcoError> {
        Ok(self.load_sale().token_sold())
    }

    /// Wei raised and not yet withdrawn.
    pub fn total(&self) -> Result<U256, IcoError> {
        Ok(self.total_raised.get())
    }

    /// Seconds before the sale closes; reverts once it is closed.
    pub fn time_left(&self) -> Result<U256, IcoError> {
        let left = self.load_sale().time_left(&self.clock())?;
        Ok(U256::from(left))
    }

    pub fn beneficiary(&self) -> Result<Address, IcoError> {
        Ok(self.beneficiary.get())
    }

    pub fn token(&self) -> Result<Address, IcoError> {
        Ok(self.token.get())
    }

    pub fn deadline(&self) -> Result<u64, IcoError> {
        Ok(self.deadline.get().to::<u64>())
    }
}

impl Ico {
    fn purchase(&mut self) -> Result<(), IcoError> {
        let buyer = self.vm().msg_sender();
        let paid = self.vm().msg_value();
        let clock = self.clock();
        let mut sale = self.load_sale();

        let purchase = {
            let mut ledger = Erc20Ledger::new(self.vm(), sale.token);
            sale.buy(&mut ledger, &clock, buyer, paid)?
        };
        self.store_sale(&sale);

        // Counters are stored before any ETH leaves the contract
        if purchase.is_partial() {
            self.send(buyer, purchase.refund)?;
            log(
                self.vm(),
                Refunded {
                    buyer,
                    amount: purchase.refund,
                },
            );
        }

        log(self.vm(), Bought::from(&purchase));

        Ok(())
    }

    fn clock(&self) -> FixedClock {
        FixedClock(self.vm().block_timestamp())
    }

    fn load_sale(&self) -> Sale {
        Sale {
            beneficiary: self.beneficiary.get(),
            token: self.token.get(),
            contract: self.vm().contract_address(),
            deadline: self.deadline.get().to::<u64>(),
            total_raised: self.total_raised.get(),
            tokens_sold: self.tokens_sold.get(),
        }
    }

    fn store_sale(&mut self, sale: &Sale) {
        self.total_raised.set(sale.total_raised);
        self.tokens_sold.set(sale.tokens_sold);
    }

    fn send(&self, to: Address, amount: U256) -> Result<(), IcoError> {
        self.vm()
            .transfer_eth(to, amount)
            .map_err(|_| IcoError::NativeTransferFailed(NativeTransferFailed { to, amount }))
    }
}

// ============================================================================
// TOKEN LEDGER OVER CROSS-CONTRACT CALLS
// ============================================================================

/// The sale's view of the ERC-20 it sells, through calls to that contract.
struct Erc20Ledger<'a> {
    vm: &'a dyn Host,
    token: Address,
}

impl<'a> Erc20Ledger<'a> {
    fn new(vm: &'a dyn Host, token: Address) -> Self {
        Self { vm, token }
    }

    fn failed(&self) -> IcoError {
        IcoError::TokenCallFailed(TokenCallFailed { token: self.token })
    }

    fn view<C: SolCall>(&self, call: C) -> Result<C::Return, IcoError> {
        let returned = self
            .vm
            .static_call(&Call::new(), self.token, &call.abi_encode())
            .map_err(|_| self.failed())?;
        C::abi_decode_returns(&returned, true).map_err(|_| self.failed())
    }
}

impl TokenLedger for Erc20Ledger<'_> {
    fn balance_of(&mut self, account: Address) -> Result<U256, IcoError> {
        Ok(self.view(IErc20::balanceOfCall { account })?._0)
    }

    fn allowance(&mut self, owner: Address, spender: Address) -> Result<U256, IcoError> {
        Ok(self.view(IErc20::allowanceCall { owner, spender })?._0)
    }

    fn transfer_from(
        &mut self,
        _spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), IcoError> {
        // On-chain the spender is always the calling contract
        let call = IErc20::transferFromCall {
            from,
            to,
            value: amount,
        };
        let returned = self
            .vm
            .call(&Call::new(), self.token, &call.abi_encode())
            .map_err(|_| self.failed())?;
        let transferred = IErc20::transferFromCall::abi_decode_returns(&returned, true)
            .map_err(|_| self.failed())?
            ._0;

        if !transferred {
            return Err(self.failed());
        }
        Ok(())
    }
}
