// src/sale.rs - Fixed-rate sale rules, independent of the Stylus host
// The `Ico` contract loads a `Sale` from storage, runs one operation and stores it back

use stylus_sdk::alloy_primitives::{Address, U256};

use crate::{
    errors::{
        ArithmeticOverflow, IcoError, NoTimeLeft, NoTokensAvailable, NoTokensToExchange, NotOwner,
        SaleClosed, SaleStillOpen, ZeroPayment,
    },
    ico::{Bought, Withdrew},
    ledger::{Clock, TokenLedger},
};

// ============================================================================
// SALE PARAMETERS
// ============================================================================

/// How long purchases stay open after the sale is created (14 days).
pub const SALE_DURATION: u64 = 14 * 24 * 60 * 60;

/// Token smallest units bought by one wei: 1 gwei buys one whole token.
pub const RATE: u64 = 1_000_000_000;

/// Price of one whole token, in wei.
pub const PAYMENT_UNIT: u64 = 1_000_000_000;

/// One whole token in smallest units (18 decimals).
pub const TOKEN_UNIT: u128 = 1_000_000_000_000_000_000;

/// Tokens delivered for `paid` wei.
pub fn conversion(paid: U256) -> Result<U256, IcoError> {
    paid.checked_mul(U256::from(RATE))
        .ok_or(IcoError::ArithmeticOverflow(ArithmeticOverflow {}))
}

/// Outcome of a successful purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Purchase {
    pub buyer: Address,
    /// Wei attached to the call.
    pub paid: U256,
    /// Wei kept by the sale.
    pub retained: U256,
    /// Wei handed back to the buyer when supply ran short.
    pub refund: U256,
    /// Token smallest units delivered to the buyer.
    pub tokens: U256,
}

impl Purchase {
    pub fn is_partial(&self) -> bool {
        self.refund > U256::ZERO
    }
}

impl From<&Purchase> for Bought {
    fn from(purchase: &Purchase) -> Self {
        Bought {
            buyer: purchase.buyer,
            amount: purchase.retained,
        }
    }
}

/// Outcome of a successful withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Withdrawal {
    pub beneficiary: Address,
    pub amount: U256,
}

impl From<&Withdrawal> for Withdrew {
    fn from(withdrawal: &Withdrawal) -> Self {
        Withdrew {
            beneficiary: withdrawal.beneficiary,
            amount: withdrawal.amount,
        }
    }
}

/// State of one sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sale {
    /// Supplies the tokens and collects the proceeds.
    pub beneficiary: Address,
    /// ERC-20 being sold.
    pub token: Address,
    /// Address of the sale itself, the spender on the token ledger.
    pub contract: Address,
    /// First instant at which purchases are refused.
    pub deadline: u64,
    /// Wei retained and not yet withdrawn.
    pub total_raised: U256,
    /// Token smallest units delivered since the sale opened.
    pub tokens_sold: U256,
}

impl Sale {
    /// Opens a sale for `beneficiary`, closing `SALE_DURATION` from now.
    ///
    /// Refused when the beneficiary holds no token on the ledger.
    pub fn open<L: TokenLedger, C: Clock>(
        ledger: &mut L,
        clock: &C,
        token: Address,
        contract: Address,
        beneficiary: Address,
    ) -> Result<Self, IcoError> {
        if ledger.balance_of(beneficiary)? == U256::ZERO {
            return Err(IcoError::NoTokensToExchange(NoTokensToExchange {
                owner: beneficiary,
            }));
        }

        Ok(Self {
            beneficiary,
            token,
            contract,
            deadline: clock.now().saturating_add(SALE_DURATION),
            total_raised: U256::ZERO,
            tokens_sold: U256::ZERO,
        })
    }

    /// Sells tokens to `buyer` for `paid` wei.
    ///
    /// When the beneficiary cannot cover the whole order, only what is
    /// available is delivered and the unspent wei is reported as `refund`.
    /// Nothing changes unless the ledger transfer succeeds.
    pub fn buy<L: TokenLedger, C: Clock>(
        &mut self,
        ledger: &mut L,
        clock: &C,
        buyer: Address,
        paid: U256,
    ) -> Result<Purchase, IcoError> {
        let now = clock.now();
        if now >= self.deadline {
            return Err(IcoError::SaleClosed(SaleClosed {
                deadline: self.deadline,
                now,
            }));
        }

        let available = self.available(ledger)?;
        if available == U256::ZERO {
            return Err(IcoError::NoTokensAvailable(NoTokensAvailable {}));
        }

        if paid == U256::ZERO {
            return Err(IcoError::ZeroPayment(ZeroPayment {}));
        }

        let wanted = conversion(paid)?;
        let (retained, tokens) = if wanted <= available {
            (paid, wanted)
        } else {
            // Round down to whole wei, the remainder goes back to the buyer
            let retained = available / U256::from(RATE);
            (retained, conversion(retained)?)
        };

        if retained == U256::ZERO {
            return Err(IcoError::NoTokensAvailable(NoTokensAvailable {}));
        }

        let total_raised = self
            .total_raised
            .checked_add(retained)
            .ok_or(IcoError::ArithmeticOverflow(ArithmeticOverflow {}))?;
        let tokens_sold = self
            .tokens_sold
            .checked_add(tokens)
            .ok_or(IcoError::ArithmeticOverflow(ArithmeticOverflow {}))?;

        ledger.transfer_from(self.contract, self.beneficiary, buyer, tokens)?;

        self.total_raised = total_raised;
        self.tokens_sold = tokens_sold;

        Ok(Purchase {
            buyer,
            paid,
            retained,
            refund: paid - retained,
            tokens,
        })
    }

    /// Hands the proceeds to the beneficiary once the sale is over.
    ///
    /// Withdrawing an empty sale succeeds with a zero amount.
    pub fn withdraw<C: Clock>(&mut self, clock: &C, caller: Address) -> Result<Withdrawal, IcoError> {
        self.only_beneficiary(caller)?;

        let now = clock.now();
        if now < self.deadline {
            return Err(IcoError::SaleStillOpen(SaleStillOpen {
                deadline: self.deadline,
                now,
            }));
        }

        let amount = self.total_raised;
        self.total_raised = U256::ZERO;

        Ok(Withdrawal {
            beneficiary: self.beneficiary,
            amount,
        })
    }

    /// Seconds until the deadline. Fails once the deadline is reached.
    pub fn time_left<C: Clock>(&self, clock: &C) -> Result<u64, IcoError> {
        let now = clock.now();
        if now >= self.deadline {
            return Err(IcoError::NoTimeLeft(NoTimeLeft {}));
        }
        Ok(self.deadline - now)
    }

    pub fn is_open<C: Clock>(&self, clock: &C) -> bool {
        clock.now() < self.deadline
    }

    /// Wei collected and not yet withdrawn.
    pub fn total(&self) -> U256 {
        self.total_raised
    }

    /// Whole tokens delivered since the sale opened.
    pub fn token_sold(&self) -> U256 {
        self.tokens_sold / U256::from(TOKEN_UNIT)
    }

    /// Tokens the sale may still move: the smaller of the beneficiary's
    /// allowance to the sale and their balance.
    pub fn available<L: TokenLedger>(&self, ledger: &mut L) -> Result<U256, IcoError> {
        let allowance = ledger.allowance(self.beneficiary, self.contract)?;
        if allowance == U256::ZERO {
            return Ok(U256::ZERO);
        }
        let balance = ledger.balance_of(self.beneficiary)?;
        Ok(allowance.min(balance))
    }

    fn only_beneficiary(&self, caller: Address) -> Result<(), IcoError> {
        if caller != self.beneficiary {
            return Err(IcoError::NotOwner(NotOwner {
                caller,
                owner: self.beneficiary,
            }));
        }
        Ok(())
    }
}
