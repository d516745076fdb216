// src/errors.rs - Revert reasons of the ICO sale contract
// Every failure aborts the whole call; the ABI-encoded error is the revert data

use stylus_sdk::{alloy_sol_types::sol, prelude::*};

sol! {
    /// The beneficiary holds no token at opening, there is nothing to sell.
    #[derive(Debug)]
    error NoTokensToExchange(address owner);

    /// `initialize` was already called.
    #[derive(Debug)]
    error AlreadyInitialized();

    /// The two weeks window is over, purchases are refused.
    #[derive(Debug)]
    error SaleClosed(uint64 deadline, uint64 now);

    /// The beneficiary has not approved the sale yet, or everything is sold.
    #[derive(Debug)]
    error NoTokensAvailable();

    /// A purchase was attempted without attaching any ETH.
    #[derive(Debug)]
    error ZeroPayment();

    /// Only the beneficiary may withdraw.
    #[derive(Debug)]
    error NotOwner(address caller, address owner);

    /// Withdrawal is only possible once the deadline is reached.
    #[derive(Debug)]
    error SaleStillOpen(uint64 deadline, uint64 now);

    /// `time_left` was queried after the deadline.
    #[derive(Debug)]
    error NoTimeLeft();

    /// A token amount does not fit in 256 bits.
    #[derive(Debug)]
    error ArithmeticOverflow();

    /// The token contract reverted or answered `false`.
    #[derive(Debug)]
    error TokenCallFailed(address token);

    /// Sending ETH (refund or withdrawal) failed.
    #[derive(Debug)]
    error NativeTransferFailed(address to, uint256 amount);
}

#[derive(SolidityError, Debug)]
pub enum IcoError {
    NoTokensToExchange(NoTokensToExchange),
    AlreadyInitialized(AlreadyInitialized),
    SaleClosed(SaleClosed),
    NoTokensAvailable(NoTokensAvailable),
    ZeroPayment(ZeroPayment),
    NotOwner(NotOwner),
    SaleStillOpen(SaleStillOpen),
    NoTimeLeft(NoTimeLeft),
    ArithmeticOverflow(ArithmeticOverflow),
    TokenCallFailed(TokenCallFailed),
    NativeTransferFailed(NativeTransferFailed),
}
