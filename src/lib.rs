// src/lib.rs - Fixed-rate ICO for Arbitrum Stylus
// Two contracts: the `Ico` sale (default entrypoint) and the fixed-supply `Token` it sells

#![cfg_attr(all(not(feature = "export-abi"), not(test)), no_main)]
extern crate alloc;

pub mod errors;
pub mod ico;
pub mod ledger;
pub mod sale;
pub mod token;

pub use errors::IcoError;
pub use ico::{Bought, Ico, Refunded, Withdrew};
pub use ledger::{Clock, FixedClock, ManualClock, MemoryLedger, TokenLedger};
pub use sale::{conversion, Purchase, Sale, Withdrawal, PAYMENT_UNIT, RATE, SALE_DURATION, TOKEN_UNIT};
pub use token::{Token, TokenError};
