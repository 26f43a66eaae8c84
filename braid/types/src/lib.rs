//! Domain data model for the braid matching layer: market ledger state,
//! per-user balances, identifiers, events, and the error taxonomy.

mod address;
mod balance;
mod denom;
mod error;
mod events;
mod market;

pub use {address::*, balance::*, denom::*, error::*, events::*, market::*};
