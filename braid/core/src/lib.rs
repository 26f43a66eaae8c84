//! The braid matching layer: a peer-to-peer rate optimizer sitting between
//! users and a pooled lending protocol.
//!
//! Users supply, borrow, and post collateral through [`Braid`]. Incoming
//! flow is matched against the opposite side at a mid rate where possible
//! and falls back to the pool where not; matches are unwound transparently
//! when either party leaves, with the deltas absorbing anything that cannot
//! be unwound immediately.
//!
//! The crate is layered the same way operations run:
//!
//! - [`core`] holds the pure machinery: ranking, matching, delta
//!   accounting, index refresh, the position flows, and health math.
//! - [`state`](crate::state) holds the vaults and the staged-commit
//!   plumbing that makes every operation atomic.
//! - The execution surface on [`Braid`] validates, stages, runs the pool
//!   calls, and commits.

pub mod core;
mod execute;
mod query;
mod state;
mod traits;

pub use {state::*, traits::*};
