//! Fixed-point arithmetic for index-scaled balance accounting.
//!
//! Balances are plain integer amounts ([`Uint128`]); interest indexes and
//! prices are unsigned fixed-point numbers with 27 decimal places ([`Ray`]).
//! Multiplying a scaled balance by the current index yields the underlying
//! amount.
//!
//! ## On rounding errors
//!
//! Incorrect rounding is one of the most exploited vulnerabilities in lending
//! markets. Every conversion in this crate takes an explicit rounding
//! direction, and the principle is: **always round to the advantage of the
//! protocol, and to the disadvantage of the user**. Concretely:
//!
//! - crediting a user (scaled-balance increase): round down;
//! - debiting a user (scaled-balance decrease): round up;
//! - consuming a recorded delta: round up, so the delta is never under-stated;
//! - recording a new delta: round down, so claims are never over-stated.
//!
//! The conversion functions here are the source of truth; callers must not
//! re-derive them.

mod error;
mod int;
mod is_zero;
mod number_const;
mod ray;

pub use {error::*, int::*, is_zero::*, number_const::*, ray::*};
