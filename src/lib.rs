//! traderules — boolean rule evaluation for trading strategies.
//!
//! Decides whether a composite trading condition holds at a bar index and
//! reports which leaf conditions contributed to a positive decision.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
