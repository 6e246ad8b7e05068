//! Rules services orchestrating repositories and game-rule state machines.
//!
//! # Responsibility
//! - Provide use-case entry points above the repository layer.
//! - Keep rules decisions out of SQL and SQL out of rules decisions.
//!
//! # Invariants
//! - Services never bypass repository validation/persistence contracts.

pub mod concentration_service;
