//! Buyer journey, reservation timeline, and KYC verification tracking.
//!
//! Each workflow under [`workflows`] owns its domain types, pure calculators, repository
//! contract, service facade, and axum router. [`store::InMemoryStore`] backs every repository
//! contract from a single injected handle.

pub mod accounts;
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod store;
pub mod telemetry;
pub mod workflows;
