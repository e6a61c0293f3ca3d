//! Buyer-facing workflows: journey dashboard, reservation timeline, and KYC verification.

pub mod buyer;
pub mod kyc;
pub mod reservations;
