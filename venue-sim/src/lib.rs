//! In-process collaborator simulators
//!
//! Deterministic implementations of the vault's collaborator traits for
//! integration tests and demos: an in-memory collateral custodian, a trading
//! venue that records accepted batches, a redeemable series registry, a flat
//! pricing oracle, and a pinnable clock. All simulators support failure
//! injection so rollback paths can be exercised.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod collateral;
pub mod venue;

pub use collateral::InMemoryCollateral;
pub use venue::{FlatOracle, ManualClock, RecordingRegistrar, SimRegistry, SimVenue};
