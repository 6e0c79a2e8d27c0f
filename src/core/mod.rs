//! Core implementation: ledger, placement, audit and the owned state object

pub mod address_space;
pub mod advisor;
pub mod audit;
pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod placement;
pub mod snapshot;
pub mod validation;

pub use address_space::{AddressSpace, Allocation, Release};
