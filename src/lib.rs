//! Project:Address - deterministic building addresses for a map front end.
//!
//! This library provides the address encoder and the shared types and
//! modules for the `serve` and `encode` binaries.

pub mod config;
pub mod encoder;
pub mod models;
pub mod pip;

pub use encoder::{build_address, try_build_address, AddressError};
pub use models::{AddressResult, AdminSelection, Feature};
