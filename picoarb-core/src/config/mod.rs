//! Configuration types
//!
//! Board-agnostic settings for the arbiter, plus pin assignments as they
//! arrive from configuration tables (raw numbers, validated on use).

pub mod hal;
pub mod pins;

pub use hal::*;
pub use pins::*;
