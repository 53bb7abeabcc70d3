//! Formicid library crate — re-exports all modules for integration testing.
//!
//! The binary crate (`main.rs`) is the actual game entry point.
//! This library crate exposes the same modules so that `tests/` integration
//! tests can import simulation types, systems, and resources and run whole
//! sessions headlessly.

pub mod shared;
pub mod colony;
pub mod economy;
pub mod prestige;
pub mod save;
