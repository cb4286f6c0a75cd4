//! Adapters - Concrete port implementations.

pub mod local;
