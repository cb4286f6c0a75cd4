//! Ports - Traits for the collaborators around synthesis.

pub mod artifacts;
pub mod sink;
