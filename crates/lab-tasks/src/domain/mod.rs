//! Built-in simulation domains
//!
//! Each domain provides a store implementing [`crate::SimulationStore`] and its
//! ordered task list.

pub mod chemistry;
pub mod optics;

pub use chemistry::ChemistryStore;
pub use optics::OpticsStore;
