//! Shared test fixtures for the footfall crates.
//!
//! Provides mock implementations of the collaborator traits (body motion,
//! foothold container, robot model, variable store) so the timeline and
//! constraint test suites do not depend on a real planner.

pub mod mocks;

pub use mocks::{BoxRobot, CubicMotion, NominalFootholds, StaticVariables};
