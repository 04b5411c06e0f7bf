use thiserror::Error;

use crate::types::Leg;

/// Top-level error type for the footfall crates.
#[derive(Debug, Error)]
pub enum FootfallError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),
}

/// Errors detected at timeline or constraint initialization.
///
/// These are fatal to the initialization call that raised them and are never
/// deferred to evaluation time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid sample step: {0} (must be > 0)")]
    InvalidSampleStep(f64),

    #[error("Phase {id} has invalid duration {duration} (must be finite and >= 0)")]
    NegativePhaseDuration { id: usize, duration: f64 },

    #[error("Phase at index {index} has id {id} (ids must be contiguous from 0)")]
    NonContiguousPhaseIds { index: usize, id: usize },

    #[error("Phase {id} reports {got} completed steps, expected {expected}")]
    StepCountMismatch {
        id: usize,
        expected: usize,
        got: usize,
    },

    #[error("Phase {phase_id} requests step {step} but only {available} stepping legs are planned")]
    StepOutOfRange {
        phase_id: usize,
        step: usize,
        available: usize,
    },

    #[error("No support set assigned to phase {0}")]
    UnknownSupportPhase(usize),

    #[error("Robot model cannot resolve end-effector {0}")]
    UnknownEndEffector(Leg),
}

/// Solver-update and evaluation contract violations.
///
/// Cloneable with lightweight payloads for cheap propagation on the
/// per-iteration path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("Variable store has no set named '{0}'")]
    MissingVariableSet(String),

    #[error("Motion coefficient count mismatch: expected {expected}, got {got}")]
    CoeffCountMismatch { expected: usize, got: usize },

    #[error("Foothold vector length mismatch: expected {expected}, got {got}")]
    FootholdCountMismatch { expected: usize, got: usize },

    #[error("Constraint evaluated before any variable update")]
    VariablesNotSet,

    #[error("Constraint built against structural version {built}, timeline is at {current}")]
    StaleStructure { built: u64, current: u64 },
}
