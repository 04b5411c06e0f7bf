//! Phase-timeline discretization and range-of-motion constraint assembly
//! for legged-robot trajectory optimization.
//!
//! This crate turns a symbolic, variable-duration phase schedule (which
//! feet are planted, swinging or airborne, and for how long) into the
//! pieces a gradient-based NLP solver consumes:
//!
//! 1. **Phase timeline** — owns the ordered phase sequence and lazily
//!    discretizes it into a time-stamped contact schedule on a fixed Δt
//!    grid, memoized against a structural version counter
//! 2. **Range-of-motion constraint** — keeps every free foothold inside a
//!    reachable box around the body's nominal stance offset, exposing
//!    constraint values, bounds and two cached sparse Jacobian blocks
//!    (w.r.t. footholds and w.r.t. motion coefficients)
//!
//! The body-motion model, foothold container, robot model and
//! optimization-variable store are collaborators behind the trait seams in
//! [`footfall_core::traits`]; the solver feeds updated variable values back
//! in once per iteration, strictly sequentially.

pub mod constraint;
pub mod timeline;

pub use constraint::RangeOfMotionConstraint;
pub use timeline::PhaseTimeline;
