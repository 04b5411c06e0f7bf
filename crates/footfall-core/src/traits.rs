//! Collaborator interfaces consumed by the timeline and the constraint.
//!
//! The body-motion model, foothold container, robot model and
//! optimization-variable store all live outside this core; these traits are
//! the seams they plug into. Only test mocks implement them in this
//! workspace.

use nalgebra::{DVector, RowDVector, Vector2};

use crate::error::ConfigError;
use crate::types::{Dim2, Leg, Phase, SupportMap};

// ---------------------------------------------------------------------------
// BodyMotion
// ---------------------------------------------------------------------------

/// Parametric representation of the body (center-of-mass) trajectory.
///
/// The model must be affine in its coefficients: `position_jacobian` depends
/// on the query time only, never on the currently installed coefficient
/// values. The range-of-motion constraint relies on this to cache its
/// Jacobian blocks across solver iterations.
pub trait BodyMotion: Send + Sync {
    /// Horizontal body position at trajectory time `t`.
    fn position(&self, t: f64) -> Vector2<f64>;

    /// Jacobian of the `dim` component of the position at time `t` with
    /// respect to the motion coefficients, as a dense row.
    fn position_jacobian(&self, t: f64, dim: Dim2) -> RowDVector<f64>;

    /// Number of free motion coefficients.
    fn total_free_coeffs(&self) -> usize;

    /// Install a new coefficient vector (length `total_free_coeffs`).
    fn set_coefficients(&mut self, coeffs: &DVector<f64>);

    /// Independent copy, so owners are unaffected by later mutation of the
    /// original.
    fn clone_box(&self) -> Box<dyn BodyMotion>;
}

impl Clone for Box<dyn BodyMotion> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

// ---------------------------------------------------------------------------
// SupportResolver
// ---------------------------------------------------------------------------

/// Resolves which feet support the robot during each phase.
///
/// Implemented by the foothold container. The timeline calls this once per
/// schedule recomputation and never retains the resolver.
pub trait SupportResolver: Send + Sync {
    /// Assign a support set to every phase id and report the foothold set
    /// the trajectory ends on, as one keyed mapping value.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the phase/stance/stepping-leg
    /// combination cannot be resolved (e.g. a Step phase beyond the planned
    /// stepping legs).
    fn resolve_support(
        &self,
        start_stance: &[Leg],
        stepping_legs: &[Leg],
        phases: &[Phase],
    ) -> Result<SupportMap, ConfigError>;
}

// ---------------------------------------------------------------------------
// RobotModel
// ---------------------------------------------------------------------------

/// Kinematic bounds of the robot, reduced to the horizontal plane.
pub trait RobotModel: Send + Sync {
    /// Nominal body-frame stance offset of `leg`, or `None` when the model
    /// does not know the end-effector.
    fn nominal_stance_offset(&self, leg: Leg) -> Option<Vector2<f64>>;

    /// Maximum allowed horizontal deviation from the nominal offset, per
    /// dimension. The same bound applies to every end-effector.
    fn max_deviation_xy(&self) -> Vector2<f64>;
}

// ---------------------------------------------------------------------------
// VariableStore
// ---------------------------------------------------------------------------

/// Well-known decision-variable set names shared with the store.
pub mod var_names {
    /// Horizontal positions of the free footholds, id-major then dimension.
    pub const FOOTHOLDS: &str = "footholds";
    /// Coefficients of the body-motion model.
    pub const MOTION_COEFFS: &str = "motion_coeffs";
}

/// Read access to the solver-owned decision-variable vectors.
pub trait VariableStore: Send + Sync {
    /// Current values of the variable set `name`, or `None` when the store
    /// has no such set.
    fn variables(&self, name: &str) -> Option<DVector<f64>>;
}
