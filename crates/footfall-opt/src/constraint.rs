//! Range-of-motion constraint: bounds each free foothold's body-relative
//! position to a box around the robot's nominal stance offset.
//!
//! # Constraint formulation
//!
//! For every schedule sample, every free contact, and each horizontal
//! dimension, one row:
//!
//! ```text
//! g = foothold_k − body_position(t) − nominal_offset(leg)
//! lower = −max_deviation,  upper = +max_deviation
//! ```
//!
//! The row is affine in both decision-variable blocks, so both Jacobians
//! are constant across solver iterations:
//!
//! - w.r.t. footholds: a single `1.0` per row in the column of foothold `k`
//!   and the row's dimension
//! - w.r.t. motion coefficients: `−1 ×` the body-motion model's positional
//!   Jacobian at the sample time
//!
//! Both blocks are assembled once at (re-)initialization and cached; value
//! updates never touch the sparsity structure.

use nalgebra::{DVector, Vector2};
use nalgebra_sparse::{CooMatrix, CscMatrix};

use footfall_core::error::{ConfigError, EvalError};
use footfall_core::traits::{var_names, BodyMotion, RobotModel, SupportResolver, VariableStore};
use footfall_core::types::{Bound, Dim2};

use crate::timeline::PhaseTimeline;

// Entries below this magnitude are dropped during sparse assembly.
const SPARSE_DROP_EPS: f64 = 1e-15;

/// One (sample, free contact) pair of the shared row enumeration; expands
/// to an X and a Y constraint row.
#[derive(Debug, Clone, Copy)]
struct FreeContactRow {
    time: f64,
    foothold: usize,
    nominal: Vector2<f64>,
}

/// Box constraint on the body-relative position of every free foothold,
/// exposed to the solver as a (value, bounds, Jacobian) triple.
pub struct RangeOfMotionConstraint {
    body_motion: Box<dyn BodyMotion>,
    robot: Box<dyn RobotModel>,
    rows: Vec<FreeContactRow>,
    n_footholds: usize,
    footholds: Option<Vec<Vector2<f64>>>,
    structural_version: u64,
    jac_wrt_contacts: CscMatrix<f64>,
    jac_wrt_motion: CscMatrix<f64>,
}

impl core::fmt::Debug for RangeOfMotionConstraint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RangeOfMotionConstraint")
            .field("rows", &self.rows)
            .field("n_footholds", &self.n_footholds)
            .field("footholds", &self.footholds)
            .field("structural_version", &self.structural_version)
            .field("jac_wrt_contacts", &self.jac_wrt_contacts)
            .field("jac_wrt_motion", &self.jac_wrt_motion)
            .finish_non_exhaustive()
    }
}

impl RangeOfMotionConstraint {
    /// Initialize against the timeline's current phase structure.
    ///
    /// Clones the body-motion model (so later solver-side mutation of the
    /// original cannot alias), takes ownership of the robot model, snapshots
    /// the row enumeration from the discretized schedule and assembles both
    /// Jacobian blocks.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the schedule cannot be resolved or a
    /// free contact's end-effector is unknown to the robot model.
    pub fn new(
        body_motion: &dyn BodyMotion,
        timeline: &mut PhaseTimeline,
        resolver: &dyn SupportResolver,
        robot: Box<dyn RobotModel>,
    ) -> Result<Self, ConfigError> {
        let schedule = timeline.contact_schedule(resolver)?;

        let mut rows = Vec::new();
        let mut n_footholds = 0;
        for sample in schedule {
            for contact in &sample.contacts {
                if let Some(index) = contact.foothold {
                    let nominal = robot
                        .nominal_stance_offset(contact.leg)
                        .ok_or(ConfigError::UnknownEndEffector(contact.leg))?;
                    rows.push(FreeContactRow {
                        time: sample.time,
                        foothold: index,
                        nominal,
                    });
                    n_footholds = n_footholds.max(index + 1);
                }
            }
        }

        let body_motion = body_motion.clone_box();
        let jac_wrt_contacts = build_jac_wrt_contacts(&rows, n_footholds);
        let jac_wrt_motion = build_jac_wrt_motion(&rows, body_motion.as_ref());

        tracing::debug!(
            rows = rows.len() * 2,
            footholds = n_footholds,
            "initialized range-of-motion constraint"
        );

        Ok(Self {
            body_motion,
            robot,
            rows,
            n_footholds,
            footholds: None,
            structural_version: timeline.structural_version(),
            jac_wrt_contacts,
            jac_wrt_motion,
        })
    }

    /// Install the current decision-variable values from the store.
    ///
    /// Called by the solver once per iteration. Only values change here;
    /// the cached Jacobians stay valid.
    ///
    /// # Errors
    ///
    /// Returns an [`EvalError`] when a variable set is missing or its
    /// length does not match the enumerated structure.
    pub fn update_variables(&mut self, store: &dyn VariableStore) -> Result<(), EvalError> {
        let coeffs = store
            .variables(var_names::MOTION_COEFFS)
            .ok_or_else(|| EvalError::MissingVariableSet(var_names::MOTION_COEFFS.to_owned()))?;
        let expected = self.body_motion.total_free_coeffs();
        if coeffs.len() != expected {
            return Err(EvalError::CoeffCountMismatch {
                expected,
                got: coeffs.len(),
            });
        }
        self.body_motion.set_coefficients(&coeffs);

        let footholds = store
            .variables(var_names::FOOTHOLDS)
            .ok_or_else(|| EvalError::MissingVariableSet(var_names::FOOTHOLDS.to_owned()))?;
        let expected = self.n_footholds * 2;
        if footholds.len() != expected {
            return Err(EvalError::FootholdCountMismatch {
                expected,
                got: footholds.len(),
            });
        }
        self.footholds = Some(
            footholds
                .as_slice()
                .chunks_exact(2)
                .map(|pair| Vector2::new(pair[0], pair[1]))
                .collect(),
        );

        Ok(())
    }

    /// Current constraint values, one per row of the shared enumeration.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::VariablesNotSet`] before the first successful
    /// [`RangeOfMotionConstraint::update_variables`].
    pub fn evaluate(&self) -> Result<DVector<f64>, EvalError> {
        let footholds = self.footholds.as_ref().ok_or(EvalError::VariablesNotSet)?;

        let mut values = Vec::with_capacity(self.rows.len() * 2);
        for row in &self.rows {
            let body = self.body_motion.position(row.time);
            let deviation = footholds[row.foothold] - body - row.nominal;
            values.push(deviation.x);
            values.push(deviation.y);
        }
        Ok(DVector::from_vec(values))
    }

    /// Symmetric per-row bounds from the robot's maximum deviation.
    #[must_use]
    pub fn bounds(&self) -> Vec<Bound> {
        let max_deviation = self.robot.max_deviation_xy();
        let mut bounds = Vec::with_capacity(self.rows.len() * 2);
        for _ in &self.rows {
            for dim in Dim2::BOTH {
                bounds.push(Bound::symmetric(max_deviation[dim.index()]));
            }
        }
        bounds
    }

    /// The cached Jacobian block for the named variable set, or `None` when
    /// the constraint does not depend on that set.
    #[must_use]
    pub fn jacobian_wrt(&self, var_set: &str) -> Option<&CscMatrix<f64>> {
        match var_set {
            var_names::FOOTHOLDS => Some(&self.jac_wrt_contacts),
            var_names::MOTION_COEFFS => Some(&self.jac_wrt_motion),
            _ => None,
        }
    }

    /// Fail loudly when the timeline's phase structure changed after this
    /// constraint was initialized: the cached Jacobians no longer match and
    /// the constraint must be rebuilt.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::StaleStructure`] on a version mismatch.
    pub fn verify_structure(&self, timeline: &PhaseTimeline) -> Result<(), EvalError> {
        let current = timeline.structural_version();
        if current != self.structural_version {
            return Err(EvalError::StaleStructure {
                built: self.structural_version,
                current,
            });
        }
        Ok(())
    }

    /// Number of constraint rows (free contacts × 2 dimensions).
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len() * 2
    }

    /// Width of the foothold decision block, in footholds.
    #[must_use]
    pub const fn foothold_count(&self) -> usize {
        self.n_footholds
    }

    /// Structural version the cached Jacobians were built against.
    #[must_use]
    pub const fn structural_version(&self) -> u64 {
        self.structural_version
    }
}

/// One `1.0` per row, in the column of the row's foothold and dimension.
/// Columns are id-major, dimension-minor, matching the store's foothold
/// vector layout.
fn build_jac_wrt_contacts(rows: &[FreeContactRow], n_footholds: usize) -> CscMatrix<f64> {
    let mut coo = CooMatrix::new(rows.len() * 2, n_footholds * 2);
    for (r, row) in rows.iter().enumerate() {
        for dim in Dim2::BOTH {
            coo.push(2 * r + dim.index(), 2 * row.foothold + dim.index(), 1.0);
        }
    }
    CscMatrix::from(&coo)
}

/// Each row is the negated positional Jacobian of the body-motion model at
/// the row's sample time.
fn build_jac_wrt_motion(rows: &[FreeContactRow], body_motion: &dyn BodyMotion) -> CscMatrix<f64> {
    let mut coo = CooMatrix::new(rows.len() * 2, body_motion.total_free_coeffs());
    for (r, row) in rows.iter().enumerate() {
        for dim in Dim2::BOTH {
            let jac_row = body_motion.position_jacobian(row.time, dim);
            for (col, &value) in jac_row.iter().enumerate() {
                if value.abs() > SPARSE_DROP_EPS {
                    coo.push(2 * r + dim.index(), col, -value);
                }
            }
        }
    }
    CscMatrix::from(&coo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use approx::assert_relative_eq;
    use footfall_core::config::TimingConfig;
    use footfall_core::types::Leg;
    use footfall_test_utils::{BoxRobot, CubicMotion, NominalFootholds, StaticVariables};
    use nalgebra::DVector;

    fn scenario_timeline() -> PhaseTimeline {
        let timing = TimingConfig {
            stance_initial: 1.0,
            swing: 1.0,
            sample_step: 0.5,
            ..TimingConfig::default()
        };
        PhaseTimeline::generated(Leg::ALL.to_vec(), vec![Leg::LF, Leg::RH], &timing).unwrap()
    }

    fn scenario_constraint() -> (RangeOfMotionConstraint, PhaseTimeline) {
        let mut timeline = scenario_timeline();
        let resolver = NominalFootholds::new();
        let constraint = RangeOfMotionConstraint::new(
            &CubicMotion::zeroed(),
            &mut timeline,
            &resolver,
            Box::new(BoxRobot::default()),
        )
        .unwrap();
        (constraint, timeline)
    }

    fn store(coeffs: Vec<f64>, footholds: Vec<f64>) -> StaticVariables {
        let mut store = StaticVariables::new();
        store.insert(var_names::MOTION_COEFFS, DVector::from_vec(coeffs));
        store.insert(var_names::FOOTHOLDS, DVector::from_vec(footholds));
        store
    }

    fn scenario_store() -> StaticVariables {
        // x(t) = 0.1 + 0.2 t, y(t) = -0.05; footholds LF→0, RH→1
        store(
            vec![0.1, 0.2, 0.0, 0.0, -0.05, 0.0, 0.0, 0.0],
            vec![0.4, 0.35, -0.3, -0.35],
        )
    }

    fn entries(jac: &CscMatrix<f64>) -> HashMap<(usize, usize), f64> {
        jac.triplet_iter().map(|(r, c, &v)| ((r, c), v)).collect()
    }

    #[test]
    fn row_counts_are_consistent_everywhere() {
        let (mut constraint, mut timeline) = scenario_constraint();
        constraint.update_variables(&scenario_store()).unwrap();

        let resolver = NominalFootholds::new();
        let expected = timeline.total_free_contacts(&resolver).unwrap() * 2;

        assert_eq!(constraint.row_count(), expected);
        assert_eq!(constraint.evaluate().unwrap().len(), expected);
        assert_eq!(constraint.bounds().len(), expected);
        assert_eq!(
            constraint.jacobian_wrt(var_names::FOOTHOLDS).unwrap().nrows(),
            expected
        );
        assert_eq!(
            constraint
                .jacobian_wrt(var_names::MOTION_COEFFS)
                .unwrap()
                .nrows(),
            expected
        );
    }

    #[test]
    fn contacts_jacobian_has_one_unit_entry_per_row() {
        let (constraint, _) = scenario_constraint();
        let jac = constraint.jacobian_wrt(var_names::FOOTHOLDS).unwrap();

        assert_eq!(jac.ncols(), constraint.foothold_count() * 2);
        assert_eq!(jac.nnz(), jac.nrows());

        let mut per_row = vec![0usize; jac.nrows()];
        for (r, _, &v) in jac.triplet_iter() {
            per_row[r] += 1;
            assert_relative_eq!(v, 1.0);
        }
        assert!(per_row.iter().all(|&n| n == 1));
    }

    #[test]
    fn contacts_jacobian_columns_follow_id_major_layout() {
        let (constraint, _) = scenario_constraint();
        let jac = entries(constraint.jacobian_wrt(var_names::FOOTHOLDS).unwrap());

        // First free contact is LF on foothold 0 (t = 2.0): rows 0/1 hit
        // columns 0/1.
        assert_relative_eq!(jac[&(0, 0)], 1.0);
        assert_relative_eq!(jac[&(1, 1)], 1.0);

        // The trailing stance contributes RH on foothold 1: its rows hit
        // columns 2/3.
        assert!(jac.iter().any(|(&(_, c), _)| c == 2));
        assert!(jac.iter().any(|(&(_, c), _)| c == 3));
    }

    #[test]
    fn motion_jacobian_is_negated_basis() {
        let (constraint, _) = scenario_constraint();
        let jac = entries(constraint.jacobian_wrt(var_names::MOTION_COEFFS).unwrap());

        // Row 0 is the X row of the first free contact at t = 2.0:
        // −[1, t, t², t³] in the X block, nothing in the Y block.
        let t: f64 = 2.0;
        assert_relative_eq!(jac[&(0, 0)], -1.0);
        assert_relative_eq!(jac[&(0, 1)], -t);
        assert_relative_eq!(jac[&(0, 2)], -t * t);
        assert_relative_eq!(jac[&(0, 3)], -t * t * t);
        assert!(!jac.contains_key(&(0, 4)));

        // Row 1 is the matching Y row.
        assert_relative_eq!(jac[&(1, 4)], -1.0);
        assert_relative_eq!(jac[&(1, 7)], -t * t * t);
        assert!(!jac.contains_key(&(1, 0)));
    }

    #[test]
    fn evaluate_matches_hand_computation() {
        let (mut constraint, _) = scenario_constraint();
        constraint.update_variables(&scenario_store()).unwrap();
        let values = constraint.evaluate().unwrap();

        // Row pair 0: LF on foothold 0 at t = 2.0.
        // body = (0.1 + 0.2·2, −0.05) = (0.5, −0.05)
        // deviation = (0.4, 0.35) − body − nominal(LF = (0.35, 0.3))
        assert_relative_eq!(values[0], 0.4 - 0.5 - 0.35, epsilon = 1e-12);
        assert_relative_eq!(values[1], 0.35 + 0.05 - 0.3, epsilon = 1e-12);
    }

    #[test]
    fn evaluate_changes_with_installed_coefficients() {
        let (mut constraint, _) = scenario_constraint();

        constraint.update_variables(&scenario_store()).unwrap();
        let before = constraint.evaluate().unwrap();

        // Zero motion: body stays at the origin, so the X rows grow by the
        // removed body displacement.
        let zero_motion = store(vec![0.0; 8], vec![0.4, 0.35, -0.3, -0.35]);
        constraint.update_variables(&zero_motion).unwrap();
        let after = constraint.evaluate().unwrap();

        assert_relative_eq!(after[0] - before[0], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn bounds_are_symmetric_per_dimension() {
        let (constraint, _) = scenario_constraint();
        let bounds = constraint.bounds();

        assert_eq!(bounds.len(), constraint.row_count());
        for pair in bounds.chunks_exact(2) {
            // X rows bound by 0.15, Y rows by 0.1 (BoxRobot defaults).
            assert_relative_eq!(pair[0].upper, 0.15);
            assert_relative_eq!(pair[0].lower, -0.15);
            assert_relative_eq!(pair[1].upper, 0.1);
            assert_relative_eq!(pair[1].lower, -0.1);
        }
    }

    #[test]
    fn finite_differences_confirm_motion_jacobian() {
        let (mut constraint, _) = scenario_constraint();
        let base_coeffs = vec![0.1, 0.2, 0.0, 0.0, -0.05, 0.0, 0.0, 0.0];
        let footholds = vec![0.4, 0.35, -0.3, -0.35];

        constraint
            .update_variables(&store(base_coeffs.clone(), footholds.clone()))
            .unwrap();
        let g0 = constraint.evaluate().unwrap();

        let jac = entries(constraint.jacobian_wrt(var_names::MOTION_COEFFS).unwrap());
        let h = 1e-6;
        for coeff in 0..8 {
            let mut perturbed = base_coeffs.clone();
            perturbed[coeff] += h;
            constraint
                .update_variables(&store(perturbed, footholds.clone()))
                .unwrap();
            let g1 = constraint.evaluate().unwrap();

            for row in 0..constraint.row_count() {
                let fd = (g1[row] - g0[row]) / h;
                let analytic = jac.get(&(row, coeff)).copied().unwrap_or(0.0);
                assert_relative_eq!(fd, analytic, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn unknown_variable_set_has_no_jacobian() {
        let (constraint, _) = scenario_constraint();
        assert!(constraint.jacobian_wrt("joint_torques").is_none());
    }

    #[test]
    fn evaluate_before_update_is_rejected() {
        let (constraint, _) = scenario_constraint();
        assert!(matches!(
            constraint.evaluate(),
            Err(EvalError::VariablesNotSet)
        ));
    }

    #[test]
    fn update_rejects_mismatched_lengths() {
        let (mut constraint, _) = scenario_constraint();

        let short_footholds = store(vec![0.0; 8], vec![0.4, 0.35]);
        assert!(matches!(
            constraint.update_variables(&short_footholds),
            Err(EvalError::FootholdCountMismatch {
                expected: 4,
                got: 2
            })
        ));

        let short_coeffs = store(vec![0.0; 5], vec![0.0; 4]);
        assert!(matches!(
            constraint.update_variables(&short_coeffs),
            Err(EvalError::CoeffCountMismatch {
                expected: 8,
                got: 5
            })
        ));

        let empty = StaticVariables::new();
        assert!(matches!(
            constraint.update_variables(&empty),
            Err(EvalError::MissingVariableSet(_))
        ));
    }

    #[test]
    fn unknown_end_effector_fails_at_init() {
        let mut timeline = scenario_timeline();
        let resolver = NominalFootholds::new();
        let err = RangeOfMotionConstraint::new(
            &CubicMotion::zeroed(),
            &mut timeline,
            &resolver,
            Box::new(BoxRobot::default().without_leg(Leg::LF)),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownEndEffector(Leg::LF)));
    }

    #[test]
    fn stale_structure_is_detected_after_reinit() {
        let (constraint, mut timeline) = scenario_constraint();
        assert!(constraint.verify_structure(&timeline).is_ok());

        let timing = TimingConfig::default();
        timeline
            .reinit_generated(Leg::ALL.to_vec(), vec![Leg::RF], &timing)
            .unwrap();

        assert!(matches!(
            constraint.verify_structure(&timeline),
            Err(EvalError::StaleStructure { .. })
        ));
    }
}
