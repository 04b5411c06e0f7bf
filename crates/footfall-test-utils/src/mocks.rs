//! Mock implementations of the collaborator traits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use nalgebra::{DVector, RowDVector, Vector2};

use footfall_core::error::ConfigError;
use footfall_core::traits::{BodyMotion, RobotModel, SupportResolver, VariableStore};
use footfall_core::types::{Contact, Dim2, Leg, Phase, PhaseKind, SupportMap};

// ---------------------------------------------------------------------------
// NominalFootholds
// ---------------------------------------------------------------------------

/// Support resolver that replays the foothold container's bookkeeping:
/// every leg starts fixed at its stance position, Step phase `k` lifts
/// `stepping_legs[k]` out of support and plants decision foothold `k` for
/// all later phases.
///
/// Counts `resolve_support` invocations so tests can observe whether a
/// cached schedule was actually reused.
#[derive(Debug, Default)]
pub struct NominalFootholds {
    calls: AtomicUsize,
}

impl NominalFootholds {
    /// Create a resolver with a zeroed call counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `resolve_support` has been invoked.
    #[must_use]
    pub fn resolve_calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl SupportResolver for NominalFootholds {
    fn resolve_support(
        &self,
        start_stance: &[Leg],
        stepping_legs: &[Leg],
        phases: &[Phase],
    ) -> Result<SupportMap, ConfigError> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        let mut current: Vec<Contact> = start_stance.iter().map(|&l| Contact::fixed(l)).collect();
        let mut by_phase = HashMap::new();

        for phase in phases {
            match phase.kind {
                PhaseKind::Stance => {
                    by_phase.insert(phase.id, current.clone());
                }
                PhaseKind::Flight => {
                    by_phase.insert(phase.id, Vec::new());
                }
                PhaseKind::Step => {
                    let step = phase.completed_steps;
                    let leg = *stepping_legs
                        .get(step)
                        .ok_or(ConfigError::StepOutOfRange {
                            phase_id: phase.id,
                            step,
                            available: stepping_legs.len(),
                        })?;

                    // The swinging leg carries no support during the step.
                    let support: Vec<Contact> =
                        current.iter().copied().filter(|c| c.leg != leg).collect();
                    by_phase.insert(phase.id, support);

                    // After touchdown the leg stands on decision foothold `step`.
                    if let Some(c) = current.iter_mut().find(|c| c.leg == leg) {
                        *c = Contact::free(leg, step);
                    } else {
                        current.push(Contact::free(leg, step));
                    }
                }
            }
        }

        Ok(SupportMap::new(by_phase, current))
    }
}

// ---------------------------------------------------------------------------
// CubicMotion
// ---------------------------------------------------------------------------

/// Body-motion mock: an independent cubic polynomial per horizontal
/// dimension.
///
/// Coefficient layout is `[x0, x1, x2, x3, y0, y1, y2, y3]` with
/// `position(t) = (Σ x_k t^k, Σ y_k t^k)`, so the positional Jacobian row
/// is the monomial basis `[1, t, t², t³]` in that dimension's block.
/// Affine in the coefficients, as the trait requires.
#[derive(Debug, Clone)]
pub struct CubicMotion {
    coeffs: DVector<f64>,
}

/// Number of free coefficients of [`CubicMotion`].
pub const CUBIC_COEFF_COUNT: usize = 8;

impl CubicMotion {
    /// A motion with all coefficients zero (body pinned at the origin).
    #[must_use]
    pub fn zeroed() -> Self {
        Self {
            coeffs: DVector::zeros(CUBIC_COEFF_COUNT),
        }
    }

    /// A motion with the given `[x0..x3, y0..y3]` coefficients.
    #[must_use]
    pub fn with_coefficients(coeffs: DVector<f64>) -> Self {
        assert_eq!(coeffs.len(), CUBIC_COEFF_COUNT, "cubic mock takes 8 coefficients");
        Self { coeffs }
    }
}

impl Default for CubicMotion {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl BodyMotion for CubicMotion {
    fn position(&self, t: f64) -> Vector2<f64> {
        let basis = [1.0, t, t * t, t * t * t];
        let x: f64 = (0..4).map(|k| self.coeffs[k] * basis[k]).sum();
        let y: f64 = (0..4).map(|k| self.coeffs[4 + k] * basis[k]).sum();
        Vector2::new(x, y)
    }

    fn position_jacobian(&self, t: f64, dim: Dim2) -> RowDVector<f64> {
        let mut row = RowDVector::zeros(CUBIC_COEFF_COUNT);
        let offset = dim.index() * 4;
        row[offset] = 1.0;
        row[offset + 1] = t;
        row[offset + 2] = t * t;
        row[offset + 3] = t * t * t;
        row
    }

    fn total_free_coeffs(&self) -> usize {
        CUBIC_COEFF_COUNT
    }

    fn set_coefficients(&mut self, coeffs: &DVector<f64>) {
        self.coeffs = coeffs.clone();
    }

    fn clone_box(&self) -> Box<dyn BodyMotion> {
        Box::new(self.clone())
    }
}

// ---------------------------------------------------------------------------
// BoxRobot
// ---------------------------------------------------------------------------

/// Robot-model mock with quadruped nominal stance offsets and a fixed
/// per-dimension deviation bound.
#[derive(Debug, Clone)]
pub struct BoxRobot {
    nominal: HashMap<Leg, Vector2<f64>>,
    max_deviation: Vector2<f64>,
}

impl BoxRobot {
    /// Remove a leg from the model, to exercise unresolved-end-effector
    /// handling.
    #[must_use]
    pub fn without_leg(mut self, leg: Leg) -> Self {
        self.nominal.remove(&leg);
        self
    }

    /// Override the deviation bound.
    #[must_use]
    pub fn with_max_deviation(mut self, max_deviation: Vector2<f64>) -> Self {
        self.max_deviation = max_deviation;
        self
    }
}

impl Default for BoxRobot {
    fn default() -> Self {
        let mut nominal = HashMap::new();
        nominal.insert(Leg::LF, Vector2::new(0.35, 0.3));
        nominal.insert(Leg::RF, Vector2::new(0.35, -0.3));
        nominal.insert(Leg::LH, Vector2::new(-0.35, 0.3));
        nominal.insert(Leg::RH, Vector2::new(-0.35, -0.3));
        Self {
            nominal,
            max_deviation: Vector2::new(0.15, 0.1),
        }
    }
}

impl RobotModel for BoxRobot {
    fn nominal_stance_offset(&self, leg: Leg) -> Option<Vector2<f64>> {
        self.nominal.get(&leg).copied()
    }

    fn max_deviation_xy(&self) -> Vector2<f64> {
        self.max_deviation
    }
}

// ---------------------------------------------------------------------------
// StaticVariables
// ---------------------------------------------------------------------------

/// Variable-store mock backed by a name → vector map.
#[derive(Debug, Clone, Default)]
pub struct StaticVariables {
    sets: HashMap<String, DVector<f64>>,
}

impl StaticVariables {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a variable set.
    pub fn insert(&mut self, name: impl Into<String>, values: DVector<f64>) {
        self.sets.insert(name.into(), values);
    }
}

impl VariableStore for StaticVariables {
    fn variables(&self, name: &str) -> Option<DVector<f64>> {
        self.sets.get(name).cloned()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
