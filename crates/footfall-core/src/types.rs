//! Value types shared across the footfall crates.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Leg
// ---------------------------------------------------------------------------

/// Identifier of a contact-capable end-effector on a quadruped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Leg {
    /// Left front.
    LF,
    /// Right front.
    RF,
    /// Left hind.
    LH,
    /// Right hind.
    RH,
}

impl Leg {
    /// All legs in a stable order.
    pub const ALL: [Self; 4] = [Self::LF, Self::RF, Self::LH, Self::RH];
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LF => "LF",
            Self::RF => "RF",
            Self::LH => "LH",
            Self::RH => "RH",
        };
        write!(f, "{name}")
    }
}

// ---------------------------------------------------------------------------
// Dim2
// ---------------------------------------------------------------------------

/// Horizontal dimension selector.
///
/// Constraint rows are always emitted X first, then Y; iterate [`Dim2::BOTH`]
/// wherever that ordering matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dim2 {
    X,
    Y,
}

impl Dim2 {
    /// Both dimensions in row-emission order.
    pub const BOTH: [Self; 2] = [Self::X, Self::Y];

    /// Zero-based component index.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Kind of a motion phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseKind {
    /// All planted feet stay on the ground.
    Stance,
    /// One leg swings to a new foothold.
    Step,
    /// No feet on the ground.
    Flight,
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Stance => "Stance",
            Self::Step => "Step",
            Self::Flight => "Flight",
        };
        write!(f, "{name}")
    }
}

/// One motion phase: a maximal time interval with a single contact-state kind.
///
/// Ids form a contiguous 0-based sequence in construction order, and
/// `completed_steps` of any phase equals the number of [`PhaseKind::Step`]
/// phases with a smaller id. [`crate::validate_phases`] checks both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    /// What happens during this phase.
    pub kind: PhaseKind,
    /// Unique id, strictly increasing in creation order starting at 0.
    pub id: usize,
    /// Number of Step phases that occurred strictly before this one.
    pub completed_steps: usize,
    /// Length of the phase in seconds (non-negative).
    pub duration: f64,
}

impl Phase {
    /// Create a phase descriptor.
    #[must_use]
    pub const fn new(kind: PhaseKind, id: usize, completed_steps: usize, duration: f64) -> Self {
        Self {
            kind,
            id,
            completed_steps,
            duration,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id: {}\tkind: {}\tduration: {}\tcompleted steps: {}",
            self.id, self.kind, self.duration, self.completed_steps
        )
    }
}

/// Check the phase-sequence invariants: contiguous 0-based ids, consistent
/// `completed_steps`, non-negative durations.
pub fn validate_phases(phases: &[Phase]) -> Result<(), ConfigError> {
    let mut steps_seen = 0;
    for (index, phase) in phases.iter().enumerate() {
        if phase.id != index {
            return Err(ConfigError::NonContiguousPhaseIds {
                index,
                id: phase.id,
            });
        }
        if phase.completed_steps != steps_seen {
            return Err(ConfigError::StepCountMismatch {
                id: phase.id,
                expected: steps_seen,
                got: phase.completed_steps,
            });
        }
        if !phase.duration.is_finite() || phase.duration < 0.0 {
            return Err(ConfigError::NegativePhaseDuration {
                id: phase.id,
                duration: phase.duration,
            });
        }
        if phase.kind == PhaseKind::Step {
            steps_seen += 1;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Contact / ContactSample
// ---------------------------------------------------------------------------

/// A planted foot.
///
/// `foothold` indexes the foothold decision-variable block when the foot
/// stands on a position that is still being optimized (a *free* contact);
/// `None` means the foot stands at its fixed starting position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contact {
    /// The end-effector in contact.
    pub leg: Leg,
    /// Foothold decision index, or `None` for the fixed start stance.
    pub foothold: Option<usize>,
}

impl Contact {
    /// A foot still standing at its fixed starting position.
    #[must_use]
    pub const fn fixed(leg: Leg) -> Self {
        Self {
            leg,
            foothold: None,
        }
    }

    /// A foot standing on decision-variable foothold `index`.
    #[must_use]
    pub const fn free(leg: Leg, index: usize) -> Self {
        Self {
            leg,
            foothold: Some(index),
        }
    }

    /// Whether this contact's position is a decision variable.
    #[must_use]
    pub const fn is_free(&self) -> bool {
        self.foothold.is_some()
    }
}

/// The feet planted at one sampled instant of the discretized schedule.
///
/// Produced only by the timeline's discretization pass and never mutated
/// afterwards; the schedule is replaced wholesale on recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactSample {
    /// Global trajectory time of the sample in seconds.
    pub time: f64,
    /// Feet in ground contact at `time`.
    pub contacts: Vec<Contact>,
}

impl ContactSample {
    /// The subset of contacts whose foothold is still a decision variable.
    pub fn free_contacts(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.iter().filter(|c| c.is_free())
    }
}

// ---------------------------------------------------------------------------
// SupportMap
// ---------------------------------------------------------------------------

/// Keyed association from phase id to the support set active during that
/// phase, plus the foothold set the trajectory ends on.
///
/// Returned as a single value by
/// [`SupportResolver::resolve_support`](crate::traits::SupportResolver) so
/// the phase-id contract between the timeline and the foothold container is
/// carried by the type system instead of by convention.
#[derive(Debug, Clone, Default)]
pub struct SupportMap {
    by_phase: HashMap<usize, Vec<Contact>>,
    final_stance: Vec<Contact>,
}

impl SupportMap {
    /// Build a support map from per-phase sets and the final foothold set.
    #[must_use]
    pub fn new(by_phase: HashMap<usize, Vec<Contact>>, final_stance: Vec<Contact>) -> Self {
        Self {
            by_phase,
            final_stance,
        }
    }

    /// The support set assigned to phase `phase_id`.
    pub fn support_for(&self, phase_id: usize) -> Result<&[Contact], ConfigError> {
        self.by_phase
            .get(&phase_id)
            .map(Vec::as_slice)
            .ok_or(ConfigError::UnknownSupportPhase(phase_id))
    }

    /// The feet (and footholds) the trajectory ends on.
    #[must_use]
    pub fn final_stance(&self) -> &[Contact] {
        &self.final_stance
    }

    /// Number of phases with an assigned support set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_phase.len()
    }

    /// Whether no phase has an assigned support set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_phase.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Bound
// ---------------------------------------------------------------------------

/// Closed interval constraint bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub lower: f64,
    pub upper: f64,
}

impl Bound {
    /// Create a bound from explicit endpoints.
    #[must_use]
    pub const fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// The symmetric interval `[-half_width, +half_width]`.
    #[must_use]
    pub const fn symmetric(half_width: f64) -> Self {
        Self {
            lower: -half_width,
            upper: half_width,
        }
    }
}
