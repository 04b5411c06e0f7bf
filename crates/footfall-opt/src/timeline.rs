//! Phase timeline: the symbolic phase sequence and its discretization into
//! a time-stamped contact schedule.

use footfall_core::config::TimingConfig;
use footfall_core::error::ConfigError;
use footfall_core::traits::SupportResolver;
use footfall_core::types::{validate_phases, ContactSample, Leg, Phase, PhaseKind};

// IEEE-754 division can land just below an exact multiple (0.6 / 0.2 ==
// 2.999…96), which would truncate away a sample that lies on the grid.
const GRID_EPS: f64 = 1e-9;

/// Interior sample count of a phase: `floor(duration / Δt)`, robust against
/// divisions landing just below an exact multiple.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn nodes_in_phase(duration: f64, sample_step: f64) -> usize {
    ((duration / sample_step) + GRID_EPS).floor() as usize
}

#[derive(Debug, Clone)]
struct ScheduleCache {
    version: u64,
    samples: Vec<ContactSample>,
}

/// Ordered sequence of motion phases plus the fixed-step discretization of
/// which feet touch the ground at which sampled instants.
///
/// The discretized schedule is computed lazily and memoized against a
/// structural version counter: every re-initialization bumps the version,
/// and a read with a mismatched cache recomputes. Repeated reads between
/// re-initializations return the cached schedule without touching the
/// support resolver.
#[derive(Debug, Clone)]
pub struct PhaseTimeline {
    start_stance: Vec<Leg>,
    stepping_legs: Vec<Leg>,
    phases: Vec<Phase>,
    sample_step: f64,
    structural_version: u64,
    cache: Option<ScheduleCache>,
}

impl PhaseTimeline {
    /// Build a timeline from an already-constructed phase sequence.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for a non-positive sample step or a phase
    /// sequence violating the id/step-count/duration invariants.
    pub fn new(
        start_stance: Vec<Leg>,
        stepping_legs: Vec<Leg>,
        phases: Vec<Phase>,
        sample_step: f64,
    ) -> Result<Self, ConfigError> {
        let mut timeline = Self {
            start_stance: Vec::new(),
            stepping_legs: Vec::new(),
            phases: Vec::new(),
            sample_step: 0.0,
            structural_version: 0,
            cache: None,
        };
        timeline.apply(start_stance, stepping_legs, phases, sample_step)?;
        Ok(timeline)
    }

    /// Build a timeline by generating the phase sequence from a starting
    /// stance, a stepping order and timing parameters: an optional leading
    /// stance, one Step phase per stepping leg, an optional trailing stance.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when `timing` fails validation.
    pub fn generated(
        start_stance: Vec<Leg>,
        stepping_legs: Vec<Leg>,
        timing: &TimingConfig,
    ) -> Result<Self, ConfigError> {
        timing.validate()?;
        let phases = generate_phases(stepping_legs.len(), timing);
        Self::new(start_stance, stepping_legs, phases, timing.sample_step)
    }

    /// Replace all phase data with a new direct-mode configuration.
    ///
    /// Bumps the structural version, so the next schedule read recomputes.
    ///
    /// # Errors
    ///
    /// Same conditions as [`PhaseTimeline::new`]; on error the timeline is
    /// left unchanged.
    pub fn reinit(
        &mut self,
        start_stance: Vec<Leg>,
        stepping_legs: Vec<Leg>,
        phases: Vec<Phase>,
        sample_step: f64,
    ) -> Result<(), ConfigError> {
        self.apply(start_stance, stepping_legs, phases, sample_step)
    }

    /// Replace all phase data with a newly generated phase sequence.
    ///
    /// # Errors
    ///
    /// Same conditions as [`PhaseTimeline::generated`]; on error the
    /// timeline is left unchanged.
    pub fn reinit_generated(
        &mut self,
        start_stance: Vec<Leg>,
        stepping_legs: Vec<Leg>,
        timing: &TimingConfig,
    ) -> Result<(), ConfigError> {
        timing.validate()?;
        let phases = generate_phases(stepping_legs.len(), timing);
        self.apply(start_stance, stepping_legs, phases, timing.sample_step)
    }

    fn apply(
        &mut self,
        start_stance: Vec<Leg>,
        stepping_legs: Vec<Leg>,
        phases: Vec<Phase>,
        sample_step: f64,
    ) -> Result<(), ConfigError> {
        if !sample_step.is_finite() || sample_step <= 0.0 {
            return Err(ConfigError::InvalidSampleStep(sample_step));
        }
        validate_phases(&phases)?;

        self.start_stance = start_stance;
        self.stepping_legs = stepping_legs;
        self.phases = phases;
        self.sample_step = sample_step;
        self.structural_version += 1;
        self.cache = None;
        Ok(())
    }

    /// The discretized, time-stamped contact schedule.
    ///
    /// Recomputed at most once per re-initialization; cached reads do not
    /// invoke the resolver.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the resolver cannot assign a support
    /// set to every phase.
    pub fn contact_schedule(
        &mut self,
        resolver: &dyn SupportResolver,
    ) -> Result<&[ContactSample], ConfigError> {
        let stale = self
            .cache
            .as_ref()
            .is_none_or(|c| c.version != self.structural_version);
        if stale {
            let samples = self.discretize(resolver)?;
            tracing::debug!(
                samples = samples.len(),
                version = self.structural_version,
                "recomputed contact schedule"
            );
            self.cache = Some(ScheduleCache {
                version: self.structural_version,
                samples,
            });
        }
        Ok(self.cache.as_ref().map_or(&[], |c| c.samples.as_slice()))
    }

    fn discretize(&self, resolver: &dyn SupportResolver) -> Result<Vec<ContactSample>, ConfigError> {
        let support =
            resolver.resolve_support(&self.start_stance, &self.stepping_legs, &self.phases)?;

        let mut samples = Vec::new();
        let mut t_global = 0.0;

        for phase in &self.phases {
            let stance = support.support_for(phase.id)?;
            for k in 0..nodes_in_phase(phase.duration, self.sample_step) {
                samples.push(ContactSample {
                    time: t_global + k as f64 * self.sample_step,
                    contacts: stance.to_vec(),
                });
            }
            t_global += phase.duration;
        }

        // The last phase may contribute no interior sample, but the
        // trajectory still ends in a defined footing.
        samples.push(ContactSample {
            time: t_global,
            contacts: support.final_stance().to_vec(),
        });

        Ok(samples)
    }

    /// Sum of planted feet over every sample of the schedule.
    ///
    /// # Errors
    ///
    /// Same conditions as [`PhaseTimeline::contact_schedule`].
    pub fn total_discrete_contacts(
        &mut self,
        resolver: &dyn SupportResolver,
    ) -> Result<usize, ConfigError> {
        Ok(self
            .contact_schedule(resolver)?
            .iter()
            .map(|s| s.contacts.len())
            .sum())
    }

    /// Sum of free (decision-variable) contacts over every sample; drives
    /// the constraint row count.
    ///
    /// # Errors
    ///
    /// Same conditions as [`PhaseTimeline::contact_schedule`].
    pub fn total_free_contacts(
        &mut self,
        resolver: &dyn SupportResolver,
    ) -> Result<usize, ConfigError> {
        Ok(self
            .contact_schedule(resolver)?
            .iter()
            .map(|s| s.free_contacts().count())
            .sum())
    }

    /// The phase sequence.
    #[must_use]
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// The initially planted legs.
    #[must_use]
    pub fn start_stance(&self) -> &[Leg] {
        &self.start_stance
    }

    /// The legs taking a step, in step order.
    #[must_use]
    pub fn stepping_legs(&self) -> &[Leg] {
        &self.stepping_legs
    }

    /// The discretization step Δt.
    #[must_use]
    pub const fn sample_step(&self) -> f64 {
        self.sample_step
    }

    /// Version counter bumped on every re-initialization. Derived values
    /// cached against an older version are stale.
    #[must_use]
    pub const fn structural_version(&self) -> u64 {
        self.structural_version
    }
}

fn generate_phases(n_steps: usize, timing: &TimingConfig) -> Vec<Phase> {
    let mut phases = Vec::new();
    let mut id = 0;
    let mut completed = 0;

    if timing.insert_initial_stance {
        phases.push(Phase::new(PhaseKind::Stance, id, completed, timing.stance_initial));
        id += 1;
    }

    for _ in 0..n_steps {
        phases.push(Phase::new(PhaseKind::Step, id, completed, timing.swing));
        id += 1;
        completed += 1;
    }

    if timing.insert_final_stance {
        phases.push(Phase::new(PhaseKind::Stance, id, completed, timing.stance_final));
    }

    phases
}
