// footfall-core: Types, traits, config and errors for footfall trajectory planning.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{TimingConfig, DEFAULT_FINAL_STANCE};
pub use error::{ConfigError, EvalError, FootfallError};
pub use traits::{var_names, BodyMotion, RobotModel, SupportResolver, VariableStore};
pub use types::{
    validate_phases, Bound, Contact, ContactSample, Dim2, Leg, Phase, PhaseKind, SupportMap,
};
