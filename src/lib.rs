//! Time-windowed intervention policies for agent-based epidemic models.
//!
//! A simulation registers its policies once, in a [`Policies`] registry, and then steps one
//! day at a time. For each day the step loop:
//! * applies the stateful policies, which scale interaction coefficients
//!   ([`SocialDistancing`]) or swap leisure attendance curves ([`ChangeLeisureProbability`])
//!   in tables owned by other models, and restore them exactly once the policy ends;
//! * asks a [`SkipActivityCollection`] which activities each person may do and a
//!   [`StayHomeCollection`] whether each person must stay home;
//! * reads the set of venue types closed that day.
//!
//! People, households, interaction coefficients and leisure tables belong to the host model.
//! The engine reads and writes them through the [`Person`], [`Residence`],
//! [`InteractionCoefficients`] and [`LeisureTable`] traits.
//!
//! Policies are built either directly, with the constructors of each policy type, or from
//! [`PolicyRecord`]s (a family identifier and a JSON parameter mapping) through a
//! [`PolicyConstructors`] table.
pub mod activity;
pub mod collections;
pub mod error;
pub mod interaction;
pub mod leisure;
pub mod log;
pub mod person;
pub mod policy;
pub mod random;
pub mod records;
pub mod registry;
pub mod window;

#[cfg(test)]
mod testing;

pub use activity::Activity;
pub use collections::{SkipActivityCollection, StayHomeCollection};
pub use error::InterventionError;
pub use interaction::InteractionCoefficients;
pub use leisure::{AgeProbabilityCurve, LeisureDistributor, LeisureTable, SexProbabilities};
pub use crate::log::{debug, error, info, trace, warn};
pub use person::{LockdownStatus, Person, Residence, SymptomTag, Symptoms};
pub use policy::{
    ActivationRecord, ChangeLeisureProbability, CloseCompanies, CloseLeisureVenue, CloseSchools,
    CloseUniversities, PermanentPolicy, Policy, PolicyFamily, PolicyKind, PolicyVariant,
    Quarantine, Shielding, SkipActivity, SocialDistancing, StayHome,
};
pub use records::{records_from_config, PolicyConstructor, PolicyConstructors, PolicyRecord};
pub use registry::{Policies, PolicyDay};
pub use window::{PolicyWindow, WindowEnd};

// Re-exported for use in macros and by model code that builds dates.
pub use chrono;
pub use rand;
