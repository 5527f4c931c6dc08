//! What the engine needs to know about a person and their household. The population itself
//! lives elsewhere; these traits are the read-only view predicate policies evaluate against.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SymptomTag {
    Exposed,
    Asymptomatic,
    Mild,
    Severe,
    Hospitalised,
    IntensiveCare,
    Recovered,
    Dead,
}

/// How a worker is treated under a lockdown.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LockdownStatus {
    KeyWorker,
    Furlough,
    /// Goes to work on a random subset of days.
    Random,
}

/// The current symptom state of an infected person.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Symptoms {
    pub tag: SymptomTag,
    /// Days since the start of the simulation; `None` if onset was never recorded.
    pub time_of_symptoms_onset: Option<f64>,
}

pub trait Person {
    fn age(&self) -> u32;

    /// `None` if no symptom state has been recorded for this person.
    fn symptoms(&self) -> Option<Symptoms>;

    fn lockdown_status(&self) -> Option<LockdownStatus>;

    /// The `spec` of the group the person's primary activity takes place in, e.g. `"school"`,
    /// `"university"` or `"company"`.
    fn primary_activity_spec(&self) -> Option<&str>;

    fn residence(&self) -> Option<&dyn Residence>;

    /// True while the person occupies a hospital venue.
    fn in_hospital(&self) -> bool;
}

/// The group a person lives in.
pub trait Residence {
    /// True if a resident's symptoms started fewer than `n_days_household` days before
    /// `days_from_start`, so the whole household should be quarantining.
    fn quarantine(&self, days_from_start: f64, n_days_household: u32) -> bool;

    fn residents(&self) -> Vec<&dyn Person>;
}
