use serde::Deserialize;
use serde_json::{Map, Value};

use crate::define_rng;
use crate::error::InterventionError;
use crate::person::{Person, SymptomTag};
use crate::policy::{optional_window, parse_parameters, required_window, Policy, PolicyVariant};
use crate::random::RandomStreams;

define_rng!(HouseholdQuarantineRng);
define_rng!(ShieldingRng);

/// Policies that can confine a person to their home for the day.
#[derive(Clone, Debug, PartialEq)]
pub enum StayHome {
    Permanent(PermanentPolicy),
    Quarantine(Quarantine),
    Shielding(Shielding),
}

impl StayHome {
    #[must_use]
    pub fn variant(&self) -> PolicyVariant {
        match self {
            StayHome::Permanent(_) => PolicyVariant::PermanentPolicy,
            StayHome::Quarantine(_) => PolicyVariant::Quarantine,
            StayHome::Shielding(_) => PolicyVariant::Shielding,
        }
    }

    /// `days_from_start` is the simulation time in days.
    pub fn must_stay_home<P: Person + ?Sized>(
        &self,
        person: &P,
        days_from_start: f64,
        random: &RandomStreams,
    ) -> bool {
        match self {
            StayHome::Permanent(policy) => policy.must_stay_home(person),
            StayHome::Quarantine(policy) => policy.must_stay_home(person, days_from_start, random),
            StayHome::Shielding(policy) => policy.must_stay_home(person, random),
        }
    }
}

/// Severely symptomatic people stay home. Every registry holds one for its whole lifetime.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PermanentPolicy;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PermanentPolicyParameters {
    #[serde(default, deserialize_with = "crate::policy::present_value")]
    start_time: Option<Value>,
    #[serde(default, deserialize_with = "crate::policy::present_value")]
    end_time: Option<Value>,
}

impl PermanentPolicy {
    pub fn from_parameters(parameters: &Map<String, Value>) -> Result<Policy, InterventionError> {
        let parameters: PermanentPolicyParameters = parse_parameters(parameters)?;
        let window = optional_window(parameters.start_time.as_ref(), parameters.end_time.as_ref())?;
        Ok(Policy::new(window, PermanentPolicy))
    }

    pub fn must_stay_home<P: Person + ?Sized>(&self, person: &P) -> bool {
        person
            .symptoms()
            .is_some_and(|symptoms| symptoms.tag == SymptomTag::Severe)
    }
}

/// People stay home for `n_days` after their own symptoms start, and for `n_days_household`
/// after a housemate's. Only a `household_complacency` share of housemates comply.
#[derive(Clone, Debug, PartialEq)]
pub struct Quarantine {
    pub n_days: u32,
    pub n_days_household: u32,
    pub household_complacency: f64,
}

impl Default for Quarantine {
    fn default() -> Self {
        Quarantine {
            n_days: 7,
            n_days_household: 14,
            household_complacency: 1.0,
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct QuarantineParameters {
    #[serde(default, deserialize_with = "crate::policy::present_value")]
    start_time: Option<Value>,
    #[serde(default, deserialize_with = "crate::policy::present_value")]
    end_time: Option<Value>,
    n_days: Option<u32>,
    n_days_household: Option<u32>,
    household_complacency: Option<f64>,
}

impl Quarantine {
    pub fn from_parameters(parameters: &Map<String, Value>) -> Result<Policy, InterventionError> {
        let parameters: QuarantineParameters = parse_parameters(parameters)?;
        let window = optional_window(parameters.start_time.as_ref(), parameters.end_time.as_ref())?;
        let defaults = Quarantine::default();
        let household_complacency = parameters
            .household_complacency
            .unwrap_or(defaults.household_complacency);
        if !(0.0..=1.0).contains(&household_complacency) {
            return Err(InterventionError::ConfigurationError(format!(
                "household_complacency {household_complacency} is not in [0, 1]"
            )));
        }
        Ok(Policy::new(
            window,
            Quarantine {
                n_days: parameters.n_days.unwrap_or(defaults.n_days),
                n_days_household: parameters
                    .n_days_household
                    .unwrap_or(defaults.n_days_household),
                household_complacency,
            },
        ))
    }

    /// True while `onset < days_from_start < onset + n_days` for a mildly or severely
    /// symptomatic person. A person without a recorded symptom state or onset time is not
    /// self-quarantining.
    fn self_quarantine<P: Person + ?Sized>(&self, person: &P, days_from_start: f64) -> bool {
        let Some(symptoms) = person.symptoms() else {
            return false;
        };
        if !matches!(symptoms.tag, SymptomTag::Mild | SymptomTag::Severe) {
            return false;
        }
        let Some(onset) = symptoms.time_of_symptoms_onset else {
            return false;
        };
        let release_day = onset + f64::from(self.n_days);
        onset < days_from_start && days_from_start < release_day
    }

    fn housemates_quarantine<P: Person + ?Sized>(
        &self,
        person: &P,
        days_from_start: f64,
        random: &RandomStreams,
    ) -> bool {
        let Some(residence) = person.residence() else {
            return false;
        };
        if !residence.quarantine(days_from_start, self.n_days_household) {
            return false;
        }
        self.household_complacency >= 1.0
            || random.sample_bool(HouseholdQuarantineRng, self.household_complacency)
    }

    pub fn must_stay_home<P: Person + ?Sized>(
        &self,
        person: &P,
        days_from_start: f64,
        random: &RandomStreams,
    ) -> bool {
        self.self_quarantine(person, days_from_start)
            || self.housemates_quarantine(person, days_from_start, random)
    }
}

/// People aged `min_age` or over stay home. With a `complacency` set, each check complies with
/// that probability, drawn afresh on every call.
#[derive(Clone, Debug, PartialEq)]
pub struct Shielding {
    pub min_age: u32,
    pub complacency: Option<f64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ShieldingParameters {
    #[serde(default, deserialize_with = "crate::policy::present_value")]
    start_time: Option<Value>,
    #[serde(default, deserialize_with = "crate::policy::present_value")]
    end_time: Option<Value>,
    min_age: u32,
    complacency: Option<f64>,
}

impl Shielding {
    pub fn from_parameters(parameters: &Map<String, Value>) -> Result<Policy, InterventionError> {
        let parameters: ShieldingParameters = parse_parameters(parameters)?;
        let window = required_window(
            PolicyVariant::Shielding,
            parameters.start_time.as_ref(),
            parameters.end_time.as_ref(),
        )?;
        if let Some(complacency) = parameters.complacency {
            if !(0.0..=1.0).contains(&complacency) {
                return Err(InterventionError::ConfigurationError(format!(
                    "complacency {complacency} is not in [0, 1]"
                )));
            }
        }
        Ok(Policy::new(
            window,
            Shielding {
                min_age: parameters.min_age,
                complacency: parameters.complacency,
            },
        ))
    }

    pub fn must_stay_home<P: Person + ?Sized>(&self, person: &P, random: &RandomStreams) -> bool {
        if person.age() < self.min_age {
            return false;
        }
        match self.complacency {
            None => true,
            Some(complacency) => random.sample_unit(ShieldingRng) < complacency,
        }
    }
}
