use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::activity::{remove_activities, Activity};
use crate::define_rng;
use crate::error::InterventionError;
use crate::person::{LockdownStatus, Person};
use crate::policy::{parse_parameters, required_window, Policy, PolicyVariant};
use crate::random::RandomStreams;

define_rng!(CompanyClosureRng);

/// Children below this age keep going to school when enough of their household are key workers.
const KEY_WORKER_CHILD_MAX_AGE: u32 = 14;
/// How many key workers a household needs for its children to stay in school.
const KEY_WORKER_PARENTS: usize = 2;
/// The school years `"all"` stands for.
const ALL_SCHOOL_YEARS: std::ops::Range<u32> = 0..20;

/// Policies that bar a person from some of the day's activities.
#[derive(Clone, Debug, PartialEq)]
pub enum SkipActivity {
    CloseSchools(CloseSchools),
    CloseUniversities(CloseUniversities),
    CloseCompanies(CloseCompanies),
}

impl SkipActivity {
    #[must_use]
    pub fn variant(&self) -> PolicyVariant {
        match self {
            SkipActivity::CloseSchools(_) => PolicyVariant::CloseSchools,
            SkipActivity::CloseUniversities(_) => PolicyVariant::CloseUniversities,
            SkipActivity::CloseCompanies(_) => PolicyVariant::CloseCompanies,
        }
    }

    /// Returns `activities` without the ones this policy bars `person` from.
    pub fn skip_activity<P: Person + ?Sized>(
        &self,
        person: &P,
        activities: Vec<Activity>,
        random: &RandomStreams,
    ) -> Vec<Activity> {
        match self {
            SkipActivity::CloseSchools(policy) => policy.skip_activity(person, activities),
            SkipActivity::CloseUniversities(policy) => policy.skip_activity(person, activities),
            SkipActivity::CloseCompanies(policy) => {
                policy.skip_activity(person, activities, random)
            }
        }
    }
}

/// Keeps pupils home, except young children of key workers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CloseSchools {
    pub full_closure: bool,
    /// Ages whose school years are closed when this is not a full closure.
    pub years_to_close: BTreeSet<u32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum YearsToClose {
    Keyword(String),
    Ages(Vec<u32>),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CloseSchoolsParameters {
    #[serde(default, deserialize_with = "crate::policy::present_value")]
    start_time: Option<Value>,
    #[serde(default, deserialize_with = "crate::policy::present_value")]
    end_time: Option<Value>,
    #[serde(default)]
    full_closure: Option<bool>,
    #[serde(default)]
    years_to_close: Option<YearsToClose>,
}

impl CloseSchools {
    #[must_use]
    pub fn full() -> CloseSchools {
        CloseSchools {
            full_closure: true,
            years_to_close: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn years(years_to_close: impl IntoIterator<Item = u32>) -> CloseSchools {
        CloseSchools {
            full_closure: false,
            years_to_close: years_to_close.into_iter().collect(),
        }
    }

    pub fn from_parameters(parameters: &Map<String, Value>) -> Result<Policy, InterventionError> {
        let parameters: CloseSchoolsParameters = parse_parameters(parameters)?;
        let window = required_window(
            PolicyVariant::CloseSchools,
            parameters.start_time.as_ref(),
            parameters.end_time.as_ref(),
        )?;
        let years_to_close = match parameters.years_to_close {
            None => BTreeSet::new(),
            Some(YearsToClose::Keyword(keyword)) if keyword == "all" => {
                ALL_SCHOOL_YEARS.collect()
            }
            Some(YearsToClose::Keyword(keyword)) => {
                return Err(InterventionError::ConfigurationError(format!(
                    "years_to_close must be \"all\" or a list of ages, got \"{keyword}\""
                )))
            }
            Some(YearsToClose::Ages(ages)) => ages.into_iter().collect(),
        };
        Ok(Policy::new(
            window,
            CloseSchools {
                full_closure: parameters.full_closure.unwrap_or(false),
                years_to_close,
            },
        ))
    }

    /// A child under 14 still goes to school if at least two residents of their household are
    /// key workers.
    fn kid_goes_to_school<P: Person + ?Sized>(person: &P) -> bool {
        if person.age() >= KEY_WORKER_CHILD_MAX_AGE {
            return false;
        }
        let Some(residence) = person.residence() else {
            return false;
        };
        residence
            .residents()
            .iter()
            .filter(|resident| resident.lockdown_status() == Some(LockdownStatus::KeyWorker))
            .take(KEY_WORKER_PARENTS)
            .count()
            >= KEY_WORKER_PARENTS
    }

    pub fn skip_activity<P: Person + ?Sized>(
        &self,
        person: &P,
        activities: Vec<Activity>,
    ) -> Vec<Activity> {
        if person.primary_activity_spec() != Some("school") {
            return activities;
        }
        let closed = self.full_closure || self.years_to_close.contains(&person.age());
        if closed && !Self::kid_goes_to_school(person) {
            return remove_activities(activities, &[Activity::PrimaryActivity]);
        }
        activities
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct CloseUniversities;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CloseUniversitiesParameters {
    #[serde(default, deserialize_with = "crate::policy::present_value")]
    start_time: Option<Value>,
    #[serde(default, deserialize_with = "crate::policy::present_value")]
    end_time: Option<Value>,
}

impl CloseUniversities {
    pub fn from_parameters(parameters: &Map<String, Value>) -> Result<Policy, InterventionError> {
        let parameters: CloseUniversitiesParameters = parse_parameters(parameters)?;
        let window = required_window(
            PolicyVariant::CloseUniversities,
            parameters.start_time.as_ref(),
            parameters.end_time.as_ref(),
        )?;
        Ok(Policy::new(window, CloseUniversities))
    }

    pub fn skip_activity<P: Person + ?Sized>(
        &self,
        person: &P,
        activities: Vec<Activity>,
    ) -> Vec<Activity> {
        if person.primary_activity_spec() == Some("university") {
            return remove_activities(activities, &[Activity::PrimaryActivity]);
        }
        activities
    }
}

/// Keeps furloughed workers (or, for a full closure, every worker) away from work. Workers
/// with a `random` lockdown status go in on each day with `random_work_probability`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CloseCompanies {
    pub full_closure: bool,
    pub random_work_probability: Option<f64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CloseCompaniesParameters {
    #[serde(default, deserialize_with = "crate::policy::present_value")]
    start_time: Option<Value>,
    #[serde(default, deserialize_with = "crate::policy::present_value")]
    end_time: Option<Value>,
    #[serde(default)]
    full_closure: Option<bool>,
    #[serde(default)]
    random_work_probability: Option<f64>,
}

impl CloseCompanies {
    pub fn from_parameters(parameters: &Map<String, Value>) -> Result<Policy, InterventionError> {
        let parameters: CloseCompaniesParameters = parse_parameters(parameters)?;
        let window = required_window(
            PolicyVariant::CloseCompanies,
            parameters.start_time.as_ref(),
            parameters.end_time.as_ref(),
        )?;
        if let Some(p) = parameters.random_work_probability {
            if !(0.0..=1.0).contains(&p) {
                return Err(InterventionError::ConfigurationError(format!(
                    "random_work_probability {p} is not in [0, 1]"
                )));
            }
        }
        Ok(Policy::new(
            window,
            CloseCompanies {
                full_closure: parameters.full_closure.unwrap_or(false),
                random_work_probability: parameters.random_work_probability,
            },
        ))
    }

    pub fn skip_activity<P: Person + ?Sized>(
        &self,
        person: &P,
        activities: Vec<Activity>,
        random: &RandomStreams,
    ) -> Vec<Activity> {
        if person.primary_activity_spec() != Some("company") {
            return activities;
        }
        let stays_away = match person.lockdown_status() {
            _ if self.full_closure => true,
            Some(LockdownStatus::Furlough) => true,
            Some(LockdownStatus::Random) => self
                .random_work_probability
                .is_some_and(|p| random.sample_unit(CompanyClosureRng) > p),
            _ => false,
        };
        if stays_away {
            return remove_activities(activities, &[Activity::PrimaryActivity, Activity::Commute]);
        }
        activities
    }
}
