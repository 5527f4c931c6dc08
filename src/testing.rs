//! People and households for unit tests.

use std::rc::Rc;

use crate::person::{LockdownStatus, Person, Residence, SymptomTag, Symptoms};

#[derive(Clone, Debug, Default)]
pub(crate) struct TestPerson {
    age: u32,
    symptoms: Option<Symptoms>,
    lockdown_status: Option<LockdownStatus>,
    primary_activity: Option<String>,
    residence: Option<TestHousehold>,
    in_hospital: bool,
}

impl TestPerson {
    pub(crate) fn new(age: u32) -> TestPerson {
        TestPerson {
            age,
            ..TestPerson::default()
        }
    }

    pub(crate) fn with_symptoms(mut self, tag: SymptomTag, onset: Option<f64>) -> TestPerson {
        self.symptoms = Some(Symptoms {
            tag,
            time_of_symptoms_onset: onset,
        });
        self
    }

    pub(crate) fn with_lockdown_status(mut self, status: LockdownStatus) -> TestPerson {
        self.lockdown_status = Some(status);
        self
    }

    pub(crate) fn with_primary_activity(mut self, spec: &str) -> TestPerson {
        self.primary_activity = Some(spec.to_string());
        self
    }

    pub(crate) fn with_residence(mut self, residence: TestHousehold) -> TestPerson {
        self.residence = Some(residence);
        self
    }

    pub(crate) fn hospitalised(mut self) -> TestPerson {
        self.in_hospital = true;
        self
    }
}

impl Person for TestPerson {
    fn age(&self) -> u32 {
        self.age
    }

    fn symptoms(&self) -> Option<Symptoms> {
        self.symptoms
    }

    fn lockdown_status(&self) -> Option<LockdownStatus> {
        self.lockdown_status
    }

    fn primary_activity_spec(&self) -> Option<&str> {
        self.primary_activity.as_deref()
    }

    fn residence(&self) -> Option<&dyn Residence> {
        self.residence
            .as_ref()
            .map(|residence| residence as &dyn Residence)
    }

    fn in_hospital(&self) -> bool {
        self.in_hospital
    }
}

#[derive(Debug, Default)]
struct HouseholdData {
    residents: Vec<TestPerson>,
    quarantine_start: Option<f64>,
}

/// Cheap to clone so several test people can share one household.
#[derive(Clone, Debug, Default)]
pub(crate) struct TestHousehold(Rc<HouseholdData>);

impl TestHousehold {
    pub(crate) fn new(residents: Vec<TestPerson>) -> TestHousehold {
        TestHousehold(Rc::new(HouseholdData {
            residents,
            quarantine_start: None,
        }))
    }

    /// A household where someone developed symptoms on `quarantine_start`.
    pub(crate) fn quarantining(quarantine_start: f64) -> TestHousehold {
        TestHousehold(Rc::new(HouseholdData {
            residents: Vec::new(),
            quarantine_start: Some(quarantine_start),
        }))
    }
}

impl Residence for TestHousehold {
    fn quarantine(&self, days_from_start: f64, n_days_household: u32) -> bool {
        self.0.quarantine_start.is_some_and(|start| {
            start < days_from_start && days_from_start < start + f64::from(n_days_household)
        })
    }

    fn residents(&self) -> Vec<&dyn Person> {
        self.0
            .residents
            .iter()
            .map(|resident| resident as &dyn Person)
            .collect()
    }
}
