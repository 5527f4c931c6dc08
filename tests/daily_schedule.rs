//! Runs a small population through several weeks of a lockdown timeline, the way a
//! simulation step loop drives the engine.

use std::collections::{BTreeMap, HashMap};

use assert_approx_eq::assert_approx_eq;
use interventions::chrono::{Days, NaiveDate};
use interventions::{
    records_from_config, Activity, AgeProbabilityCurve, LockdownStatus, Person, Policies,
    Residence, SexProbabilities, SymptomTag, Symptoms,
};
use serde_json::json;

struct Household {
    /// Day on which a resident became symptomatic.
    index_case_onset: Option<f64>,
    key_workers: usize,
}

impl Residence for Household {
    fn quarantine(&self, days_from_start: f64, n_days_household: u32) -> bool {
        self.index_case_onset.is_some_and(|onset| {
            onset < days_from_start && days_from_start < onset + f64::from(n_days_household)
        })
    }

    fn residents(&self) -> Vec<&dyn Person> {
        KEY_WORKERS[..self.key_workers]
            .iter()
            .map(|person| person as &dyn Person)
            .collect()
    }
}

struct Resident {
    age: u32,
    group: Option<&'static str>,
    status: Option<LockdownStatus>,
    symptoms: Option<Symptoms>,
    home: Option<&'static Household>,
}

impl Person for Resident {
    fn age(&self) -> u32 {
        self.age
    }

    fn symptoms(&self) -> Option<Symptoms> {
        self.symptoms
    }

    fn lockdown_status(&self) -> Option<LockdownStatus> {
        self.status
    }

    fn primary_activity_spec(&self) -> Option<&str> {
        self.group
    }

    fn residence(&self) -> Option<&dyn Residence> {
        self.home.map(|home| home as &dyn Residence)
    }

    fn in_hospital(&self) -> bool {
        false
    }
}

static KEY_WORKERS: [Resident; 2] = [
    Resident {
        age: 40,
        group: Some("company"),
        status: Some(LockdownStatus::KeyWorker),
        symptoms: None,
        home: None,
    },
    Resident {
        age: 42,
        group: Some("company"),
        status: Some(LockdownStatus::KeyWorker),
        symptoms: None,
        home: None,
    },
];

static KEY_WORKER_HOME: Household = Household {
    index_case_onset: None,
    key_workers: 2,
};

static QUARANTINED_HOME: Household = Household {
    index_case_onset: Some(20.0),
    key_workers: 0,
};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 3, 1).unwrap()
}

fn policies() -> Policies {
    let config = json!({
        "close_schools": {
            "start_time": "2020-03-16", "end_time": "2020-04-13",
            "full_closure": true,
        },
        "close_companies": {
            "start_time": "2020-03-21", "end_time": "2020-04-13",
            "random_work_probability": 0.2,
        },
        "quarantine": {
            "start_time": "2020-03-10", "end_time": "2020-04-13",
            "n_days": 7, "n_days_household": 14,
        },
        "social_distancing": {
            "first": {"start_time": "2020-03-16", "end_time": "2020-03-23",
                      "beta_factors": {"household": 1.25, "pub": 0.5}},
            "second": {"start_time": "2020-03-23", "end_time": "2020-04-13",
                       "beta_factors": {"pub": 0.1}},
        },
        "close_leisure_venue": {
            "start_time": "2020-03-21", "end_time": "2020-04-13",
            "venues_to_close": ["pub", "cinema"],
        },
        "change_leisure_probability": {
            "start_time": "2020-04-13", "end_time": "2020-04-20",
            "leisure_activities_probabilities": {
                "pub": {"men": {"0-18": 0.0, "18-100": 0.1},
                        "women": {"0-18": 0.0, "18-100": 0.05}},
            },
        },
    });
    let records = records_from_config(&config).unwrap();
    let mut policies = Policies::from_records(&records).unwrap();
    policies.init_random(3);
    policies
}

fn everything() -> Vec<Activity> {
    vec![
        Activity::MedicalFacility,
        Activity::Commute,
        Activity::PrimaryActivity,
        Activity::Leisure,
        Activity::Residence,
    ]
}

#[test]
fn lockdown_timeline() {
    let mut policies = policies();
    assert_eq!(policies.len(), 8);

    let mut betas = HashMap::from([("household".to_string(), 0.8), ("pub".to_string(), 1.0)]);
    let mut leisure = BTreeMap::from([(
        "pub".to_string(),
        SexProbabilities {
            male: AgeProbabilityCurve::uniform(0.3),
            female: AgeProbabilityCurve::uniform(0.2),
        },
    )]);
    let original_leisure = leisure.clone();

    let pupil = Resident {
        age: 9,
        group: Some("school"),
        status: None,
        symptoms: None,
        home: None,
    };
    let key_worker_child = Resident {
        age: 9,
        group: Some("school"),
        status: None,
        symptoms: None,
        home: Some(&KEY_WORKER_HOME),
    };
    let furloughed = Resident {
        age: 35,
        group: Some("company"),
        status: Some(LockdownStatus::Furlough),
        symptoms: None,
        home: None,
    };
    let sick = Resident {
        age: 50,
        group: Some("company"),
        status: Some(LockdownStatus::KeyWorker),
        symptoms: Some(Symptoms {
            tag: SymptomTag::Mild,
            time_of_symptoms_onset: Some(15.0),
        }),
        home: None,
    };
    let housemate = Resident {
        age: 30,
        group: None,
        status: None,
        symptoms: None,
        home: Some(&QUARANTINED_HOME),
    };

    for day in 0..60u32 {
        let date = start() + Days::new(u64::from(day));
        let days_from_start = f64::from(day);
        policies
            .apply_stateful_policies(date, &mut betas, &mut leisure)
            .unwrap();
        let today = policies.day(date);

        let schools_closed = (15..43).contains(&day);
        let companies_closed = (20..43).contains(&day);

        let pupil_day = today.skip_activity.apply(&pupil, everything());
        assert_eq!(
            pupil_day.contains(&Activity::PrimaryActivity),
            !schools_closed,
            "pupil on day {day}"
        );
        assert_eq!(
            today.skip_activity.apply(&key_worker_child, everything()),
            everything()
        );
        let furloughed_day = today.skip_activity.apply(&furloughed, everything());
        assert_eq!(furloughed_day.contains(&Activity::Commute), !companies_closed);

        let quarantine_active = (9..43).contains(&day);
        assert_eq!(
            today.stay_home.must_stay_home(&sick, days_from_start),
            quarantine_active && 15.0 < days_from_start && days_from_start < 22.0,
            "sick resident on day {day}"
        );
        assert_eq!(
            today.stay_home.must_stay_home(&housemate, days_from_start),
            quarantine_active && 20.0 < days_from_start && days_from_start < 34.0,
            "housemate on day {day}"
        );

        assert_eq!(today.is_venue_closed("pub"), companies_closed);

        match day {
            0..15 => {
                assert_eq!(betas["household"], 0.8);
                assert_eq!(betas["pub"], 1.0);
            }
            15..22 => {
                assert_approx_eq!(betas["household"], 1.0);
                assert_approx_eq!(betas["pub"], 0.5);
            }
            22..43 => {
                assert_eq!(betas["household"], 0.8);
                assert_approx_eq!(betas["pub"], 0.1);
            }
            _ => {
                assert_eq!(betas["household"], 0.8);
                assert_eq!(betas["pub"], 1.0);
            }
        }

        match day {
            43..50 => {
                assert_eq!(leisure["pub"].male.probability(10), 0.0);
                assert_eq!(leisure["pub"].male.probability(30), 0.1);
                assert_eq!(leisure["pub"].female.probability(30), 0.05);
            }
            _ => assert_eq!(leisure, original_leisure),
        }
    }
}

#[test]
fn random_work_follows_the_seed() {
    let attendance = |seed: u64| {
        let mut policies = policies();
        policies.init_random(seed);
        let worker = Resident {
            age: 30,
            group: Some("company"),
            status: Some(LockdownStatus::Random),
            symptoms: None,
            home: None,
        };
        let date = NaiveDate::from_ymd_opt(2020, 3, 25).unwrap();
        let collection = policies.skip_activity_collection(date);
        (0..200)
            .map(|_| {
                collection
                    .apply(&worker, everything())
                    .contains(&Activity::PrimaryActivity)
            })
            .collect::<Vec<bool>>()
    };
    let first = attendance(11);
    assert_eq!(first, attendance(11));

    let days_at_work = first.iter().filter(|at_work| **at_work).count();
    assert!((10..80).contains(&days_at_work), "{days_at_work}");
}

#[test]
fn unknown_family_fails_at_load_time() {
    let records = records_from_config(&json!({
        "close_borders": {"start_time": "2020-03-16", "end_time": "2020-04-13"},
    }))
    .unwrap();
    let error = Policies::from_records(&records).unwrap_err();
    assert!(error.is_configuration_error());
}
