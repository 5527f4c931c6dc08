use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::InterventionError;
use crate::leisure::{AgeProbabilityCurve, LeisureTable, SexProbabilities};
use crate::policy::{parse_parameters, required_window, ActivationRecord, Policy, PolicyVariant};

/// Replaces the attendance probability curves of some leisure activities while in force, e.g.
/// to model pubs being restricted to a few age groups.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChangeLeisureProbability {
    leisure_probabilities: BTreeMap<String, SexProbabilities>,
    activation: Option<ActivationRecord<BTreeMap<String, SexProbabilities>>>,
}

/// Age bands per sex, e.g. `{"men": {"0-50": 0.5, "50-99": 0.2}, "women": {...}}`.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ActivityBands {
    men: BTreeMap<String, f64>,
    women: BTreeMap<String, f64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ChangeLeisureProbabilityParameters {
    #[serde(default, deserialize_with = "crate::policy::present_value")]
    start_time: Option<Value>,
    #[serde(default, deserialize_with = "crate::policy::present_value")]
    end_time: Option<Value>,
    leisure_activities_probabilities: BTreeMap<String, ActivityBands>,
}

impl ChangeLeisureProbability {
    #[must_use]
    pub fn new(
        leisure_probabilities: BTreeMap<String, SexProbabilities>,
    ) -> ChangeLeisureProbability {
        ChangeLeisureProbability {
            leisure_probabilities,
            activation: None,
        }
    }

    pub fn from_parameters(parameters: &Map<String, Value>) -> Result<Policy, InterventionError> {
        let parameters: ChangeLeisureProbabilityParameters = parse_parameters(parameters)?;
        let window = required_window(
            PolicyVariant::ChangeLeisureProbability,
            parameters.start_time.as_ref(),
            parameters.end_time.as_ref(),
        )?;
        let leisure_probabilities = parameters
            .leisure_activities_probabilities
            .into_iter()
            .map(|(activity, bands)| {
                let probabilities = SexProbabilities {
                    male: AgeProbabilityCurve::from_bands(&bands.men)?,
                    female: AgeProbabilityCurve::from_bands(&bands.women)?,
                };
                Ok((activity, probabilities))
            })
            .collect::<Result<BTreeMap<_, _>, InterventionError>>()?;
        Ok(Policy::new(
            window,
            ChangeLeisureProbability::new(leisure_probabilities),
        ))
    }

    #[must_use]
    pub fn leisure_probabilities(&self) -> &BTreeMap<String, SexProbabilities> {
        &self.leisure_probabilities
    }

    /// The curves as they were before activation; `None` unless currently applied.
    #[must_use]
    pub fn original_leisure_probabilities(&self) -> Option<&BTreeMap<String, SexProbabilities>> {
        self.activation.as_ref().map(|record| &record.original)
    }

    #[must_use]
    pub fn is_applied(&self) -> bool {
        self.activation.is_some()
    }

    fn check_known_activities<L: LeisureTable + ?Sized>(
        &self,
        leisure: &L,
        action: &str,
    ) -> Result<(), InterventionError> {
        match self
            .leisure_probabilities
            .keys()
            .find(|activity| !leisure.contains_activity(activity))
        {
            Some(unknown) => Err(InterventionError::PolicyError(format!(
                "trying to {action} a leisure probability for non-existing activity `{unknown}`"
            ))),
            None => Ok(()),
        }
    }

    /// Records the current curves of every configured activity and swaps in the policy's.
    /// Nothing is changed if any configured activity is unknown to `leisure`.
    pub(crate) fn activate<L: LeisureTable + ?Sized>(
        &mut self,
        date: NaiveDate,
        leisure: &mut L,
    ) -> Result<(), InterventionError> {
        self.check_known_activities(leisure, "change")?;
        let mut original = BTreeMap::new();
        for (activity, probabilities) in &self.leisure_probabilities {
            if let Some(distributor) = leisure.distributor_mut(activity) {
                original.insert(
                    activity.clone(),
                    SexProbabilities {
                        male: distributor.male_probabilities().clone(),
                        female: distributor.female_probabilities().clone(),
                    },
                );
                distributor.set_male_probabilities(probabilities.male.clone());
                distributor.set_female_probabilities(probabilities.female.clone());
                debug!("change_leisure_probability: {activity} probabilities replaced");
            }
        }
        self.activation = Some(ActivationRecord {
            activated_on: date,
            original,
        });
        Ok(())
    }

    /// Clears the record and returns the curves it held. The record is kept if any configured
    /// activity is unknown to `leisure`.
    pub(crate) fn deactivate<L: LeisureTable + ?Sized>(
        &mut self,
        leisure: &L,
    ) -> Result<BTreeMap<String, SexProbabilities>, InterventionError> {
        if self.activation.is_none() {
            return Ok(BTreeMap::new());
        }
        self.check_known_activities(leisure, "restore")?;
        Ok(self
            .activation
            .take()
            .map(|record| record.original)
            .unwrap_or_default())
    }

    /// Takes `probabilities` over as the curves to restore for `activity`, when an earlier
    /// policy that replaced the same activity ends first. Returns the curves the activity
    /// should now use, or `None` if this policy does not hold `activity`.
    pub(crate) fn hand_down(
        &mut self,
        activity: &str,
        probabilities: SexProbabilities,
    ) -> Option<SexProbabilities> {
        let original = self.activation.as_mut()?.original.get_mut(activity)?;
        *original = probabilities;
        self.leisure_probabilities.get(activity).cloned()
    }

    /// Puts the recorded curves back and clears the record. [`Policies`] restores
    /// overlapping policies on the same activity through each other instead.
    ///
    /// [`Policies`]: crate::Policies
    pub fn restore<L: LeisureTable + ?Sized>(
        &mut self,
        leisure: &mut L,
    ) -> Result<(), InterventionError> {
        for (activity, probabilities) in self.deactivate(leisure)? {
            set_probabilities(leisure, &activity, probabilities);
        }
        Ok(())
    }
}

/// Writes both curves of `activity`, if `leisure` has it.
pub(crate) fn set_probabilities<L: LeisureTable + ?Sized>(
    leisure: &mut L,
    activity: &str,
    probabilities: SexProbabilities,
) {
    if let Some(distributor) = leisure.distributor_mut(activity) {
        distributor.set_male_probabilities(probabilities.male);
        distributor.set_female_probabilities(probabilities.female);
        debug!("change_leisure_probability: {activity} probabilities restored");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, d).unwrap()
    }

    fn uniform(male: f64, female: f64) -> SexProbabilities {
        SexProbabilities {
            male: AgeProbabilityCurve::uniform(male),
            female: AgeProbabilityCurve::uniform(female),
        }
    }

    fn leisure() -> BTreeMap<String, SexProbabilities> {
        BTreeMap::from([
            ("pubs".to_string(), uniform(0.3, 0.2)),
            ("cinemas".to_string(), uniform(0.1, 0.1)),
        ])
    }

    #[test]
    fn activate_and_restore() {
        let mut table = leisure();
        let mut policy = ChangeLeisureProbability::new(BTreeMap::from([(
            "pubs".to_string(),
            uniform(0.0, 0.05),
        )]));

        policy.activate(date(10), &mut table).unwrap();
        assert_eq!(table["pubs"], uniform(0.0, 0.05));
        assert_eq!(table["cinemas"], uniform(0.1, 0.1));
        assert_eq!(
            policy.original_leisure_probabilities(),
            Some(&BTreeMap::from([("pubs".to_string(), uniform(0.3, 0.2))]))
        );

        policy.restore(&mut table).unwrap();
        assert_eq!(table, leisure());
        assert!(policy.original_leisure_probabilities().is_none());
    }

    #[test]
    fn unknown_activity_fails_without_changes() {
        let mut table = leisure();
        let mut policy = ChangeLeisureProbability::new(BTreeMap::from([
            ("cinemas".to_string(), uniform(0.0, 0.0)),
            ("pubs".to_string(), uniform(0.0, 0.0)),
            ("theatres".to_string(), uniform(0.0, 0.0)),
        ]));
        let error = policy.activate(date(10), &mut table).unwrap_err();
        assert!(error.is_policy_error());
        assert_eq!(table, leisure());
        assert!(!policy.is_applied());
    }

    #[test]
    fn restore_into_table_missing_an_activity_fails() {
        let mut table = leisure();
        let mut policy = ChangeLeisureProbability::new(BTreeMap::from([(
            "pubs".to_string(),
            uniform(0.0, 0.0),
        )]));
        policy.activate(date(10), &mut table).unwrap();

        table.remove("pubs");
        let error = policy.restore(&mut table).unwrap_err();
        assert!(error.is_policy_error());
        // the record survives so a fixed table can still be restored
        assert!(policy.is_applied());
    }

    #[test]
    fn parse_change_leisure_probability() {
        let parameters = json!({
            "start_time": "2020-03-10",
            "end_time": "2020-03-20",
            "leisure_activities_probabilities": {
                "pubs": {
                    "men": {"0-50": 0.5, "50-99": 0.2},
                    "women": {"0-70": 0.2, "71-99": 0.8},
                },
            },
        });
        let policy =
            ChangeLeisureProbability::from_parameters(parameters.as_object().unwrap()).unwrap();
        assert_eq!(policy.spec(), "change_leisure_probability");
        // closed window
        assert!(policy.is_active(date(20)));

        let change = policy.as_change_leisure_probability().unwrap();
        let pubs = &change.leisure_probabilities()["pubs"];
        assert_eq!(pubs.male.probability(20), 0.5);
        assert_eq!(pubs.male.probability(60), 0.2);
        assert_eq!(pubs.female.probability(70), 0.0);
        assert_eq!(pubs.female.probability(80), 0.8);
    }

    #[test]
    fn parse_requires_both_sexes() {
        let parameters = json!({
            "start_time": "2020-03-10",
            "end_time": "2020-03-20",
            "leisure_activities_probabilities": {"pubs": {"men": {"0-99": 0.1}}},
        });
        let error =
            ChangeLeisureProbability::from_parameters(parameters.as_object().unwrap()).unwrap_err();
        assert!(error.is_configuration_error());
    }
}
