use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::InterventionError;
use crate::interaction::InteractionCoefficients;
use crate::policy::{parse_parameters, required_window, ActivationRecord, Policy, PolicyVariant};

/// Scales interaction coefficients while in force: `beta = beta * factor` for each configured
/// interaction type. The scaled-over values are restored exactly afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SocialDistancing {
    beta_factors: BTreeMap<String, f64>,
    activation: Option<ActivationRecord<BTreeMap<String, f64>>>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SocialDistancingParameters {
    #[serde(default, deserialize_with = "crate::policy::present_value")]
    start_time: Option<Value>,
    #[serde(default, deserialize_with = "crate::policy::present_value")]
    end_time: Option<Value>,
    #[serde(default)]
    beta_factors: BTreeMap<String, f64>,
}

impl SocialDistancing {
    #[must_use]
    pub fn new(beta_factors: BTreeMap<String, f64>) -> SocialDistancing {
        SocialDistancing {
            beta_factors,
            activation: None,
        }
    }

    pub fn from_parameters(parameters: &Map<String, Value>) -> Result<Policy, InterventionError> {
        let parameters: SocialDistancingParameters = parse_parameters(parameters)?;
        let window = required_window(
            PolicyVariant::SocialDistancing,
            parameters.start_time.as_ref(),
            parameters.end_time.as_ref(),
        )?;
        Ok(Policy::new(window, SocialDistancing::new(parameters.beta_factors)))
    }

    #[must_use]
    pub fn beta_factors(&self) -> &BTreeMap<String, f64> {
        &self.beta_factors
    }

    /// The coefficients as they were before activation; `None` unless currently applied.
    #[must_use]
    pub fn original_betas(&self) -> Option<&BTreeMap<String, f64>> {
        self.activation.as_ref().map(|record| &record.original)
    }

    #[must_use]
    pub fn is_applied(&self) -> bool {
        self.activation.is_some()
    }

    fn check_known_types<I: InteractionCoefficients + ?Sized>(
        &self,
        interaction: &I,
        action: &str,
    ) -> Result<(), InterventionError> {
        match self
            .beta_factors
            .keys()
            .find(|interaction_type| interaction.beta(interaction_type).is_none())
        {
            Some(unknown) => Err(InterventionError::PolicyError(format!(
                "trying to {action} the beta of unknown interaction type `{unknown}`"
            ))),
            None => Ok(()),
        }
    }

    /// Records the current coefficient of every configured type, then scales it. Nothing is
    /// changed if any configured type is unknown to `interaction`.
    pub(crate) fn activate<I: InteractionCoefficients + ?Sized>(
        &mut self,
        date: NaiveDate,
        interaction: &mut I,
    ) -> Result<(), InterventionError> {
        self.check_known_types(interaction, "change")?;
        let mut original = BTreeMap::new();
        for (interaction_type, factor) in &self.beta_factors {
            if let Some(beta) = interaction.beta(interaction_type) {
                original.insert(interaction_type.clone(), beta);
                interaction.set_beta(interaction_type, beta * factor);
                debug!(
                    "social_distancing: {interaction_type} beta {beta} -> {}",
                    beta * factor
                );
            }
        }
        self.activation = Some(ActivationRecord {
            activated_on: date,
            original,
        });
        Ok(())
    }

    /// Clears the record and returns the coefficients it held. The record is kept if any
    /// configured type is unknown to `interaction`.
    pub(crate) fn deactivate<I: InteractionCoefficients + ?Sized>(
        &mut self,
        interaction: &I,
    ) -> Result<BTreeMap<String, f64>, InterventionError> {
        if self.activation.is_none() {
            return Ok(BTreeMap::new());
        }
        self.check_known_types(interaction, "restore")?;
        Ok(self
            .activation
            .take()
            .map(|record| record.original)
            .unwrap_or_default())
    }

    /// Takes `beta` over as the value to restore for `interaction_type`, when an earlier
    /// policy that scaled the same type ends first. Returns what the coefficient should now
    /// read, or `None` if this policy does not hold `interaction_type`.
    pub(crate) fn hand_down(&mut self, interaction_type: &str, beta: f64) -> Option<f64> {
        let original = self
            .activation
            .as_mut()?
            .original
            .get_mut(interaction_type)?;
        *original = beta;
        let factor = self.beta_factors.get(interaction_type)?;
        Some(beta * factor)
    }

    /// Writes the recorded coefficients back and clears the record. [`Policies`] restores
    /// overlapping policies on the same type through each other instead.
    ///
    /// [`Policies`]: crate::Policies
    pub fn restore<I: InteractionCoefficients + ?Sized>(
        &mut self,
        interaction: &mut I,
    ) -> Result<(), InterventionError> {
        for (interaction_type, beta) in self.deactivate(interaction)? {
            debug!("social_distancing: {interaction_type} beta restored to {beta}");
            interaction.set_beta(&interaction_type, beta);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use serde_json::json;
    use std::collections::HashMap;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, d).unwrap()
    }

    fn betas() -> HashMap<String, f64> {
        HashMap::from([
            ("household".to_string(), 2.0),
            ("school".to_string(), 0.3),
            ("pub".to_string(), 0.1),
        ])
    }

    #[test]
    fn activate_scales_and_records() {
        let mut interaction = betas();
        let mut policy = SocialDistancing::new(BTreeMap::from([
            ("household".to_string(), 0.5),
            ("pub".to_string(), 0.2),
        ]));
        assert!(policy.original_betas().is_none());

        policy.activate(date(10), &mut interaction).unwrap();
        assert!(policy.is_applied());
        assert_approx_eq!(interaction["household"], 1.0);
        assert_approx_eq!(interaction["pub"], 0.02);
        assert_approx_eq!(interaction["school"], 0.3);
        assert_eq!(
            policy.original_betas(),
            Some(&BTreeMap::from([
                ("household".to_string(), 2.0),
                ("pub".to_string(), 0.1),
            ]))
        );

        policy.restore(&mut interaction).unwrap();
        assert!(!policy.is_applied());
        assert_eq!(interaction, betas());
    }

    #[test]
    fn restore_is_exact_for_awkward_factors() {
        let mut interaction = HashMap::from([("household".to_string(), 0.1 + 0.2)]);
        let mut policy =
            SocialDistancing::new(BTreeMap::from([("household".to_string(), 1.0 / 3.0)]));
        policy.activate(date(1), &mut interaction).unwrap();
        policy.restore(&mut interaction).unwrap();
        assert_eq!(interaction["household"], 0.1 + 0.2);
    }

    #[test]
    fn unknown_interaction_type_is_an_error_before_any_change() {
        let mut interaction = betas();
        let mut policy = SocialDistancing::new(BTreeMap::from([
            ("household".to_string(), 0.5),
            ("stadium".to_string(), 0.5),
        ]));
        let error = policy.activate(date(10), &mut interaction).unwrap_err();
        assert!(error.is_policy_error());
        assert_eq!(interaction, betas());
        assert!(!policy.is_applied());
    }

    #[test]
    fn restore_without_activation_is_a_no_op() {
        let mut interaction = betas();
        let mut policy = SocialDistancing::new(BTreeMap::from([("household".to_string(), 0.5)]));
        policy.restore(&mut interaction).unwrap();
        assert_eq!(interaction, betas());
    }

    #[test]
    fn parse_social_distancing() {
        let parameters = json!({
            "start_time": "2020-03-10",
            "end_time": "2020-03-20",
            "beta_factors": {"household": 0.5, "school": 0.8},
        });
        let policy = SocialDistancing::from_parameters(parameters.as_object().unwrap()).unwrap();
        assert_eq!(policy.spec(), "social_distancing");
        assert_eq!(policy.start_time(), date(10));
        assert_eq!(
            policy.as_social_distancing().unwrap().beta_factors(),
            &BTreeMap::from([("household".to_string(), 0.5), ("school".to_string(), 0.8)])
        );

        let parameters = json!({"start_time": "2020-03-10", "end_time": "2020-03-20",
                                "beta_factors": {"household": "half"}});
        assert!(SocialDistancing::from_parameters(parameters.as_object().unwrap())
            .unwrap_err()
            .is_configuration_error());
    }
}
