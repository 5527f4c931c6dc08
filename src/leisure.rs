//! Leisure-attendance probabilities: the tables `ChangeLeisureProbability` swaps in and out.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use crate::error::InterventionError;

/// A probability for every year of age in `0..AgeProbabilityCurve::MAX_AGE`.
#[derive(Clone, Debug, PartialEq)]
pub struct AgeProbabilityCurve(Vec<f64>);

impl AgeProbabilityCurve {
    pub const MAX_AGE: u32 = 100;

    /// The same probability at every age.
    #[must_use]
    pub fn uniform(probability: f64) -> AgeProbabilityCurve {
        AgeProbabilityCurve(vec![probability; Self::MAX_AGE as usize])
    }

    /// Builds a curve from age bands keyed `"lo-hi"`, each covering ages `lo..hi`.
    ///
    /// Ages outside every band get probability 0. Where bands overlap the one with the lower
    /// `lo` wins.
    pub fn from_bands(
        bands: &BTreeMap<String, f64>,
    ) -> Result<AgeProbabilityCurve, InterventionError> {
        let mut parsed = bands
            .iter()
            .map(|(key, &probability)| {
                let (lo, hi) = parse_age_band(key)?;
                if !(0.0..=1.0).contains(&probability) {
                    return Err(InterventionError::ConfigurationError(format!(
                        "probability {probability} for age band `{key}` is not in [0, 1]"
                    )));
                }
                Ok((lo, hi, probability))
            })
            .collect::<Result<Vec<_>, InterventionError>>()?;
        parsed.sort_by_key(|&(lo, hi, _)| (lo, hi));

        let curve = (0..Self::MAX_AGE)
            .map(|age| {
                parsed
                    .iter()
                    .find(|&&(lo, hi, _)| lo <= age && age < hi)
                    .map_or(0.0, |&(_, _, probability)| probability)
            })
            .collect();
        Ok(AgeProbabilityCurve(curve))
    }

    /// Ages past the end of the curve have probability 0.
    #[must_use]
    pub fn probability(&self, age: u32) -> f64 {
        self.0.get(age as usize).copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

fn parse_age_band(key: &str) -> Result<(u32, u32), InterventionError> {
    let invalid =
        || InterventionError::ConfigurationError(format!("`{key}` is not an age band like `0-50`"));
    let (lo, hi) = key.split_once('-').ok_or_else(invalid)?;
    let lo = lo.trim().parse::<u32>().map_err(|_| invalid())?;
    let hi = hi.trim().parse::<u32>().map_err(|_| invalid())?;
    if lo > hi {
        return Err(invalid());
    }
    Ok((lo, hi))
}

/// The attendance probabilities of one leisure activity, split by sex.
pub trait LeisureDistributor {
    fn male_probabilities(&self) -> &AgeProbabilityCurve;
    fn female_probabilities(&self) -> &AgeProbabilityCurve;
    fn set_male_probabilities(&mut self, probabilities: AgeProbabilityCurve);
    fn set_female_probabilities(&mut self, probabilities: AgeProbabilityCurve);
}

#[derive(Clone, Debug, PartialEq)]
pub struct SexProbabilities {
    pub male: AgeProbabilityCurve,
    pub female: AgeProbabilityCurve,
}

impl LeisureDistributor for SexProbabilities {
    fn male_probabilities(&self) -> &AgeProbabilityCurve {
        &self.male
    }

    fn female_probabilities(&self) -> &AgeProbabilityCurve {
        &self.female
    }

    fn set_male_probabilities(&mut self, probabilities: AgeProbabilityCurve) {
        self.male = probabilities;
    }

    fn set_female_probabilities(&mut self, probabilities: AgeProbabilityCurve) {
        self.female = probabilities;
    }
}

/// The leisure model's activity → distributor table, e.g. `"pubs"`, `"cinemas"`.
pub trait LeisureTable {
    fn distributor(&self, activity: &str) -> Option<&dyn LeisureDistributor>;

    fn distributor_mut(&mut self, activity: &str) -> Option<&mut dyn LeisureDistributor>;

    fn contains_activity(&self, activity: &str) -> bool {
        self.distributor(activity).is_some()
    }
}

impl<D: LeisureDistributor, S: BuildHasher> LeisureTable for HashMap<String, D, S> {
    fn distributor(&self, activity: &str) -> Option<&dyn LeisureDistributor> {
        self.get(activity).map(|d| d as &dyn LeisureDistributor)
    }

    fn distributor_mut(&mut self, activity: &str) -> Option<&mut dyn LeisureDistributor> {
        self.get_mut(activity)
            .map(|d| d as &mut dyn LeisureDistributor)
    }
}

impl<D: LeisureDistributor> LeisureTable for BTreeMap<String, D> {
    fn distributor(&self, activity: &str) -> Option<&dyn LeisureDistributor> {
        self.get(activity).map(|d| d as &dyn LeisureDistributor)
    }

    fn distributor_mut(&mut self, activity: &str) -> Option<&mut dyn LeisureDistributor> {
        self.get_mut(activity)
            .map(|d| d as &mut dyn LeisureDistributor)
    }
}
