use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

/// The interaction model's per-interaction-type transmission coefficients ("betas"),
/// e.g. `"household"`, `"school"`, `"pub"`.
pub trait InteractionCoefficients {
    fn beta(&self, interaction_type: &str) -> Option<f64>;

    fn set_beta(&mut self, interaction_type: &str, value: f64);
}

impl<S: BuildHasher> InteractionCoefficients for HashMap<String, f64, S> {
    fn beta(&self, interaction_type: &str) -> Option<f64> {
        self.get(interaction_type).copied()
    }

    fn set_beta(&mut self, interaction_type: &str, value: f64) {
        self.insert(interaction_type.to_string(), value);
    }
}

impl InteractionCoefficients for BTreeMap<String, f64> {
    fn beta(&self, interaction_type: &str) -> Option<f64> {
        self.get(interaction_type).copied()
    }

    fn set_beta(&mut self, interaction_type: &str, value: f64) {
        self.insert(interaction_type.to_string(), value);
    }
}
