//! Turning pre-parsed parameter records into policies.
//!
//! A [`PolicyRecord`] names a family identifier (`"close_schools"`, `"quarantine"`, ...) and
//! carries that policy's parameters. [`PolicyConstructors`] maps each identifier to the
//! function that validates the parameters and builds the policy. Unknown identifiers and
//! malformed parameters are reported as configuration errors when the registry is built, never
//! later.

use log::trace;
use rustc_hash::FxHashMap as HashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::IntoEnumIterator;

use crate::error::InterventionError;
use crate::policy::{
    ChangeLeisureProbability, CloseCompanies, CloseLeisureVenue, CloseSchools, CloseUniversities,
    PermanentPolicy, Policy, PolicyVariant, Quarantine, Shielding, SocialDistancing,
};

/// One policy's parameters, as produced by whatever loaded the configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub family: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl PolicyRecord {
    /// `parameters` must be a JSON object.
    pub fn new(family: &str, parameters: Value) -> Result<PolicyRecord, InterventionError> {
        match parameters {
            Value::Object(parameters) => Ok(PolicyRecord {
                family: family.to_string(),
                parameters,
            }),
            other => Err(InterventionError::ConfigurationError(format!(
                "parameters of a {family} policy must be a mapping, got `{other}`"
            ))),
        }
    }
}

pub type PolicyConstructor = fn(&Map<String, Value>) -> Result<Policy, InterventionError>;

/// Family identifier → constructor.
#[derive(Clone)]
pub struct PolicyConstructors {
    constructors: HashMap<String, PolicyConstructor>,
}

impl PolicyConstructors {
    /// An empty table.
    #[must_use]
    pub fn new() -> PolicyConstructors {
        PolicyConstructors {
            constructors: HashMap::default(),
        }
    }

    /// A table with a constructor for every [`PolicyVariant`].
    #[must_use]
    pub fn standard() -> PolicyConstructors {
        let mut constructors = PolicyConstructors::new();
        for variant in PolicyVariant::iter() {
            constructors.register(variant.spec(), standard_constructor(variant));
        }
        constructors
    }

    /// Adds or replaces the constructor for `identifier`, returning the one it replaced.
    pub fn register(
        &mut self,
        identifier: &str,
        constructor: PolicyConstructor,
    ) -> Option<PolicyConstructor> {
        self.constructors
            .insert(normalize_identifier(identifier), constructor)
    }

    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        self.constructors
            .contains_key(&normalize_identifier(identifier))
    }

    pub fn build(&self, record: &PolicyRecord) -> Result<Policy, InterventionError> {
        let identifier = normalize_identifier(&record.family);
        let Some(constructor) = self.constructors.get(&identifier) else {
            return Err(InterventionError::ConfigurationError(format!(
                "unknown policy family `{}`",
                record.family
            )));
        };
        trace!("building {identifier} policy");
        constructor(&record.parameters)
    }

    /// Builds every record in order, stopping at the first failure.
    pub fn build_all(&self, records: &[PolicyRecord]) -> Result<Vec<Policy>, InterventionError> {
        records.iter().map(|record| self.build(record)).collect()
    }
}

impl Default for PolicyConstructors {
    fn default() -> Self {
        PolicyConstructors::standard()
    }
}

fn standard_constructor(variant: PolicyVariant) -> PolicyConstructor {
    match variant {
        PolicyVariant::CloseSchools => CloseSchools::from_parameters,
        PolicyVariant::CloseUniversities => CloseUniversities::from_parameters,
        PolicyVariant::CloseCompanies => CloseCompanies::from_parameters,
        PolicyVariant::PermanentPolicy => PermanentPolicy::from_parameters,
        PolicyVariant::Quarantine => Quarantine::from_parameters,
        PolicyVariant::Shielding => Shielding::from_parameters,
        PolicyVariant::SocialDistancing => SocialDistancing::from_parameters,
        PolicyVariant::ChangeLeisureProbability => ChangeLeisureProbability::from_parameters,
        PolicyVariant::CloseLeisureVenue => CloseLeisureVenue::from_parameters,
    }
}

/// Family identifiers are snake_case; `CloseSchools` is accepted as `close_schools`.
fn normalize_identifier(identifier: &str) -> String {
    let mut normalized = String::with_capacity(identifier.len() + 4);
    for (i, c) in identifier.trim().chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 && !normalized.ends_with('_') {
                normalized.push('_');
            }
            normalized.push(c.to_ascii_lowercase());
        } else {
            normalized.push(c);
        }
    }
    normalized
}

/// A family maps to one parameter set unless every value is itself a named parameter set.
fn is_single_parameter_set(parameters: &Map<String, Value>) -> bool {
    parameters.is_empty()
        || parameters.contains_key("start_time")
        || parameters.contains_key("end_time")
        || parameters.values().any(|value| !value.is_object())
}

/// Flattens a grouped configuration into records, in configuration order.
///
/// Each entry maps a family identifier either to one parameter set or to named parameter sets
/// for several policies of that family. An entry is read as named sets only when all of its
/// values are mappings and it has no `start_time` or `end_time` of its own:
///
/// ```json
/// {
///     "quarantine": {"start_time": "2020-03-16", "end_time": "2020-07-01", "n_days": 7},
///     "close_leisure_venue": {
///         "lockdown": {"start_time": "2020-03-21", "end_time": "2020-07-04",
///                      "venues_to_close": ["pubs", "cinemas"]},
///         "second_wave": {"start_time": "2020-11-05", "end_time": "2020-12-02",
///                         "venues_to_close": ["pubs"]}
///     }
/// }
/// ```
///
/// Every named parameter set must carry both `start_time` and `end_time`.
pub fn records_from_config(config: &Value) -> Result<Vec<PolicyRecord>, InterventionError> {
    let Value::Object(config) = config else {
        return Err(InterventionError::ConfigurationError(
            "policy configuration must be a mapping of policy families".to_string(),
        ));
    };
    let mut records = Vec::new();
    for (family, data) in config {
        let Value::Object(parameters) = data else {
            return Err(InterventionError::ConfigurationError(format!(
                "parameters of `{family}` must be a mapping"
            )));
        };
        if is_single_parameter_set(parameters) {
            records.push(PolicyRecord::new(family, data.clone())?);
            continue;
        }
        for (name, instance) in parameters {
            let has_window = instance
                .as_object()
                .is_some_and(|p| p.contains_key("start_time") && p.contains_key("end_time"));
            if !has_window {
                return Err(InterventionError::ConfigurationError(format!(
                    "`{family}.{name}` is missing start_time or end_time"
                )));
            }
            records.push(PolicyRecord::new(family, instance.clone())?);
        }
    }
    Ok(records)
}
