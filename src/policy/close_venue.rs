use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::InterventionError;
use crate::policy::{optional_window, parse_parameters, Policy};

const DEFAULT_VENUES_TO_CLOSE: [&str; 2] = ["cinemas", "groceries"];

/// Shuts every leisure venue of the listed types.
#[derive(Clone, Debug, PartialEq)]
pub struct CloseLeisureVenue {
    pub venues_to_close: BTreeSet<String>,
}

impl Default for CloseLeisureVenue {
    fn default() -> Self {
        CloseLeisureVenue::new(DEFAULT_VENUES_TO_CLOSE)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CloseLeisureVenueParameters {
    #[serde(default, deserialize_with = "crate::policy::present_value")]
    start_time: Option<Value>,
    #[serde(default, deserialize_with = "crate::policy::present_value")]
    end_time: Option<Value>,
    venues_to_close: Option<BTreeSet<String>>,
}

impl CloseLeisureVenue {
    pub fn new<S: Into<String>>(venues_to_close: impl IntoIterator<Item = S>) -> CloseLeisureVenue {
        CloseLeisureVenue {
            venues_to_close: venues_to_close.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_parameters(parameters: &Map<String, Value>) -> Result<Policy, InterventionError> {
        let parameters: CloseLeisureVenueParameters = parse_parameters(parameters)?;
        let window = optional_window(parameters.start_time.as_ref(), parameters.end_time.as_ref())?;
        let policy = match parameters.venues_to_close {
            Some(venues_to_close) => CloseLeisureVenue { venues_to_close },
            None => CloseLeisureVenue::default(),
        };
        Ok(Policy::new(window, policy))
    }
}
