//! Policies: single time-windowed interventions.
//!
//! A [`Policy`] pairs a [`PolicyWindow`] with a [`PolicyKind`], the closed set of intervention
//! families:
//!
//! * [`SkipActivity`] policies remove activities from a person's day (school, university and
//!   company closures).
//! * [`StayHome`] policies decide whether a person must stay home (the permanent
//!   stay-home-if-severe baseline, quarantine, shielding).
//! * [`SocialDistancing`] and [`ChangeLeisureProbability`] mutate a table owned by another model
//!   while they are in force and restore it afterwards.
//! * [`CloseLeisureVenue`] names venue types that are shut.
//!
//! Predicate policies hold no state between calls. Stateful policies carry an
//! [`ActivationRecord`] with the values they overwrote, present only while the mutation is
//! applied.

mod close_venue;
mod leisure_probability;
mod skip_activity;
mod social_distancing;
mod stay_home;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::InterventionError;
use crate::window::{PolicyWindow, WindowEnd};

pub use close_venue::CloseLeisureVenue;
pub use leisure_probability::ChangeLeisureProbability;
pub(crate) use leisure_probability::set_probabilities;
pub use skip_activity::{CloseCompanies, CloseSchools, CloseUniversities, SkipActivity};
pub use social_distancing::SocialDistancing;
pub use stay_home::{PermanentPolicy, Quarantine, Shielding, StayHome};
#[cfg(test)]
pub(crate) use stay_home::ShieldingRng;

/// The behavioral categories policies are grouped and queried by.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum PolicyFamily {
    SkipActivity,
    StayHome,
    SocialDistancing,
    ChangeLeisureProbability,
    CloseLeisureVenue,
}

/// Every concrete policy. The snake_case name is both the policy's `spec` and the family
/// identifier used in parameter records.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum PolicyVariant {
    CloseSchools,
    CloseUniversities,
    CloseCompanies,
    PermanentPolicy,
    Quarantine,
    Shielding,
    SocialDistancing,
    ChangeLeisureProbability,
    CloseLeisureVenue,
}

impl PolicyVariant {
    #[must_use]
    pub fn family(self) -> PolicyFamily {
        match self {
            PolicyVariant::CloseSchools
            | PolicyVariant::CloseUniversities
            | PolicyVariant::CloseCompanies => PolicyFamily::SkipActivity,
            PolicyVariant::PermanentPolicy
            | PolicyVariant::Quarantine
            | PolicyVariant::Shielding => PolicyFamily::StayHome,
            PolicyVariant::SocialDistancing => PolicyFamily::SocialDistancing,
            PolicyVariant::ChangeLeisureProbability => PolicyFamily::ChangeLeisureProbability,
            PolicyVariant::CloseLeisureVenue => PolicyFamily::CloseLeisureVenue,
        }
    }

    /// Leisure probability changes stay in force on their end date.
    #[must_use]
    pub fn window_end(self) -> WindowEnd {
        match self {
            PolicyVariant::ChangeLeisureProbability => WindowEnd::Inclusive,
            _ => WindowEnd::Exclusive,
        }
    }

    #[must_use]
    pub fn spec(self) -> &'static str {
        self.into()
    }
}

pub enum PolicyKind {
    SkipActivity(SkipActivity),
    StayHome(StayHome),
    SocialDistancing(SocialDistancing),
    ChangeLeisureProbability(ChangeLeisureProbability),
    CloseLeisureVenue(CloseLeisureVenue),
}

impl PolicyKind {
    #[must_use]
    pub fn variant(&self) -> PolicyVariant {
        match self {
            PolicyKind::SkipActivity(policy) => policy.variant(),
            PolicyKind::StayHome(policy) => policy.variant(),
            PolicyKind::SocialDistancing(_) => PolicyVariant::SocialDistancing,
            PolicyKind::ChangeLeisureProbability(_) => PolicyVariant::ChangeLeisureProbability,
            PolicyKind::CloseLeisureVenue(_) => PolicyVariant::CloseLeisureVenue,
        }
    }
}

macro_rules! impl_into_policy_kind {
    ($($policy:ty => |$arg:ident| $kind:expr),+ $(,)?) => {
        $(
            impl From<$policy> for PolicyKind {
                fn from($arg: $policy) -> Self {
                    $kind
                }
            }
        )+
    };
}

impl_into_policy_kind!(
    CloseSchools => |policy| PolicyKind::SkipActivity(SkipActivity::CloseSchools(policy)),
    CloseUniversities => |policy| PolicyKind::SkipActivity(SkipActivity::CloseUniversities(policy)),
    CloseCompanies => |policy| PolicyKind::SkipActivity(SkipActivity::CloseCompanies(policy)),
    PermanentPolicy => |policy| PolicyKind::StayHome(StayHome::Permanent(policy)),
    Quarantine => |policy| PolicyKind::StayHome(StayHome::Quarantine(policy)),
    Shielding => |policy| PolicyKind::StayHome(StayHome::Shielding(policy)),
    SocialDistancing => |policy| PolicyKind::SocialDistancing(policy),
    ChangeLeisureProbability => |policy| PolicyKind::ChangeLeisureProbability(policy),
    CloseLeisureVenue => |policy| PolicyKind::CloseLeisureVenue(policy),
);

/// The values a stateful policy overwrote, kept from activation until restoration.
#[derive(Clone, Debug, PartialEq)]
pub struct ActivationRecord<T> {
    pub activated_on: NaiveDate,
    pub original: T,
}

/// A single named intervention and the dates it applies on.
pub struct Policy {
    spec: &'static str,
    window: PolicyWindow,
    kind: PolicyKind,
}

impl Policy {
    /// The window's end is made inclusive for the variants that use a closed interval.
    pub fn new(window: PolicyWindow, kind: impl Into<PolicyKind>) -> Policy {
        let kind = kind.into();
        let variant = kind.variant();
        if window.with_end(variant.window_end()).is_empty() {
            log::warn!(
                "{} policy window {} .. {} is empty and will never activate",
                variant,
                window.start(),
                window.end()
            );
        }
        Policy {
            spec: variant.spec(),
            window: window.with_end(variant.window_end()),
            kind,
        }
    }

    /// The baseline every registry starts with: severely symptomatic people stay home, always.
    #[must_use]
    pub fn baseline() -> Policy {
        Policy::new(PolicyWindow::unbounded(), PermanentPolicy)
    }

    #[must_use]
    pub fn is_active(&self, date: NaiveDate) -> bool {
        self.window.is_active(date)
    }

    /// The stable lowercase identifier of this policy's variant, e.g. `"close_schools"`.
    #[must_use]
    pub fn spec(&self) -> &'static str {
        self.spec
    }

    #[must_use]
    pub fn variant(&self) -> PolicyVariant {
        self.kind.variant()
    }

    #[must_use]
    pub fn family(&self) -> PolicyFamily {
        self.variant().family()
    }

    #[must_use]
    pub fn window(&self) -> PolicyWindow {
        self.window
    }

    #[must_use]
    pub fn start_time(&self) -> NaiveDate {
        self.window.start()
    }

    #[must_use]
    pub fn end_time(&self) -> NaiveDate {
        self.window.end()
    }

    #[must_use]
    pub fn kind(&self) -> &PolicyKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut PolicyKind {
        &mut self.kind
    }

    #[must_use]
    pub fn as_skip_activity(&self) -> Option<&SkipActivity> {
        match &self.kind {
            PolicyKind::SkipActivity(policy) => Some(policy),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_stay_home(&self) -> Option<&StayHome> {
        match &self.kind {
            PolicyKind::StayHome(policy) => Some(policy),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_social_distancing(&self) -> Option<&SocialDistancing> {
        match &self.kind {
            PolicyKind::SocialDistancing(policy) => Some(policy),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_change_leisure_probability(&self) -> Option<&ChangeLeisureProbability> {
        match &self.kind {
            PolicyKind::ChangeLeisureProbability(policy) => Some(policy),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_close_leisure_venue(&self) -> Option<&CloseLeisureVenue> {
        match &self.kind {
            PolicyKind::CloseLeisureVenue(policy) => Some(policy),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Policy")
            .field("spec", &self.spec)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

/// Deserializes a variant's typed parameters out of a record's parameter map.
pub(crate) fn parse_parameters<T: for<'de> Deserialize<'de>>(
    parameters: &Map<String, Value>,
) -> Result<T, InterventionError> {
    Ok(serde_json::from_value(Value::Object(parameters.clone()))?)
}

/// Keeps a present `null` as `Some(Value::Null)` so that only an absent field falls back to a
/// default. Use with `#[serde(default)]`.
pub(crate) fn present_value<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// Reads the window of a variant whose record must name both dates.
pub(crate) fn required_window(
    variant: PolicyVariant,
    start_time: Option<&Value>,
    end_time: Option<&Value>,
) -> Result<PolicyWindow, InterventionError> {
    match (start_time, end_time) {
        (Some(start), Some(end)) => PolicyWindow::from_values(start, end),
        _ => Err(InterventionError::ConfigurationError(format!(
            "{variant} requires both start_time and end_time"
        ))),
    }
}

/// Reads the window of a variant that defaults to 1900-01-01 .. 2100-01-01.
pub(crate) fn optional_window(
    start_time: Option<&Value>,
    end_time: Option<&Value>,
) -> Result<PolicyWindow, InterventionError> {
    let default = PolicyWindow::unbounded();
    let start = start_time.map_or(Ok(default.start()), crate::window::read_date)?;
    let end = end_time.map_or(Ok(default.end()), crate::window::read_date)?;
    Ok(PolicyWindow::new(start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn spec_names() {
        let names: Vec<&str> = PolicyVariant::iter().map(PolicyVariant::spec).collect();
        assert_eq!(
            names,
            vec![
                "close_schools",
                "close_universities",
                "close_companies",
                "permanent_policy",
                "quarantine",
                "shielding",
                "social_distancing",
                "change_leisure_probability",
                "close_leisure_venue",
            ]
        );
        for variant in PolicyVariant::iter() {
            assert_eq!(PolicyVariant::from_str(variant.spec()).unwrap(), variant);
        }
    }

    #[test]
    fn baseline_is_permanent_and_always_active() {
        let policy = Policy::baseline();
        assert_eq!(policy.spec(), "permanent_policy");
        assert_eq!(policy.family(), PolicyFamily::StayHome);
        assert!(policy.is_active(date(2020, 3, 1)));
        assert!(policy.is_active(date(1900, 1, 1)));
        assert!(!policy.is_active(date(2100, 1, 1)));
        assert!(policy.as_stay_home().is_some());
        assert!(policy.as_skip_activity().is_none());
    }

    #[test]
    fn leisure_probability_window_is_closed() {
        let window = PolicyWindow::new(date(2020, 3, 10), date(2020, 3, 20));
        let policy = Policy::new(window, ChangeLeisureProbability::default());
        assert!(policy.is_active(date(2020, 3, 20)));
        assert!(!policy.is_active(date(2020, 3, 21)));

        let policy = Policy::new(window, CloseUniversities);
        assert!(!policy.is_active(date(2020, 3, 20)));
    }

    #[test]
    fn every_variant_belongs_to_its_family() {
        assert_eq!(PolicyVariant::CloseCompanies.family(), PolicyFamily::SkipActivity);
        assert_eq!(PolicyVariant::Shielding.family(), PolicyFamily::StayHome);
        assert_eq!(
            PolicyVariant::CloseLeisureVenue.family(),
            PolicyFamily::CloseLeisureVenue
        );
        assert_eq!(
            Policy::new(PolicyWindow::unbounded(), Quarantine::default()).variant(),
            PolicyVariant::Quarantine
        );
    }

    #[test]
    fn windows_from_values() {
        let start = Value::String("2020-03-10".to_string());
        let end = Value::String("2020-03-20".to_string());
        let window =
            required_window(PolicyVariant::CloseSchools, Some(&start), Some(&end)).unwrap();
        assert_eq!(window.start(), date(2020, 3, 10));

        let error = required_window(PolicyVariant::CloseSchools, Some(&start), None).unwrap_err();
        assert!(matches!(error, InterventionError::ConfigurationError(_)));

        let window = optional_window(None, Some(&end)).unwrap();
        assert_eq!(window.start(), date(1900, 1, 1));
        assert_eq!(window.end(), date(2020, 3, 20));
    }
}
