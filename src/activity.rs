use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// One of the things a person can do during a simulated day. Skip-activity policies remove
/// entries from the list of activities a person is about to do.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    MedicalFacility,
    Commute,
    PrimaryActivity,
    Leisure,
    Residence,
}

/// Returns `activities` without any entry found in `to_remove`, keeping the original order.
#[must_use]
pub fn remove_activities(activities: Vec<Activity>, to_remove: &[Activity]) -> Vec<Activity> {
    activities
        .into_iter()
        .filter(|activity| !to_remove.contains(activity))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn names_are_snake_case() {
        assert_eq!(Activity::PrimaryActivity.to_string(), "primary_activity");
        assert_eq!(
            Activity::from_str("medical_facility").unwrap(),
            Activity::MedicalFacility
        );
        let name: &'static str = Activity::Commute.into();
        assert_eq!(name, "commute");
        assert_eq!(Activity::iter().count(), 5);
    }

    #[test]
    fn removal_keeps_order() {
        let activities = vec![
            Activity::MedicalFacility,
            Activity::Commute,
            Activity::PrimaryActivity,
            Activity::Leisure,
            Activity::Residence,
        ];
        assert_eq!(
            remove_activities(activities, &[Activity::PrimaryActivity, Activity::Commute]),
            vec![
                Activity::MedicalFacility,
                Activity::Leisure,
                Activity::Residence
            ]
        );
        assert!(remove_activities(vec![], &[Activity::Commute]).is_empty());
    }
}
