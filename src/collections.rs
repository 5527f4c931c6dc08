//! Per-day batches of active policies of one family, queried once per person.
//!
//! Collections are built fresh for each date by [`Policies`](crate::registry::Policies) and
//! borrow the registry; they never outlive the day they were built for.

use log::trace;

use crate::activity::Activity;
use crate::person::Person;
use crate::policy::Policy;
use crate::random::RandomStreams;

/// The skip-activity policies in force on one date.
pub struct SkipActivityCollection<'a> {
    policies: Vec<&'a Policy>,
    random: &'a RandomStreams,
}

impl<'a> SkipActivityCollection<'a> {
    /// Members that are not skip-activity policies are ignored.
    pub fn new(policies: Vec<&'a Policy>, random: &'a RandomStreams) -> SkipActivityCollection<'a> {
        SkipActivityCollection {
            policies: policies
                .into_iter()
                .filter(|policy| policy.as_skip_activity().is_some())
                .collect(),
            random,
        }
    }

    #[must_use]
    pub fn policies(&self) -> &[&'a Policy] {
        &self.policies
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Filters out the activities `person` may not do today. Each policy, in registration order,
    /// sees only what the previous ones left.
    pub fn apply<P: Person + ?Sized>(
        &self,
        person: &P,
        activities: Vec<Activity>,
    ) -> Vec<Activity> {
        self.policies
            .iter()
            .filter_map(|policy| policy.as_skip_activity().map(|kind| (policy.spec(), kind)))
            .fold(activities, |activities, (spec, policy)| {
                let remaining = policy.skip_activity(person, activities, self.random);
                trace!("{spec}: {} activities left", remaining.len());
                remaining
            })
    }
}

/// The stay-home policies in force on one date.
pub struct StayHomeCollection<'a> {
    policies: Vec<&'a Policy>,
    random: &'a RandomStreams,
}

impl<'a> StayHomeCollection<'a> {
    /// Members that are not stay-home policies are ignored.
    pub fn new(policies: Vec<&'a Policy>, random: &'a RandomStreams) -> StayHomeCollection<'a> {
        StayHomeCollection {
            policies: policies
                .into_iter()
                .filter(|policy| policy.as_stay_home().is_some())
                .collect(),
            random,
        }
    }

    #[must_use]
    pub fn policies(&self) -> &[&'a Policy] {
        &self.policies
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// True as soon as one policy keeps `person` home. People in hospital never stay home and
    /// are not evaluated at all.
    pub fn must_stay_home<P: Person + ?Sized>(&self, person: &P, days_from_start: f64) -> bool {
        if person.in_hospital() {
            return false;
        }
        self.policies
            .iter()
            .filter_map(|policy| policy.as_stay_home().map(|kind| (policy.spec(), kind)))
            .any(|(spec, policy)| {
                let stays = policy.must_stay_home(person, days_from_start, self.random);
                if stays {
                    trace!("{spec}: must stay home on day {days_from_start}");
                }
                stays
            })
    }
}
