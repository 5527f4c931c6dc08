//! The registry of every policy a simulation runs with, and the daily query surface over it.
//!
//! The step loop asks [`Policies`] once per simulated day for:
//!
//! * the table mutations of the stateful families, through
//!   [`Policies::apply_social_distancing_policy`] and
//!   [`Policies::apply_change_probabilities_leisure`] (or both at once with
//!   [`Policies::apply_stateful_policies`]), before any person is evaluated;
//! * the per-person collections, through [`Policies::skip_activity_collection`] and
//!   [`Policies::stay_home_collection`];
//! * the venue types shut that day, through [`Policies::find_closed_venues`].
//!
//! [`Policies::day`] bundles the read-only parts for one date.
//!
//! Stateful policies apply their mutation while the date is in `[start, end)`. Each applier
//! first restores every policy that is applied but out of its window, then activates every
//! policy that is in its window but not yet applied, so a policy ending on a date is always
//! undone before one starting on that date reads the table.
//!
//! Policies of one family may overlap on the same key and end in any order. When one ends, the
//! value it recorded is handed to the policies activated after it that still hold the key, and
//! the table is set to what those policies now make of it. Once all of them have ended the key
//! reads its pre-activation value again.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use log::{debug, trace};

use crate::collections::{SkipActivityCollection, StayHomeCollection};
use crate::error::InterventionError;
use crate::interaction::InteractionCoefficients;
use crate::leisure::LeisureTable;
use crate::policy::{
    set_probabilities, ChangeLeisureProbability, Policy, PolicyFamily, PolicyKind,
    SocialDistancing,
};
use crate::random::RandomStreams;
use crate::records::{PolicyConstructors, PolicyRecord};

pub struct Policies {
    policies: Vec<Policy>,
    random: RandomStreams,
    /// Indices of the applied stateful policies, oldest activation first.
    activation_order: Vec<usize>,
}

impl Policies {
    /// Registers `policies` in order, after the always-on [`Policy::baseline`].
    #[must_use]
    pub fn new(policies: Vec<Policy>) -> Policies {
        let mut all = Vec::with_capacity(policies.len() + 1);
        all.push(Policy::baseline());
        all.extend(policies);
        trace!("registered {} policies", all.len());
        Policies {
            policies: all,
            random: RandomStreams::default(),
            activation_order: Vec::new(),
        }
    }

    /// Builds every record with the standard constructors.
    pub fn from_records(records: &[PolicyRecord]) -> Result<Policies, InterventionError> {
        Policies::from_records_with(records, &PolicyConstructors::standard())
    }

    pub fn from_records_with(
        records: &[PolicyRecord],
        constructors: &PolicyConstructors,
    ) -> Result<Policies, InterventionError> {
        Ok(Policies::new(constructors.build_all(records)?))
    }

    /// Reseeds the random streams used by stochastic policies. Streams already drawn from are
    /// discarded.
    pub fn init_random(&mut self, seed: u64) {
        trace!("initializing policy random streams with seed {seed}");
        self.random.init_random(seed);
    }

    #[must_use]
    pub fn random(&self) -> &RandomStreams {
        &self.random
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Never true for a registry built with [`Policies::new`], which always holds the baseline.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Policy> {
        self.policies.iter()
    }

    /// Policies of `family` active on `date`, in registration order.
    #[must_use]
    pub fn get_active_policies_for_type(
        &self,
        family: PolicyFamily,
        date: NaiveDate,
    ) -> Vec<&Policy> {
        self.policies
            .iter()
            .filter(|policy| policy.family() == family && policy.is_active(date))
            .collect()
    }

    #[must_use]
    pub fn skip_activity_collection(&self, date: NaiveDate) -> SkipActivityCollection<'_> {
        SkipActivityCollection::new(
            self.get_active_policies_for_type(PolicyFamily::SkipActivity, date),
            &self.random,
        )
    }

    #[must_use]
    pub fn stay_home_collection(&self, date: NaiveDate) -> StayHomeCollection<'_> {
        StayHomeCollection::new(
            self.get_active_policies_for_type(PolicyFamily::StayHome, date),
            &self.random,
        )
    }

    #[must_use]
    pub fn social_distancing_policies(&self, date: NaiveDate) -> Vec<&Policy> {
        self.get_active_policies_for_type(PolicyFamily::SocialDistancing, date)
    }

    #[must_use]
    pub fn change_leisure_probabilities_policies(&self, date: NaiveDate) -> Vec<&Policy> {
        self.get_active_policies_for_type(PolicyFamily::ChangeLeisureProbability, date)
    }

    #[must_use]
    pub fn close_venues_policies(&self, date: NaiveDate) -> Vec<&Policy> {
        self.get_active_policies_for_type(PolicyFamily::CloseLeisureVenue, date)
    }

    /// Scales or restores interaction coefficients for `date`.
    ///
    /// Fails with [`InterventionError::PolicyError`] at the first policy naming an interaction
    /// type `interaction` does not have. That policy leaves the table untouched; policies handled
    /// before it in the same call stay applied.
    pub fn apply_social_distancing_policy<I: InteractionCoefficients + ?Sized>(
        &mut self,
        date: NaiveDate,
        interaction: &mut I,
    ) -> Result<(), InterventionError> {
        for index in 0..self.policies.len() {
            let window = self.policies[index].window();
            let Some(social_distancing) = self.social_distancing_mut(index) else {
                continue;
            };
            if !social_distancing.is_applied() || window.is_mutating(date) {
                continue;
            }
            debug!("{date}: restoring social_distancing ending {}", window.end());
            let original = social_distancing.deactivate(interaction)?;
            let later = self.remove_from_activation_order(index);
            for (interaction_type, mut beta) in original {
                for &other in &later {
                    if let Some(scaled) = self
                        .social_distancing_mut(other)
                        .and_then(|other| other.hand_down(&interaction_type, beta))
                    {
                        beta = scaled;
                    }
                }
                debug!("social_distancing: {interaction_type} beta restored to {beta}");
                interaction.set_beta(&interaction_type, beta);
            }
        }
        for index in 0..self.policies.len() {
            let window = self.policies[index].window();
            let Some(social_distancing) = self.social_distancing_mut(index) else {
                continue;
            };
            if !social_distancing.is_applied() && window.is_mutating(date) {
                debug!("{date}: activating social_distancing starting {}", window.start());
                social_distancing.activate(date, interaction)?;
                self.activation_order.push(index);
            }
        }
        Ok(())
    }

    /// Swaps or restores leisure probability curves for `date`.
    ///
    /// Fails with [`InterventionError::PolicyError`] at the first policy naming an activity
    /// `leisure` does not have. That policy leaves the table untouched; policies handled before
    /// it in the same call stay applied.
    pub fn apply_change_probabilities_leisure<L: LeisureTable + ?Sized>(
        &mut self,
        date: NaiveDate,
        leisure: &mut L,
    ) -> Result<(), InterventionError> {
        for index in 0..self.policies.len() {
            let window = self.policies[index].window();
            let Some(change) = self.leisure_change_mut(index) else {
                continue;
            };
            if !change.is_applied() || window.is_mutating(date) {
                continue;
            }
            debug!("{date}: restoring change_leisure_probability ending {}", window.end());
            let original = change.deactivate(leisure)?;
            let later = self.remove_from_activation_order(index);
            for (activity, mut probabilities) in original {
                for &other in &later {
                    let handed = probabilities.clone();
                    if let Some(current) = self
                        .leisure_change_mut(other)
                        .and_then(|other| other.hand_down(&activity, handed))
                    {
                        probabilities = current;
                    }
                }
                set_probabilities(leisure, &activity, probabilities);
            }
        }
        for index in 0..self.policies.len() {
            let window = self.policies[index].window();
            let Some(change) = self.leisure_change_mut(index) else {
                continue;
            };
            if !change.is_applied() && window.is_mutating(date) {
                debug!(
                    "{date}: activating change_leisure_probability starting {}",
                    window.start()
                );
                change.activate(date, leisure)?;
                self.activation_order.push(index);
            }
        }
        Ok(())
    }

    fn social_distancing_mut(&mut self, index: usize) -> Option<&mut SocialDistancing> {
        match self.policies.get_mut(index)?.kind_mut() {
            PolicyKind::SocialDistancing(social_distancing) => Some(social_distancing),
            _ => None,
        }
    }

    fn leisure_change_mut(&mut self, index: usize) -> Option<&mut ChangeLeisureProbability> {
        match self.policies.get_mut(index)?.kind_mut() {
            PolicyKind::ChangeLeisureProbability(change) => Some(change),
            _ => None,
        }
    }

    /// Drops `index` from the activation order, returning the policies activated after it.
    fn remove_from_activation_order(&mut self, index: usize) -> Vec<usize> {
        match self.activation_order.iter().position(|&i| i == index) {
            Some(position) => {
                let later = self.activation_order[position + 1..].to_vec();
                self.activation_order.remove(position);
                later
            }
            None => Vec::new(),
        }
    }

    /// Runs both stateful appliers for `date`, interaction coefficients first.
    pub fn apply_stateful_policies<I, L>(
        &mut self,
        date: NaiveDate,
        interaction: &mut I,
        leisure: &mut L,
    ) -> Result<(), InterventionError>
    where
        I: InteractionCoefficients + ?Sized,
        L: LeisureTable + ?Sized,
    {
        self.apply_social_distancing_policy(date, interaction)?;
        self.apply_change_probabilities_leisure(date, leisure)
    }

    /// Union of the venue types closed by every venue-closure policy active on `date`.
    #[must_use]
    pub fn find_closed_venues(&self, date: NaiveDate) -> BTreeSet<String> {
        self.close_venues_policies(date)
            .into_iter()
            .filter_map(Policy::as_close_leisure_venue)
            .flat_map(|policy| policy.venues_to_close.iter().cloned())
            .collect()
    }

    /// Everything the per-person loop reads on `date`. Apply the stateful policies first.
    #[must_use]
    pub fn day(&self, date: NaiveDate) -> PolicyDay<'_> {
        PolicyDay {
            date,
            skip_activity: self.skip_activity_collection(date),
            stay_home: self.stay_home_collection(date),
            closed_venues: self.find_closed_venues(date),
        }
    }
}

impl Default for Policies {
    fn default() -> Self {
        Policies::new(Vec::new())
    }
}

impl std::fmt::Debug for Policies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Policies")
            .field("policies", &self.policies)
            .field("base_seed", &self.random.base_seed())
            .finish()
    }
}

/// The read-only policy view of one simulated day.
pub struct PolicyDay<'a> {
    pub date: NaiveDate,
    pub skip_activity: SkipActivityCollection<'a>,
    pub stay_home: StayHomeCollection<'a>,
    pub closed_venues: BTreeSet<String>,
}

impl PolicyDay<'_> {
    #[must_use]
    pub fn is_venue_closed(&self, venue_type: &str) -> bool {
        self.closed_venues.contains(venue_type)
    }
}
