//! Deterministic random streams for the stochastic predicates.
//!
//! Every stochastic policy draws from its own named stream so that adding, say, a shielding
//! policy does not shift the draws a company closure sees. A stream is seeded with the base seed
//! plus a hash of its name and is created the first time it is used.
mod macros;

use std::any::{Any, TypeId};
use std::cell::{RefCell, RefMut};

pub use macros::define_rng;

use crate::rand::{Rng, SeedableRng};
use log::trace;
use rustc_hash::FxHashMap as HashMap;
use xxhash_rust::xxh3::xxh3_64;

pub trait RngId: Copy + Clone + 'static {
    type RngType: SeedableRng + Rng + 'static;
    fn get_name() -> &'static str;
}

/// A base seed and the lazily created streams keyed by their [`RngId`].
///
/// Streams sit behind a `RefCell` so that read-only queries (which only hold `&self`) can still
/// draw. The engine is evaluated on one thread; see [`crate::registry::Policies`].
pub struct RandomStreams {
    base_seed: u64,
    rngs: RefCell<HashMap<TypeId, Box<dyn Any>>>,
}

impl RandomStreams {
    #[must_use]
    pub fn new(base_seed: u64) -> RandomStreams {
        RandomStreams {
            base_seed,
            rngs: RefCell::new(HashMap::default()),
        }
    }

    #[must_use]
    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    /// Resets the base seed. Existing streams are dropped so they get re-seeded on next use.
    pub fn init_random(&mut self, base_seed: u64) {
        trace!("initializing random streams (seed={base_seed})");
        self.base_seed = base_seed;
        self.rngs.get_mut().clear();
    }

    fn get_rng<R: RngId>(&self) -> RefMut<'_, R::RngType> {
        let base_seed = self.base_seed;
        RefMut::map(self.rngs.borrow_mut(), |rngs| {
            let rng = rngs.entry(TypeId::of::<R>()).or_insert_with(|| {
                trace!("creating random stream {} (seed={base_seed})", R::get_name());
                let seed_offset = xxh3_64(R::get_name().as_bytes());
                Box::new(R::RngType::seed_from_u64(base_seed.wrapping_add(seed_offset)))
            });
            match rng.downcast_mut::<R::RngType>() {
                Some(rng) => rng,
                None => unreachable!("random stream stored under a foreign type id"),
            }
        })
    }

    /// Applies `sampler` to the stream identified by `R`.
    pub fn sample<R: RngId, T>(&self, _rng_id: R, sampler: impl FnOnce(&mut R::RngType) -> T) -> T {
        let mut rng = self.get_rng::<R>();
        sampler(&mut rng)
    }

    /// A uniform draw from `[0, 1)`.
    pub fn sample_unit<R: RngId>(&self, rng_id: R) -> f64 {
        self.sample(rng_id, |rng| rng.random::<f64>())
    }

    /// True with probability `p`. Probabilities outside `[0, 1]` are clamped.
    pub fn sample_bool<R: RngId>(&self, rng_id: R, p: f64) -> bool {
        let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
        self.sample(rng_id, |rng| rng.random_bool(p))
    }
}

impl Default for RandomStreams {
    fn default() -> Self {
        RandomStreams::new(0)
    }
}
