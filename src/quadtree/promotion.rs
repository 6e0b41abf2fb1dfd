use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::Error;
use crate::error::Result;

/// Probability of promoting a point one layer up, unless configured otherwise.
pub const DEFAULT_PROBABILITY: f64 = 0.5;

/// Decides whether a freshly inserted point climbs one more layer of the tower.
pub trait Promote {
    fn promote(&mut self) -> bool;
}

/// Accepts probabilities in `[0, 1]`.
pub(crate) fn check_probability(probability: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&probability) {
        return Err(Error::InvalidProbability(probability));
    }

    Ok(probability)
}

/// A biased coin backed by any [`Rng`]. Seed the rng to get reproducible towers.
#[derive(Debug, Clone)]
pub struct CoinFlip<R = StdRng> {
    probability: f64,
    rng: R,
}

impl<R: Rng> CoinFlip<R> {
    pub fn new(probability: f64, rng: R) -> Result<Self> {
        let probability = check_probability(probability)?;

        Ok(Self { probability, rng })
    }
}

impl CoinFlip<StdRng> {
    pub fn seeded(probability: f64, seed: u64) -> Result<Self> {
        Self::new(probability, StdRng::seed_from_u64(seed))
    }

    pub fn from_os_rng(probability: f64) -> Result<Self> {
        Self::new(probability, StdRng::from_os_rng())
    }
}

impl Default for CoinFlip<StdRng> {
    fn default() -> Self {
        Self {
            probability: DEFAULT_PROBABILITY,
            rng: StdRng::from_os_rng(),
        }
    }
}

impl<R: Rng> Promote for CoinFlip<R> {
    fn promote(&mut self) -> bool {
        self.rng.random_bool(self.probability)
    }
}

/// Promotion decided by a closure, see [`from_fn`].
#[derive(Debug, Clone)]
pub struct FromFn<F>(F);

/// Wraps a closure as a [`Promote`] source, e.g. to script the exact shape of a tower.
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: FnMut() -> bool,
{
    FromFn(f)
}

impl<F> Promote for FromFn<F>
where
    F: FnMut() -> bool,
{
    fn promote(&mut self) -> bool {
        (self.0)()
    }
}
