//! Random source, bias and run configuration.

use crate::error::{Error, Result};
use rand::{RngCore, SeedableRng};
use std::fmt;

/// Splittable random source for deterministic generation.
///
/// Uses SplitMix64. Splitting derives an independent child stream from the
/// parent's own state, so composed generators never share a draw sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomSource {
    state: u64,
    gamma: u64,
}

impl RandomSource {
    /// Create a source from a single seed value.
    pub fn from_u64(seed: u64) -> Self {
        let state = splitmix64_mix(seed);
        let gamma = mix_gamma(state);
        RandomSource { state, gamma }
    }

    /// Create a source seeded from the thread-local entropy pool.
    pub fn random() -> Self {
        RandomSource::from_u64(random_seed())
    }

    /// Reset this source to a deterministic seed.
    pub fn reseed(&mut self, seed: u64) {
        *self = RandomSource::from_u64(seed);
    }

    /// Derive an independent child source, advancing this one.
    pub fn split(&mut self) -> RandomSource {
        self.state = self.state.wrapping_add(self.gamma);
        let output = splitmix64_mix(self.state);
        RandomSource {
            state: output,
            gamma: mix_gamma(output),
        }
    }

    /// Draw uniformly from the inclusive range `[min, max]`.
    ///
    /// Covers the whole `u64` domain without modulo bias. Arguments are
    /// swapped when given out of order.
    pub fn uniform(&mut self, min: u64, max: u64) -> u64 {
        use rand::Rng;
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        self.gen_range(lo..=hi)
    }
}

impl RngCore for RandomSource {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(self.gamma);
        splitmix64_mix(self.state)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for RandomSource {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        RandomSource::from_u64(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(seed: u64) -> Self {
        RandomSource::from_u64(seed)
    }
}

/// Draw a fresh seed from the thread-local entropy pool.
pub fn random_seed() -> u64 {
    use rand::Rng;
    rand::thread_rng().gen()
}

/// How much of a configured range a generator explores.
///
/// The explored fraction is `(size - scaling + 1) / size`, clamped to
/// `(0, 1]`. Integer ranges shrink toward their origin and length ranges
/// toward their minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bias {
    pub size: u64,
    pub scaling: u64,
}

impl Bias {
    pub fn new(size: u64, scaling: u64) -> Self {
        Bias { size, scaling }
    }

    /// A bias that explores the whole range.
    pub fn full() -> Self {
        Bias {
            size: 1,
            scaling: 1,
        }
    }

    /// Bias for iteration `index` (zero-based) of a run of `iterations`.
    pub fn for_iteration(index: usize, iterations: usize) -> Self {
        let size = iterations as u64;
        Bias::new(size, size.saturating_sub(index as u64))
    }

    /// The explored fraction of a range.
    pub fn fraction(&self) -> f64 {
        let (numerator, denominator) = self.ratio();
        numerator as f64 / denominator as f64
    }

    /// Scale a span (`max - min`) by the explored fraction.
    pub fn scale(&self, span: u64) -> u64 {
        let (numerator, denominator) = self.ratio();
        (span as u128 * numerator as u128 / denominator as u128) as u64
    }

    fn ratio(&self) -> (u64, u64) {
        if self.size == 0 {
            return (1, 1);
        }
        let scaling = self.scaling.clamp(1, self.size);
        (self.size - scaling + 1, self.size)
    }
}

impl Default for Bias {
    fn default() -> Self {
        Bias::full()
    }
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bias({}/{})", self.scaling, self.size)
    }
}

/// Configuration for property checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Number of iterations to run.
    pub test_limit: usize,

    /// Maximum number of shrink steps per failure.
    pub shrink_limit: usize,

    /// Seed for the run; a random seed is drawn when absent.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            test_limit: 100,
            shrink_limit: 10_000,
            seed: None,
        }
    }
}

impl Config {
    /// Set the number of iterations.
    pub fn with_tests(mut self, tests: usize) -> Self {
        self.test_limit = tests;
        self
    }

    /// Set the shrink step limit.
    pub fn with_shrinks(mut self, shrinks: usize) -> Self {
        self.shrink_limit = shrinks;
        self
    }

    /// Fix the seed so the run is reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Read `SHRIKE_TESTS`, `SHRIKE_SHRINKS` and `SHRIKE_SEED` on top of
    /// the defaults.
    pub fn from_env() -> Result<Self> {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::default();
        if let Some(tests) = parse_var(&lookup, "SHRIKE_TESTS")? {
            config.test_limit = tests as usize;
        }
        if let Some(shrinks) = parse_var(&lookup, "SHRIKE_SHRINKS")? {
            config.shrink_limit = shrinks as usize;
        }
        config.seed = parse_var(&lookup, "SHRIKE_SEED")?;
        Ok(config)
    }
}

fn parse_var(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<u64>().map(Some).map_err(|err| {
            Error::config(format!("{key}={raw:?} is not an unsigned integer: {err}"))
        }),
    }
}

/// SplitMix64 mixing function for high-quality output.
fn splitmix64_mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e3779b97f4a7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

/// Derive an odd gamma for a child stream.
fn mix_gamma(z: u64) -> u64 {
    (splitmix64_mix(z) | 1).wrapping_mul(0x9e3779b97f4a7c15) | 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = RandomSource::from_u64(7);
        let mut b = RandomSource::from_u64(7);
        for _ in 0..100 {
            assert_eq!(a.uniform(0, 1000), b.uniform(0, 1000));
        }
    }

    #[test]
    fn reseed_restarts_the_stream() {
        let mut source = RandomSource::from_u64(11);
        let first: Vec<u64> = (0..5).map(|_| source.next_u64()).collect();
        source.reseed(11);
        let again: Vec<u64> = (0..5).map(|_| source.next_u64()).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn split_streams_diverge() {
        let mut parent = RandomSource::from_u64(3);
        let mut left = parent.split();
        let mut right = parent.split();
        let l: Vec<u64> = (0..8).map(|_| left.next_u64()).collect();
        let r: Vec<u64> = (0..8).map(|_| right.next_u64()).collect();
        assert_ne!(l, r);
    }

    #[test]
    fn uniform_covers_extremes() {
        let mut source = RandomSource::from_u64(99);
        for _ in 0..10_000 {
            let v = source.uniform(3, 5);
            assert!((3..=5).contains(&v));
        }
        // The full domain must not panic or overflow.
        let _ = source.uniform(0, u64::MAX);
        assert_eq!(source.uniform(9, 9), 9);
    }

    #[test]
    fn bias_fraction_grows_with_iterations() {
        assert_eq!(Bias::for_iteration(0, 100).scale(1000), 10);
        assert_eq!(Bias::for_iteration(99, 100).scale(1000), 1000);
        assert_eq!(Bias::full().scale(u64::MAX), u64::MAX);
        assert_eq!(Bias::new(0, 0).fraction(), 1.0);
    }

    #[test]
    fn config_reads_environment_overrides() {
        let config = Config::from_lookup(|key| match key {
            "SHRIKE_TESTS" => Some("25".to_string()),
            "SHRIKE_SEED" => Some("1234".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.test_limit, 25);
        assert_eq!(config.seed, Some(1234));
        assert_eq!(config.shrink_limit, Config::default().shrink_limit);

        let err = Config::from_lookup(|key| (key == "SHRIKE_SHRINKS").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
