//! Colour sources for the initial fill and for refills.

use crate::grid::ColorId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Supplies the next bean colour. Injected into the board so fills are reproducible in tests.
pub trait ColorSource {
    /// Next colour in `0..palette_size`.
    fn next_color(&mut self, palette_size: u8) -> ColorId;
}

/// Uniform random colours from any `rand` generator.
#[derive(Debug, Clone)]
pub struct RandomColors<R> {
    rng: R,
}

impl<R: Rng> RandomColors<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomColors<StdRng> {
    /// Seeded generator when `seed` is given, entropy-seeded otherwise.
    pub fn from_seed(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self::new(rng)
    }
}

impl<R: Rng> ColorSource for RandomColors<R> {
    fn next_color(&mut self, palette_size: u8) -> ColorId {
        self.rng.gen_range(0..palette_size.max(1))
    }
}

/// Repeats a fixed colour sequence.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct ScriptedColors {
    seq: Vec<ColorId>,
    next: usize,
}

#[cfg(test)]
impl ScriptedColors {
    pub fn new(seq: Vec<ColorId>) -> Self {
        assert!(!seq.is_empty(), "scripted colour sequence must not be empty");
        Self { seq, next: 0 }
    }
}

#[cfg(test)]
impl ColorSource for ScriptedColors {
    fn next_color(&mut self, palette_size: u8) -> ColorId {
        let c = self.seq[self.next % self.seq.len()];
        self.next += 1;
        c % palette_size.max(1)
    }
}
