//! Deterministic random number generation for synthetic populations.
//!
//! RULE: the scoring and simulation path never draws randomness. Only
//! the synthetic population generator does, and only through SeededRng
//! instances derived from one master seed.
//!
//! Each stream is seeded from (master_seed XOR stream_index), so adding
//! a stream never changes the draws of the existing ones.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

pub struct SeededRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SeededRng {
    /// The index must never change once assigned.
    pub fn new(master_seed: u64, stream_index: u64) -> Self {
        let derived_seed = master_seed ^ stream_index.wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// u64 in [0, n). `n` must be positive.
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Float in [min, max).
    pub fn uniform(&mut self, min: f64, max: f64) -> f64 {
        min + (max - min) * self.next_f64()
    }

    /// Bernoulli trial: true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Simplified Pareto draw; heavier tail for smaller alpha.
    pub fn pareto(&mut self, x_min: f64, alpha: f64) -> f64 {
        let u = self.next_f64().max(1e-10);
        x_min * u.powf(-1.0 / alpha)
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.next_u64_below(items.len() as u64) as usize]
    }
}

pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn for_stream(&self, slot: StreamSlot) -> SeededRng {
        SeededRng::new(self.master_seed, slot as u64).with_name(slot.name())
    }
}

/// Stable stream assignments. NEVER reorder or remove entries, only
/// append: reordering changes every stream's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum StreamSlot {
    Names = 0,
    Countries = 1,
    Projections = 2,
    Projects = 3,
}

impl StreamSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Names => "names",
            Self::Countries => "countries",
            Self::Projections => "projections",
            Self::Projects => "projects",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streams_are_independent_and_reproducible() {
        let bank = RngBank::new(99);
        let a: Vec<u64> = (0..4)
            .map(|_| bank.for_stream(StreamSlot::Countries).next_u64_below(1_000_000))
            .collect();
        assert!(a.windows(2).all(|w| w[0] == w[1]), "fresh stream restarts the sequence");

        let mut countries = bank.for_stream(StreamSlot::Countries);
        let mut projects = bank.for_stream(StreamSlot::Projects);
        let x: Vec<f64> = (0..8).map(|_| countries.next_f64()).collect();
        let y: Vec<f64> = (0..8).map(|_| projects.next_f64()).collect();
        assert_ne!(x, y);
        assert!(x.iter().all(|v| (0.0..1.0).contains(v)));
    }
}
