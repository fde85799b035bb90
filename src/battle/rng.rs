use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use tracing::trace;

/// Injected source of every random decision in a battle.
///
/// Each draw carries a `reason` so scripted runs can be traced.
pub trait RandomSource {
    /// Uniform integer in `1..=100`.
    fn next_percent(&mut self, reason: &str) -> u8;

    /// Uniform integer in `low..=high`.
    fn next_range(&mut self, low: u32, high: u32, reason: &str) -> u32;

    /// Uniform float in `[0, 1)`.
    fn next_unit(&mut self, reason: &str) -> f64;

    /// True with probability `percent / 100`.
    fn chance(&mut self, percent: u8, reason: &str) -> bool {
        if percent >= 100 {
            return true;
        }
        if percent == 0 {
            return false;
        }
        self.next_percent(reason) <= percent
    }

    /// Damage roll multiplier in `[0.85, 1.0]`.
    fn damage_variance(&mut self) -> f64 {
        0.85 + 0.15 * self.next_unit("damage variance")
    }

    /// Uniform index into a collection of `len` items. Does not draw for `len <= 1`.
    fn pick_index(&mut self, len: usize, reason: &str) -> usize {
        if len <= 1 {
            return 0;
        }
        self.next_range(0, (len - 1) as u32, reason) as usize
    }
}

/// Reproducible randomness from a 64-bit seed.
#[derive(Debug, Clone)]
pub struct SeededRng {
    rng: StdRng,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRng {
    fn next_percent(&mut self, reason: &str) -> u8 {
        let value = self.rng.random_range(1..=100u8);
        trace!(value, reason, "rng percent");
        value
    }

    fn next_range(&mut self, low: u32, high: u32, reason: &str) -> u32 {
        let value = if low >= high {
            low
        } else {
            self.rng.random_range(low..=high)
        };
        trace!(value, reason, "rng range");
        value
    }

    fn next_unit(&mut self, reason: &str) -> f64 {
        let value: f64 = self.rng.random();
        trace!(value, reason, "rng unit");
        value
    }
}

/// Fixed outcome list for deterministic tests.
///
/// Every draw consumes one value: percents use it directly, ranges clamp it
/// into `low..=high`, and unit draws read it as a percentage (so `100` is the
/// maximum damage roll and `0` the minimum).
#[derive(Debug, Clone)]
pub struct ScriptedRng {
    outcomes: VecDeque<u32>,
}

impl ScriptedRng {
    pub fn new_for_test(outcomes: Vec<u32>) -> Self {
        Self {
            outcomes: outcomes.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.outcomes.len()
    }

    fn next_outcome(&mut self, reason: &str) -> u32 {
        match self.outcomes.pop_front() {
            Some(outcome) => {
                trace!(outcome, reason, "scripted rng consumed");
                outcome
            }
            None => panic!(
                "ScriptedRng exhausted! Tried to get a value for: '{}'. Need more random values.",
                reason
            ),
        }
    }
}

impl RandomSource for ScriptedRng {
    fn next_percent(&mut self, reason: &str) -> u8 {
        self.next_outcome(reason).clamp(1, 100) as u8
    }

    fn next_range(&mut self, low: u32, high: u32, reason: &str) -> u32 {
        self.next_outcome(reason).clamp(low, high.max(low))
    }

    fn next_unit(&mut self, reason: &str) -> f64 {
        (self.next_outcome(reason).min(100) as f64 / 100.0).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = SeededRng::new(42);
        let mut b = SeededRng::new(42);
        for _ in 0..50 {
            assert_eq!(a.next_percent("test"), b.next_percent("test"));
            assert_eq!(a.next_range(1, 3, "test"), b.next_range(1, 3, "test"));
        }
    }

    #[test]
    fn test_seeded_rng_bounds() {
        let mut rng = SeededRng::new(7);
        for _ in 0..1000 {
            let percent = rng.next_percent("bounds");
            assert!((1..=100).contains(&percent));
            let variance = rng.damage_variance();
            assert!((0.85..=1.0).contains(&variance));
            assert!(rng.next_range(2, 4, "bounds") >= 2);
        }
    }

    #[test]
    fn test_scripted_rng_consumes_in_order() {
        let mut rng = ScriptedRng::new_for_test(vec![30, 100, 0, 9]);
        assert!(rng.chance(60, "first"));
        assert_eq!(rng.damage_variance(), 1.0);
        assert_eq!(rng.damage_variance(), 0.85);
        assert_eq!(rng.next_range(1, 3, "clamped"), 3);
        assert_eq!(rng.remaining(), 0);
    }

    #[test]
    fn test_certain_chances_do_not_draw() {
        let mut rng = ScriptedRng::new_for_test(vec![]);
        assert!(rng.chance(100, "always"));
        assert!(!rng.chance(0, "never"));
        assert_eq!(rng.pick_index(1, "single"), 0);
    }

    #[test]
    #[should_panic(expected = "ScriptedRng exhausted")]
    fn test_scripted_rng_panics_when_exhausted() {
        let mut rng = ScriptedRng::new_for_test(vec![]);
        rng.next_percent("too many");
    }
}
