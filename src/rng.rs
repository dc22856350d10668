//! Seeded pseudo-random streams for stable visuals.
//!
//! Identity-keyed visual elements (edge curves, radial placements, the
//! particle field) draw their variation from a `SeededRng` instead of ambient
//! randomness, so the same entity looks the same on every pass. The
//! recurrence and constants are part of the visual contract: changing them
//! would reshuffle every curve in every deployed scene.

const MULTIPLIER: u64 = 1_664_525;
const INCREMENT: u64 = 1_013_904_223;
const MODULUS: u64 = 2_147_483_647;

/// Seed used when a caller hands us a zero/empty seed.
const FALLBACK_SEED: u64 = 1_234_567;

/// Linear-congruential generator with a fully deterministic stream.
///
/// Two instances built from the same seed produce identical output
/// sequences; there is no shared state between instances. Construct one
/// stream per semantically distinct purpose (one per edge, one for the
/// particle field) so unrelated elements don't correlate.
#[derive(Debug, Clone)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    /// Create a stream from a numeric seed. Zero falls back to a fixed
    /// constant so the stream never degenerates.
    pub fn new(seed: u64) -> Self {
        let seed = if seed == 0 { FALLBACK_SEED } else { seed };
        Self {
            state: seed % MODULUS,
        }
    }

    /// Create a stream from a string key via a polynomial rolling hash
    /// (`hash = code + ((hash << 5) - hash)`, 32-bit wrapping, absolute
    /// value). Same key, same stream.
    pub fn from_key(key: &str) -> Self {
        let mut hash: i32 = 0;
        for c in key.chars() {
            let code = c as i32;
            hash = code.wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash));
        }
        Self::new(hash.unsigned_abs() as u64)
    }

    /// Advance the stream and return a float in `[0, 1)`.
    pub fn next(&mut self) -> f64 {
        self.state = (MULTIPLIER * self.state + INCREMENT) % MODULUS;
        self.state.saturating_sub(1) as f64 / MODULUS as f64
    }

    /// A float in `[min, max)`.
    pub fn range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next() * (max - min)
    }

    /// True with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next() < p
    }

    /// A uniform index in `[0, len)`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        ((self.next() * len as f64) as usize).min(len - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn same_string_seed_same_sequence() {
        let mut a = SeededRng::from_key("table_x");
        let mut b = SeededRng::from_key("table_x");
        let first: Vec<f64> = (0..5).map(|_| a.next()).collect();
        let second: Vec<f64> = (0..5).map(|_| b.next()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = SeededRng::from_key("users");
        let mut b = SeededRng::from_key("orders");
        let first: Vec<f64> = (0..5).map(|_| a.next()).collect();
        let second: Vec<f64> = (0..5).map(|_| b.next()).collect();
        assert_ne!(first, second);
    }

    #[test]
    fn next_stays_in_unit_interval() {
        let mut rng = SeededRng::new(42);
        for _ in 0..1000 {
            let v = rng.next();
            assert!((0.0..1.0).contains(&v), "out of range: {v}");
        }
    }

    #[test]
    fn range_respects_bounds() {
        let mut rng = SeededRng::from_key("range");
        for _ in 0..1000 {
            let v = rng.range(-3.0, 7.5);
            assert!((-3.0..7.5).contains(&v));
        }
    }

    #[test]
    fn zero_and_empty_seeds_fall_back() {
        let mut a = SeededRng::new(0);
        let mut b = SeededRng::from_key("");
        assert_eq!(a.next(), b.next());
    }

    #[test]
    fn index_covers_range_without_escaping() {
        let mut rng = SeededRng::new(7);
        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[rng.index(4)] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn chance_extremes() {
        let mut rng = SeededRng::new(99);
        assert!(rng.chance(1.1));
        let mut rng = SeededRng::new(99);
        assert!(!rng.chance(0.0));
    }
}
