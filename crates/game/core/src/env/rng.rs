//! Deterministic random number generation for scripts.
//!
//! Every rule engine owns one [`ScriptRng`], seeded from its agent identity,
//! so chance rolls and random timers replay identically for the same seed.

use rand::RngCore;

/// PCG random number generator (Permuted Congruential Generator).
///
/// PCG-XSH-RR: 64-bit state, 32-bit output. Fast and small, with good
/// statistical quality.
///
/// # References
///
/// - PCG paper: <https://www.pcg-random.org/>
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptRng {
    state: u64,
}

impl ScriptRng {
    /// PCG multiplier constant.
    const MULTIPLIER: u64 = 6364136223846793005;

    /// PCG increment constant.
    const INCREMENT: u64 = 1442695040888963407;

    pub fn new(seed: u64) -> Self {
        let mut rng = Self { state: 0 };
        rng.state = Self::pcg_step(seed.wrapping_add(Self::INCREMENT));
        rng
    }

    /// Advance the PCG state by one step.
    ///
    /// `state' = (state × multiplier + increment) mod 2^64`
    #[inline]
    fn pcg_step(state: u64) -> u64 {
        state
            .wrapping_mul(Self::MULTIPLIER)
            .wrapping_add(Self::INCREMENT)
    }

    /// PCG output function using XSH-RR (xorshift high, random rotate).
    #[inline]
    fn pcg_output(state: u64) -> u32 {
        let xorshifted = (((state >> 18) ^ state) >> 27) as u32;
        let rot = (state >> 59) as u32;
        xorshifted.rotate_right(rot)
    }

    /// Uniform value in `[min, max]`; returns `min` when the range is empty.
    pub fn urand(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        let span = u64::from(max - min) + 1;
        min + (u64::from(self.next_u32()) % span) as u32
    }

    /// Uniform index in `[0, len)`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0);
        (self.next_u64() % len as u64) as usize
    }

    /// Rolls a percentage chance in `[0, 100]`.
    pub fn roll_chance(&mut self, chance: u32) -> bool {
        if chance >= 100 {
            return true;
        }
        self.urand(0, 99) < chance
    }
}

impl RngCore for ScriptRng {
    fn next_u32(&mut self) -> u32 {
        self.state = Self::pcg_step(self.state);
        Self::pcg_output(self.state)
    }

    fn next_u64(&mut self) -> u64 {
        let high = u64::from(self.next_u32());
        let low = u64::from(self.next_u32());
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Compute a deterministic seed from an identity and a world seed.
///
/// These constants are based on SplitMix64 and FxHash multipliers.
pub fn compute_seed(world_seed: u64, entry: u32, counter: u64) -> u64 {
    let mut hash = world_seed;
    hash ^= counter.wrapping_mul(0x9e3779b97f4a7c15);
    hash ^= u64::from(entry).wrapping_mul(0x517cc1b727220a95);

    // Final avalanche step
    hash ^= hash >> 33;
    hash = hash.wrapping_mul(0xff51afd7ed558ccd);
    hash ^= hash >> 33;

    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = ScriptRng::new(42);
        let mut b = ScriptRng::new(42);
        for _ in 0..16 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn urand_stays_in_bounds() {
        let mut rng = ScriptRng::new(7);
        for _ in 0..1000 {
            let value = rng.urand(1000, 2000);
            assert!((1000..=2000).contains(&value));
        }
        assert_eq!(rng.urand(5, 5), 5);
        assert_eq!(rng.urand(9, 3), 9);
    }

    #[test]
    fn works_with_rand_adapters() {
        let mut rng = ScriptRng::new(compute_seed(1, 100, 5));
        let value: u32 = rng.gen_range(10..20);
        assert!((10..20).contains(&value));
    }

    #[test]
    fn chance_edges() {
        let mut rng = ScriptRng::new(3);
        assert!(rng.roll_chance(100));
        assert!((0..100).all(|_| !rng.roll_chance(0)));
    }
}
