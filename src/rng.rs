//! Pseudo-random source: a 32-bit linear congruential generator.

// IMPORTANT: Everything here runs per sample on the RT thread. Keep it pure.

/// LCG multiplier (Numerical Recipes).
pub const LCG_MUL: u32 = 1_664_525;
/// LCG increment (Numerical Recipes).
pub const LCG_ADD: u32 = 1_013_904_223;

/// Advance the seed one step and return the new value.
#[inline]
pub fn lcg_next(seed: &mut u32) -> u32 {
    *seed = seed.wrapping_mul(LCG_MUL).wrapping_add(LCG_ADD);
    *seed
}

/// Advance the seed and map the result to a float in `[-1, 1]`.
#[inline]
pub fn white_sample(seed: &mut u32) -> f32 {
    let raw = lcg_next(seed);
    (raw as f32 / u32::MAX as f32) * 2.0 - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lcg_matches_known_sequence() {
        let mut seed = 0x1234_5678;
        assert_eq!(lcg_next(&mut seed), 0x7543_2777);
        assert_eq!(lcg_next(&mut seed), 0xcd30_5e6a);
        assert_eq!(lcg_next(&mut seed), 0x25db_fac1);
        assert_eq!(seed, 0x25db_fac1);
    }

    #[test]
    fn white_sample_stays_in_range() {
        let mut seed = 1;
        for _ in 0..100_000 {
            let s = white_sample(&mut seed);
            assert!((-1.0..=1.0).contains(&s), "sample {} out of range", s);
        }
    }

    #[test]
    fn extremes_map_to_bounds() {
        // Seeds chosen so the next step lands on 0 and u32::MAX.
        let mut low = 0u32.wrapping_sub(LCG_ADD).wrapping_mul(inverse_mul());
        assert_eq!(white_sample(&mut low), -1.0);
        let mut high = u32::MAX.wrapping_sub(LCG_ADD).wrapping_mul(inverse_mul());
        assert_eq!(white_sample(&mut high), 1.0);
    }

    // Multiplicative inverse of LCG_MUL mod 2^32 via Newton iteration.
    fn inverse_mul() -> u32 {
        let mut x = LCG_MUL;
        for _ in 0..5 {
            x = x.wrapping_mul(2u32.wrapping_sub(LCG_MUL.wrapping_mul(x)));
        }
        x
    }
}
