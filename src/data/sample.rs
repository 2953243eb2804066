use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};

// ---------------------------------------------------------------------------
// Random source
// ---------------------------------------------------------------------------

/// Source of randomness for display sampling. Injected so tests can seed it.
pub trait RandomSource {
    fn next_u64(&mut self) -> u64;

    /// Uniform integer in `0..bound`. `bound` must be non-zero.
    fn below(&mut self, bound: u64) -> u64 {
        // Lemire's multiply-shift with rejection to remove modulo bias.
        let threshold = bound.wrapping_neg() % bound;
        loop {
            let m = (self.next_u64() as u128) * (bound as u128);
            if (m as u64) >= threshold {
                return (m >> 64) as u64;
            }
        }
    }
}

/// Deterministic PRNG (xoshiro256**).
#[derive(Debug, Clone)]
pub struct Xoshiro256 {
    state: [u64; 4],
}

impl Xoshiro256 {
    pub fn seeded(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        Xoshiro256 { state: s }
    }

    /// Seed from the clock mixed with the process' random hasher keys.
    pub fn from_entropy() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        let mut hasher = RandomState::new().build_hasher();
        hasher.write_u64(nanos);
        Self::seeded(hasher.finish())
    }

    /// Uniform float in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        (RandomSource::next_u64(self) >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    pub fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

impl RandomSource for Xoshiro256 {
    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }
}

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

/// Pick `min(k, items.len())` distinct elements uniformly without
/// replacement (partial Fisher–Yates). Output order is the draw order.
pub fn random_sample<T: Clone>(items: &[T], k: usize, rng: &mut impl RandomSource) -> Vec<T> {
    let take = k.min(items.len());
    let mut indices: Vec<usize> = (0..items.len()).collect();
    for i in 0..take {
        let remaining = (indices.len() - i) as u64;
        let j = i + rng.below(remaining) as usize;
        indices.swap(i, j);
    }
    indices[..take].iter().map(|&i| items[i].clone()).collect()
}

/// Apply the display cap: everything when within `cap` or when `cap` is 0,
/// else a random `cap`-sized subset.
pub fn cap_for_display<T: Clone>(items: &[T], cap: usize, rng: &mut impl RandomSource) -> Vec<T> {
    if cap > 0 && items.len() > cap {
        random_sample(items, cap, rng)
    } else {
        items.to_vec()
    }
}
