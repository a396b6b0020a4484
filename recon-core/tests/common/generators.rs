//! Stochastic generators for test variations
//!
//! Uses seeded RNG for reproducibility. Print seed on failure for replay.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use recon_core::{Item, Value};

/// Seeded generator for reproducible stochastic tests
pub struct Gen {
    pub rng: StdRng,
    pub seed: u64,
}

impl Gen {
    /// Create with specific seed (for reproduction)
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create from environment or random seed
    pub fn from_env_or_random() -> Self {
        let seed = std::env::var("RECON_TEST_SEED")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(rand::random);
        Self::new(seed)
    }

    /// Geometric distribution: count until rand > alpha
    pub fn geometric(&mut self, alpha: f64) -> usize {
        let mut n = 0;
        while self.rng.gen::<f64>() < alpha {
            n += 1;
        }
        n
    }

    /// Poisson-like count (simplified)
    pub fn poisson(&mut self, lambda: f64) -> usize {
        let l = (-lambda).exp();
        let mut k = 0;
        let mut p = 1.0;
        loop {
            k += 1;
            p *= self.rng.gen::<f64>();
            if p <= l {
                break;
            }
        }
        k - 1
    }

    /// Random boolean with probability p
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.gen::<f64>() < p
    }

    /// Split `len` bytes into random non-empty chunk lengths.
    ///
    /// Mostly tiny chunks, so boundaries land inside tokens and codepoints.
    pub fn chunking(&mut self, len: usize) -> Vec<usize> {
        let mut chunks = Vec::new();
        let mut left = len;
        while left > 0 {
            let size = (1 + self.geometric(0.6)).min(left);
            chunks.push(size);
            left -= size;
        }
        chunks
    }

    /// Random identifier
    pub fn name(&mut self) -> String {
        let len = 1 + self.geometric(0.7);
        let mut name = String::with_capacity(len);
        name.push(self.rng.gen_range(b'a'..=b'z') as char);
        let chars = b"abcdefghijklmnopqrstuvwxyz0123456789-_";
        for _ in 1..len {
            name.push(chars[self.rng.gen_range(0..chars.len())] as char);
        }
        name
    }

    /// Random text, sometimes needing quotes and escapes
    pub fn text(&mut self) -> String {
        if self.chance(0.6) {
            return self.name();
        }
        let pool = ['a', 'z', ' ', '"', '\\', '\n', '\t', 'é', '中', '@', '{', '#', '\u{1}', '😀'];
        let len = self.geometric(0.8);
        (0..len).map(|_| pool[self.rng.gen_range(0..pool.len())]).collect()
    }

    /// Random scalar in the set of values the writer round-trips exactly
    pub fn scalar(&mut self) -> Value {
        match self.rng.gen_range(0..6) {
            0 => Value::from(self.rng.gen_range(-100_000i64..100_000)),
            1 => Value::from(self.rng.gen::<i64>()),
            2 => Value::Bool(self.chance(0.5)),
            3 => {
                let len = self.rng.gen_range(0..8);
                Value::Data((0..len).map(|_| self.rng.gen()).collect())
            }
            4 => Value::from(self.rng.gen_range(-1.0e6..1.0e6_f64)),
            _ => Value::text(self.text()),
        }
    }

    /// Random record of depth at most `depth`: leading attributes, then
    /// slots and values.
    pub fn record(&mut self, depth: usize) -> Value {
        let mut items = Vec::new();
        for _ in 0..self.geometric(0.3) {
            let value = if self.chance(0.5) { Value::Extant } else { self.value(depth) };
            items.push(Item::attr(self.name(), value));
        }
        for _ in 0..self.geometric(0.7) {
            if self.chance(0.5) {
                let key = Value::text(self.text());
                let value = if self.chance(0.1) { Value::Extant } else { self.value(depth) };
                items.push(Item::slot(key, value));
            } else {
                items.push(Item::value(self.value(depth)));
            }
        }
        Value::record(items)
    }

    /// Random value of depth at most `depth`
    pub fn value(&mut self, depth: usize) -> Value {
        if depth > 0 && self.chance(0.3) {
            self.record(depth - 1)
        } else {
            self.scalar()
        }
    }
}
