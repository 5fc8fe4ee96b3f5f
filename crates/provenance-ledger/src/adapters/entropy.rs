use crate::ports::outbound::EntropySource;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{thread_rng, Rng, SeedableRng};

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn draw<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
        .collect()
}

/// Thread-local OS-seeded randomness.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn base36(&self, len: usize) -> String {
        draw(&mut thread_rng(), len)
    }
}

/// Reproducible randomness for tests and demos.
#[derive(Debug)]
pub struct SeededEntropy {
    rng: Mutex<StdRng>,
}

impl SeededEntropy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl EntropySource for SeededEntropy {
    fn base36(&self, len: usize) -> String {
        draw(&mut *self.rng.lock(), len)
    }
}
