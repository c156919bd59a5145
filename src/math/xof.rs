//! Seed-driven byte stream for deterministic sampling.
//!
//! The stream is BLAKE3 in keyed mode. The key is the seed zero-padded or
//! truncated to 32 bytes; the hasher then absorbs the seed length and the full
//! seed, so every byte of an arbitrary-length seed determines the output.

use rand::{CryptoRng, RngCore};

const KEY_LEN: usize = blake3::KEY_LEN;

/// A [`RngCore`] reading from a keyed BLAKE3 output stream.
///
/// Two instances built from the same seed produce byte-identical streams.
pub struct XofRng {
    reader: blake3::OutputReader,
}

impl XofRng {
    pub fn from_seed_bytes(seed: &[u8]) -> Self {
        let mut key = [0u8; KEY_LEN];
        let prefix = seed.len().min(KEY_LEN);
        key[..prefix].copy_from_slice(&seed[..prefix]);

        let mut hasher = blake3::Hasher::new_keyed(&key);
        hasher.update(&(seed.len() as u64).to_le_bytes());
        hasher.update(seed);
        Self {
            reader: hasher.finalize_xof(),
        }
    }
}

impl RngCore for XofRng {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.reader.fill(&mut buf);
        u32::from_le_bytes(buf)
    }

    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.reader.fill(&mut buf);
        u64::from_le_bytes(buf)
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        self.reader.fill(dst);
    }
}

impl CryptoRng for XofRng {}

impl std::fmt::Debug for XofRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XofRng").finish_non_exhaustive()
    }
}
