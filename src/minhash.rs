
//! MinHash signatures over the k-mers of a read.
//!
//! `SequenceMinHash` evaluates a family of seeded hash functions over every
//! k-mer window of a sequence and records, per function, the minimum value
//! observed. Two reads agree at a signature position with probability equal
//! to the Jaccard similarity of their k-mer sets, which is the LSH kernel
//! the RACE sketch estimates densities under. Sequences are treated as
//! opaque byte strings: no case folding and no ambiguity-code normalization.

/// Signature slot value for reads with no k-mer (sequence shorter than k).
pub const NO_KMER: i32 = i32::MAX;

/// Thomas Wang's 64-bit integer hash.
// https://gist.github.com/lh3/974ced188be2f90422cc#file-inthash-c
// https://aebou.rbind.io/post/a-rust-glimpse-at-thomas-wang-integer-hash-function
#[inline]
pub fn tw_hash64(kmer: u64) -> u64 {
    let mut hash = kmer;

    hash = (!hash).wrapping_add(hash << 21); // key = (key << 21) - key - 1
    hash = hash ^ (hash >> 24);

    hash = hash.wrapping_add(hash << 3).wrapping_add(hash << 8); // key * 265
    hash = hash ^ (hash >> 14);

    hash = hash.wrapping_add(hash << 2).wrapping_add(hash << 4); // key * 21
    hash = hash ^ (hash >> 28);

    hash = hash.wrapping_add(hash << 31);

    hash
}

/// FNV-1a over a byte window.
#[inline]
fn fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x00000100000001B3;

    let mut hash = OFFSET;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(PRIME);
    }

    hash
}

/// A family of seeded MinHash functions over fixed-length k-mers.
#[derive(Clone, Debug)]
pub struct SequenceMinHash {
    seeds: Vec<u64>,
}

impl SequenceMinHash {
    /// Create `num_hashes` hash functions with seeds derived deterministically
    /// from `seed`, so signatures are reproducible across runs.
    pub fn new(num_hashes: usize, seed: u64) -> Self {
        let mut state = seed;
        let seeds = (0..num_hashes)
            .map(|_| {
                // LCG seed chain
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                state
            })
            .collect();

        SequenceMinHash { seeds }
    }

    pub fn num_hashes(&self) -> usize {
        self.seeds.len()
    }

    /// Fill `signature` with the minimum hash of any k-mer in `seq`, one slot
    /// per hash function. A sequence shorter than `k` has no k-mers and every
    /// slot receives [`NO_KMER`].
    ///
    /// Each slot depends only on the multiset of k-mers in `seq` and on the
    /// seed at that position.
    pub fn extract(&self, k: usize, seq: &[u8], signature: &mut [i32]) {
        debug_assert!(k >= 1);
        debug_assert_eq!(signature.len(), self.seeds.len());

        signature.fill(NO_KMER);
        if seq.len() < k {
            return;
        }

        for window in seq.windows(k) {
            let base = fnv1a64(window);
            for (slot, seed) in signature.iter_mut().zip(&self.seeds) {
                let hash = (tw_hash64(base ^ seed) & 0x7fff_ffff) as i32;
                if hash < *slot {
                    *slot = hash;
                }
            }
        }
    }
}
