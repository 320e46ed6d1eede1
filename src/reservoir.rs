
//! Weighted reservoir sampling with exponential keys (A-Res).
//!
//! Each offered record draws `u` uniformly from the reservoir's own seeded
//! RNG and is keyed by `q = u^(1/weight)`; the reservoir keeps the records
//! with the largest keys, which samples records with probability
//! proportional to their weights. A min-heap over the keys makes each offer
//! O(log n).
//!
//! See Efraimidis & Spirakis, 2006: https://doi.org/10.1016/j.ipl.2005.11.003

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::io::Write;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

struct Entry {
    key: f64,
    order: u64,
    chunk: Vec<u8>,
    weight: f64,
    kde: f64,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Entry) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl Ord for Entry {
    fn cmp(&self, other: &Entry) -> Ordering {
        // On equal keys the later arrival orders first so it is evicted
        // first, leaving ties resolved in favor of insertion order.
        self.key
            .total_cmp(&other.key)
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Entry) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Fixed-capacity reservoir retaining the highest-keyed records offered.
pub struct Reservoir {
    capacity: usize,
    entries: BinaryHeap<Reverse<Entry>>,
    rng: StdRng,
    offers: u64,
}

impl Reservoir {
    /// A reservoir holding at most `capacity` records, with its own RNG
    /// seeded from `seed`. Two reservoirs built with the same seed and fed
    /// offers in lockstep make identical retention decisions, which is what
    /// keeps paired-end outputs aligned mate-for-mate.
    pub fn new(capacity: usize, seed: u64) -> Self {
        Reservoir {
            capacity,
            entries: BinaryHeap::with_capacity(capacity + 1),
            rng: StdRng::seed_from_u64(seed),
            offers: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Offer one record. `chunk` is the verbatim record text emitted on
    /// drain; `kde` rides along for the weights file and plays no part in
    /// the retention decision.
    pub fn put(&mut self, chunk: Vec<u8>, weight: f64, kde: f64) {
        // The draw happens unconditionally so that reservoirs sharing a seed
        // consume their RNG streams identically regardless of acceptance.
        let u: f64 = self.rng.gen();
        let key = if weight == 0.0 {
            0.0
        } else if weight == f64::INFINITY {
            1.0
        } else {
            u.powf(1.0 / weight)
        };

        self.offers += 1;
        let entry = Entry {
            key,
            order: self.offers,
            chunk,
            weight,
            kde,
        };

        if self.entries.len() < self.capacity {
            self.entries.push(Reverse(entry));
        } else if let Some(Reverse(smallest)) = self.entries.peek() {
            if entry.key > smallest.key {
                self.entries.pop();
                self.entries.push(Reverse(entry));
            }
        }
    }

    /// Write retained record chunks to `chunk_sink` and one `"<weight> <kde>"`
    /// line per record to `weight_sink`, highest key first. The i-th weight
    /// line describes the i-th emitted chunk.
    pub fn drain<C: Write, W: Write>(self, chunk_sink: &mut C, weight_sink: &mut W) -> Result<()> {
        for Reverse(entry) in self.entries.into_sorted_vec() {
            chunk_sink.write_all(&entry.chunk)?;
            writeln!(weight_sink, "{} {}", entry.weight, entry.kde)?;
        }
        Ok(())
    }
}
