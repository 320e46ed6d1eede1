
//! This module defines the `SampleParams` struct, which gathers everything
//! that shapes a sampling run: the reservoir capacity, the k-mer length fed
//! to the MinHash family, and the RACE sketch geometry (repetitions, hashes
//! per repetition, and counter range). Parameters are validated once at
//! startup, before any input is read.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleParams {
    sample_size: usize,
    kmer_length: usize,
    race_repetitions: usize,
    hash_power: usize,
    race_range: u32,
}

impl Default for SampleParams {
    fn default() -> Self {
        SampleParams {
            sample_size: 100,
            kmer_length: 16,
            race_repetitions: 100,
            hash_power: 1,
            race_range: 10000,
        }
    }
}

impl SampleParams {
    pub fn new(
        sample_size: usize,
        kmer_length: usize,
        race_repetitions: usize,
        hash_power: usize,
        race_range: u32,
    ) -> Self {
        SampleParams {
            sample_size,
            kmer_length,
            race_repetitions,
            hash_power,
            race_range,
        }
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    pub fn k(&self) -> usize {
        self.kmer_length
    }

    pub fn repetitions(&self) -> usize {
        self.race_repetitions
    }

    pub fn hash_power(&self) -> usize {
        self.hash_power
    }

    pub fn range(&self) -> u32 {
        self.race_range
    }

    /// Total number of MinHash functions backing the sketch.
    pub fn num_hashes(&self) -> usize {
        self.race_repetitions * self.hash_power
    }

    /// Reject configurations the sampler cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.sample_size == 0 {
            bail!("Sample size must be at least 1.");
        }
        if self.kmer_length == 0 {
            bail!("K-mer length must be at least 1.");
        }
        if self.race_repetitions == 0 {
            bail!("Number of repetitions (--reps) must be at least 1.");
        }
        if self.hash_power == 0 {
            bail!("Number of hashes per repetition (--hashes) must be at least 1.");
        }
        if self.race_range == 0 {
            bail!("Hash range (--range) must be at least 1.");
        }

        Ok(())
    }
}
