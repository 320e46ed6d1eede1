
//! The streaming sampler core.
//!
//! `DiversitySampler` wires the MinHash family, the rehasher, and the RACE
//! sketch into a single query-then-update step per read, producing the
//! retention weight offered to the reservoir. The stream loops pull framed
//! records in strict FIFO order and process each to completion before the
//! next is read, so the sketch state seen by record `t + 1` always includes
//! record `t`.

use std::io::BufRead;

use indicatif::ProgressBar;
use log::warn;

use crate::fastx::{Pull, ReadRecord, RecordReader};
use crate::minhash::SequenceMinHash;
use crate::race::Race;
use crate::rehash::rehash;
use crate::reservoir::Reservoir;
use crate::sample_params::SampleParams;

pub struct DiversitySampler {
    minhash: SequenceMinHash,
    race: Race,
    signature: Vec<i32>,
    buckets: Vec<u32>,
    kmer_length: usize,
    hash_power: usize,
    records_seen: u64,
}

impl DiversitySampler {
    pub fn new(params: &SampleParams, seed: u64) -> Self {
        let minhash = SequenceMinHash::new(params.num_hashes(), seed);
        let race = Race::new(params.repetitions(), params.range());
        let signature = vec![0; minhash.num_hashes()];
        let buckets = vec![0; race.repetitions()];

        DiversitySampler {
            minhash,
            race,
            signature,
            buckets,
            kmer_length: params.k(),
            hash_power: params.hash_power(),
            records_seen: 0,
        }
    }

    pub fn records_seen(&self) -> u64 {
        self.records_seen
    }

    /// Ingest one read and return its `(weight, kde)`.
    ///
    /// The KDE reflects only earlier reads. The weight scales the inverse
    /// density by the 1-indexed stream position: the sketch accumulates mass
    /// over time, and without that factor early reads would dominate the
    /// sample. The `+1` keeps the first read finite.
    pub fn observe(&mut self, sequence: &[u8]) -> (f64, f64) {
        self.minhash
            .extract(self.kmer_length, sequence, &mut self.signature);
        rehash(
            &self.signature,
            &mut self.buckets,
            self.hash_power,
            self.race.range(),
        );
        let kde = self.race.query_and_add(&self.buckets);

        self.records_seen += 1;
        let weight = self.records_seen as f64 / (kde + 1.0);

        (weight, kde)
    }
}

/// Counts for one pass over an input stream. `records` are the units offered
/// to the reservoir (read pairs count once); `skipped` are malformed units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub records: u64,
    pub skipped: u64,
}

fn next_single<R: BufRead>(
    reader: &mut RecordReader<R>,
    stats: &mut StreamStats,
) -> std::io::Result<Option<ReadRecord>> {
    loop {
        match reader.next_record()? {
            Pull::Record(record) => return Ok(Some(record)),
            Pull::Skip => stats.skipped += 1,
            Pull::Eof => return Ok(None),
        }
    }
}

/// Pull two consecutive records and fuse them into one sampling unit. A pair
/// whose second half is malformed is dropped whole.
fn next_interleaved<R: BufRead>(
    reader: &mut RecordReader<R>,
    stats: &mut StreamStats,
) -> std::io::Result<Option<ReadRecord>> {
    loop {
        let first = match next_single(reader, stats)? {
            Some(record) => record,
            None => return Ok(None),
        };
        match reader.next_record()? {
            Pull::Record(second) => {
                let mut fused = first;
                fused.sequence.extend_from_slice(&second.sequence);
                fused.chunk.extend_from_slice(&second.chunk);
                return Ok(Some(fused));
            }
            Pull::Skip => stats.skipped += 1,
            Pull::Eof => {
                warn!("Interleaved input ends with an unpaired record; dropping it.");
                stats.skipped += 1;
                return Ok(None);
            }
        }
    }
}

/// Stream a single-end or interleaved input through the sampler. An I/O
/// error on the input ends the pass early; whatever the reservoir holds is
/// still drained by the caller.
pub fn sample_single<R: BufRead>(
    reader: &mut RecordReader<R>,
    interleaved: bool,
    sampler: &mut DiversitySampler,
    reservoir: &mut Reservoir,
    progress: &ProgressBar,
) -> StreamStats {
    let mut stats = StreamStats::default();

    loop {
        let pulled = if interleaved {
            next_interleaved(reader, &mut stats)
        } else {
            next_single(reader, &mut stats)
        };

        let record = match pulled {
            Ok(Some(record)) => record,
            Ok(None) => break,
            Err(error) => {
                warn!("Error reading input: {error}. Sampling the records read so far.");
                break;
            }
        };

        let (weight, kde) = sampler.observe(&record.sequence);
        reservoir.put(record.chunk, weight, kde);
        stats.records += 1;
        progress.inc(1);
    }

    stats
}

/// Stream two mate files in lockstep. Both mates contribute to one hashed
/// sequence and share one weight; each mate's chunk goes to its own
/// reservoir so the drained outputs stay aligned record-for-record.
pub fn sample_paired<R1: BufRead, R2: BufRead>(
    reader1: &mut RecordReader<R1>,
    reader2: &mut RecordReader<R2>,
    sampler: &mut DiversitySampler,
    reservoir1: &mut Reservoir,
    reservoir2: &mut Reservoir,
    progress: &ProgressBar,
) -> StreamStats {
    let mut stats = StreamStats::default();

    loop {
        let pulls = reader1
            .next_record()
            .and_then(|p1| reader2.next_record().map(|p2| (p1, p2)));
        let (pull1, pull2) = match pulls {
            Ok(pulls) => pulls,
            Err(error) => {
                warn!("Error reading input: {error}. Sampling the records read so far.");
                break;
            }
        };

        match (pull1, pull2) {
            (Pull::Eof, Pull::Eof) => break,
            (Pull::Eof, _) | (_, Pull::Eof) => {
                warn!("Paired inputs have unequal record counts; ignoring the excess.");
                break;
            }
            // Skipping both sides of a bad pair keeps the streams in step.
            (Pull::Skip, _) | (_, Pull::Skip) => stats.skipped += 1,
            (Pull::Record(mate1), Pull::Record(mate2)) => {
                let mut sequence =
                    Vec::with_capacity(mate1.sequence.len() + mate2.sequence.len());
                sequence.extend_from_slice(&mate1.sequence);
                sequence.extend_from_slice(&mate2.sequence);

                let (weight, kde) = sampler.observe(&sequence);
                reservoir1.put(mate1.chunk, weight, kde);
                reservoir2.put(mate2.chunk, weight, kde);
                stats.records += 1;
                progress.inc(1);
            }
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_utils::FileFormat;
    use std::io::{Cursor, Write};

    fn test_params(sample_size: usize) -> SampleParams {
        SampleParams::new(sample_size, 3, 4, 1, 256)
    }

    fn make_reader(data: &str, format: FileFormat) -> RecordReader<Cursor<Vec<u8>>> {
        RecordReader::new(Cursor::new(data.as_bytes().to_vec()), format)
    }

    fn run_single(
        data: &str,
        format: FileFormat,
        interleaved: bool,
        params: &SampleParams,
        seed: u64,
    ) -> (String, String, StreamStats) {
        let mut reader = make_reader(data, format);
        let mut sampler = DiversitySampler::new(params, seed);
        let mut reservoir = Reservoir::new(params.sample_size(), seed);
        let stats = sample_single(
            &mut reader,
            interleaved,
            &mut sampler,
            &mut reservoir,
            &ProgressBar::hidden(),
        );

        let mut chunks = Vec::new();
        let mut weights = Vec::new();
        reservoir.drain(&mut chunks, &mut weights).unwrap();
        (
            String::from_utf8(chunks).unwrap(),
            String::from_utf8(weights).unwrap(),
            stats,
        )
    }

    fn fastq(reads: &[(&str, &str)]) -> String {
        let mut data = String::new();
        for (name, seq) in reads {
            data.push_str(&format!("@{name}\n{seq}\n+\n{}\n", "I".repeat(seq.len())));
        }
        data
    }

    #[test]
    fn test_repeated_read_constant_weight() {
        // Feeding one read n times walks the KDE through 0, 1, ..., n - 1
        // while the weight stays pinned at 1.
        let mut sampler = DiversitySampler::new(&test_params(2), 1);
        for i in 0..10 {
            let (weight, kde) = sampler.observe(b"ACGTACGTACGT");
            assert_eq!(kde, i as f64);
            assert_eq!(weight, 1.0);
        }
        assert_eq!(sampler.records_seen(), 10);
    }

    #[test]
    fn test_distinct_read_outweighs_duplicates() {
        let mut sampler = DiversitySampler::new(&test_params(2), 1);
        let (w1, _) = sampler.observe(b"AAAA");
        let (w2, _) = sampler.observe(b"AAAA");
        let (w3, _) = sampler.observe(b"AAAA");
        let (w4, kde4) = sampler.observe(b"CGTG");

        assert_eq!((w1, w2, w3), (1.0, 1.0, 1.0));
        assert!(kde4 < 3.0);
        assert!(w4 > w3);
    }

    #[test]
    fn test_unique_read_wins_reservoir_slot() {
        // Three copies of one read and a single distinct read: the distinct
        // read arrives with a near-zero density estimate, takes the largest
        // weight in the stream, and wins one of the two reservoir slots.
        let data = fastq(&[
            ("dup1", "AAAA"),
            ("dup2", "AAAA"),
            ("dup3", "AAAA"),
            ("rare", "CGTG"),
        ]);
        let params = SampleParams::new(2, 3, 4, 1, 16);
        let (chunks, weights, stats) =
            run_single(&data, FileFormat::Fastq, false, &params, 44);

        assert_eq!(stats.records, 4);
        assert_eq!(chunks.matches('@').count(), 2);
        assert!(chunks.contains("@rare"));
        // the distinct read keeps its arrival weight t / (kde + 1) = 4 / 1
        assert!(weights.lines().any(|line| line == "4 0"));
    }

    #[test]
    fn test_empty_input() {
        let (chunks, weights, stats) =
            run_single("", FileFormat::Fastq, false, &test_params(5), 1);
        assert_eq!(stats, StreamStats::default());
        assert!(chunks.is_empty());
        assert!(weights.is_empty());
    }

    #[test]
    fn test_under_capacity_all_retained() {
        let data = fastq(&[("r1", "ACGTACGT"), ("r2", "ACGTACGT"), ("r3", "ACGTACGT")]);
        let (chunks, weights, stats) =
            run_single(&data, FileFormat::Fastq, false, &test_params(10), 1);

        assert_eq!(stats.records, 3);
        assert_eq!(chunks.matches('@').count(), 3);

        // identical reads: kde walks 0, 1, 2 and every weight is t / t = 1
        let mut lines: Vec<&str> = weights.lines().collect();
        lines.sort_unstable();
        assert_eq!(lines, vec!["1 0", "1 1", "1 2"]);
    }

    #[test]
    fn test_dedup_pressure() {
        let reads: Vec<(String, &str)> = (0..100)
            .map(|i| (format!("r{i}"), "ACGTACGTACGT"))
            .collect();
        let reads: Vec<(&str, &str)> = reads.iter().map(|(n, s)| (n.as_str(), *s)).collect();
        let (chunks, weights, stats) =
            run_single(&fastq(&reads), FileFormat::Fastq, false, &test_params(2), 1);

        assert_eq!(stats.records, 100);
        assert_eq!(chunks.matches('@').count(), 2);
        for line in weights.lines() {
            let weight: f64 = line.split_whitespace().next().unwrap().parse().unwrap();
            assert_eq!(weight, 1.0);
        }
    }

    #[test]
    fn test_reservoir_overflow() {
        let reads: Vec<(String, String)> = (0..10)
            .map(|i| (format!("r{i}"), format!("ACGT{}ACGT", "AC".repeat(i))))
            .collect();
        let reads: Vec<(&str, &str)> = reads
            .iter()
            .map(|(n, s)| (n.as_str(), s.as_str()))
            .collect();
        let (chunks, weights, stats) =
            run_single(&fastq(&reads), FileFormat::Fastq, false, &test_params(3), 1);

        assert_eq!(stats.records, 10);
        assert_eq!(chunks.matches('@').count(), 3);
        assert_eq!(weights.lines().count(), 3);
    }

    #[test]
    fn test_short_sequence_still_sampled() {
        // a read shorter than k hashes through the no-kmer sentinel
        let data = fastq(&[("tiny", "AC")]);
        let (chunks, _, stats) =
            run_single(&data, FileFormat::Fastq, false, &test_params(5), 1);

        assert_eq!(stats.records, 1);
        assert!(chunks.contains("@tiny"));
    }

    #[test]
    fn test_malformed_record_skipped() {
        let mut data = fastq(&[
            ("r0", "ACGTAACC"),
            ("r1", "ACGTAAGG"),
            ("r2", "ACGTAATT"),
            ("r3", "ACGTCCGG"),
            ("r4", "ACGTCCTT"),
            ("r5", "ACGTGGTT"),
            ("r6", "AACCGGTT"),
            ("r7", "AACCTTGG"),
            ("r8", "AAGGCCTT"),
            ("r9", "AAGGTTCC"),
        ]);
        data.push_str("@truncated\nACGT\n");

        let (chunks, _, stats) =
            run_single(&data, FileFormat::Fastq, false, &test_params(20), 1);
        assert_eq!(stats.records, 10);
        assert_eq!(stats.skipped, 1);

        // every retained record must be well-formed FASTX
        let mut sample = tempfile::NamedTempFile::with_suffix(".fastq").unwrap();
        sample.write_all(chunks.as_bytes()).unwrap();
        sample.flush().unwrap();

        let mut parsed = 0;
        let mut fastx_reader = needletail::parse_fastx_file(sample.path()).unwrap();
        while let Some(record) = fastx_reader.next() {
            record.unwrap();
            parsed += 1;
        }
        assert_eq!(parsed, 10);
    }

    #[test]
    fn test_seed_determinism() {
        let reads: Vec<(String, String)> = (0..50)
            .map(|i| (format!("r{i}"), format!("ACGTAC{}GTACGT", "GT".repeat(i % 5))))
            .collect();
        let reads: Vec<(&str, &str)> = reads
            .iter()
            .map(|(n, s)| (n.as_str(), s.as_str()))
            .collect();
        let data = fastq(&reads);

        let first = run_single(&data, FileFormat::Fastq, false, &test_params(5), 42);
        let second = run_single(&data, FileFormat::Fastq, false, &test_params(5), 42);
        assert_eq!(first, second);

        let other_seed = run_single(&data, FileFormat::Fastq, false, &test_params(5), 43);
        assert_ne!(first.0, other_seed.0);
    }

    #[test]
    fn test_interleaved_mates_stay_fused() {
        let data = fastq(&[
            ("p0/1", "ACGTACGT"),
            ("p0/2", "TTGGCCAA"),
            ("p1/1", "AACCGGTT"),
            ("p1/2", "GGTTAACC"),
            ("p2/1", "ACACACAC"),
            ("p2/2", "GTGTGTGT"),
        ]);
        let (chunks, weights, stats) =
            run_single(&data, FileFormat::Fastq, true, &test_params(2), 1);

        assert_eq!(stats.records, 3);
        assert_eq!(weights.lines().count(), 2);
        assert_eq!(chunks.matches('@').count(), 4);

        // each retained unit carries both mates, back to back
        let lines: Vec<&str> = chunks.lines().collect();
        for window in lines.chunks(8) {
            let first = window[0].strip_prefix('@').unwrap();
            let second = window[4].strip_prefix('@').unwrap();
            assert_eq!(first.split('/').next(), second.split('/').next());
            assert!(first.ends_with("/1") && second.ends_with("/2"));
        }
    }

    #[test]
    fn test_paired_outputs_stay_aligned() {
        let mates1 = fastq(&[("p0/1", "ACGTACGT"), ("p1/1", "AACCGGTT"), ("p2/1", "ACACACAC")]);
        let mates2 = fastq(&[("p0/2", "TTGGCCAA"), ("p1/2", "GGTTAACC"), ("p2/2", "GTGTGTGT")]);

        let params = test_params(2);
        let mut reader1 = make_reader(&mates1, FileFormat::Fastq);
        let mut reader2 = make_reader(&mates2, FileFormat::Fastq);
        let mut sampler = DiversitySampler::new(&params, 1);
        let mut reservoir1 = Reservoir::new(params.sample_size(), 1);
        let mut reservoir2 = Reservoir::new(params.sample_size(), 1);

        let stats = sample_paired(
            &mut reader1,
            &mut reader2,
            &mut sampler,
            &mut reservoir1,
            &mut reservoir2,
            &ProgressBar::hidden(),
        );
        assert_eq!(stats.records, 3);

        let mut chunks1 = Vec::new();
        let mut weights1 = Vec::new();
        reservoir1.drain(&mut chunks1, &mut weights1).unwrap();
        let mut chunks2 = Vec::new();
        let mut weights2 = Vec::new();
        reservoir2.drain(&mut chunks2, &mut weights2).unwrap();

        assert_eq!(weights1, weights2);

        // the i-th retained record in each output must be the same pair
        let chunks1 = String::from_utf8(chunks1).unwrap();
        let chunks2 = String::from_utf8(chunks2).unwrap();
        let ids1: Vec<&str> = chunks1
            .lines()
            .filter(|l| l.starts_with('@'))
            .map(|l| l.trim_start_matches('@').split('/').next().unwrap())
            .collect();
        let ids2: Vec<&str> = chunks2
            .lines()
            .filter(|l| l.starts_with('@'))
            .map(|l| l.trim_start_matches('@').split('/').next().unwrap())
            .collect();
        assert_eq!(ids1.len(), 2);
        assert_eq!(ids1, ids2);
    }

    #[test]
    fn test_paired_unequal_lengths() {
        let mates1 = fastq(&[("p0/1", "ACGTACGT"), ("p1/1", "AACCGGTT"), ("p2/1", "ACACACAC")]);
        let mates2 = fastq(&[("p0/2", "TTGGCCAA"), ("p1/2", "GGTTAACC")]);

        let params = test_params(5);
        let mut reader1 = make_reader(&mates1, FileFormat::Fastq);
        let mut reader2 = make_reader(&mates2, FileFormat::Fastq);
        let mut sampler = DiversitySampler::new(&params, 1);
        let mut reservoir1 = Reservoir::new(params.sample_size(), 1);
        let mut reservoir2 = Reservoir::new(params.sample_size(), 1);

        let stats = sample_paired(
            &mut reader1,
            &mut reader2,
            &mut sampler,
            &mut reservoir1,
            &mut reservoir2,
            &ProgressBar::hidden(),
        );
        assert_eq!(stats.records, 2);
        assert_eq!(reservoir1.len(), 2);
        assert_eq!(reservoir2.len(), 2);
    }
}
