
//! Main entry point for the racesample application.
//!
//! This file handles command-line parsing, logging setup, input validation, and
//! orchestrates the streaming pass over the input reads: each record is hashed,
//! scored against the online density sketch, and offered to a weighted
//! reservoir. The retained records are written to the output file(s) along with
//! a companion `.weights` file per output. Single-end, interleaved, and
//! paired-end inputs are supported in FASTA or FASTQ, optionally gzipped.

use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Result};
use clap::Parser;
use log::info;

use crate::cli::{Cli, ReadFormat};
use crate::fastx::RecordReader;
use crate::io_utils::{create_writer, file_format, open_reader, weights_path};
use crate::logging::setup_logger;
use crate::progress::progress_spinner;
use crate::reservoir::Reservoir;
use crate::sample_params::SampleParams;
use crate::sampler::{sample_paired, sample_single, DiversitySampler};

mod cli;
pub mod fastx;
pub mod io_utils;
pub mod logging;
pub mod minhash;
pub mod progress;
pub mod race;
pub mod rehash;
pub mod reservoir;
pub mod sample_params;
pub mod sampler;

/// Common initialization required at startup.
fn init() -> Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    info!("{} v{}", env!("CARGO_PKG_NAME"), VERSION);
    info!("{}", env::args().collect::<Vec<String>>().join(" "));

    Ok(())
}

/// Split the positional file list into input and output paths for the given
/// read layout.
fn split_files(format: ReadFormat, files: &[PathBuf]) -> Result<(&[PathBuf], &[PathBuf])> {
    match format {
        ReadFormat::Paired => {
            if files.len() != 4 {
                bail!("PE format requires four files: input1 input2 output1 output2.");
            }
            Ok((&files[..2], &files[2..]))
        }
        ReadFormat::Single | ReadFormat::Interleaved => {
            if files.len() != 2 {
                bail!("SE and I formats require two files: input output.");
            }
            Ok((&files[..1], &files[1..]))
        }
    }
}

/// Write the retained records to `output` and their weights to the
/// `.weights` companion file.
fn drain_to_files(reservoir: Reservoir, output: &Path) -> Result<()> {
    let mut sample_writer = create_writer(output)?;
    let mut weights_writer = create_writer(&weights_path(output))?;

    reservoir.drain(&mut sample_writer, &mut weights_writer)?;
    sample_writer.flush()?;
    weights_writer.flush()?;

    Ok(())
}

fn main() -> Result<()> {
    let start = Instant::now();

    let args = Cli::parse();

    setup_logger()?;

    init()?;

    let params = SampleParams::new(
        args.sample_size,
        args.kmer_length,
        args.race_repetitions,
        args.hash_power,
        args.race_range,
    );
    params.validate()?;

    let (inputs, outputs) = split_files(args.format, &args.files)?;

    let record_format = file_format(&inputs[0])?;
    for input in &inputs[1..] {
        if file_format(input)? != record_format {
            bail!("Input files must all be FASTA or all be FASTQ.");
        }
    }

    let seed = args.seed.unwrap_or_else(rand::random);
    info!(
        "Sampling {} records with k = {}, reps = {}, hashes = {}, range = {}.",
        params.sample_size(),
        params.k(),
        params.repetitions(),
        params.hash_power(),
        params.range()
    );
    info!("Using random seed {}.", seed);

    let mut sampler = DiversitySampler::new(&params, seed);
    let progress = progress_spinner();

    let stats = match args.format {
        ReadFormat::Single | ReadFormat::Interleaved => {
            let mut reader = RecordReader::new(open_reader(&inputs[0])?, record_format);
            let mut reservoir = Reservoir::new(params.sample_size(), seed);

            let stats = sample_single(
                &mut reader,
                args.format == ReadFormat::Interleaved,
                &mut sampler,
                &mut reservoir,
                &progress,
            );
            progress.finish();

            info!("Retaining {} of {} records.", reservoir.len(), stats.records);
            drain_to_files(reservoir, &outputs[0])?;
            stats
        }
        ReadFormat::Paired => {
            let mut reader1 = RecordReader::new(open_reader(&inputs[0])?, record_format);
            let mut reader2 = RecordReader::new(open_reader(&inputs[1])?, record_format);
            // Both reservoirs share one seed so their retention decisions
            // match and the two outputs stay aligned mate-for-mate.
            let mut reservoir1 = Reservoir::new(params.sample_size(), seed);
            let mut reservoir2 = Reservoir::new(params.sample_size(), seed);

            let stats = sample_paired(
                &mut reader1,
                &mut reader2,
                &mut sampler,
                &mut reservoir1,
                &mut reservoir2,
                &progress,
            );
            progress.finish();

            info!(
                "Retaining {} of {} read pairs.",
                reservoir1.len(),
                stats.records
            );
            drain_to_files(reservoir1, &outputs[0])?;
            drain_to_files(reservoir2, &outputs[1])?;
            stats
        }
    };

    if stats.skipped > 0 {
        info!("Skipped {} malformed records.", stats.skipped);
    }

    info!("Elapsed time (sec): {:.2}", start.elapsed().as_secs_f32());
    info!("Done.");

    Ok(())
}
