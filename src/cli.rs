
//! Command-line interface definition for the racesample application.
//!
//! This file defines the `Cli` struct using the `clap` crate to parse and validate
//! command-line arguments: the sample size, the read layout (single-end, interleaved,
//! or paired-end), the input and output files, and the sketching parameters.
//! Custom value parsers validate the numeric options. The CLI output is styled
//! using the `anstyle` crate for improved readability.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

const DEFAULT_K: usize = 16;
const DEFAULT_REPETITIONS: usize = 100;
const DEFAULT_HASH_POWER: usize = 1;
const DEFAULT_RANGE: u32 = 10000;

/// Layout of the input reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReadFormat {
    /// Single-end reads
    #[value(name = "SE")]
    Single,
    /// Interleaved paired reads in one file
    #[value(name = "I")]
    Interleaved,
    /// Paired-end reads in two files
    #[value(name = "PE")]
    Paired,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(styles=get_styles())]
#[command(disable_help_subcommand = true)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Number of reads to retain in the sample
    #[arg(value_parser = validate_positive)]
    pub sample_size: usize,

    /// Read layout of the input
    #[arg(value_enum)]
    pub format: ReadFormat,

    /// Input file(s) followed by output file(s); two files for SE and I,
    /// four (input1 input2 output1 output2) for PE. Each output P also
    /// produces a companion P.weights file.
    #[arg(value_name = "FILE", required = true, num_args = 2..=4)]
    pub files: Vec<PathBuf>,

    /// Hash range of each counter row (B)
    #[arg(long = "range", help_heading = "Sketch parameters", default_value_t = DEFAULT_RANGE, value_parser = validate_positive_u32)]
    pub race_range: u32,

    /// Number of counter rows (R)
    #[arg(long = "reps", help_heading = "Sketch parameters", default_value_t = DEFAULT_REPETITIONS, value_parser = validate_positive)]
    pub race_repetitions: usize,

    /// Number of MinHashes per counter row (p)
    #[arg(long = "hashes", help_heading = "Sketch parameters", default_value_t = DEFAULT_HASH_POWER, value_parser = validate_positive)]
    pub hash_power: usize,

    /// Length of k-mers to use
    #[arg(short, long, help_heading = "Sketch parameters", default_value_t = DEFAULT_K, value_parser = validate_positive)]
    pub kmer_length: usize,

    /// Random seed for the hash functions and the reservoir; defaults to a
    /// fresh value logged at startup
    #[arg(long)]
    pub seed: Option<u64>,
}

fn validate_positive(value: &str) -> Result<usize, String> {
    let value: usize = value
        .parse()
        .map_err(|_| format!("`{value}` isn't a valid value"))?;

    if value == 0 {
        return Err("Value must be at least 1".to_string());
    }

    Ok(value)
}

fn validate_positive_u32(value: &str) -> Result<u32, String> {
    let value: u32 = value
        .parse()
        .map_err(|_| format!("`{value}` isn't a valid value"))?;

    if value == 0 {
        return Err("Value must be at least 1".to_string());
    }

    Ok(value)
}

fn get_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .usage(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))),
        )
        .header(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))),
        )
        .literal(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
        .invalid(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
        )
        .error(
            anstyle::Style::new()
                .bold()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
        )
        .valid(
            anstyle::Style::new()
                .bold()
                .underline()
                .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
        )
        .placeholder(
            anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))),
        )
}
