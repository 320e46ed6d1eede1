use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;

/// On-disk record format of a read file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileFormat {
    Fasta,
    Fastq,
}

/// Determine the record format from a file path's extension, looking through
/// a trailing `.gz`. A path without an extension is an error.
pub fn file_format(path: &Path) -> Result<FileFormat> {
    let name = match path.file_name() {
        Some(name) => name.to_string_lossy().to_string(),
        None => bail!("Invalid input path: {}", path.display()),
    };

    let name = name.strip_suffix(".gz").unwrap_or(&name);
    let extension = match name.rsplit_once('.') {
        Some((_, extension)) => extension,
        None => bail!("Input file {} has no extension.", path.display()),
    };

    match extension {
        "fa" | "fasta" | "fna" => Ok(FileFormat::Fasta),
        "fq" | "fastq" => Ok(FileFormat::Fastq),
        other => bail!(
            "Unknown file extension '{}' for {}; expected FASTA (fa, fasta, fna) or FASTQ (fq, fastq).",
            other,
            path.display()
        ),
    }
}

/// Open a read file, decompressing gzip transparently.
pub fn open_reader(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).context(format!("Failed to open {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Create an output file wrapped in a buffered writer.
pub fn create_writer(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).context(format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Path of the weights companion for an output file. The returned path is a
/// fresh value; the argument is left untouched.
pub fn weights_path(output: &Path) -> PathBuf {
    let mut name = OsString::from(output.file_name().unwrap_or_default());
    name.push(".weights");
    output.with_file_name(name)
}
