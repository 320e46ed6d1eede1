
//! Line-oriented FASTA/FASTQ record framing.
//!
//! The sampler copies retained records to the output byte-for-byte, so the
//! reader keeps the verbatim text of every record alongside its extracted
//! sequence. Malformed records yield [`Pull::Skip`] rather than an error:
//! the reader consumes at least one line per call, resynchronizes on the
//! next header line, and lets the stream loop carry on.

use std::io::{self, BufRead};

use crate::io_utils::FileFormat;

/// One framed record: the nucleotide sequence and the exact bytes it came
/// from, line terminators included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadRecord {
    pub sequence: Vec<u8>,
    pub chunk: Vec<u8>,
}

/// Outcome of one pull from a record stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Pull {
    Record(ReadRecord),
    /// A malformed but recoverable record was consumed.
    Skip,
    Eof,
}

pub struct RecordReader<R: BufRead> {
    reader: R,
    format: FileFormat,
    /// Lookahead line held back while scanning for the end of a FASTA body.
    pending: Option<Vec<u8>>,
}

impl<R: BufRead> RecordReader<R> {
    pub fn new(reader: R, format: FileFormat) -> Self {
        RecordReader {
            reader,
            format,
            pending: None,
        }
    }

    /// Pull the next record from the stream.
    pub fn next_record(&mut self) -> io::Result<Pull> {
        match self.format {
            FileFormat::Fastq => self.next_fastq(),
            FileFormat::Fasta => self.next_fasta(),
        }
    }

    fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        if let Some(line) = self.pending.take() {
            return Ok(Some(line));
        }

        let mut line = Vec::new();
        if self.reader.read_until(b'\n', &mut line)? == 0 {
            Ok(None)
        } else {
            Ok(Some(line))
        }
    }

    /// A FASTQ record is exactly four lines: `@header`, sequence, `+`
    /// separator, and qualities. Anything else is skipped.
    fn next_fastq(&mut self) -> io::Result<Pull> {
        let header = match self.read_line()? {
            None => return Ok(Pull::Eof),
            Some(line) => line,
        };
        if !header.starts_with(b"@") {
            return Ok(Pull::Skip);
        }

        let seq_line = match self.read_line()? {
            None => return Ok(Pull::Skip),
            Some(line) => line,
        };
        let sep_line = match self.read_line()? {
            None => return Ok(Pull::Skip),
            Some(line) => line,
        };
        let qual_line = match self.read_line()? {
            None => return Ok(Pull::Skip),
            Some(line) => line,
        };
        if !sep_line.starts_with(b"+") {
            return Ok(Pull::Skip);
        }

        let sequence = trim_line_ending(&seq_line).to_vec();
        let mut chunk = header;
        chunk.extend_from_slice(&seq_line);
        chunk.extend_from_slice(&sep_line);
        chunk.extend_from_slice(&qual_line);

        Ok(Pull::Record(ReadRecord { sequence, chunk }))
    }

    /// A FASTA record is a `>` header plus every line up to the next header
    /// or end of input. An empty body is a valid record.
    fn next_fasta(&mut self) -> io::Result<Pull> {
        let header = match self.read_line()? {
            None => return Ok(Pull::Eof),
            Some(line) => line,
        };
        if !header.starts_with(b">") {
            return Ok(Pull::Skip);
        }

        let mut chunk = header;
        let mut sequence = Vec::new();
        loop {
            match self.read_line()? {
                None => break,
                Some(line) => {
                    if line.starts_with(b">") {
                        self.pending = Some(line);
                        break;
                    }
                    sequence.extend_from_slice(trim_line_ending(&line));
                    chunk.extend_from_slice(&line);
                }
            }
        }

        Ok(Pull::Record(ReadRecord { sequence, chunk }))
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    if end > 0 && line[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && line[end - 1] == b'\r' {
        end -= 1;
    }
    &line[..end]
}
