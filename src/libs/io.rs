use std::io::BufRead;
use std::path::Path;

use anyhow::{bail, Context};
use noodles_fasta as fasta;
use noodles_fastq as fastq;

use crate::libs::nt::to_acgtn;
use crate::libs::read::RawRead;

/// True when the path looks like FASTQ, .gz included
///
/// ```
/// assert!(criscan::is_fq("reads.fq"));
/// assert!(criscan::is_fq("reads.fastq.gz"));
/// assert!(!criscan::is_fq("contigs.fa.gz"));
/// ```
pub fn is_fq(infile: &str) -> bool {
    let name = infile.strip_suffix(".gz").unwrap_or(infile);
    name.ends_with(".fq") || name.ends_with(".fastq")
}

//----------------------------
// SequenceSource
//----------------------------
/// Iterates reads from one FASTA or FASTQ file, plain or gzipped.
/// Bases are uppercased and coerced to ACGTN on the way out; record
/// parse errors surface so the caller can fail the file.
pub enum SequenceSource {
    Fasta(fasta::io::Reader<Box<dyn BufRead>>),
    Fastq(fastq::io::Reader<Box<dyn BufRead>>),
}

impl SequenceSource {
    pub fn open(infile: &str) -> anyhow::Result<Self> {
        if infile != "stdin" && !Path::new(infile).is_file() {
            bail!("could not open {}", infile);
        }
        let reader = intspan::reader(infile);

        if is_fq(infile) {
            Ok(Self::Fastq(fastq::io::Reader::new(reader)))
        } else {
            Ok(Self::Fasta(fasta::io::Reader::new(reader)))
        }
    }
}

impl Iterator for SequenceSource {
    type Item = anyhow::Result<RawRead>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Fasta(reader) => reader.records().next().map(|result| {
                let record = result.context("malformed FASTA record")?;
                let name = String::from_utf8_lossy(record.name()).to_string();
                let seq = record.sequence();
                let bases = to_acgtn(&String::from_utf8_lossy(&seq[..]));
                Ok(RawRead { name, bases })
            }),
            Self::Fastq(reader) => reader.records().next().map(|result| {
                let record = result.context("malformed FASTQ record")?;
                let name = String::from_utf8_lossy(record.name()).to_string();
                let bases = to_acgtn(&String::from_utf8_lossy(record.sequence()));
                Ok(RawRead { name, bases })
            }),
        }
    }
}
