//! Line classification and the rewrite of sex chromosome loci.

use clap::ValueEnum;
use serde::Serialize;
use thiserror::Error;

use crate::genotype::{GenotypeError, haploidize_sample_field};
use crate::sex::MaleColumns;
use crate::tally::LocusTally;

/// Marker opening the column header line.
pub const HEADER_PREFIX: &str = "#CHROM";

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
pub enum SexChromosome {
    Y,
    X,
}

/// How the `CHROM` field is compared with the configured chromosome names.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChromosomeMatch {
    /// The field must equal the name.
    #[default]
    Exact,
    /// The field must contain the name.
    Contains,
}

/// Configured names of the Y and X chromosomes.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ChromosomeTargets {
    y: String,
    x: String,
    mode: ChromosomeMatch,
}

impl ChromosomeTargets {
    pub fn new(y: impl Into<String>, x: impl Into<String>, mode: ChromosomeMatch) -> Self {
        Self {
            y: y.into(),
            x: x.into(),
            mode,
        }
    }

    /// Y is tested before X.
    pub fn classify(&self, chromosome: &str) -> Option<SexChromosome> {
        if self.matches(chromosome, &self.y) {
            Some(SexChromosome::Y)
        } else if self.matches(chromosome, &self.x) {
            Some(SexChromosome::X)
        } else {
            None
        }
    }

    pub fn y(&self) -> &str {
        &self.y
    }

    pub fn x(&self) -> &str {
        &self.x
    }

    fn matches(&self, chromosome: &str, target: &str) -> bool {
        match self.mode {
            ChromosomeMatch::Exact => chromosome == target,
            ChromosomeMatch::Contains => !target.is_empty() && chromosome.contains(target),
        }
    }
}

/// A line of a VCF file, without its terminator.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Line<'a> {
    Blank,
    Metadata,
    Header,
    Locus { chromosome: &'a str },
}

impl<'a> Line<'a> {
    pub fn parse(line: &'a str) -> Self {
        if line.is_empty() {
            Self::Blank
        } else if line.starts_with(HEADER_PREFIX) {
            Self::Header
        } else if line.starts_with('#') {
            Self::Metadata
        } else {
            let chromosome = line.split('\t').next().unwrap_or_default();
            Self::Locus { chromosome }
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum LocusError {
    #[error("malformed genotype of sample {sample} in column {}: {source}", .column + 1)]
    MalformedGenotype {
        column: usize,
        sample: String,
        #[source]
        source: GenotypeError,
    },
    #[error("column {} of sample {sample} is missing", .column + 1)]
    MissingSampleColumn { column: usize, sample: String },
}

/// A haploidized data line and the genotype classes found on it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RewrittenLocus {
    pub line: String,
    pub tally: LocusTally,
}

/// Haploidize the male sample columns of a data line.
///
/// Columns of other samples, and the fixed fields, are copied unchanged.
pub fn rewrite_locus(line: &str, males: &MaleColumns) -> Result<RewrittenLocus, LocusError> {
    let mut rewritten = String::with_capacity(line.len());
    let mut tally = LocusTally::default();
    let mut field_count = 0;

    for (column, field) in line.split('\t').enumerate() {
        if column > 0 {
            rewritten.push('\t');
        }
        field_count += 1;

        if !males.is_male(column) {
            rewritten.push_str(field);
            continue;
        }

        let (haploid, zygosity) =
            haploidize_sample_field(field).map_err(|source| LocusError::MalformedGenotype {
                column,
                sample: sample_name(males, column),
                source,
            })?;
        rewritten.push_str(&haploid);
        tally.record(zygosity);
    }

    if let Some(&column) = males.columns().iter().find(|&&column| column >= field_count) {
        return Err(LocusError::MissingSampleColumn {
            column,
            sample: sample_name(males, column),
        });
    }

    Ok(RewrittenLocus {
        line: rewritten,
        tally,
    })
}

fn sample_name(males: &MaleColumns, column: usize) -> String {
    males.sample_name(column).unwrap_or_default().to_string()
}
