//! Haploidization of a single sample field.
//!
//! A sample field is colon-delimited; its first subfield is the `GT` call,
//! two allele tokens joined by `/`. Only that subfield is rewritten, every
//! other subfield is carried over verbatim and in order.

use thiserror::Error;

/// Allele token used for an absent call.
pub const MISSING_ALLELE: &str = ".";

const ALLELE_SEPARATOR: char = '/';
const PHASED_SEPARATOR: char = '|';
const SUBFIELD_SEPARATOR: char = ':';

/// Classification of a male genotype on a hemizygous chromosome.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Zygosity {
    /// The two alleles differ; the call is collapsed to missing.
    Heterozygous,
    /// Both alleles are the same concrete allele.
    Homozygous,
    /// Both alleles are missing.
    Missing,
}

/// Reasons a `GT` subfield cannot be haploidized.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum GenotypeError {
    #[error("empty genotype call")]
    Empty,
    #[error("phased genotype '{0}' is not supported")]
    Phased(String),
    #[error("expected two '/'-separated alleles in '{genotype}', found {count}")]
    AlleleCount { genotype: String, count: usize },
    #[error("invalid allele '{allele}' in genotype '{genotype}'")]
    InvalidAllele { genotype: String, allele: String },
}

/// The haploid allele chosen for a diploid call.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct HaploidCall<'a> {
    pub allele: &'a str,
    pub zygosity: Zygosity,
}

/// Collapse a `GT` value such as `1/1` to its haploid form.
///
/// A call that is already a single allele (the output of a previous run) is
/// accepted unchanged, which makes the conversion idempotent.
pub fn haploidize_genotype(genotype: &str) -> Result<HaploidCall<'_>, GenotypeError> {
    if genotype.is_empty() {
        return Err(GenotypeError::Empty);
    }
    if genotype.contains(PHASED_SEPARATOR) {
        return Err(GenotypeError::Phased(genotype.to_string()));
    }

    let Some((first, second)) = genotype.split_once(ALLELE_SEPARATOR) else {
        validate_allele(genotype, genotype)?;
        return Ok(homozygous_call(genotype));
    };

    if second.contains(ALLELE_SEPARATOR) {
        return Err(GenotypeError::AlleleCount {
            genotype: genotype.to_string(),
            count: genotype.split(ALLELE_SEPARATOR).count(),
        });
    }

    validate_allele(genotype, first)?;
    validate_allele(genotype, second)?;

    if first != second {
        Ok(HaploidCall {
            allele: MISSING_ALLELE,
            zygosity: Zygosity::Heterozygous,
        })
    } else {
        Ok(homozygous_call(first))
    }
}

/// Rewrite a whole sample field, e.g. `0/1:30` becomes `.:30`.
pub fn haploidize_sample_field(field: &str) -> Result<(String, Zygosity), GenotypeError> {
    let (genotype, rest) = match field.split_once(SUBFIELD_SEPARATOR) {
        Some((genotype, rest)) => (genotype, Some(rest)),
        None => (field, None),
    };

    let call = haploidize_genotype(genotype)?;

    let mut rewritten = String::with_capacity(field.len());
    rewritten.push_str(call.allele);
    if let Some(rest) = rest {
        rewritten.push(SUBFIELD_SEPARATOR);
        rewritten.push_str(rest);
    }

    Ok((rewritten, call.zygosity))
}

fn homozygous_call(allele: &str) -> HaploidCall<'_> {
    let zygosity = if allele == MISSING_ALLELE {
        Zygosity::Missing
    } else {
        Zygosity::Homozygous
    };
    HaploidCall { allele, zygosity }
}

fn validate_allele(genotype: &str, allele: &str) -> Result<(), GenotypeError> {
    let is_index = !allele.is_empty() && allele.bytes().all(|b| b.is_ascii_digit());
    if allele == MISSING_ALLELE || is_index {
        Ok(())
    } else {
        Err(GenotypeError::InvalidAllele {
            genotype: genotype.to_string(),
            allele: allele.to_string(),
        })
    }
}
